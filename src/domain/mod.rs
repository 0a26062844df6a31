//! Pattern rules: presets, templates and the session pattern list.
//!
//! Patterns are plain data until [`PatternSet::compile`] turns them into
//! regexes. A pattern that fails to compile is skipped for the pass and
//! reported back, never fatal.

pub mod presets;
pub mod templates;

pub use presets::{find_preset, Preset, PRESETS};
pub use templates::MatchTemplate;

use crate::error::{RedactorError, RedactorResult};
use crate::geometry::Color;
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

/// Highlight colors handed out to new patterns in order.
pub const PALETTE: [Color; 15] = [
    Color::rgb(0xff, 0x57, 0x22),
    Color::rgb(0xe9, 0x1e, 0x63),
    Color::rgb(0x9c, 0x27, 0xb0),
    Color::rgb(0x67, 0x3a, 0xb7),
    Color::rgb(0x3f, 0x51, 0xb5),
    Color::rgb(0x21, 0x96, 0xf3),
    Color::rgb(0x03, 0xa9, 0xf4),
    Color::rgb(0x00, 0xbc, 0xd4),
    Color::rgb(0x00, 0x96, 0x88),
    Color::rgb(0x4c, 0xaf, 0x50),
    Color::rgb(0x8b, 0xc3, 0x4a),
    Color::rgb(0xcd, 0xdc, 0x39),
    Color::rgb(0xff, 0xeb, 0x3b),
    Color::rgb(0xff, 0xc1, 0x07),
    Color::rgb(0xff, 0x98, 0x00),
];

/// Where a pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternOrigin {
    Preset,
    Custom,
    Selection,
}

/// A labelled regex rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub label: String,
    pub regex: String,
    pub color: Color,
    pub origin: PatternOrigin,
}

impl Pattern {
    pub fn new(label: impl Into<String>, regex: impl Into<String>, origin: PatternOrigin) -> Self {
        Self {
            label: label.into(),
            regex: regex.into(),
            color: PALETTE[0],
            origin,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Compiles the rule the way matching runs: case-insensitive, with `^`
    /// and `$` anchoring at line boundaries.
    pub fn compile(&self) -> RedactorResult<CompiledPattern> {
        let regex = Regex::new(&format!("(?mi){}", self.regex)).map_err(|e| {
            RedactorError::PatternError {
                pattern: self.label.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(CompiledPattern {
            label: self.label.clone(),
            color: self.color,
            regex,
        })
    }
}

/// A pattern ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub label: String,
    pub color: Color,
    pub regex: Regex,
}

/// A pattern left out of a pass because it did not compile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPattern {
    pub label: String,
    pub reason: String,
}

/// Ordered session list of patterns with unique labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pattern, rejecting a label that is already present.
    pub fn add(&mut self, pattern: Pattern) -> RedactorResult<&Pattern> {
        if pattern.label.trim().is_empty() {
            return Err(RedactorError::invalid_input("label", "label is empty"));
        }
        if self.patterns.iter().any(|p| p.label == pattern.label) {
            return Err(RedactorError::DuplicatePattern {
                label: pattern.label,
            });
        }
        self.patterns.push(pattern);
        let last = self.patterns.len() - 1;
        Ok(&self.patterns[last])
    }

    /// Adds a preset by name, coloring it from the palette.
    pub fn add_preset(&mut self, name: &str) -> RedactorResult<&Pattern> {
        let preset = find_preset(name.trim())
            .ok_or_else(|| RedactorError::invalid_input("preset", format!("unknown preset '{}'", name)))?;
        let pattern = Pattern::new(preset.name, preset.regex, PatternOrigin::Preset)
            .with_color(self.next_color());
        self.add(pattern)
    }

    /// Adds a pattern generated from a template and its inputs.
    pub fn add_template(
        &mut self,
        template: MatchTemplate,
        inputs: &[&str],
        origin: PatternOrigin,
    ) -> RedactorResult<&Pattern> {
        let regex = template.regex(inputs)?;
        let pattern = Pattern::new(template.label(inputs), regex, origin)
            .with_color(self.next_color());
        self.add(pattern)
    }

    pub fn remove(&mut self, index: usize) -> Option<Pattern> {
        (index < self.patterns.len()).then(|| self.patterns.remove(index))
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    fn next_color(&self) -> Color {
        PALETTE[self.patterns.len() % PALETTE.len()]
    }

    /// Compiles every pattern, splitting out those that fail.
    pub fn compile(&self) -> (Vec<CompiledPattern>, Vec<SkippedPattern>) {
        let mut compiled = Vec::with_capacity(self.patterns.len());
        let mut skipped = Vec::new();
        for pattern in &self.patterns {
            match pattern.compile() {
                Ok(c) => compiled.push(c),
                Err(e) => {
                    tracing::warn!(label = %pattern.label, error = %e, "skipping invalid pattern");
                    skipped.push(SkippedPattern {
                        label: pattern.label.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (compiled, skipped)
    }
}

impl FromIterator<Pattern> for PatternSet {
    /// Collects patterns, keeping the first of any duplicate labels.
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        let mut set = PatternSet::new();
        for p in iter {
            let _ = set.add(p);
        }
        set
    }
}
