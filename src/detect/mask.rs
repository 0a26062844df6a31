//! Text de-identification: replacing detected entities in plain text.

use super::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a detected entity is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskingStyle {
    /// `<LABEL>`
    TypeLabel,
    /// One `*` per character.
    FullMask,
    /// First and last character kept, the rest starred.
    PartialMask,
    /// A fixed block, independent of the original length.
    #[default]
    Redact,
}

impl MaskingStyle {
    pub const ALL: [MaskingStyle; 4] = [
        MaskingStyle::TypeLabel,
        MaskingStyle::FullMask,
        MaskingStyle::PartialMask,
        MaskingStyle::Redact,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaskingStyle::TypeLabel => "type_label",
            MaskingStyle::FullMask => "full_mask",
            MaskingStyle::PartialMask => "partial_mask",
            MaskingStyle::Redact => "redact",
        }
    }

    fn replacement(self, label: &str, original: &str) -> String {
        let n = original.chars().count();
        match self {
            MaskingStyle::TypeLabel => format!("<{}>", label),
            MaskingStyle::FullMask => "*".repeat(n),
            MaskingStyle::PartialMask if n > 4 => {
                let first = original.chars().next().unwrap_or('*');
                let last = original.chars().last().unwrap_or('*');
                format!("{}{}{}", first, "*".repeat(n - 2), last)
            }
            MaskingStyle::PartialMask => "*".repeat(n),
            MaskingStyle::Redact => "****".to_string(),
        }
    }
}

impl fmt::Display for MaskingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaskingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaskingStyle::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown masking style '{}'", s))
    }
}

/// Replaces every entity span in `text` according to `style`.
///
/// Spans that are out of range, empty, or overlap an already-masked span
/// are skipped. Replacements are applied from the end of the text backwards
/// so earlier offsets stay valid.
pub fn mask_entities(text: &str, entities: &[Entity], style: MaskingStyle) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<&Entity> = entities
        .iter()
        .filter(|e| {
            let valid = e.start < e.end && e.end <= chars.len();
            if !valid {
                tracing::debug!(
                    start = e.start,
                    end = e.end,
                    len = chars.len(),
                    "skipping entity with invalid span"
                );
            }
            valid
        })
        .collect();
    spans.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut out = chars.clone();
    let mut floor = usize::MAX;
    for e in spans {
        if e.end > floor {
            continue;
        }
        let original: String = chars[e.start..e.end].iter().collect();
        let replacement = style.replacement(&e.label, &original);
        out.splice(e.start..e.end, replacement.chars());
        floor = e.start;
    }
    out.into_iter().collect()
}
