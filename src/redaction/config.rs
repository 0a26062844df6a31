//! Pass configuration.

use crate::detect::DetectionConfig;
use crate::error::{RedactorError, RedactorResult};
use crate::geometry::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which occurrences a single-character match covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleCharScope {
    /// Every occurrence of the character anywhere on the page.
    #[default]
    Page,
    /// Only the character at the offset the regex matched.
    MatchOffset,
}

impl fmt::Display for SingleCharScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SingleCharScope::Page => "page",
            SingleCharScope::MatchOffset => "match-offset",
        })
    }
}

impl FromStr for SingleCharScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "page" => Ok(SingleCharScope::Page),
            "match-offset" | "offset" => Ok(SingleCharScope::MatchOffset),
            _ => Err(format!("unknown single-character scope '{}'", s)),
        }
    }
}

/// Settings for one preview, analysis or redaction pass.
///
/// Built once by the caller and passed by reference; nothing in the pass
/// reads settings from anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Margin added on every side of a candidate rectangle before merging.
    pub padding: f32,
    /// Rectangles narrower or shorter than this are discarded as noise.
    pub min_extent: f32,
    /// Fill painted over removed content.
    pub fill: Color,
    pub single_char_scope: SingleCharScope,
    /// Entity detection; `None` runs patterns only.
    pub detection: Option<DetectionConfig>,
    /// Garbage-collect and compress the output document.
    pub compact_output: bool,
    /// How many times a page commit is tried before the pass fails.
    pub page_attempts: usize,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            padding: 2.0,
            min_extent: 0.1,
            fill: Color::BLACK,
            single_char_scope: SingleCharScope::Page,
            detection: None,
            compact_output: true,
            page_attempts: 2,
        }
    }
}

impl RedactionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_min_extent(mut self, min_extent: f32) -> Self {
        self.min_extent = min_extent;
        self
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_single_char_scope(mut self, scope: SingleCharScope) -> Self {
        self.single_char_scope = scope;
        self
    }

    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = Some(detection);
        self
    }

    pub fn with_compact_output(mut self, compact: bool) -> Self {
        self.compact_output = compact;
        self
    }

    pub fn with_page_attempts(mut self, attempts: usize) -> Self {
        self.page_attempts = attempts;
        self
    }

    /// Checks every value that comes from outside the crate.
    pub fn validate(&self) -> RedactorResult<()> {
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(RedactorError::invalid_input(
                "padding",
                format!("{} is not a non-negative number", self.padding),
            ));
        }
        if !(self.min_extent.is_finite() && self.min_extent >= 0.0) {
            return Err(RedactorError::invalid_input(
                "min_extent",
                format!("{} is not a non-negative number", self.min_extent),
            ));
        }
        if self.page_attempts == 0 {
            return Err(RedactorError::invalid_input(
                "page_attempts",
                "at least one attempt is required",
            ));
        }
        if let Some(detection) = &self.detection {
            detection.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedactionConfig::default();
        assert_eq!(config.padding, 2.0);
        assert_eq!(config.min_extent, 0.1);
        assert_eq!(config.fill, Color::BLACK);
        assert_eq!(config.single_char_scope, SingleCharScope::Page);
        assert!(config.detection.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(RedactionConfig::new().with_padding(-1.0).validate().is_err());
        assert!(RedactionConfig::new().with_min_extent(f32::NAN).validate().is_err());
        assert!(RedactionConfig::new().with_page_attempts(0).validate().is_err());
        let bad_detection = DetectionConfig::default().with_threshold(2.0);
        assert!(RedactionConfig::new()
            .with_detection(bad_detection)
            .validate()
            .is_err());
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("page".parse(), Ok(SingleCharScope::Page));
        assert_eq!("match_offset".parse(), Ok(SingleCharScope::MatchOffset));
        assert!("line".parse::<SingleCharScope>().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RedactionConfig =
            serde_json::from_str(r##"{"padding": 1.5, "fill": "#ffffff"}"##).unwrap();
        assert_eq!(config.padding, 1.5);
        assert_eq!(config.fill, Color::WHITE);
        assert_eq!(config.page_attempts, 2);
    }
}
