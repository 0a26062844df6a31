//! Results of preview, analysis and redaction passes.

use crate::document::Bitmap;
use crate::domain::SkippedPattern;
use crate::geometry::{Color, Rect};
use serde::Serialize;

/// What produced a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Pattern,
    Entity,
}

/// One resolved match as shown in a preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub rect: Rect,
    pub text: String,
    pub label: String,
    pub color: Color,
    pub source: MatchSource,
}

/// The state of entity detection for a pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetectorStatus {
    /// Detection was not requested.
    #[default]
    Disabled,
    Ran,
    /// Detection was requested but could not run; the pass used patterns only.
    Degraded { reason: String },
}

/// Preview of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    /// One-based page number.
    pub page: usize,
    pub highlights: Vec<Highlight>,
    pub skipped_patterns: Vec<SkippedPattern>,
    pub unresolved: usize,
    pub detector_status: DetectorStatus,
    /// The rendered page with highlights painted in, when requested.
    #[serde(skip)]
    pub bitmap: Option<Bitmap>,
}

impl PreviewReport {
    pub fn match_count(&self) -> usize {
        self.highlights.len()
    }
}

/// Hits for one pattern on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageHits {
    /// One-based page number.
    pub page: usize,
    pub hits: usize,
}

/// Hits for one pattern across the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHits {
    pub label: String,
    pub total: usize,
    /// Pages with at least one hit, in page order.
    pub pages: Vec<PageHits>,
}

/// Document-wide hit analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HitReport {
    /// One entry per compiled pattern, in pattern order.
    pub patterns: Vec<PatternHits>,
    pub total_hits: usize,
    pub pages_scanned: usize,
    pub skipped_patterns: Vec<SkippedPattern>,
}

impl HitReport {
    pub fn pattern(&self, label: &str) -> Option<&PatternHits> {
        self.patterns.iter().find(|p| p.label == label)
    }

    pub(crate) fn record(&mut self, pattern_index: usize, page: usize, hits: usize) {
        if hits == 0 {
            return;
        }
        if let Some(entry) = self.patterns.get_mut(pattern_index) {
            entry.total += hits;
            entry.pages.push(PageHits { page, hits });
            self.total_hits += hits;
        }
    }
}

/// Statistics about a redaction pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedactionReport {
    pub pages_processed: usize,
    /// Pages with at least one region applied.
    pub pages_modified: usize,
    /// Rectangles resolved from pattern hits.
    pub pattern_matches: usize,
    /// Rectangles resolved from detected entities.
    pub entity_matches: usize,
    /// Hits dropped because they had no geometry.
    pub unresolved: usize,
    /// Merged regions removed from the document.
    pub regions_applied: usize,
    pub skipped_patterns: Vec<SkippedPattern>,
    pub detector_status: DetectorStatus,
}

impl RedactionReport {
    /// Returns true if any region was removed.
    pub fn has_redactions(&self) -> bool {
        self.regions_applied > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_report_record() {
        let mut report = HitReport {
            patterns: vec![PatternHits {
                label: "Email".to_string(),
                total: 0,
                pages: Vec::new(),
            }],
            ..Default::default()
        };
        report.record(0, 1, 2);
        report.record(0, 2, 0);
        report.record(0, 3, 1);
        report.record(5, 1, 9);
        let email = report.pattern("Email").unwrap();
        assert_eq!(email.total, 3);
        assert_eq!(
            email.pages,
            vec![PageHits { page: 1, hits: 2 }, PageHits { page: 3, hits: 1 }]
        );
        assert_eq!(report.total_hits, 3);
    }

    #[test]
    fn test_detector_status_json() {
        let status = DetectorStatus::Degraded {
            reason: "missing".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"status":"degraded","reason":"missing"}"#);
    }

    #[test]
    fn test_has_redactions() {
        assert!(!RedactionReport::default().has_redactions());
        let report = RedactionReport {
            regions_applied: 1,
            ..Default::default()
        };
        assert!(report.has_redactions());
    }
}
