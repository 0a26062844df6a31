//! PDF redaction library with pixel-accurate match geometry.
//!
//! Sensitive text is found with labelled regex patterns or an entity
//! detector, resolved to exact rectangles on the page, consolidated into
//! non-overlapping regions and then physically removed through MuPDF's
//! redaction API. Redacted content cannot be recovered from the output.
//!
//! # Architecture
//!
//! - [`geometry`]: rectangles, words, matches and colors in page space
//! - [`domain`]: patterns, presets, match templates and the session pattern set
//! - [`document`]: the document provider seam, word index and backends
//! - [`detect`]: entity detectors, model catalog and text masking
//! - [`redaction`]: match resolution, region merging and the pass service
//! - [`error`]: error types
//!
//! # Quick Start
//!
//! ```no_run
//! use redactor::{PassControl, PatternSet, RedactionConfig, RedactionService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedactionService::with_mupdf();
//!
//! let mut patterns = PatternSet::new();
//! patterns.add_preset("Email Address")?;
//! patterns.add_preset("Phone Number (10 digits)")?;
//!
//! let report = service.redact(
//!     Path::new("input.pdf"),
//!     Path::new("output.pdf"),
//!     &patterns,
//!     &RedactionConfig::default(),
//!     &PassControl::detached(),
//! )?;
//! println!("{} region(s) removed", report.regions_applied);
//! # Ok(())
//! # }
//! ```
//!
//! # Examples
//!
//! ## Resolving matches on a page
//!
//! ```
//! use redactor::document::WordIndex;
//! use redactor::domain::{Pattern, PatternOrigin};
//! use redactor::{MatchResolver, Word};
//!
//! let word = |text: &str, x0: f32, pos: usize| Word {
//!     x0,
//!     y0: 72.0,
//!     x1: x0 + 6.0 * text.len() as f32,
//!     y1: 82.0,
//!     text: text.to_string(),
//!     block: 0,
//!     line: 0,
//!     pos,
//! };
//! let words = vec![word("Contact:", 72.0, 0), word("9876543210", 126.0, 1)];
//! let index = WordIndex::new(words, "Contact: 9876543210".to_string());
//!
//! let pattern = Pattern::new("Phone", r"\b\d{10}\b", PatternOrigin::Custom)
//!     .compile()
//!     .unwrap();
//! let resolution = MatchResolver::new(&index).find_matches(&pattern.regex);
//! assert_eq!(resolution.matches.len(), 1);
//! ```
//!
//! ## Masking entities in text
//!
//! ```
//! use redactor::detect::{DetectionConfig, MaskingStyle};
//! use redactor::RedactionService;
//!
//! let service = RedactionService::with_mupdf();
//! let detection = DetectionConfig::default().with_masking(MaskingStyle::TypeLabel);
//! let masked = service.mask_text("reach me at jane@example.com", &detection).unwrap();
//! assert_eq!(masked, "reach me at <EMAIL>");
//! ```

// Public API
pub mod detect;
pub mod document;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod redaction;

// Re-exports for convenient access
pub use detect::{DetectionConfig, Entity, EntityDetector, MaskingStyle, ModelKind};
pub use document::{DocumentProvider, MupdfProvider, PageContext, WordIndex};
pub use domain::{MatchTemplate, Pattern, PatternOrigin, PatternSet};
pub use error::{RedactorError, RedactorResult};
pub use geometry::{Color, Match, Point, Rect, Word};
pub use redaction::{
    HitReport, MatchResolver, PassControl, PassHandle, PreviewReport, RedactionConfig,
    RedactionMerger, RedactionReport, RedactionService, SingleCharScope,
};

use std::path::Path;

/// Extracts the text of every page of a PDF, pages separated by newlines.
pub fn extract_text_from_pdf(path: &Path) -> RedactorResult<String> {
    RedactionService::with_mupdf().extract_text(path)
}
