//! Error types for the PDF redaction library.
//!
//! Fatal errors abort the current operation only. Recoverable conditions
//! (a pattern that fails to compile, a match with no geometry, a detector
//! that cannot run) are reported on the pass result instead of here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Error type for all redaction operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Error occurred during PDF processing
    #[error("PDF processing error{}: {message}", page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pattern compilation error
    #[error("Pattern error for '{pattern}': {reason}")]
    PatternError { pattern: String, reason: String },

    /// A pattern with the same label is already in the set
    #[error("Pattern '{label}' already exists")]
    DuplicatePattern { label: String },

    /// Text extraction failed
    #[error("Text extraction failed for '{}': {reason}", path.display())]
    TextExtraction { path: PathBuf, reason: String },

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Backend-specific error (MuPDF, etc.)
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A page could not be redacted as a whole
    #[error("Redaction of page {page} failed after {attempts} attempt(s): {reason}")]
    PartialRedaction {
        page: usize,
        attempts: usize,
        reason: String,
    },

    /// The pass was cancelled at a page boundary
    #[error("Operation cancelled after {completed_pages} page(s)")]
    Cancelled { completed_pages: usize },
}

impl RedactorError {
    pub(crate) fn invalid_input(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BackendError {
            backend: "MuPDF".to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion implementations for common error types
impl From<io::Error> for RedactorError {
    fn from(err: io::Error) -> Self {
        Self::BackendError {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<regex::Error> for RedactorError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<fancy_regex::Error> for RedactorError {
    fn from(err: fancy_regex::Error) -> Self {
        Self::PatternError {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for RedactorError {
    fn from(err: anyhow::Error) -> Self {
        Self::BackendError {
            backend: "anyhow".to_string(),
            message: err.to_string(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RedactorError::DuplicatePattern {
            label: "Email Address".to_string(),
        };
        assert_eq!(err.to_string(), "Pattern 'Email Address' already exists");
    }

    #[test]
    fn test_pdf_processing_display_page() {
        let err = RedactorError::PdfProcessing {
            message: "boom".to_string(),
            page: Some(3),
            source: None,
        };
        assert_eq!(err.to_string(), "PDF processing error on page 3: boom");

        let err = RedactorError::PdfProcessing {
            message: "boom".to_string(),
            page: None,
            source: None,
        };
        assert_eq!(err.to_string(), "PDF processing error: boom");
    }
}
