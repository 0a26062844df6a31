//! PDF inspection helpers.

use anyhow::Result;
use std::path::Path;
use std::sync::Mutex;

// MuPDF font loading is not thread-safe; test threads extract one at a time.
static EXTRACT_LOCK: Mutex<()> = Mutex::new(());

/// Extracts text through the library, one caller at a time.
pub fn extract_text_locked(pdf_path: &Path) -> redactor::RedactorResult<String> {
    let _guard = EXTRACT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    redactor::extract_text_from_pdf(pdf_path)
}

/// Extracts text through the library, returning an error instead of panicking.
pub fn extract_text(pdf_path: &Path) -> Result<String> {
    extract_text_locked(pdf_path).map_err(|e| anyhow::anyhow!("Failed to extract text: {}", e))
}

/// Extracts text with pdf-extract, which parses content streams without MuPDF.
///
/// pdf-extract panics on some font dictionaries; that is reported as an error.
pub fn extract_text_independent(pdf_path: &Path) -> Result<String> {
    let path = pdf_path.to_path_buf();
    std::panic::catch_unwind(move || pdf_extract::extract_text(&path))
        .map_err(|_| anyhow::anyhow!("pdf-extract panicked"))?
        .map_err(|e| anyhow::anyhow!("pdf-extract failed: {}", e))
}

/// Counts occurrences of `needle` in a PDF.
pub fn count_in_pdf(pdf_path: &Path, needle: &str) -> Result<usize> {
    let text = extract_text(pdf_path)?;
    Ok(text.matches(needle).count())
}

/// Number of pages according to lopdf.
pub fn page_count(pdf_path: &Path) -> Result<usize> {
    Ok(::lopdf::Document::load(pdf_path)?.get_pages().len())
}
