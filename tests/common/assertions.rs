//! Custom assertions for PDF redaction testing.

use std::path::Path;

/// Asserts that `needle` no longer appears in the PDF's text.
///
/// The text is read twice: through the library's own MuPDF extraction and
/// through pdf-extract, so a leftover glyph stream cannot hide behind one
/// extractor's quirks.
///
/// # Panics
/// Panics if either extractor still finds the text.
pub fn assert_redacted(pdf_path: &Path, needle: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        !text.contains(needle),
        "'{}' should be redacted but was found in output PDF at '{}'.\nExtracted text length: {} chars",
        needle,
        pdf_path.display(),
        text.len()
    );

    if let Ok(independent) = super::pdf_helpers::extract_text_independent(pdf_path) {
        assert!(
            !independent.contains(needle),
            "'{}' survives in the content stream of '{}'",
            needle,
            pdf_path.display()
        );
    }
}

/// Asserts that `needle` is still present in the PDF.
///
/// # Panics
/// Panics if the text is not found.
pub fn assert_preserved(pdf_path: &Path, needle: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        text.contains(needle),
        "'{}' should be preserved but was not found in PDF at '{}'",
        needle,
        pdf_path.display()
    );
}

/// Asserts that a PDF exists, is non-empty and parses.
///
/// # Panics
/// Panics if the PDF appears to be empty or corrupted.
pub fn assert_valid_pdf(pdf_path: &Path) {
    assert!(
        pdf_path.exists(),
        "PDF should exist at '{}'",
        pdf_path.display()
    );

    let metadata = std::fs::metadata(pdf_path).expect("Failed to get PDF metadata");
    assert!(
        metadata.len() > 0,
        "PDF should not be empty at '{}'",
        pdf_path.display()
    );

    assert!(
        ::lopdf::Document::load(pdf_path).is_ok(),
        "PDF at '{}' does not parse",
        pdf_path.display()
    );
}

/// Asserts that none of `needles` appear in the PDF.
pub fn assert_all_redacted(pdf_path: &Path, needles: &[&str]) {
    let text = extract_text_or_panic(pdf_path);
    let found: Vec<&str> = needles
        .iter()
        .copied()
        .filter(|n| text.contains(n))
        .collect();
    assert!(
        found.is_empty(),
        "The following should be redacted but were found: {:?}",
        found
    );
}

fn extract_text_or_panic(pdf_path: &Path) -> String {
    super::pdf_helpers::extract_text_locked(pdf_path).unwrap_or_else(|e| {
        panic!(
            "Failed to extract text from PDF '{}': {}",
            pdf_path.display(),
            e
        )
    })
}
