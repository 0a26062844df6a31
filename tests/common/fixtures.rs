//! Test fixtures and PDF builders.
//!
//! Every line is written with its own text operator at a fixed baseline, so
//! the extracted words come back one text line per fixture line.

use anyhow::Result;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Distance between baselines.
const LINE_SPACING: f32 = 12.0;

/// Builder for creating test PDFs with custom content.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let pdf = TestPdfBuilder::new()
///     .with_line("Contact: 9876543210")
///     .new_page()
///     .with_line("Email: jane@example.com")
///     .build(Path::new("/tmp/test.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    font_size: f32,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    /// Creates a builder with one empty A4 page.
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: vec![Vec::new()],
            font_size: 12.0,
            page_width: Mm(210.0),  // A4 width
            page_height: Mm(297.0), // A4 height
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds a text line to the current page.
    pub fn with_line(mut self, line: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(line.to_string());
        }
        self
    }

    /// Adds several lines to the current page.
    pub fn with_lines(self, lines: &[&str]) -> Self {
        lines.iter().fold(self, |b, line| b.with_line(line))
    }

    /// Starts a new page; following lines go there.
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        for (i, lines) in self.pages.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(page1).get_layer(layer1)
            } else {
                let (page, layer) = doc.add_page(self.page_width, self.page_height, "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            for (n, line) in lines.iter().enumerate() {
                let y = self.page_height.0 - 30.0 - n as f32 * LINE_SPACING;
                layer.use_text(line.as_str(), self.font_size, Mm(20.0), Mm(y), &font);
            }
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-page contact sheet with one `Name: phone` line per contact.
pub fn create_contact_sheet(path: &Path, contacts: &[(&str, &str)]) -> Result<PathBuf> {
    let mut builder = TestPdfBuilder::new()
        .with_title("Contact Sheet")
        .with_line("Emergency Contacts");
    for (name, phone) in contacts {
        builder = builder.with_line(&format!("{}: {}", name, phone));
    }
    builder.build(path)
}

/// A two-page customer statement mixing identifiers and plain prose.
pub fn create_statement(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_title("Monthly Statement")
        .with_lines(&[
            "Monthly Statement",
            "Customer: Jane Doe",
            "Contact: 9876543210",
            "Email: jane.doe@example.com",
            "Balance carried forward",
        ])
        .new_page()
        .with_lines(&[
            "Payment history",
            "Alternate contact: 9123456780",
            "Thank you for your business",
        ])
        .build(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_pages() {
        let builder = TestPdfBuilder::new()
            .with_line("one")
            .new_page()
            .with_lines(&["two", "three"]);
        assert_eq!(builder.page_count(), 2);
        assert_eq!(builder.pages[1].len(), 2);
    }

    #[test]
    fn test_create_statement() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let pdf_path = temp_dir.path().join("statement.pdf");
        create_statement(&pdf_path)?;
        assert!(pdf_path.exists());
        Ok(())
    }
}
