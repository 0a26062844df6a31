//! In-memory documents.
//!
//! Pages are laid out as fixed-pitch text, which makes word geometry exact
//! and predictable. Committing a redaction deletes every character whose
//! center falls under a region, so removed text is gone from both the words
//! and the page text afterwards.

use super::{Bitmap, DocumentHandle, DocumentProvider, PageHandle};
use crate::error::{RedactorError, RedactorResult};
use crate::geometry::{Color, Point, Rect, Word};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPage {
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
    /// Regions applied so far, with their fill.
    pub redactions: Vec<(Rect, Color)>,
    failing_commits: usize,
}

impl MemoryPage {
    pub const CHAR_WIDTH: f32 = 6.0;
    pub const FONT_SIZE: f32 = 10.0;
    pub const LINE_HEIGHT: f32 = 14.0;
    pub const MARGIN: f32 = 72.0;

    /// Lays out each string as one text line.
    pub fn from_lines(lines: &[&str]) -> Self {
        let mut words = Vec::new();
        for (line_no, line) in lines.iter().enumerate() {
            let y0 = Self::MARGIN + line_no as f32 * Self::LINE_HEIGHT;
            let mut x = Self::MARGIN;
            for (pos, token) in line.split_whitespace().enumerate() {
                let x1 = x + token.chars().count() as f32 * Self::CHAR_WIDTH;
                words.push(Word {
                    x0: x,
                    y0,
                    x1,
                    y1: y0 + Self::FONT_SIZE,
                    text: token.to_string(),
                    block: 0,
                    line: line_no,
                    pos,
                });
                x = x1 + Self::CHAR_WIDTH;
            }
        }
        Self {
            width: 612.0,
            height: 792.0,
            words,
            redactions: Vec::new(),
            failing_commits: 0,
        }
    }

    /// Makes the next `n` commits fail without touching the page.
    pub fn with_failing_commits(mut self, n: usize) -> Self {
        self.failing_commits = n;
        self
    }

    /// Page text: words of a line joined by single spaces, one line per row.
    pub fn text(&self) -> String {
        let mut text = String::new();
        let mut current: Option<(usize, usize)> = None;
        for word in &self.words {
            let key = (word.block, word.line);
            match current {
                Some(k) if k == key => text.push(' '),
                Some(_) => text.push('\n'),
                None => {}
            }
            current = Some(key);
            text.push_str(&word.text);
        }
        if current.is_some() {
            text.push('\n');
        }
        text
    }

    fn erase(&mut self, regions: &[Rect]) {
        let mut kept = Vec::with_capacity(self.words.len());
        for word in self.words.drain(..) {
            let n = word.char_count();
            let mut segment: Option<(usize, String)> = None;
            let mut pieces = Vec::new();
            for (i, ch) in word.text.chars().enumerate() {
                let r = word.char_span_rect(i, 1);
                let center = Point::new((r.x0 + r.x1) / 2.0, (r.y0 + r.y1) / 2.0);
                if regions.iter().any(|region| region.contains_point(center)) {
                    pieces.extend(segment.take());
                } else {
                    segment.get_or_insert_with(|| (i, String::new())).1.push(ch);
                }
            }
            pieces.extend(segment);

            if pieces.len() == 1 && pieces[0].1.chars().count() == n {
                kept.push(word);
                continue;
            }
            for (start, text) in pieces {
                let r = word.char_span_rect(start, text.chars().count());
                kept.push(Word {
                    x0: r.x0,
                    x1: r.x1,
                    text,
                    ..word.clone()
                });
            }
        }
        self.words = kept;
    }
}

impl PageHandle for &mut MemoryPage {
    fn extract_words(&self) -> RedactorResult<Vec<Word>> {
        Ok(self.words.clone())
    }

    fn extract_text(&self) -> RedactorResult<String> {
        Ok(self.text())
    }

    fn render(&self, scale: f32) -> RedactorResult<Bitmap> {
        if !(scale > 0.0) {
            return Err(RedactorError::invalid_input("scale", "must be positive"));
        }
        let mut bitmap = Bitmap::new(
            (self.width * scale).ceil() as u32,
            (self.height * scale).ceil() as u32,
            Color::WHITE,
        );
        for word in &self.words {
            bitmap.fill_rect(&word.rect().scale(scale), Color::rgb(0x40, 0x40, 0x40), 1.0);
        }
        for (rect, fill) in &self.redactions {
            bitmap.fill_rect(&rect.scale(scale), *fill, 1.0);
        }
        Ok(bitmap)
    }

    fn commit_redactions(&mut self, regions: &[Rect], fill: Color) -> RedactorResult<usize> {
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(RedactorError::BackendError {
                backend: "memory".to_string(),
                message: "simulated commit failure".to_string(),
                source: None,
            });
        }
        if let Some(bad) = regions
            .iter()
            .find(|r| ![r.x0, r.y0, r.x1, r.y1].iter().all(|v| v.is_finite()))
        {
            return Err(RedactorError::invalid_input(
                "region",
                format!("non-finite region {:?}", bad),
            ));
        }
        self.erase(regions);
        self.redactions
            .extend(regions.iter().map(|r| (*r, fill)));
        Ok(regions.len())
    }
}

/// A document made of [`MemoryPage`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self { pages }
    }

    /// Single-page document from text lines.
    pub fn from_lines(lines: &[&str]) -> Self {
        Self::new(vec![MemoryPage::from_lines(lines)])
    }

    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(MemoryPage::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A provider serving documents from a shared in-memory file table.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: Arc<Mutex<HashMap<PathBuf, MemoryDocument>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, document: MemoryDocument) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), document);
        }
    }

    pub fn get(&self, path: &Path) -> Option<MemoryDocument> {
        self.files.lock().ok()?.get(path).cloned()
    }
}

impl DocumentProvider for MemoryProvider {
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn DocumentHandle>> {
        let document = self.get(path).ok_or_else(|| RedactorError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "Input file does not exist"),
        })?;
        Ok(Box::new(MemoryHandle {
            document,
            files: Arc::clone(&self.files),
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemoryHandle {
    document: MemoryDocument,
    files: Arc<Mutex<HashMap<PathBuf, MemoryDocument>>>,
}

impl DocumentHandle for MemoryHandle {
    fn page_count(&self) -> RedactorResult<usize> {
        Ok(self.document.pages.len())
    }

    fn page(&mut self, index: usize) -> RedactorResult<Box<dyn PageHandle + '_>> {
        let count = self.document.pages.len();
        let page = self
            .document
            .pages
            .get_mut(index)
            .ok_or_else(|| RedactorError::PdfProcessing {
                message: format!("page index {} out of range (document has {})", index, count),
                page: Some(index + 1),
                source: None,
            })?;
        Ok(Box::new(page))
    }

    fn save(&mut self, path: &Path, _compact: bool) -> RedactorResult<()> {
        let mut files = self.files.lock().map_err(|_| RedactorError::BackendError {
            backend: "memory".to_string(),
            message: "file table lock poisoned".to_string(),
            source: None,
        })?;
        files.insert(path.to_path_buf(), self.document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_and_text() {
        let page = MemoryPage::from_lines(&["Contact: 9876543210", "Jane  Doe"]);
        assert_eq!(page.words.len(), 4);
        assert_eq!(page.text(), "Contact: 9876543210\nJane Doe\n");
        let digits = &page.words[1];
        assert_eq!(digits.x0, 72.0 + 9.0 * 6.0);
        assert_eq!(digits.x1 - digits.x0, 60.0);
        assert_eq!(page.words[2].line, 1);
    }

    #[test]
    fn test_commit_erases_partial_word() {
        let mut page = MemoryPage::from_lines(&["user@example.com"]);
        let word = page.words[0].clone();
        let region = word.char_span_rect(5, 7);
        let mut handle = &mut page;
        assert_eq!(handle.commit_redactions(&[region], Color::BLACK).unwrap(), 1);
        let texts: Vec<_> = page.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["user@", ".com"]);
        assert_eq!(page.redactions.len(), 1);
    }

    #[test]
    fn test_failing_commit_leaves_page_untouched() {
        let mut page = MemoryPage::from_lines(&["secret"]).with_failing_commits(1);
        let region = page.words[0].rect();
        let mut handle = &mut page;
        assert!(handle.commit_redactions(&[region], Color::BLACK).is_err());
        assert_eq!(page.words.len(), 1);
        let mut handle = &mut page;
        assert!(handle.commit_redactions(&[region], Color::BLACK).is_ok());
        assert!(page.words.is_empty());
    }

    #[test]
    fn test_provider_roundtrip_through_save() {
        let provider = MemoryProvider::new();
        provider.insert("in.pdf", MemoryDocument::from_lines(&["hello"]));
        let mut doc = provider.open(Path::new("in.pdf")).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);
        doc.save(Path::new("out.pdf"), true).unwrap();
        assert!(provider.get(Path::new("out.pdf")).is_some());
        assert!(provider.open(Path::new("missing.pdf")).is_err());
    }
}
