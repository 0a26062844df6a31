//! Document provider abstraction.
//!
//! The redaction core only talks to documents through these traits, so the
//! PDF backend can be swapped (MuPDF in production, an in-memory document in
//! tests). A handle returned by [`DocumentProvider::open`] is owned by one
//! pass and released when dropped, on every exit path.

pub mod bitmap;
#[cfg(test)]
pub mod memory;
pub mod mupdf_backend;
pub mod words;

pub use bitmap::Bitmap;
#[cfg(test)]
pub use memory::{MemoryDocument, MemoryPage, MemoryProvider};
pub use mupdf_backend::MupdfProvider;
pub use words::{PageContext, WordIndex};

use crate::error::RedactorResult;
use crate::geometry::{Color, Rect, Word};
use std::path::Path;

/// Opens documents.
pub trait DocumentProvider: Send + Sync {
    /// Opens the document at `path` for exclusive use by the caller.
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn DocumentHandle>>;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &str;
}

/// An open document.
pub trait DocumentHandle {
    fn page_count(&self) -> RedactorResult<usize>;

    /// Loads the page at zero-based `index`.
    fn page(&mut self, index: usize) -> RedactorResult<Box<dyn PageHandle + '_>>;

    /// Writes the document to `path`. With `compact`, unused objects are
    /// collected and streams compressed.
    fn save(&mut self, path: &Path, compact: bool) -> RedactorResult<()>;
}

/// One loaded page.
pub trait PageHandle {
    /// Word tokens in reading order.
    fn extract_words(&self) -> RedactorResult<Vec<Word>>;

    /// Full page text, built from the same token stream as the words.
    fn extract_text(&self) -> RedactorResult<String>;

    /// Rasterizes the page at `scale` pixels per point.
    fn render(&self, scale: f32) -> RedactorResult<Bitmap>;

    /// Destroys all content under `regions` and paints them with `fill`.
    ///
    /// Either every region is applied or an error is returned; callers retry
    /// the whole page on failure.
    fn commit_redactions(&mut self, regions: &[Rect], fill: Color) -> RedactorResult<usize>;
}
