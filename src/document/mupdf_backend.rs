//! MuPDF document backend.
//!
//! Redaction goes through MuPDF's redaction API: one `Redact` annotation is
//! created per region and the page is then redacted in a single call, which
//! physically removes the text and image content underneath and paints the
//! region. Redacted content cannot be recovered from the output file.

use super::{Bitmap, DocumentHandle, DocumentProvider, PageHandle};
use crate::error::{RedactorError, RedactorResult};
use crate::geometry::{Color, Rect, Word};
use std::path::{Path, PathBuf};

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage, PdfWriteOptions};
use mupdf::{Colorspace, Matrix, Page, Quad, Rect as MuRect, TextPage, TextPageFlags};

/// Opens PDF files with MuPDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfProvider;

impl MupdfProvider {
    pub fn new() -> Self {
        Self
    }
}

fn path_str<'a>(path: &'a Path, parameter: &str) -> RedactorResult<&'a str> {
    path.to_str().ok_or_else(|| RedactorError::InvalidInput {
        parameter: parameter.to_string(),
        reason: "Path contains invalid UTF-8".to_string(),
    })
}

impl DocumentProvider for MupdfProvider {
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn DocumentHandle>> {
        if !path.exists() {
            return Err(RedactorError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Input file does not exist",
                ),
            });
        }
        let doc = PdfDocument::open(path_str(path, "input")?).map_err(|e| {
            RedactorError::PdfProcessing {
                message: format!("Failed to open '{}' with MuPDF", path.display()),
                page: None,
                source: Some(Box::new(e)),
            }
        })?;
        Ok(Box::new(MupdfDocument {
            doc,
            path: path.to_path_buf(),
        }))
    }

    fn name(&self) -> &str {
        "MuPDF"
    }
}

struct MupdfDocument {
    doc: PdfDocument,
    path: PathBuf,
}

impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> RedactorResult<usize> {
        let count = self
            .doc
            .page_count()
            .map_err(|e| RedactorError::backend("Failed to get page count", e))?;
        Ok(count.max(0) as usize)
    }

    fn page(&mut self, index: usize) -> RedactorResult<Box<dyn PageHandle + '_>> {
        let page = self
            .doc
            .load_page(index as i32)
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to load page {} of '{}'", index + 1, self.path.display()),
                page: Some(index + 1),
                source: Some(Box::new(e)),
            })?;
        Ok(Box::new(MupdfPage { page, index }))
    }

    /// Writes next to `path` first and renames into place, so a failed save
    /// never leaves a truncated file at the output path.
    fn save(&mut self, path: &Path, compact: bool) -> RedactorResult<()> {
        let partial = partial_path(path);
        let output = path_str(&partial, "output")?;
        let saved = if compact {
            let mut options = PdfWriteOptions::default();
            options.set_garbage_level(4);
            options.set_compress(true);
            options.set_clean(true);
            self.doc.save_with_options(output, options)
        } else {
            self.doc.save(output)
        };
        if let Err(e) = saved {
            let _ = std::fs::remove_file(&partial);
            return Err(RedactorError::PdfProcessing {
                message: format!("Failed to save redacted PDF to '{}'", path.display()),
                page: None,
                source: Some(Box::new(e)),
            });
        }
        std::fs::rename(&partial, path).map_err(|source| {
            let _ = std::fs::remove_file(&partial);
            RedactorError::Io {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// Sibling of `path` used while the output is being written.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

struct MupdfPage {
    page: Page,
    index: usize,
}

impl MupdfPage {
    fn text_page(&self) -> RedactorResult<TextPage> {
        self.page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to extract structured text".to_string(),
                page: Some(self.index + 1),
                source: Some(Box::new(e)),
            })
    }

    fn processing_error(&self, message: &str, e: mupdf::Error) -> RedactorError {
        RedactorError::PdfProcessing {
            message: message.to_string(),
            page: Some(self.index + 1),
            source: Some(Box::new(e)),
        }
    }
}

fn quad_bounds(quad: &Quad) -> Rect {
    Rect::new(
        quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
        quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
        quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
        quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
    )
}

/// Accumulates characters of one line into words.
struct WordBuilder {
    block: usize,
    line: usize,
    pos: usize,
    text: String,
    bounds: Option<Rect>,
}

impl WordBuilder {
    fn new(block: usize, line: usize) -> Self {
        Self {
            block,
            line,
            pos: 0,
            text: String::new(),
            bounds: None,
        }
    }

    fn push(&mut self, ch: char, rect: Rect) {
        self.text.push(ch);
        self.bounds = Some(match self.bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
    }

    fn finish(&mut self, words: &mut Vec<Word>) {
        if let Some(b) = self.bounds.take() {
            words.push(Word {
                x0: b.x0,
                y0: b.y0,
                x1: b.x1,
                y1: b.y1,
                text: std::mem::take(&mut self.text),
                block: self.block,
                line: self.line,
                pos: self.pos,
            });
            self.pos += 1;
        }
    }
}

impl PageHandle for MupdfPage {
    fn extract_words(&self) -> RedactorResult<Vec<Word>> {
        let text_page = self.text_page()?;
        let mut words = Vec::new();
        for (block_no, block) in text_page.blocks().enumerate() {
            for (line_no, line) in block.lines().enumerate() {
                let mut builder = WordBuilder::new(block_no, line_no);
                for ch in line.chars() {
                    match ch.char() {
                        Some(c) if !c.is_whitespace() => builder.push(c, quad_bounds(&ch.quad())),
                        _ => builder.finish(&mut words),
                    }
                }
                builder.finish(&mut words);
            }
        }
        Ok(words)
    }

    fn extract_text(&self) -> RedactorResult<String> {
        let text_page = self.text_page()?;
        let mut text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                text.extend(line.chars().map(|ch| ch.char().unwrap_or('\u{FFFD}')));
                text.push('\n');
            }
            text.push('\n');
        }
        Ok(text)
    }

    fn render(&self, scale: f32) -> RedactorResult<Bitmap> {
        let pixmap = self
            .page
            .to_pixmap(
                &Matrix::new_scale(scale, scale),
                &Colorspace::device_rgb(),
                false,
                true,
            )
            .map_err(|e| self.processing_error("Failed to render page", e))?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let n = pixmap.n() as usize;
        let samples = pixmap.samples();
        let stride = if height == 0 {
            0
        } else {
            samples.len() / height as usize
        };
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height as usize {
            let row = &samples[y * stride..];
            for x in 0..width as usize {
                rgb.extend_from_slice(&row[x * n..x * n + 3]);
            }
        }
        Bitmap::from_rgb(width, height, rgb)
    }

    fn commit_redactions(&mut self, regions: &[Rect], fill: Color) -> RedactorResult<usize> {
        let mut pdf_page = PdfPage::try_from(self.page.clone())
            .map_err(|e| self.processing_error("Page is not a PDF page", e))?;

        for region in regions {
            let annot = pdf_page
                .create_annotation(PdfAnnotationType::Redact)
                .map_err(|e| self.processing_error("Failed to create redaction annotation", e))?;

            let rect = MuRect {
                x0: region.x0,
                y0: region.y0,
                x1: region.x1,
                y1: region.y1,
            };
            unsafe {
                ffi::set_annotation_rect(&annot, rect);
                ffi::set_annotation_interior_color(&annot, fill.to_unit());
            }
        }

        pdf_page
            .redact()
            .map_err(|e| self.processing_error("Failed to apply redactions", e))?;
        Ok(regions.len())
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    #[repr(C)]
    struct PdfAnnotRaw {
        inner: *mut mupdf_sys::pdf_annot,
    }

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// The annotation must be valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }

    /// Sets the interior (fill) color used when the redaction is applied.
    ///
    /// # Safety
    /// Same requirements as [`set_annotation_rect`].
    pub unsafe fn set_annotation_interior_color(annot: &PdfAnnotation, rgb: [f32; 3]) {
        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            mupdf_sys::pdf_set_annot_interior_color(ctx, annot_raw.inner, 3, rgb.as_ptr());
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name() {
        assert_eq!(MupdfProvider::new().name(), "MuPDF");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MupdfProvider::new()
            .open(Path::new("/nonexistent/input.pdf"))
            .err()
            .unwrap();
        assert!(matches!(err, RedactorError::Io { .. }));
    }

    #[test]
    fn test_partial_path_is_a_sibling() {
        let partial = partial_path(Path::new("/out/dir/redacted.pdf"));
        assert_eq!(partial, PathBuf::from("/out/dir/redacted.pdf.partial"));
    }

    #[test]
    fn test_word_builder_splits_and_numbers() {
        let mut words = Vec::new();
        let mut b = WordBuilder::new(2, 1);
        b.push('a', Rect::new(0.0, 0.0, 5.0, 10.0));
        b.push('b', Rect::new(5.0, 0.0, 10.0, 10.0));
        b.finish(&mut words);
        b.finish(&mut words);
        b.push('c', Rect::new(15.0, 0.0, 20.0, 10.0));
        b.finish(&mut words);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "ab");
        assert_eq!(words[0].rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!((words[1].block, words[1].line, words[1].pos), (2, 1, 1));
    }
}
