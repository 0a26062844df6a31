//! RGB page rasters used for previews.

use crate::error::{RedactorError, RedactorResult};
use crate::geometry::{Color, Rect};
use std::path::Path;

/// A packed 8-bit RGB raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Creates a bitmap filled with a single color.
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[background.r, background.g, background.b]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wraps raw RGB samples, `width * height * 3` bytes long.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> RedactorResult<Self> {
        if pixels.len() != width as usize * height as usize * 3 {
            return Err(RedactorError::invalid_input(
                "pixels",
                format!(
                    "expected {} bytes for {}x{} RGB, got {}",
                    width as usize * height as usize * 3,
                    width,
                    height,
                    pixels.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Blends `color` over the pixels inside `rect` (raster coordinates).
    /// An `alpha` of 1.0 paints an opaque box.
    pub fn fill_rect(&mut self, rect: &Rect, color: Color, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let x0 = rect.x0.floor().max(0.0) as u32;
        let y0 = rect.y0.floor().max(0.0) as u32;
        let x1 = (rect.x1.ceil().max(0.0) as u32).min(self.width);
        let y1 = (rect.y1.ceil().max(0.0) as u32).min(self.height);
        let src = [color.r, color.g, color.b];

        for y in y0..y1 {
            for x in x0..x1 {
                let i = (y as usize * self.width as usize + x as usize) * 3;
                for c in 0..3 {
                    let dst = self.pixels[i + c] as f32;
                    self.pixels[i + c] = (dst + (src[c] as f32 - dst) * alpha).round() as u8;
                }
            }
        }
    }

    /// Writes the raster as a PNG file.
    pub fn save_png(&self, path: &Path) -> RedactorResult<()> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| RedactorError::invalid_input("bitmap", "pixel buffer size mismatch"))?;
        image.save(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })
    }
}
