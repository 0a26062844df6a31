//! Page-space geometry: rectangles, extracted words and colors.
//!
//! All coordinates are PDF points in the page's own coordinate space, with
//! `y` growing downwards as reported by the text extraction backend. Nothing
//! here depends on a rendering scale; zoom only matters when painting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
///
/// Constructed through [`Rect::new`], the corners are always ordered so that
/// `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Creates a rectangle from two corners, normalizing their order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Returns true when either side is shorter than `min_extent`.
    pub fn is_degenerate(&self, min_extent: f32) -> bool {
        !(self.width() >= min_extent && self.height() >= min_extent)
    }

    /// Grows the rectangle by `padding` on all four sides.
    pub fn expand(&self, padding: f32) -> Self {
        Self {
            x0: self.x0 - padding,
            y0: self.y0 - padding,
            x1: self.x1 + padding,
            y1: self.y1 + padding,
        }
    }

    /// Overlap test that also treats shared edges as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// The overlapping area, if it has positive width and height.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (r.x0 < r.x1 && r.y0 < r.y1).then_some(r)
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// Maps the rectangle into a raster at `scale` pixels per point.
    pub fn scale(&self, scale: f32) -> Rect {
        Rect {
            x0: self.x0 * scale,
            y0: self.y0 * scale,
            x1: self.x1 * scale,
            y1: self.y1 * scale,
        }
    }
}

/// One word token extracted from a page.
///
/// Words come out in reading order, which is not necessarily geometric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub text: String,
    pub block: usize,
    pub line: usize,
    pub pos: usize,
}

impl Word {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Horizontal slice of the word covering `len` characters starting at
    /// character `start`, assuming every glyph in the word has the same
    /// advance. Spans the full height of the word.
    pub fn char_span_rect(&self, start: usize, len: usize) -> Rect {
        let width = self.x1 - self.x0;
        let char_width = match self.char_count() {
            0 => width,
            n => width / n as f32,
        };
        let start_x = self.x0 + start as f32 * char_width;
        Rect::new(start_x, self.y0, start_x + len as f32 * char_width, self.y1)
    }

    /// True when both words sit on the same extracted text line.
    pub fn same_line(&self, other: &Word) -> bool {
        self.block == other.block && self.line == other.line
    }
}

/// A resolved piece of geometry together with the text it covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub rect: Rect,
    pub text: String,
}

/// An opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to `0.0..=1.0`, the form PDF color operators take.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #rrggbb, got '{}'", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("'{}': {}", s, e))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
