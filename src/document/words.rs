//! Per-page word index.

use super::PageHandle;
use crate::error::RedactorResult;
use crate::geometry::{Point, Rect, Word};

/// The words of one page together with the page's full text.
///
/// Word positions inside the text are recovered by aligning each word against
/// the text in reading order. A word that cannot be aligned simply has no
/// offset; nothing assumes that word indices and text offsets line up.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    words: Vec<Word>,
    text: String,
    offsets: Vec<Option<usize>>,
}

impl WordIndex {
    pub fn new(words: Vec<Word>, text: String) -> Self {
        let offsets = align(&words, &text);
        Self {
            words,
            text,
            offsets,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Character offset of word `index` within the page text.
    pub fn word_offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied().flatten()
    }

    /// Finds the word covering the character at `char_offset` in the page
    /// text, returning the word index and the character index inside it.
    pub fn locate(&self, char_offset: usize) -> Option<(usize, usize)> {
        self.words.iter().enumerate().find_map(|(i, w)| {
            let start = self.offsets[i]?;
            (char_offset >= start && char_offset < start + w.char_count())
                .then(|| (i, char_offset - start))
        })
    }

    /// The word under a point, if any.
    pub fn word_at(&self, point: Point) -> Option<&Word> {
        self.words.iter().find(|w| w.rect().contains_point(point))
    }

    /// Text covered by a selection area. Words cut by the area edge
    /// contribute only the characters estimated to lie inside it.
    pub fn text_in_area(&self, area: &Rect) -> String {
        let mut parts = Vec::new();
        for word in &self.words {
            let rect = word.rect();
            if area.contains_rect(&rect) {
                parts.push(word.text.clone());
                continue;
            }
            let Some(overlap) = area.intersection(&rect) else {
                continue;
            };
            let n = word.char_count();
            if n == 0 {
                continue;
            }
            let char_width = rect.width() / n as f32;
            if char_width <= 0.0 {
                continue;
            }
            let start = ((overlap.x0 - rect.x0) / char_width).floor().max(0.0) as usize;
            let end = (((overlap.x1 - rect.x0) / char_width).ceil() as usize).min(n);
            if start < end {
                parts.push(word.text.chars().skip(start).take(end - start).collect());
            }
        }
        parts.join(" ").trim().to_string()
    }
}

fn align(words: &[Word], text: &str) -> Vec<Option<usize>> {
    let mut offsets = Vec::with_capacity(words.len());
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for word in words {
        if word.text.is_empty() {
            offsets.push(None);
            continue;
        }
        match text[byte_cursor..].find(&word.text) {
            Some(rel) => {
                let skipped = text[byte_cursor..byte_cursor + rel].chars().count();
                let start = char_cursor + skipped;
                offsets.push(Some(start));
                byte_cursor += rel + word.text.len();
                char_cursor = start + word.char_count();
            }
            None => offsets.push(None),
        }
    }
    offsets
}

/// Text and words of one page, loaded once and reused at any zoom.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Zero-based page index.
    pub index: usize,
    pub words: WordIndex,
}

impl PageContext {
    pub fn load(page: &dyn PageHandle, index: usize) -> RedactorResult<Self> {
        let words = page.extract_words()?;
        let text = page.extract_text()?;
        Ok(Self {
            index,
            words: WordIndex::new(words, text),
        })
    }

    pub fn text(&self) -> &str {
        self.words.text()
    }
}
