//! Match-to-geometry resolution.
//!
//! A regex hit or a detected entity is only a piece of text with an offset.
//! [`MatchResolver`] turns it into page rectangles using the word index, trying
//! in order: exact word equality, substring within a word, a run of
//! consecutive words, and finally the character span at the match offset.
//! Single-character matches go straight to character-level resolution.
//!
//! Positions inside a word are interpolated assuming every glyph of that word
//! has the same advance. The padding applied by the merger absorbs the error
//! for proportional fonts.

use super::config::SingleCharScope;
use crate::detect::Entity;
use crate::document::WordIndex;
use crate::geometry::{Match, Rect, Word};
use fancy_regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// How a match was turned into geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    ExactWord,
    Substring,
    MultiWord,
    SingleChar,
    Span,
}

impl Method {
    /// Methods whose result does not depend on where the match occurred.
    fn is_position_independent(self, scope: SingleCharScope) -> bool {
        match self {
            Method::Span => false,
            Method::SingleChar => scope == SingleCharScope::Page,
            _ => true,
        }
    }
}

/// Geometry for every hit of one pattern (or one batch of entities) on a page.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub matches: Vec<Match>,
    /// Hits for which no rectangle could be found.
    pub unresolved: usize,
}

impl Resolution {
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.matches.iter().map(|m| m.rect)
    }
}

/// Resolves text matches against one page's words.
#[derive(Debug, Clone, Copy)]
pub struct MatchResolver<'a> {
    index: &'a WordIndex,
    scope: SingleCharScope,
}

impl<'a> MatchResolver<'a> {
    pub fn new(index: &'a WordIndex) -> Self {
        Self {
            index,
            scope: SingleCharScope::default(),
        }
    }

    pub fn with_single_char_scope(mut self, scope: SingleCharScope) -> Self {
        self.scope = scope;
        self
    }

    /// Runs `regex` over the page text and resolves every hit.
    ///
    /// Surrounding whitespace is trimmed from each hit. Hits with the same
    /// words (ignoring case and spacing) usually resolve to the same geometry,
    /// so a repeat is only resolved again, at its own offset, when the
    /// rectangles found so far do not cover it.
    pub fn find_matches(&self, regex: &Regex) -> Resolution {
        let text = self.index.text();
        let mut hits = Vec::new();
        let mut byte_cursor = 0;
        let mut char_cursor = 0;

        for found in regex.find_iter(text) {
            let m = match found {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "regex matching aborted on this page");
                    break;
                }
            };
            let raw = m.as_str();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let start = m.start() + (raw.len() - raw.trim_start().len());
            char_cursor += text[byte_cursor..start].chars().count();
            byte_cursor = start;
            hits.push((trimmed, char_cursor));
        }
        self.resolve_all(hits)
    }

    /// Resolves detected entities. Each entity's span is read back from the
    /// page text; its own `text` is used if the span does not fit.
    pub fn resolve_entities(&self, entities: &[Entity]) -> Resolution {
        let chars: Vec<char> = self.index.text().chars().collect();
        let spans: Vec<(String, usize)> = entities
            .iter()
            .map(|e| {
                if e.start < e.end && e.end <= chars.len() {
                    let span: String = chars[e.start..e.end].iter().collect();
                    let lead = span.chars().take_while(|c| c.is_whitespace()).count();
                    (span.trim().to_string(), e.start + lead)
                } else {
                    (e.text.trim().to_string(), e.start)
                }
            })
            .filter(|(text, _)| !text.is_empty())
            .collect();
        self.resolve_all(spans.iter().map(|(t, o)| (t.as_str(), *o)))
    }

    /// Resolves one detected entity.
    pub fn resolve_entity(&self, entity: &Entity) -> Vec<Match> {
        self.resolve_entities(std::slice::from_ref(entity)).matches
    }

    fn resolve_all<'t>(&self, hits: impl IntoIterator<Item = (&'t str, usize)>) -> Resolution {
        let mut resolution = Resolution::default();
        // Normalized text -> rectangles already produced for it.
        let mut done: HashMap<String, Vec<Rect>> = HashMap::new();

        for (target, offset) in hits {
            let key = target
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if let Some(rects) = done.get_mut(&key) {
                let span = self.resolve_span(offset, offset + target.chars().count());
                let uncovered: Vec<Match> = span
                    .into_iter()
                    .filter(|m| !is_covered(&m.rect, rects))
                    .collect();
                if !uncovered.is_empty() {
                    debug!(matched = target, offset, "repeat not covered, resolving at offset");
                    rects.extend(uncovered.iter().map(|m| m.rect));
                    resolution.matches.extend(uncovered);
                }
                continue;
            }
            match self.resolve(target, Some(offset)) {
                Some((method, matches)) => {
                    debug!(
                        matched = target,
                        offset,
                        ?method,
                        rects = matches.len(),
                        "resolved match"
                    );
                    if method.is_position_independent(self.scope) {
                        done.insert(key, matches.iter().map(|m| m.rect).collect());
                    }
                    resolution.matches.extend(matches);
                }
                None => {
                    debug!(matched = target, offset, "dropping match with no geometry");
                    resolution.unresolved += 1;
                }
            }
        }
        resolution
    }

    /// Resolves a literal matched string. `offset` is the character offset of
    /// the match in the page text, when known.
    pub fn resolve_text(&self, target: &str, offset: Option<usize>) -> Vec<Match> {
        self.resolve(target.trim(), offset)
            .map(|(_, matches)| matches)
            .unwrap_or_default()
    }

    fn resolve(&self, target: &str, offset: Option<usize>) -> Option<(Method, Vec<Match>)> {
        if target.is_empty() {
            return None;
        }
        let len = target.chars().count();

        if len == 1 {
            let found = match (self.scope, offset) {
                (SingleCharScope::MatchOffset, Some(offset)) => self.resolve_span(offset, offset + 1),
                _ => self.single_char(target),
            };
            return non_empty(Method::SingleChar, found);
        }

        let lower = target.to_lowercase();
        non_empty(Method::ExactWord, self.exact_words(&lower, target))
            .or_else(|| non_empty(Method::Substring, self.substrings(&lower, target)))
            .or_else(|| non_empty(Method::MultiWord, self.word_runs(&lower, target)))
            .or_else(|| {
                let offset = offset?;
                non_empty(Method::Span, self.resolve_span(offset, offset + len))
            })
    }

    fn exact_words(&self, lower: &str, target: &str) -> Vec<Match> {
        self.index
            .words()
            .iter()
            .filter(|w| w.text.to_lowercase() == lower)
            .map(|w| Match {
                rect: w.rect(),
                text: target.to_string(),
            })
            .collect()
    }

    /// Every occurrence of the target inside every word.
    fn substrings(&self, lower: &str, target: &str) -> Vec<Match> {
        let len = target.chars().count();
        let mut found = Vec::new();
        for word in self.index.words() {
            let word_lower = word.text.to_lowercase();
            for (pos, _) in word_lower.match_indices(lower) {
                let start = word_lower[..pos].chars().count();
                found.push(Match {
                    rect: word.char_span_rect(start, len),
                    text: target.to_string(),
                });
            }
        }
        found
    }

    /// Every window of consecutive words whose lowercased texts, joined by
    /// single spaces, equal the target. A window that wraps onto another
    /// line yields one rectangle per line.
    fn word_runs(&self, lower: &str, target: &str) -> Vec<Match> {
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        if tokens.len() < 2 {
            return Vec::new();
        }
        let wanted = tokens.join(" ");
        let mut found = Vec::new();
        for window in self.index.words().windows(tokens.len()) {
            let candidate = window
                .iter()
                .map(|w| w.text.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            if candidate == wanted {
                found.extend(line_rects(window).into_iter().map(|rect| Match {
                    rect,
                    text: target.to_string(),
                }));
            }
        }
        found
    }

    fn single_char(&self, target: &str) -> Vec<Match> {
        let wanted: String = target.to_lowercase();
        let mut found = Vec::new();
        for word in self.index.words() {
            for (i, c) in word.text.chars().enumerate() {
                if c.to_lowercase().eq(wanted.chars()) {
                    found.push(Match {
                        rect: word.char_span_rect(i, 1),
                        text: c.to_string(),
                    });
                }
            }
        }
        found
    }

    /// Rectangles covering the page-text characters in `start..end`.
    ///
    /// Characters that belong to no word (whitespace, unaligned text) are
    /// skipped. Pieces on the same line are joined into one rectangle.
    pub fn resolve_span(&self, start: usize, end: usize) -> Vec<Match> {
        // (word index, first char, end char)
        let mut pieces: Vec<(usize, usize, usize)> = Vec::new();
        for offset in start..end {
            let Some((wi, ci)) = self.index.locate(offset) else {
                continue;
            };
            match pieces.last_mut() {
                Some(p) if p.0 == wi && p.2 == ci => p.2 += 1,
                _ => pieces.push((wi, ci, ci + 1)),
            }
        }

        let words = self.index.words();
        let mut found: Vec<(Match, &Word)> = Vec::new();
        for (wi, first, last) in pieces {
            let word = &words[wi];
            let rect = word.char_span_rect(first, last - first);
            let text: String = word.text.chars().skip(first).take(last - first).collect();
            match found.last_mut() {
                Some((m, prev)) if prev.same_line(word) => {
                    m.rect = m.rect.union(&rect);
                    m.text.push(' ');
                    m.text.push_str(&text);
                    *prev = word;
                }
                _ => found.push((Match { rect, text }, word)),
            }
        }
        found.into_iter().map(|(m, _)| m).collect()
    }
}

/// Slack for float error between a span rectangle and a word rectangle.
const COVER_TOLERANCE: f32 = 0.01;

fn is_covered(rect: &Rect, rects: &[Rect]) -> bool {
    rects
        .iter()
        .any(|r| r.expand(COVER_TOLERANCE).contains_rect(rect))
}

fn non_empty(method: Method, matches: Vec<Match>) -> Option<(Method, Vec<Match>)> {
    (!matches.is_empty()).then_some((method, matches))
}

/// Bounding rectangle of each same-line run of words.
fn line_rects(words: &[Word]) -> Vec<Rect> {
    let mut rects: Vec<Rect> = Vec::new();
    let mut prev: Option<&Word> = None;
    for word in words {
        let joined = prev.is_some_and(|p| p.same_line(word));
        match rects.last_mut() {
            Some(r) if joined => *r = r.union(&word.rect()),
            _ => rects.push(word.rect()),
        }
        prev = Some(word);
    }
    rects
}
