//! Pattern-based entity detector.
//!
//! Always available. Scores are fixed per label, reflecting how specific each
//! pattern is; card numbers that fail the Luhn check score low.

use super::{DetectorError, Entity, EntityDetector, ModelKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Labels this detector can emit.
pub const LABELS: &[&str] = &[
    "EMAIL",
    "URL",
    "IP_ADDRESS",
    "US_SSN",
    "CREDIT_CARD",
    "PHONE_NUMBER",
    "DATE_TIME",
];

struct Rule {
    label: &'static str,
    score: f32,
    regex: Regex,
}

fn rule(label: &'static str, score: f32, pattern: &str) -> Rule {
    Rule {
        label,
        score,
        regex: Regex::new(pattern).expect("Valid entity regex"),
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(
            "EMAIL",
            0.95,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        ),
        rule("URL", 0.9, r"\bhttps?://[^\s]+|\bwww\.[A-Za-z0-9.-]+\.[A-Za-z]{2,}[^\s]*"),
        rule(
            "IP_ADDRESS",
            0.9,
            r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
        ),
        rule("US_SSN", 0.85, r"\b\d{3}-\d{2}-\d{4}\b"),
        rule("CREDIT_CARD", 0.95, r"\b(?:\d[ -]?){12,18}\d\b"),
        rule(
            "PHONE_NUMBER",
            0.75,
            r"(?:\+\d{1,3}[\s.-]?)?\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b",
        ),
        rule(
            "DATE_TIME",
            0.6,
            r"\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4})\b",
        ),
    ]
});

/// Score of a card-shaped digit run that fails the Luhn check.
const WEAK_CARD_SCORE: f32 = 0.3;

fn overlaps(claimed: &[(usize, usize, &'static str, f32)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e, ..)| start < e && s < end)
}

fn luhn_valid(digits: &str) -> bool {
    let digits: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Regex-driven detector for common structured identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexEntityDetector;

impl RegexEntityDetector {
    pub fn new() -> Self {
        Self
    }
}

impl EntityDetector for RegexEntityDetector {
    fn model(&self) -> ModelKind {
        ModelKind::Builtin
    }

    fn detect(&self, text: &str, labels: &BTreeSet<String>) -> Result<Vec<Entity>, DetectorError> {
        let mut found: Vec<(usize, usize, &'static str, f32)> = Vec::new();
        // Digit runs that fail the Luhn check never claim a span.
        let mut weak: Vec<(usize, usize, &'static str, f32)> = Vec::new();

        for rule in RULES.iter() {
            if !labels.is_empty() && !labels.contains(rule.label) {
                continue;
            }
            for m in rule.regex.find_iter(text) {
                // A byte span already claimed by a more specific rule wins.
                if overlaps(&found, m.start(), m.end()) {
                    continue;
                }
                if rule.label == "CREDIT_CARD" && !luhn_valid(m.as_str()) {
                    weak.push((m.start(), m.end(), rule.label, WEAK_CARD_SCORE));
                    continue;
                }
                found.push((m.start(), m.end(), rule.label, rule.score));
            }
        }
        for candidate in weak {
            if !overlaps(&found, candidate.0, candidate.1) {
                found.push(candidate);
            }
        }
        found.sort_by_key(|&(start, ..)| start);

        // Convert byte offsets into character offsets.
        let mut entities = Vec::with_capacity(found.len());
        let mut byte_cursor = 0;
        let mut char_cursor = 0;
        for (start, end, label, score) in found {
            char_cursor += text[byte_cursor..start].chars().count();
            byte_cursor = start;
            let span = &text[start..end];
            let char_len = span.chars().count();
            entities.push(Entity {
                label: label.to_string(),
                start: char_cursor,
                end: char_cursor + char_len,
                text: span.to_string(),
                score,
            });
        }
        Ok(entities)
    }
}
