//! Match templates: regex generators parameterized by user text.
//!
//! Every template escapes its inputs, so selected page text such as
//! `"(555)"` is matched literally. Some templates match leading whitespace;
//! the resolver trims matched text before looking up geometry.

use crate::error::{RedactorError, RedactorResult};
use fancy_regex::escape;

/// A parameterized pattern shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTemplate {
    ExactWord,
    TextAfterWord,
    TextBeforeWord,
    LineAfterWord,
    WordStartsWith,
    WordEndsWith,
    WordContains,
    BetweenWords,
    LineContaining,
    Parenthesized,
    Quoted,
    NumbersAfterText,
    TextAfterColon,
    CustomRegex,
    SingleCharacter,
    CharacterSet,
    Digits,
    Letters,
    UppercaseLetters,
    LowercaseLetters,
}

impl MatchTemplate {
    pub const ALL: [MatchTemplate; 20] = [
        Self::ExactWord,
        Self::TextAfterWord,
        Self::TextBeforeWord,
        Self::LineAfterWord,
        Self::WordStartsWith,
        Self::WordEndsWith,
        Self::WordContains,
        Self::BetweenWords,
        Self::LineContaining,
        Self::Parenthesized,
        Self::Quoted,
        Self::NumbersAfterText,
        Self::TextAfterColon,
        Self::CustomRegex,
        Self::SingleCharacter,
        Self::CharacterSet,
        Self::Digits,
        Self::Letters,
        Self::UppercaseLetters,
        Self::LowercaseLetters,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ExactWord => "Exact word match",
            Self::TextAfterWord => "Text after word",
            Self::TextBeforeWord => "Text before word",
            Self::LineAfterWord => "Line after word",
            Self::WordStartsWith => "Word starts with",
            Self::WordEndsWith => "Word ends with",
            Self::WordContains => "Word contains",
            Self::BetweenWords => "Between two words",
            Self::LineContaining => "Entire line containing",
            Self::Parenthesized => "Text in parentheses",
            Self::Quoted => "Text in quotes",
            Self::NumbersAfterText => "Numbers after text",
            Self::TextAfterColon => "Text after colon",
            Self::CustomRegex => "Custom Regex",
            Self::SingleCharacter => "Single character",
            Self::CharacterSet => "Multiple characters",
            Self::Digits => "All digits",
            Self::Letters => "All letters",
            Self::UppercaseLetters => "Uppercase letters",
            Self::LowercaseLetters => "Lowercase letters",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Names of the inputs the template expects, in order.
    pub fn inputs(self) -> &'static [&'static str] {
        match self {
            Self::ExactWord | Self::TextAfterWord | Self::TextBeforeWord | Self::LineAfterWord => {
                &["Word"]
            }
            Self::WordStartsWith => &["Prefix"],
            Self::WordEndsWith => &["Suffix"],
            Self::WordContains | Self::LineContaining | Self::NumbersAfterText => &["Text"],
            Self::BetweenWords => &["Start Word", "End Word"],
            Self::TextAfterColon => &["Label"],
            Self::CustomRegex => &["Regex Pattern"],
            Self::SingleCharacter => &["Character"],
            Self::CharacterSet => &["Characters"],
            Self::Parenthesized
            | Self::Quoted
            | Self::Digits
            | Self::Letters
            | Self::UppercaseLetters
            | Self::LowercaseLetters => &[],
        }
    }

    /// Builds the regex source for the given inputs.
    pub fn regex(self, inputs: &[&str]) -> RedactorResult<String> {
        let expected = self.inputs().len();
        let inputs: Vec<&str> = inputs.iter().map(|s| s.trim()).collect();
        if inputs.len() != expected || inputs.iter().any(|s| s.is_empty()) {
            return Err(RedactorError::invalid_input(
                self.name(),
                format!("expected {} non-empty input(s)", expected),
            ));
        }
        let e = |i: usize| escape(inputs[i]);

        let regex = match self {
            Self::ExactWord => format!(r"\b{}\b", e(0)),
            Self::TextAfterWord => format!(r"(?<={}\s)\S+", e(0)),
            Self::TextBeforeWord => format!(r"\S+(?=\s+{})", e(0)),
            Self::LineAfterWord => format!(r"(?<={}).*", e(0)),
            Self::WordStartsWith => format!(r"\b{}\w*", e(0)),
            Self::WordEndsWith => format!(r"\b\w*{}\b", e(0)),
            Self::WordContains => format!(r"\b\w*{}\w*\b", e(0)),
            Self::BetweenWords => format!(r"(?<={}).*?(?={})", e(0), e(1)),
            Self::LineContaining => format!(r"^.*{}.*$", e(0)),
            Self::Parenthesized => r"\([^)]+\)".to_string(),
            Self::Quoted => r#""[^"]*""#.to_string(),
            Self::NumbersAfterText => format!(r"(?<={})\s*\d+", e(0)),
            Self::TextAfterColon => format!(r"(?<={}:)\s*[^\n\r]+", e(0)),
            Self::CustomRegex => inputs[0].to_string(),
            Self::SingleCharacter => {
                if inputs[0].chars().count() != 1 {
                    return Err(RedactorError::invalid_input(
                        self.name(),
                        "expected exactly one character",
                    ));
                }
                e(0).into_owned()
            }
            Self::CharacterSet => format!("[{}]", e(0)),
            Self::Digits => r"\d".to_string(),
            Self::Letters => r"[A-Za-z]".to_string(),
            Self::UppercaseLetters => r"[A-Z]".to_string(),
            Self::LowercaseLetters => r"[a-z]".to_string(),
        };
        Ok(regex)
    }

    /// Display label for a pattern built from this template.
    pub fn label(self, inputs: &[&str]) -> String {
        if inputs.is_empty() {
            self.name().to_string()
        } else {
            let joined: Vec<&str> = inputs.iter().map(|s| s.trim()).collect();
            format!("{}: {}", self.name(), joined.join(" + "))
        }
    }
}
