//! Word tokenizer for caption text.
//!
//! Strips punctuation, splits on whitespace runs and title-cases every
//! word (`hello` → `Hello`, `WORLD` → `World`).  The resulting [`Token`]
//! is the lookup key for a sign clip, so the mapping has to be pure: the
//! same word always yields the same key, independent of input casing or
//! the host locale.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::PunctuationMode;

/// Characters removed in [`PunctuationMode::Legacy`].
const LEGACY_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`',
    '~', '(', ')',
];

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// A canonical, non-empty word key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Canonicalize a single word.  Returns `None` for empty input or
    /// input containing whitespace.
    ///
    /// The word is not stripped of punctuation; use [`Tokenizer`] for that.
    pub fn canonical(word: &str) -> Option<Self> {
        if word.chars().any(char::is_whitespace) {
            return None;
        }
        let mut chars = word.chars();
        let first = chars.next()?;

        // Multi-char uppercase expansions (`ß` → `SS`) keep only the
        // leading char upper-cased so re-tokenizing is a no-op.
        let mut upper = first.to_uppercase();
        let mut out = String::with_capacity(word.len());
        if let Some(head) = upper.next() {
            out.push(head);
        }
        let tail: String = upper.chain(chars).collect();
        out.push_str(&tail.to_lowercase());
        Some(Self(out))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Configurable word tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    pub mode: PunctuationMode,
}

impl Tokenizer {
    pub fn new(mode: PunctuationMode) -> Self {
        Self { mode }
    }

    /// Split `text` into ordered lookup keys.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let stripped = self.strip_punctuation(text);
        stripped.split_whitespace().filter_map(Token::canonical).collect()
    }

    fn strip_punctuation(&self, text: &str) -> String {
        match self.mode {
            PunctuationMode::Legacy => text
                .chars()
                .filter(|c| !LEGACY_PUNCTUATION.contains(c))
                .collect(),
            PunctuationMode::NonWord => NON_WORD.replace_all(text, "").into_owned(),
        }
    }
}

/// Convenience wrapper: tokenize with the legacy punctuation set.
pub fn tokenize(text: &str) -> Vec<Token> {
    Tokenizer::default().tokenize(text)
}
