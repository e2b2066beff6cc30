//! Banned-word matching.

use std::collections::HashSet;

/// Immutable set of lowercase banned tokens, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct BannedWordSet {
    words: HashSet<String>,
}

impl BannedWordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Pure text check against a [`BannedWordSet`].
#[derive(Clone, Debug)]
pub struct MessageFilter {
    banned: BannedWordSet,
}

impl MessageFilter {
    pub fn new(banned: BannedWordSet) -> Self {
        Self { banned }
    }

    /// True iff at least one whitespace-separated token of the lower-cased
    /// text is a banned word. Whole tokens only: no substring matching.
    pub fn matches(&self, text: &str) -> bool {
        if self.banned.is_empty() {
            return false;
        }
        text.to_lowercase()
            .split_whitespace()
            .any(|token| self.banned.contains(token))
    }
}
