//! Build-time stop list.
//!
//! Stopping is applied when a batch is dumped rather than per inserted word:
//! most builds run without a stop list and dump time is the one point where
//! every distinct term is visited exactly once anyway.
//!
//! # Examples
//!
//! ```
//! use falchion::analysis::stop::{StopList, StopPredicate};
//!
//! let stop = StopList::new();
//! assert!(stop.is_stopped("the"));
//! assert!(!stop.is_stopped("falchion"));
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::Result;

/// Default English stop words.
const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Default English stop words as a HashSet.
pub static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<String>> = LazyLock::new(|| {
    DEFAULT_ENGLISH_STOP_WORDS
        .iter()
        .map(|&s| s.to_string())
        .collect()
});

/// Decides whether a term is dropped from a dump.
pub trait StopPredicate: Send + Sync {
    /// Returns true if `term` should not be written.
    fn is_stopped(&self, term: &str) -> bool;
}

impl<F> StopPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_stopped(&self, term: &str) -> bool {
        self(term)
    }
}

/// A set of stop words.
#[derive(Clone, Debug, Default)]
pub struct StopList {
    words: HashSet<String>,
}

impl StopList {
    /// Create a stop list holding the default English stop words.
    pub fn new() -> Self {
        StopList {
            words: DEFAULT_ENGLISH_STOP_WORDS_SET.clone(),
        }
    }

    /// Create an empty stop list.
    pub fn empty() -> Self {
        StopList::default()
    }

    /// Create a stop list from a list of words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = StopList::empty();
        for word in words {
            list.add(word.as_ref());
        }
        list
    }

    /// Add a single word, case-folded to lower case. Returns false if the
    /// word was already present.
    pub fn add(&mut self, word: &str) -> bool {
        self.words.insert(word.to_lowercase())
    }

    /// Add the contents of a stop word file: one word per line, blank lines
    /// and text after `#` ignored. Returns the number of new words.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let reader = BufReader::new(File::open(path)?);
        let mut added = 0;

        for line in reader.lines() {
            let line = line?;
            let word = line.split('#').next().unwrap_or("").trim();
            if !word.is_empty() && self.add(word) {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Number of stop words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl StopPredicate for StopList {
    fn is_stopped(&self, term: &str) -> bool {
        self.words.contains(term)
    }
}
