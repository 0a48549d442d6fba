//! Stemmers applied to terms as they are inserted.

/// Trait for stemming algorithms.
///
/// Stemming happens in place on the caller's scratch buffer so that the hot
/// insertion path does not allocate a fresh string per word. A stemmer is
/// allowed to reduce a term to the empty string; such terms are dropped.
pub trait Stemmer: Send + Sync {
    /// Stem `term` in place.
    fn stem(&self, term: &mut String);

    /// Get the name of this stemmer.
    fn name(&self) -> &'static str;
}

/// Identity stemmer that leaves terms unchanged.
#[derive(Debug, Clone, Default)]
pub struct IdentityStemmer;

impl IdentityStemmer {
    pub fn new() -> Self {
        IdentityStemmer
    }
}

impl Stemmer for IdentityStemmer {
    fn stem(&self, _term: &mut String) {}

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Stemmer that strips the longest matching suffix from a fixed list.
#[derive(Debug, Clone)]
pub struct SuffixStemmer {
    /// Suffixes, longest first.
    suffixes: Vec<String>,
    /// Minimum number of bytes that must remain after stripping.
    min_stem_len: usize,
}

impl SuffixStemmer {
    /// Create a stemmer with the default English suffix list.
    pub fn new() -> Self {
        Self::with_suffixes(
            [
                "ing", "ed", "er", "est", "ly", "s", "es", "ies", "ied", "tion", "sion", "able",
                "ible", "ment", "ness", "ful",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }

    /// Create a stemmer with custom suffixes.
    pub fn with_suffixes(mut suffixes: Vec<String>) -> Self {
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
        SuffixStemmer {
            suffixes,
            min_stem_len: 3,
        }
    }

    /// Set the minimum stem length. A value of 0 lets a term that consists
    /// only of a suffix stem to nothing.
    pub fn min_stem_len(mut self, len: usize) -> Self {
        self.min_stem_len = len;
        self
    }
}

impl Default for SuffixStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for SuffixStemmer {
    fn stem(&self, term: &mut String) {
        if term.len() <= self.min_stem_len {
            return;
        }

        for suffix in &self.suffixes {
            if term.len() >= suffix.len() + self.min_stem_len && term.ends_with(suffix.as_str()) {
                let cut = term.len() - suffix.len();
                term.truncate(cut);
                return;
            }
        }
    }

    fn name(&self) -> &'static str {
        "suffix"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stemmed(stemmer: &dyn Stemmer, word: &str) -> String {
        let mut term = word.to_string();
        stemmer.stem(&mut term);
        term
    }

    #[test]
    fn test_identity_stemmer() {
        let stemmer = IdentityStemmer::new();

        assert_eq!(stemmed(&stemmer, "running"), "running");
        assert_eq!(stemmed(&stemmer, "flies"), "flies");
        assert_eq!(stemmer.name(), "identity");
    }

    #[test]
    fn test_suffix_stemmer() {
        let stemmer = SuffixStemmer::new();

        assert_eq!(stemmed(&stemmer, "running"), "runn");
        assert_eq!(stemmed(&stemmer, "flies"), "fli");
        assert_eq!(stemmed(&stemmer, "beautiful"), "beauti");
        assert_eq!(stemmed(&stemmer, "agreement"), "agree");
        assert_eq!(stemmed(&stemmer, "cat"), "cat");
    }

    #[test]
    fn test_suffix_stemmer_can_empty_a_term() {
        let stemmer = SuffixStemmer::with_suffixes(vec!["ing".to_string()]).min_stem_len(0);

        assert_eq!(stemmed(&stemmer, "ing"), "");
        assert_eq!(stemmed(&stemmer, "sing"), "s");
    }
}
