//! Unicode word tokenization for plain-text documents.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` on Unicode word boundaries (UAX #29) and lower-case each word.
///
/// Returns `(term, position)` pairs where positions count words from 0, so
/// they are strictly increasing as the postings store requires.
///
/// ```
/// use falchion::analysis::tokenize;
///
/// let terms: Vec<_> = tokenize("Hello, World! hello").collect();
/// assert_eq!(terms, vec![
///     ("hello".to_string(), 0),
///     ("world".to_string(), 1),
///     ("hello".to_string(), 2),
/// ]);
/// ```
pub fn tokenize(text: &str) -> impl Iterator<Item = (String, u64)> + '_ {
    text.unicode_words()
        .enumerate()
        .map(|(position, word)| (word.to_lowercase(), position as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_is_dropped() {
        let terms: Vec<_> = tokenize("a, b; c.").map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_international_text() {
        let terms: Vec<_> = tokenize("Café résumé").collect();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].0, "café");
        assert_eq!(terms[1], ("résumé".to_string(), 1));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(tokenize("  ...  ").count(), 0);
    }
}
