//! Text normalization for lexical retrieval.

/// Split text into lowercase ASCII alphanumeric terms.
///
/// Any run of other characters (punctuation, whitespace, non-ASCII) acts as a
/// separator. Empty tokens are never produced.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Hello, World! 123"), vec!["hello", "world", "123"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ...!?  ").is_empty());
    }

    #[test]
    fn test_tokenize_mixed_separators() {
        assert_eq!(tokenize("don't\tstop--me_now"), vec!["don", "t", "stop", "me", "now"]);
        assert_eq!(tokenize("café 2:35"), vec!["caf", "2", "35"]);
    }
}
