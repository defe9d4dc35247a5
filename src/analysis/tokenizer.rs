//! Tokenizer implementations for text featurization.

use unicode_segmentation::UnicodeSegmentation;

/// Trait for tokenizers that convert text into tokens.
///
/// Implementations must be deterministic: the same input always produces
/// the same token sequence. `Send + Sync` allows use from the concurrent
/// prediction service.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Splits on Unicode word boundaries and lowercases each token.
///
/// Punctuation and whitespace are dropped, so "Great, product!" and
/// "great product" featurize identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    /// Create a new word tokenizer.
    pub fn new() -> Self {
        WordTokenizer
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(|w| w.to_lowercase()).collect()
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenizer_basic() {
        let tokenizer = WordTokenizer::new();
        let tokens = tokenizer.tokenize("Hello world");
        assert_eq!(tokens, vec!["hello", "world"]);
    }

    #[test]
    fn test_word_tokenizer_drops_punctuation() {
        let tokenizer = WordTokenizer::new();
        let tokens = tokenizer.tokenize("Great, product! Really.");
        assert_eq!(tokens, vec!["great", "product", "really"]);
    }

    #[test]
    fn test_word_tokenizer_deterministic() {
        let tokenizer = WordTokenizer::new();
        let text = "I never asked for this...";
        assert_eq!(tokenizer.tokenize(text), tokenizer.tokenize(text));
    }

    #[test]
    fn test_word_tokenizer_empty() {
        let tokenizer = WordTokenizer::new();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("   ").is_empty());
    }
}
