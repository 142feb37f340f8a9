//! Case-preserving reassembly of the token sequence.
//!
//! Tokens emptied by a phrase match are dropped entirely, including any
//! punctuation they carried. Punctuation on absorbed interior tokens is
//! lost; only the window's closing punctuation survives, migrated to the
//! kept token by the phrase pass.

use super::models::Token;

/// Rebuild the output text from the token sequence.
pub fn reassemble(tokens: &[Token]) -> String {
    let parts: Vec<String> = tokens
        .iter()
        .filter(|t| !t.current.is_empty())
        .map(|t| {
            format!(
                "{}{}{}",
                t.leading_punctuation, t.current, t.trailing_punctuation
            )
        })
        .collect();
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{CompressionPattern, PassPriority};
    use crate::core::phrase::{self, PatternIndex};
    use crate::core::tokenizer::tokenize;

    #[test]
    fn test_identity_roundtrip() {
        let input = "Well, (this) still works: great!";
        let tokens = tokenize(input);
        assert_eq!(reassemble(&tokens), input);
    }

    #[test]
    fn test_substituted_token_keeps_punctuation() {
        let mut tokens = tokenize("send the (message).");
        tokens[2].current = "msg".to_string();
        assert_eq!(reassemble(&tokens), "send the (msg).");
    }

    #[test]
    fn test_absorbed_tokens_dropped() {
        let mut tokens = tokenize("a b c");
        tokens[1].current.clear();
        assert_eq!(reassemble(&tokens), "a c");
    }

    // Punctuation attached to an interior token of a compressed phrase
    // is lost with the token. Only the window's closing punctuation
    // survives.
    #[test]
    fn test_punctuation_inside_compressed_phrase_is_dropped() {
        let mut tokens = tokenize("reply as soon, as possible please");
        let index = PatternIndex::new(vec![CompressionPattern {
            id: 1,
            original_text: "as soon as".to_string(),
            compressed_form: "ASAP".to_string(),
            word_count: 3,
            pass_priority: PassPriority::Phrase,
            confidence: 0.9,
            usage_count: 0,
        }]);
        phrase::run(&mut tokens, &index, 6);

        // The comma rode on the absorbed interior "soon," token and is gone
        assert_eq!(reassemble(&tokens), "reply ASAP possible please");
    }

    #[test]
    fn test_closing_punctuation_survives_phrase_match() {
        let mut tokens = tokenize("explain machine learning?");
        let index = PatternIndex::new(vec![CompressionPattern {
            id: 1,
            original_text: "machine learning".to_string(),
            compressed_form: "ML".to_string(),
            word_count: 2,
            pass_priority: PassPriority::Phrase,
            confidence: 0.9,
            usage_count: 0,
        }]);
        phrase::run(&mut tokens, &index, 6);

        assert_eq!(reassemble(&tokens), "explain ML?");
    }
}
