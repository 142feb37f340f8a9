//! Pass 2: per-token word substitution.
//!
//! Visits tokens the phrase pass left untouched and applies single-word
//! rules with the same case-preservation discipline.

use super::casing;
use super::models::{AppliedRule, PassPriority, Token};
use super::phrase::PatternIndex;

/// Run the word pass over the token sequence in place.
pub fn run(tokens: &mut [Token], index: &PatternIndex) -> Vec<AppliedRule> {
    let mut applied = Vec::new();
    if index.is_empty() {
        return applied;
    }

    for token in tokens.iter_mut() {
        if token.processed || token.clean.trim().is_empty() {
            continue;
        }

        let Some(pattern) = index.lookup(1, &token.clean) else {
            continue;
        };

        token.current = casing::preserve_case(&token.original, &pattern.compressed_form);
        token.processed = true;

        applied.push(AppliedRule {
            pattern_id: Some(pattern.id),
            original_text: pattern.original_text.clone(),
            compressed_form: pattern.compressed_form.clone(),
            pass: PassPriority::Word,
            confidence: pattern.confidence,
            start_index: token.position,
            end_index: token.position,
        });
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::CompressionPattern;
    use crate::core::tokenizer::tokenize;

    fn word(id: i64, text: &str, short: &str) -> CompressionPattern {
        CompressionPattern {
            id,
            original_text: text.to_string(),
            compressed_form: short.to_string(),
            word_count: 1,
            pass_priority: PassPriority::Word,
            confidence: 0.8,
            usage_count: 0,
        }
    }

    #[test]
    fn test_word_substitution() {
        let mut tokens = tokenize("send the message tomorrow");
        let index = PatternIndex::new(vec![
            word(1, "message", "msg"),
            word(2, "tomorrow", "tmrw"),
        ]);

        let applied = run(&mut tokens, &index);

        assert_eq!(applied.len(), 2);
        assert_eq!(tokens[2].current, "msg");
        assert_eq!(tokens[3].current, "tmrw");
        assert!(!tokens[0].processed);
    }

    #[test]
    fn test_case_variants() {
        let index = PatternIndex::new(vec![word(1, "react", "xyz")]);

        let mut tokens = tokenize("REACT React react");
        let applied = run(&mut tokens, &index);

        assert_eq!(applied.len(), 3);
        assert_eq!(tokens[0].current, "XYZ");
        assert_eq!(tokens[1].current, "Xyz");
        assert_eq!(tokens[2].current, "xyz");
    }

    #[test]
    fn test_processed_tokens_skipped() {
        let mut tokens = tokenize("message message");
        tokens[0].processed = true;
        tokens[0].current.clear();
        let index = PatternIndex::new(vec![word(1, "message", "msg")]);

        let applied = run(&mut tokens, &index);

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].start_index, 1);
        assert!(tokens[0].current.is_empty());
    }

    #[test]
    fn test_punctuation_untouched() {
        let mut tokens = tokenize("(message)");
        let index = PatternIndex::new(vec![word(1, "message", "msg")]);

        run(&mut tokens, &index);

        assert_eq!(tokens[0].current, "msg");
        assert_eq!(tokens[0].leading_punctuation, "(");
        assert_eq!(tokens[0].trailing_punctuation, ")");
    }
}
