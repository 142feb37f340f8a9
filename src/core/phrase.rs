//! Pass 1: greedy longest-window phrase substitution.
//!
//! Scans windows from the configured maximum width down to 1, replacing
//! the first token of a matched window with the case-adjusted compressed
//! form and absorbing the rest. Longest-match-first ordering guarantees
//! multi-word idioms are captured before the word pass can fragment them.

use std::collections::HashMap;

use super::casing;
use super::models::{AppliedRule, CompressionPattern, PassPriority, Token};

/// Pattern lookup indexed by word count and lower-cased text.
///
/// Shared by the phrase and word passes; built once per call from the
/// store snapshot.
pub struct PatternIndex {
    by_text: HashMap<(usize, String), CompressionPattern>,
    max_word_count: usize,
}

impl PatternIndex {
    pub fn new(patterns: Vec<CompressionPattern>) -> Self {
        let mut by_text = HashMap::with_capacity(patterns.len());
        let mut max_word_count = 0;
        for pattern in patterns {
            max_word_count = max_word_count.max(pattern.word_count);
            by_text.insert(
                (pattern.word_count, pattern.original_text.to_lowercase()),
                pattern,
            );
        }
        Self {
            by_text,
            max_word_count,
        }
    }

    pub fn lookup(&self, word_count: usize, text: &str) -> Option<&CompressionPattern> {
        self.by_text.get(&(word_count, text.to_lowercase()))
    }

    pub fn max_word_count(&self) -> usize {
        self.max_word_count
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_text.len()
    }
}

/// Run the phrase pass over the token sequence in place.
///
/// Returns the applied-rule entries in the order they fired.
pub fn run(tokens: &mut [Token], index: &PatternIndex, max_window: usize) -> Vec<AppliedRule> {
    let mut applied = Vec::new();
    if index.is_empty() || tokens.is_empty() {
        return applied;
    }

    let widest = max_window.min(index.max_word_count()).max(1);

    for window in (1..=widest).rev() {
        if window > tokens.len() {
            continue;
        }
        let mut start = 0;
        while start + window <= tokens.len() {
            if tokens[start..start + window].iter().any(|t| t.processed) {
                start += 1;
                continue;
            }

            let span: Vec<&str> = tokens[start..start + window]
                .iter()
                .map(|t| t.clean.as_str())
                .collect();
            let candidate = span.join(" ");

            let Some(pattern) = index.lookup(window, &candidate) else {
                start += 1;
                continue;
            };

            let original_span: Vec<&str> = tokens[start..start + window]
                .iter()
                .map(|t| t.original.as_str())
                .collect();
            let replacement = casing::preserve_case(&original_span.join(" "), &pattern.compressed_form);

            tokens[start].current = replacement;
            tokens[start].processed = true;
            // The window's closing punctuation survives on the kept token;
            // punctuation on interior tokens goes down with them
            if window > 1 {
                tokens[start].trailing_punctuation =
                    tokens[start + window - 1].trailing_punctuation.clone();
            }
            for token in &mut tokens[start + 1..start + window] {
                token.current.clear();
                token.processed = true;
            }

            applied.push(AppliedRule {
                pattern_id: Some(pattern.id),
                original_text: pattern.original_text.clone(),
                compressed_form: pattern.compressed_form.clone(),
                pass: PassPriority::Phrase,
                confidence: pattern.confidence,
                start_index: tokens[start].position,
                end_index: tokens[start + window - 1].position,
            });

            start += window;
        }
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokenizer::tokenize;

    fn phrase(id: i64, text: &str, short: &str, confidence: f64) -> CompressionPattern {
        CompressionPattern {
            id,
            original_text: text.to_string(),
            compressed_form: short.to_string(),
            word_count: text.split_whitespace().count(),
            pass_priority: PassPriority::Phrase,
            confidence,
            usage_count: 0,
        }
    }

    #[test]
    fn test_basic_phrase_match() {
        let mut tokens = tokenize("explain machine learning please");
        let index = PatternIndex::new(vec![phrase(1, "machine learning", "ML", 0.9)]);

        let applied = run(&mut tokens, &index, 6);

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].start_index, 1);
        assert_eq!(applied[0].end_index, 2);
        assert_eq!(tokens[1].current, "ML");
        assert!(tokens[1].processed);
        assert!(tokens[2].current.is_empty());
        assert!(tokens[2].processed);
        assert!(!tokens[0].processed);
    }

    #[test]
    fn test_longest_window_first() {
        let mut tokens = tokenize("as soon as possible");
        let index = PatternIndex::new(vec![
            phrase(1, "as soon as possible", "ASAP", 0.9),
            phrase(2, "as soon as", "soon", 0.9),
        ]);

        let applied = run(&mut tokens, &index, 6);

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].original_text, "as soon as possible");
        assert_eq!(tokens[0].current, "ASAP");
    }

    #[test]
    fn test_case_preserved_from_span() {
        let mut tokens = tokenize("Machine learning is hard");
        let index = PatternIndex::new(vec![phrase(1, "machine learning", "ml", 0.9)]);

        run(&mut tokens, &index, 6);

        assert_eq!(tokens[0].current, "Ml");
    }

    #[test]
    fn test_all_caps_span() {
        let mut tokens = tokenize("MACHINE LEARNING rocks");
        let index = PatternIndex::new(vec![phrase(1, "machine learning", "ml", 0.9)]);

        run(&mut tokens, &index, 6);

        assert_eq!(tokens[0].current, "ML");
    }

    #[test]
    fn test_processed_tokens_excluded() {
        let mut tokens = tokenize("machine learning machine learning");
        tokens[0].processed = true;
        let index = PatternIndex::new(vec![phrase(1, "machine learning", "ML", 0.9)]);

        let applied = run(&mut tokens, &index, 6);

        // Only the second occurrence is free to match
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].start_index, 2);
    }

    #[test]
    fn test_non_overlapping_matches() {
        let mut tokens = tokenize("machine learning and machine learning");
        let index = PatternIndex::new(vec![phrase(1, "machine learning", "ML", 0.9)]);

        let applied = run(&mut tokens, &index, 6);

        assert_eq!(applied.len(), 2);
        assert_eq!(tokens[0].current, "ML");
        assert_eq!(tokens[3].current, "ML");
    }

    #[test]
    fn test_trailing_punctuation_migrates_to_kept_token() {
        let mut tokens = tokenize("explain machine learning?");
        let index = PatternIndex::new(vec![phrase(1, "machine learning", "ML", 0.9)]);

        run(&mut tokens, &index, 6);

        assert_eq!(tokens[1].current, "ML");
        assert_eq!(tokens[1].trailing_punctuation, "?");
        assert!(tokens[2].current.is_empty());
    }

    #[test]
    fn test_empty_index() {
        let mut tokens = tokenize("nothing to see here");
        let index = PatternIndex::new(vec![]);
        assert!(run(&mut tokens, &index, 6).is_empty());
    }
}
