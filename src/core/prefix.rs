//! Pass 0: question/politeness prefix removal.
//!
//! Tries an ordered list of prefix rules against the start of the text,
//! most specific (longest) first. On a match the prefix is dropped, the
//! remaining first letter is normalized unless it looks like a proper
//! noun, and a question mark is appended when no terminator is present.

use super::casing;
use super::models::{AppliedRule, CompressedText, CompressionPattern, PassPriority};

/// One prefix rule; built-in tiers carry no store id.
#[derive(Debug, Clone)]
pub struct PrefixRule {
    pub pattern_id: Option<i64>,
    /// Lower-cased prefix text.
    pub text: String,
    pub word_count: usize,
    pub confidence: f64,
}

/// Outcome of running Pass 0 over the raw text.
#[derive(Debug, Clone)]
pub struct PrefixOutcome {
    pub original: String,
    pub processed: String,
    pub prefix_removed: Option<String>,
    pub compression_ratio: i32,
    pub question_mark_added: bool,
    pub applied: Option<AppliedRule>,
}

/// Stock prefix tiers used when the store holds no priority-0 rules.
/// Longer phrases are listed before their substrings so declaration
/// order alone never lets "can you" shadow "can you please".
const DEFAULT_PREFIXES: &[&str] = &[
    "i was wondering if you could",
    "would you be able to",
    "would it be possible to",
    "could you please",
    "can you please",
    "would you please",
    "will you please",
    "i was wondering if",
    "would you mind",
    "could you",
    "can you",
    "would you",
    "will you",
    "please",
];

/// Prefix remover holding its rule list in matching order.
pub struct PrefixRemover {
    rules: Vec<PrefixRule>,
}

impl PrefixRemover {
    /// Build from store-loaded priority-0 patterns. Falls back to the
    /// built-in tiers when the store has none.
    pub fn new(patterns: &[CompressionPattern]) -> Self {
        if patterns.is_empty() {
            return Self::with_defaults();
        }

        let mut rules: Vec<PrefixRule> = patterns
            .iter()
            .map(|p| PrefixRule {
                pattern_id: Some(p.id),
                text: p.original_text.to_lowercase(),
                word_count: p.word_count,
                confidence: p.confidence,
            })
            .collect();
        // Longest first; sort is stable so declaration order breaks ties
        rules.sort_by(|a, b| b.word_count.cmp(&a.word_count));
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        let rules = DEFAULT_PREFIXES
            .iter()
            .map(|text| PrefixRule {
                pattern_id: None,
                text: text.to_string(),
                word_count: text.split_whitespace().count(),
                confidence: 1.0,
            })
            .collect();
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run the pass. First matching rule wins.
    pub fn apply(&self, text: &str) -> PrefixOutcome {
        let trimmed = text.trim();

        for rule in &self.rules {
            if let Some(remainder) = match_prefix(trimmed, &rule.text) {
                let remainder = remainder.trim_start_matches([' ', ',']).trim_start();
                if remainder.is_empty() {
                    // The whole text was the prefix; nothing left to keep
                    continue;
                }

                let matched: String = trimmed[..trimmed.len() - remainder.len()]
                    .trim_end_matches([' ', ','])
                    .to_string();

                let mut processed = normalize_leading_case(remainder);
                let question_mark_added = !processed.ends_with('?') && !processed.ends_with('.');
                if question_mark_added {
                    processed.push('?');
                }

                let applied = AppliedRule {
                    pattern_id: rule.pattern_id,
                    original_text: rule.text.clone(),
                    compressed_form: String::new(),
                    pass: PassPriority::Prefix,
                    confidence: rule.confidence,
                    start_index: 0,
                    end_index: rule.word_count.saturating_sub(1),
                };

                return PrefixOutcome {
                    original: text.to_string(),
                    compression_ratio: CompressedText::ratio(text, &processed),
                    processed,
                    prefix_removed: Some(matched),
                    question_mark_added,
                    applied: Some(applied),
                };
            }
        }

        PrefixOutcome {
            original: text.to_string(),
            processed: text.to_string(),
            prefix_removed: None,
            compression_ratio: 0,
            question_mark_added: false,
            applied: None,
        }
    }
}

/// Case-insensitive anchored match of `prefix` against `text`, requiring
/// a word boundary after the match. Returns the remainder on success.
fn match_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let remainder = &text[prefix.len()..];
    match remainder.chars().next() {
        None => Some(remainder),
        Some(c) if c.is_whitespace() || c == ',' => Some(remainder),
        _ => None,
    }
}

/// Lower-case the first letter unless the first word looks like a proper
/// noun (best-effort heuristic, see `casing`).
fn normalize_leading_case(text: &str) -> String {
    let first_word = text.split_whitespace().next().unwrap_or("");
    let is_entire = text.split_whitespace().count() == 1;

    if first_word.chars().next().is_some_and(|c| c.is_uppercase())
        && !casing::looks_like_proper_noun(first_word, is_entire)
    {
        let mut chars = text.chars();
        if let Some(first) = chars.next() {
            return first.to_lowercase().collect::<String>() + chars.as_str();
        }
    }
    text.to_string()
}
