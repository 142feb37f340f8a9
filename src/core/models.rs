//! Domain types for the compression pipeline.
//!
//! Wire-facing types serialize as camelCase to match the JSON shape the
//! admin UI and browser extension consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Pass priority
// ============================================================================

/// Pipeline stage a pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassPriority {
    /// Pass 0: question/politeness prefix removal.
    Prefix,
    /// Pass 1: multi-word phrase substitution.
    Phrase,
    /// Pass 2: single-word substitution.
    Word,
}

impl PassPriority {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Prefix => 0,
            Self::Phrase => 1,
            Self::Word => 2,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Prefix),
            1 => Some(Self::Phrase),
            2 => Some(Self::Word),
            _ => None,
        }
    }
}

// ============================================================================
// Token
// ============================================================================

/// A single word of input with its punctuation separated out.
///
/// Lives only for the duration of one compression call: created by the
/// tokenizer, mutated by the passes, consumed by the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lower-cased core text used for pattern matching.
    pub clean: String,
    /// Original core text with casing intact.
    pub original: String,
    /// Text the reassembler emits; passes substitute into this.
    pub current: String,
    /// Punctuation run stripped from the front of the raw token.
    pub leading_punctuation: String,
    /// Punctuation run stripped from the back of the raw token.
    pub trailing_punctuation: String,
    /// Set once a pass has consumed this token; later passes skip it.
    pub processed: bool,
    /// Index in the token sequence.
    pub position: usize,
}

impl Token {
    pub fn new(
        clean: String,
        original: String,
        leading: String,
        trailing: String,
        position: usize,
    ) -> Self {
        Self {
            current: original.clone(),
            clean,
            original,
            leading_punctuation: leading,
            trailing_punctuation: trailing,
            processed: false,
            position,
        }
    }

    /// A token verbatim-preserved by the tokenizer's special cases
    /// (contractions, decimals, URLs, hyphenated compounds).
    pub fn verbatim(text: &str, position: usize) -> Self {
        Self::new(
            text.to_lowercase(),
            text.to_string(),
            String::new(),
            String::new(),
            position,
        )
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// A stored rewrite rule: original text maps to a shorter form.
///
/// Owned by the persistence layer; the engine works on a read-only
/// snapshot loaded per call. Patterns are never deleted: "disabled" means
/// confidence forced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionPattern {
    pub id: i64,
    pub original_text: String,
    pub compressed_form: String,
    pub word_count: usize,
    pub pass_priority: PassPriority,
    /// Eligibility score in [0, 1], clamped at every mutation.
    pub confidence: f64,
    pub usage_count: i64,
}

// ============================================================================
// Applied rules and pass metrics
// ============================================================================

/// Record of one rule firing during a compression call.
///
/// Span indexes are pass-relative: prefix rules (pass 0) run before
/// tokenization and report word offsets in the raw input, while phrase
/// and word rules (pass 1/2) report positions in the token sequence
/// built from pass 0's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    /// Store id of the pattern; `None` for built-in prefix tiers.
    pub pattern_id: Option<i64>,
    pub original_text: String,
    pub compressed_form: String,
    pub pass: PassPriority,
    pub confidence: f64,
    /// First word or token position the rule covered (see struct docs).
    pub start_index: usize,
    /// Last position the rule covered (inclusive).
    pub end_index: usize,
}

/// Counters for a single pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStats {
    pub tokens_processed: usize,
    pub rules_applied: usize,
    pub processing_time_ms: u64,
}

/// Per-pass metrics for a full compression call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassResults {
    pub pass0: PassStats,
    pub pass1: PassStats,
    pub pass2: PassStats,
}

// ============================================================================
// Compression result
// ============================================================================

/// The outcome of one `compress()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedText {
    pub original: String,
    pub compressed: String,
    /// Percentage of characters saved, rounded: `(orig - comp) / orig * 100`.
    pub compression_ratio: i32,
    pub processing_time_ms: u64,
    pub rules_applied: Vec<AppliedRule>,
    pub from_cache: bool,
    pub pass_results: PassResults,
}

impl CompressedText {
    /// Result for empty input: nothing to do, ratio zero.
    pub fn empty() -> Self {
        Self {
            original: String::new(),
            compressed: String::new(),
            compression_ratio: 0,
            processing_time_ms: 0,
            rules_applied: Vec::new(),
            from_cache: false,
            pass_results: PassResults::default(),
        }
    }

    /// Ratio formula shared by the engine and Pass 0.
    pub fn ratio(original: &str, compressed: &str) -> i32 {
        if original.is_empty() {
            return 0;
        }
        let saved = original.len() as f64 - compressed.len() as f64;
        (saved / original.len() as f64 * 100.0).round() as i32
    }
}

// ============================================================================
// Miss discovery
// ============================================================================

/// Classification of an uncovered vocabulary candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissKind {
    Word,
    Phrase,
}

impl MissKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Phrase => "phrase",
        }
    }
}

/// A word or phrase no rule covered, queued for manual curation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissEntry {
    pub text: String,
    pub frequency: i64,
    pub kind: MissKind,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Set when an admin derives a pattern from this entry.
    pub reviewed: bool,
}

// ============================================================================
// Feedback
// ============================================================================

/// Immutable log entry recording user satisfaction with one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub id: Uuid,
    pub satisfied: bool,
    pub original_text: String,
    pub compressed_text: String,
    pub rules_applied: Vec<AppliedRule>,
    pub compression_ratio: Option<i32>,
    pub processing_time_ms: Option<u64>,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn new(
        satisfied: bool,
        original_text: impl Into<String>,
        compressed_text: impl Into<String>,
        rules_applied: Vec<AppliedRule>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            satisfied,
            original_text: original_text.into(),
            compressed_text: compressed_text.into(),
            rules_applied,
            compression_ratio: None,
            processing_time_ms: None,
            session_id: None,
            created_at: Utc::now(),
        }
    }
}

/// One pattern's confidence change produced by feedback processing.
///
/// Derived from the pattern mutation and returned to the caller; not
/// persisted as its own entity (manual overrides go to the audit table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceAdjustment {
    pub pattern_id: i64,
    pub old_confidence: f64,
    pub new_confidence: f64,
    pub delta: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_priority_roundtrip() {
        for p in [PassPriority::Prefix, PassPriority::Phrase, PassPriority::Word] {
            assert_eq!(PassPriority::from_i64(p.as_i64()), Some(p));
        }
        assert_eq!(PassPriority::from_i64(7), None);
    }

    #[test]
    fn test_ratio_formula() {
        // "Could you help me?" (18 chars) -> "help me?" (8 chars)
        assert_eq!(CompressedText::ratio("Could you help me?", "help me?"), 56);
        assert_eq!(CompressedText::ratio("", ""), 0);
        assert_eq!(CompressedText::ratio("same", "same"), 0);
    }

    #[test]
    fn test_token_starts_unprocessed() {
        let token = Token::verbatim("don't", 3);
        assert!(!token.processed);
        assert_eq!(token.clean, "don't");
        assert_eq!(token.current, "don't");
        assert_eq!(token.position, 3);
    }

    #[test]
    fn test_wire_shape_camel_case() {
        let result = CompressedText::empty();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("compressionRatio").is_some());
        assert!(json.get("rulesApplied").is_some());
        assert!(json.get("fromCache").is_some());
        assert!(json["passResults"].get("pass0").is_some());
    }
}
