//! Miss discovery and quality filtering.
//!
//! After the passes run, tokens still unprocessed represent vocabulary no
//! rule covers. This module picks out the candidates worth a curator's
//! time and suppresses noise: stop words, short low-value words, spans
//! with digits or embedded proper nouns.
//!
//! Word candidates survive when they are long enough or classified
//! high-value (technical, long-common, business, or abbreviable terms).
//! Phrase candidates (2- and 3-word windows) survive only when they match
//! a fixed whitelist of idiom-like shapes.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{AppliedRule, MissKind, Token};

// ============================================================================
// Stop words
// ============================================================================

/// Articles, pronouns, common prepositions/conjunctions, and short
/// question words that are never worth logging on their own.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Articles
        "a", "an", "the",
        // Pronouns
        "i", "me", "my", "mine", "you", "your", "yours", "he", "him", "his", "she", "her",
        "hers", "it", "its", "we", "us", "our", "ours", "they", "them", "their", "theirs",
        "this", "that", "these", "those",
        // Prepositions and conjunctions
        "of", "in", "on", "at", "to", "for", "with", "by", "from", "up", "out", "off",
        "over", "under", "and", "or", "but", "nor", "so", "yet", "as", "if", "than",
        "into", "onto", "about",
        // Short question words and auxiliaries
        "who", "what", "when", "where", "why", "how", "is", "are", "was", "were", "be",
        "been", "am", "do", "does", "did", "can", "could", "will", "would", "shall",
        "should", "may", "might", "must", "not", "no",
    ]
    .into_iter()
    .collect()
});

// ============================================================================
// High-value word classifications
// ============================================================================

static TECHNICAL_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "database", "server", "frontend", "backend", "deployment", "kubernetes", "docker",
        "javascript", "typescript", "python", "algorithm", "encryption", "authentication",
        "middleware", "repository", "framework", "endpoint", "container", "pipeline",
        "compiler", "debugger", "refactoring", "microservice", "websocket", "latency",
    ]
    .into_iter()
    .collect()
});

static LONG_COMMON_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "something", "everything", "anything", "nothing", "someone", "everyone", "anyone",
        "together", "different", "important", "available", "necessary", "possible",
        "probably", "definitely", "absolutely", "basically", "actually", "currently",
        "immediately", "eventually", "understand", "information", "question", "answer",
    ]
    .into_iter()
    .collect()
});

static BUSINESS_TERMS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "meeting", "schedule", "deadline", "project", "manager", "client", "customer",
        "invoice", "budget", "revenue", "quarter", "stakeholder", "proposal", "contract",
        "marketing", "strategy", "feedback", "report", "presentation", "conference",
    ]
    .into_iter()
    .collect()
});

static ABBREVIABLE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "message", "please", "thanks", "tomorrow", "tonight", "because", "people",
        "probably", "minute", "second", "morning", "afternoon", "evening", "weekend",
        "number", "address", "appointment", "document", "picture", "birthday",
    ]
    .into_iter()
    .collect()
});

/// Words at or above this length are high-value regardless of the lists.
const HIGH_VALUE_LENGTH: usize = 8;

/// Minimum length for an ordinary (non-high-value) word candidate.
const MIN_WORD_LENGTH: usize = 4;

// ============================================================================
// Valuable phrase shapes
// ============================================================================

/// Idiom-like shapes worth curating as phrase rules. Anything not
/// matching one of these is discarded as noise.
static VALUABLE_PHRASE_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^right now$",
        r"^as \w+ as$",
        r"^(?:going|want|need|have|trying) to$",
        r"^at the moment$",
        r"^in order to$",
        r"^by the way$",
        r"^let me know$",
        r"^talk to you$",
        r"^looking forward$",
        r"^a lot of$",
        r"^(?:kind|sort) of$",
        r"^thank you(?: \w+)?$",
        r"^of course$",
        r"^make sure$",
        r"^(?:find|figure) out$",
        r"^follow up$",
        r"^get back to$",
        r"^on the way$",
        r"^for example$",
        r"^be able to$",
        r"^as soon as$",
    ]
    .iter()
    .map(|shape| Regex::new(shape).expect("valid regex"))
    .collect()
});

// ============================================================================
// Discovery
// ============================================================================

/// A candidate the filter judged worth logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissCandidate {
    pub text: String,
    pub kind: MissKind,
    /// Context sample stored alongside the miss (the source sentence).
    pub context: String,
}

fn is_clean_word(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '\'')
}

fn is_high_value(word: &str) -> bool {
    word.len() >= HIGH_VALUE_LENGTH
        || TECHNICAL_TERMS.contains(word)
        || LONG_COMMON_WORDS.contains(word)
        || BUSINESS_TERMS.contains(word)
        || ABBREVIABLE_WORDS.contains(word)
}

/// Identify uncovered words and phrases worth manual curation.
///
/// `applied` is used to avoid re-logging text a rule already covered
/// elsewhere in the input.
pub fn discover(tokens: &[Token], original_text: &str, applied: &[AppliedRule]) -> Vec<MissCandidate> {
    let covered: HashSet<String> = applied
        .iter()
        .map(|rule| rule.original_text.to_lowercase())
        .collect();

    let unprocessed: Vec<&Token> = tokens.iter().filter(|t| !t.processed).collect();
    let mut candidates = Vec::new();

    // Word stage: deduplicated single tokens
    let mut seen = HashSet::new();
    for token in &unprocessed {
        let word = token.clean.as_str();
        if !seen.insert(word.to_string()) {
            continue;
        }
        if !is_clean_word(word) || STOP_WORDS.contains(word) || covered.contains(word) {
            continue;
        }
        if word.len() < MIN_WORD_LENGTH && !is_high_value(word) {
            continue;
        }
        candidates.push(MissCandidate {
            text: word.to_string(),
            kind: MissKind::Word,
            context: original_text.to_string(),
        });
    }

    // Phrase stage: contiguous 2- and 3-word windows over unprocessed runs
    let mut seen_phrases = HashSet::new();
    for width in 2..=3usize {
        for window in unprocessed.windows(width) {
            let contiguous = window
                .windows(2)
                .all(|pair| pair[1].position == pair[0].position + 1);
            if !contiguous {
                continue;
            }

            if window.iter().any(|t| !is_clean_word(&t.clean)) {
                continue;
            }
            if window.iter().all(|t| STOP_WORDS.contains(t.clean.as_str())) {
                continue;
            }
            // Capitalized non-initial word suggests a proper name
            if window[1..]
                .iter()
                .any(|t| t.original.chars().next().is_some_and(|c| c.is_uppercase()))
            {
                continue;
            }

            let phrase: Vec<&str> = window.iter().map(|t| t.clean.as_str()).collect();
            let phrase = phrase.join(" ");
            if covered.contains(&phrase) || !seen_phrases.insert(phrase.clone()) {
                continue;
            }
            if !VALUABLE_PHRASE_SHAPES.iter().any(|shape| shape.is_match(&phrase)) {
                continue;
            }

            candidates.push(MissCandidate {
                text: phrase,
                kind: MissKind::Phrase,
                context: original_text.to_string(),
            });
        }
    }

    candidates
}
