//! Tokenizer and punctuation model.
//!
//! Splits raw text on whitespace and separates one leading and one
//! trailing punctuation run from each word, keeping the original casing
//! for display and a lower-cased core for matching. Contractions, decimal
//! numbers, URL-like tokens, and hyphenated compounds are preserved
//! verbatim so punctuation stripping cannot mangle them.
//!
//! Guarantee: joining `leading + current + trailing` for every token with
//! single spaces reconstructs the input up to substitutions and collapsed
//! whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::Token;

// ============================================================================
// Special-case shapes preserved verbatim
// ============================================================================

/// Contractions such as `don't`, `it's`, `we'll`.
static CONTRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+'[A-Za-z]+$").expect("valid regex"));

/// Decimal numbers such as `3.14` or `1,024.5`.
static DECIMAL_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d[\d,]*\.\d+$").expect("valid regex"));

/// URL-like tokens: scheme-prefixed, `www.`-prefixed, or bare domains.
static URL_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://\S+|www\.\S+|[A-Za-z0-9-]+\.(?:com|org|net|io|dev|co)(?:/\S*)?)$")
        .expect("valid regex")
});

/// Hyphenated compound words such as `well-known` or `state-of-the-art`.
static HYPHENATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+(?:-[A-Za-z]+)+$").expect("valid regex"));

/// Leading punctuation run: opening brackets and quotes.
static LEADING_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\(\[\{<"'`]+"#).expect("valid regex"));

/// Trailing punctuation run: closing brackets, quotes, and terminators.
static TRAILING_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\)\]\}>"'`.,!?;:]+$"#).expect("valid regex"));

fn is_special_case(raw: &str) -> bool {
    CONTRACTION.is_match(raw)
        || DECIMAL_NUMBER.is_match(raw)
        || URL_LIKE.is_match(raw)
        || HYPHENATED.is_match(raw)
}

/// Split raw text into tokens with punctuation separated out.
///
/// Tokens whose core is empty after stripping (pure punctuation) are
/// dropped. Positions are assigned after dropping, so they are contiguous.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for raw in text.split_whitespace() {
        if is_special_case(raw) {
            tokens.push(Token::verbatim(raw, tokens.len()));
            continue;
        }

        let leading = LEADING_PUNCT
            .find(raw)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let rest = &raw[leading.len()..];

        let trailing = TRAILING_PUNCT
            .find(rest)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let core = &rest[..rest.len() - trailing.len()];

        if core.is_empty() {
            continue;
        }

        tokens.push(Token::new(
            core.to_lowercase(),
            core.to_string(),
            leading,
            trailing,
            tokens.len(),
        ));
    }

    tokens
}
