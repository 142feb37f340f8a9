//! Case preservation and proper-noun heuristics.
//!
//! When a rule replaces a span, the replacement inherits the span's
//! capitalization pattern: all-caps stays all-caps, a capitalized first
//! letter stays capitalized, everything else is lower-cased.
//!
//! The proper-noun detection used by the prefix pass is a best-effort
//! heuristic over fixed shapes (acronyms, CamelCase, lone capitalized
//! words) and will misclassify some inputs. That is accepted behavior,
//! not a correctness guarantee.

use once_cell::sync::Lazy;
use regex::Regex;

/// Acronyms and shouting: two or more letters, all upper-case.
static ALL_CAPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,}$").expect("valid regex"));

/// CamelCase identifiers: interior upper-case after a lower-case run.
static CAMEL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]*[a-z][A-Z][A-Za-z]*$").expect("valid regex"));

/// A single capitalized word with nothing else around it.
static LONE_CAPITALIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+$").expect("valid regex"));

/// Map the original span's capitalization onto the replacement.
///
/// Replacements stored as all-caps acronyms ("ML", "ASAP") keep their
/// stored casing; everything else follows the span: all-caps stays
/// all-caps, capitalized stays capitalized, lower-case stays lower-case.
pub fn preserve_case(original: &str, replacement: &str) -> String {
    let has_letters = original.chars().any(|c| c.is_alphabetic());
    let all_upper = has_letters
        && original
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| c.is_uppercase());

    if all_upper {
        return replacement.to_uppercase();
    }

    let acronym = replacement.len() >= 2 && replacement.chars().all(|c| c.is_ascii_uppercase());
    if acronym {
        return replacement.to_string();
    }

    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        let lower = replacement.to_lowercase();
        let mut chars = lower.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => lower,
        };
    }

    replacement.to_lowercase()
}

/// Heuristic check whether `word` looks like a proper noun.
///
/// `is_entire_remainder` is true when the word makes up the whole text
/// under inspection; a lone capitalized word is then left alone because
/// there is no sentence context to justify lower-casing it.
pub fn looks_like_proper_noun(word: &str, is_entire_remainder: bool) -> bool {
    if ALL_CAPS.is_match(word) || CAMEL_CASE.is_match(word) {
        return true;
    }
    is_entire_remainder && LONE_CAPITALIZED.is_match(word)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("REACT", "xyz", "XYZ")]
    #[case("React", "xyz", "Xyz")]
    #[case("react", "XYZ", "XYZ")]
    #[case("Machine learning", "ml", "Ml")]
    #[case("MACHINE LEARNING", "ml", "ML")]
    #[case("could you", "cy", "cy")]
    #[case("machine learning", "ML", "ML")]
    #[case("Machine learning", "ML", "ML")]
    #[case("MACHINE LEARNING", "ML", "ML")]
    fn test_preserve_case(#[case] original: &str, #[case] replacement: &str, #[case] expected: &str) {
        assert_eq!(preserve_case(original, replacement), expected);
    }

    #[test]
    fn test_preserve_case_no_letters() {
        // Digit-only spans take the lower-cased replacement
        assert_eq!(preserve_case("42", "FORTY-TWO"), "forty-two");
    }

    #[rstest]
    #[case("NASA", false, true)]
    #[case("iPhone", false, true)]
    #[case("JavaScript", false, true)]
    #[case("Help", false, false)]
    #[case("Help", true, true)]
    #[case("help", true, false)]
    #[case("A", false, false)]
    fn test_proper_noun_heuristic(
        #[case] word: &str,
        #[case] entire: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(looks_like_proper_noun(word, entire), expected);
    }
}
