//! Fuzzy street address comparison.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Lowercase, punctuation to spaces, whitespace collapsed and trimmed.
pub fn normalize_address(address: &str) -> String {
    let lower = address.to_lowercase();
    let spaced = PUNCTUATION.replace_all(&lower, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Whether two free-form addresses plausibly describe the same place.
///
/// Equal or containing after normalization is a match. Otherwise the
/// significant tokens (longer than 2 characters) of `a` are counted when
/// they equal a token of `b`, or when one contains the other and the
/// contained token is longer than 4 characters. Two such tokens are
/// enough, three when either side has more than 5 tokens.
///
/// An address that normalizes to nothing never matches.
pub fn addresses_similar(a: &str, b: &str) -> bool {
    let a = normalize_address(a);
    let b = normalize_address(b);

    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b || a.contains(&b) || b.contains(&a) {
        return true;
    }

    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();

    let matches = tokens_a
        .iter()
        .filter(|ta| ta.chars().count() > 2)
        .filter(|ta| {
            tokens_b.iter().any(|tb| {
                ta == &tb
                    || (ta.chars().count() > 4 && tb.contains(**ta))
                    || (tb.chars().count() > 4 && ta.contains(*tb))
            })
        })
        .count();

    let threshold = if tokens_a.len() > 5 || tokens_b.len() > 5 {
        3
    } else {
        2
    };

    matches >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_address("  123 Main St.,\tSpringfield,  IL "),
            "123 main st springfield il"
        );
    }

    #[test]
    fn test_similar_street_abbreviation() {
        assert!(addresses_similar(
            "123 Main St, Springfield, IL 62701",
            "123 main street springfield il"
        ));
    }

    #[test]
    fn test_different_addresses() {
        assert!(!addresses_similar("123 Main St, Springfield", "456 Oak Ave, Chicago"));
    }

    #[test]
    fn test_containment_and_equality() {
        assert!(addresses_similar("123 Main St", "123 MAIN ST, Springfield IL"));
        assert!(addresses_similar("Main-St", "main st"));
    }

    #[test]
    fn test_partial_token_containment() {
        assert!(addresses_similar("springfield 62701", "springfields 627015"));
        assert!(!addresses_similar("abc springfield", "abcd fields"));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!addresses_similar("", "123 Main St"));
        assert!(!addresses_similar("123 Main St", " , "));
    }
}
