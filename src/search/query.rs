//! Query normalization and tokenization
//!
//! Turns the raw `q` parameter into the trimmed query text, the bounded
//! token list and the per-token case variants that both scoring paths use.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of tokens considered per query
pub const MAX_QUERY_TOKENS: usize = 6;

static PERCENT_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").unwrap());

/// Result of normalizing a raw query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedQuery {
    /// Nothing to search for; callers return the unranked base set
    Empty,
    /// Trimmed (and at most once decoded) query text
    Text(String),
}

impl NormalizedQuery {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedQuery::Empty => None,
            NormalizedQuery::Text(text) => Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedQuery::Empty)
    }
}

/// Trim the query and undo one layer of percent-encoding if present.
///
/// Some proxies encode the query string twice, so a `%XX` sequence that
/// survives the framework's own decoding gets exactly one more pass.
/// Decoding is never repeated: `%2525` becomes `%25`, not `%`.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let trimmed = raw.trim();

    let text = if PERCENT_ESCAPE.is_match(trimmed) {
        match urlencoding::decode(trimmed) {
            Ok(decoded) => decoded.trim().to_string(),
            // Escapes that decode to invalid UTF-8 are kept literally
            Err(_) => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    };

    if text.is_empty() {
        NormalizedQuery::Empty
    } else {
        NormalizedQuery::Text(text)
    }
}

/// Split a query on whitespace runs, case-fold, and keep the first `max_tokens`
pub fn tokenize(query: &str, max_tokens: usize) -> Vec<String> {
    query
        .split_whitespace()
        .map(|token| token.to_lowercase())
        .take(max_tokens)
        .collect()
}

/// Unicode case fold used for containment tests on every path
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// The four casings a token is matched under: as typed, lower, upper, title
pub fn case_variants(token: &str) -> [String; 4] {
    [
        token.to_string(),
        token.to_lowercase(),
        token.to_uppercase(),
        title_case(token),
    ]
}

/// Case variants with duplicates removed, first occurrence kept
pub fn distinct_case_variants(token: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::with_capacity(4);
    for variant in case_variants(token) {
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}

/// Uppercase the first character, lowercase the rest
pub fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Parse the `limit` parameter.
///
/// Non-numeric and non-positive values mean "no limit" rather than an error;
/// valid values are clamped to `max_limit`.
pub fn parse_limit(raw: Option<&str>, max_limit: usize) -> Option<usize> {
    let value: i64 = raw?.trim().parse().ok()?;
    if value <= 0 {
        return None;
    }
    Some((value as u64).min(max_limit as u64) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  chess  "), NormalizedQuery::Text("chess".into()));
        assert_eq!(normalize("   \t\n"), NormalizedQuery::Empty);
        assert_eq!(normalize(""), NormalizedQuery::Empty);
    }

    #[test]
    fn test_normalize_decodes_once() {
        assert_eq!(
            normalize("chess%20club"),
            NormalizedQuery::Text("chess club".into())
        );
        // Double-encoded percent sign only loses one layer
        assert_eq!(normalize("100%2525"), NormalizedQuery::Text("100%25".into()));
        // Cyrillic sent through a double-encoding proxy
        assert_eq!(
            normalize("%D1%88%D0%B0%D1%85%D0%BC%D0%B0%D1%82%D1%8B"),
            NormalizedQuery::Text("шахматы".into())
        );
    }

    #[test]
    fn test_normalize_leaves_plain_percent() {
        assert_eq!(normalize("50% off"), NormalizedQuery::Text("50% off".into()));
        assert_eq!(normalize("%zz"), NormalizedQuery::Text("%zz".into()));
    }

    #[test]
    fn test_normalize_decoded_to_blank_is_empty() {
        assert_eq!(normalize("%20%20"), NormalizedQuery::Empty);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Chess   CLUB\tmeetup", 6), vec!["chess", "club", "meetup"]);
        assert_eq!(tokenize("a b c d e f g h", 6).len(), 6);
        assert_eq!(tokenize("a b c d e f g h", 6).last().unwrap(), "f");
        assert!(tokenize("   ", 6).is_empty());
    }

    #[test]
    fn test_case_variants() {
        assert_eq!(
            case_variants("cHess"),
            [
                "cHess".to_string(),
                "chess".to_string(),
                "CHESS".to_string(),
                "Chess".to_string()
            ]
        );
        assert_eq!(title_case("шахматы"), "Шахматы");
        assert_eq!(title_case(""), "");
        assert_eq!(distinct_case_variants("chess"), vec!["chess", "CHESS", "Chess"]);
        assert_eq!(distinct_case_variants("42"), vec!["42"]);
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(Some("10"), 200), Some(10));
        assert_eq!(parse_limit(Some(" 7 "), 200), Some(7));
        assert_eq!(parse_limit(Some("1000"), 200), Some(200));
        assert_eq!(parse_limit(Some("abc"), 200), None);
        assert_eq!(parse_limit(Some("0"), 200), None);
        assert_eq!(parse_limit(Some("-3"), 200), None);
        assert_eq!(parse_limit(Some("2.5"), 200), None);
        assert_eq!(parse_limit(None, 200), None);
    }
}
