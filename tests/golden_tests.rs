//! Golden tests - fixture-based tests that lock expected behavior
//!
//! These tests use JSON fixtures to verify that the search primitives
//! produce fixed outputs. Any change in behavior will cause these tests to
//! fail, signaling a change in ranking for every stored post.
//!
//! Run with: cargo test --test golden_tests

use serde::Deserialize;
use std::fs;

fn load<T: for<'de> Deserialize<'de>>(name: &str) -> T {
    let fixture_path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let content = fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("Failed to read {} fixture: {}", name, e));
    serde_json::from_str(&content).expect("Failed to parse fixture JSON")
}

// ============================================================================
// TRIGRAM SIMILARITY GOLDEN TESTS
// ============================================================================

mod similarity_golden {
    use super::*;
    use clubhub::search::similarity;
    use clubhub::storage::register_trigram_functions;
    use rusqlite::Connection;

    #[derive(Debug, Deserialize)]
    struct TestCase {
        name: String,
        a: String,
        b: String,
        expected: f64,
    }

    #[derive(Debug, Deserialize)]
    struct Fixture {
        test_cases: Vec<TestCase>,
    }

    #[test]
    fn test_similarity_golden() {
        let fixture: Fixture = load("trigram_similarity.json");

        for case in fixture.test_cases {
            let result = similarity(&case.a, &case.b);
            assert!(
                (result - case.expected).abs() < 1e-12,
                "Case '{}': similarity({:?}, {:?}) expected {}, got {}",
                case.name,
                case.a,
                case.b,
                case.expected,
                result
            );
        }
    }

    #[test]
    fn test_sql_similarity_golden() {
        let fixture: Fixture = load("trigram_similarity.json");
        let conn = Connection::open_in_memory().unwrap();
        register_trigram_functions(&conn).unwrap();

        for case in fixture.test_cases {
            let result: f64 = conn
                .query_row("SELECT similarity(?1, ?2)", [&case.a, &case.b], |row| {
                    row.get(0)
                })
                .unwrap();
            assert!(
                (result - case.expected).abs() < 1e-12,
                "Case '{}': SQL similarity expected {}, got {}",
                case.name,
                case.expected,
                result
            );
        }
    }
}

// ============================================================================
// QUERY NORMALIZATION GOLDEN TESTS
// ============================================================================

mod query_golden {
    use super::*;
    use clubhub::search::{normalize, tokenize, MAX_QUERY_TOKENS};

    #[derive(Debug, Deserialize)]
    struct TestCase {
        name: String,
        input: String,
        expected: Option<String>,
        tokens: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Fixture {
        test_cases: Vec<TestCase>,
    }

    #[test]
    fn test_query_normalization_golden() {
        let fixture: Fixture = load("query_normalization.json");

        for case in fixture.test_cases {
            let normalized = normalize(&case.input);
            assert_eq!(
                normalized.as_text(),
                case.expected.as_deref(),
                "Case '{}': normalized value mismatch",
                case.name
            );

            let tokens = normalized
                .as_text()
                .map(|text| tokenize(text, MAX_QUERY_TOKENS))
                .unwrap_or_default();
            assert_eq!(tokens, case.tokens, "Case '{}': token mismatch", case.name);
        }
    }
}
