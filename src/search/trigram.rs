//! Character trigram similarity
//!
//! Strings are padded with two leading spaces and one trailing space, the
//! same convention as the PostgreSQL `pg_trgm` extension, and compared as
//! sets of 3-character windows. The SQL `similarity()` function registered
//! by the storage layer calls [`similarity`] directly, so the database path
//! and the in-process path can never disagree.

use std::collections::HashSet;

/// Padding put in front of every string before trigram extraction
const LEADING_PAD: &str = "  ";
/// Padding put after every string before trigram extraction
const TRAILING_PAD: &str = " ";

/// A single trigram; shorter windows never occur after padding
pub type Trigram = [char; 3];

/// Trigram set of one string, reusable across many comparisons
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrigramSet {
    grams: HashSet<Trigram>,
}

impl TrigramSet {
    /// Extract the trigram set of `text` (padded first)
    pub fn new(text: &str) -> Self {
        let padded: Vec<char> = LEADING_PAD
            .chars()
            .chain(text.chars())
            .chain(TRAILING_PAD.chars())
            .collect();

        if padded.len() < 3 {
            return Self::default();
        }

        let grams = padded.windows(3).map(|w| [w[0], w[1], w[2]]).collect();
        Self { grams }
    }

    pub fn len(&self) -> usize {
        self.grams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grams.is_empty()
    }

    pub fn contains(&self, gram: &Trigram) -> bool {
        self.grams.contains(gram)
    }

    /// `|A ∩ B| / max(|A|, |B|)`, or 0.0 when either set is empty
    pub fn similarity(&self, other: &TrigramSet) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let shared = small.grams.iter().filter(|g| large.contains(g)).count();
        shared as f64 / large.len() as f64
    }
}

/// Trigram similarity of two strings in `[0, 1]`; case-sensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    TrigramSet::new(a).similarity(&TrigramSet::new(b))
}
