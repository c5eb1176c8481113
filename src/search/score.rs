//! Similarity to match-score normalization

/// A post is returned only when its match score is strictly above this
pub const ACCEPT_THRESHOLD: f64 = 0.5;

/// Map raw trigram similarity onto a match score with `2s / (1 + s)`.
///
/// The curve is concave, so the 0.5 acceptance cut corresponds to a raw
/// similarity of one third.
pub fn match_score(similarity: f64) -> f64 {
    if similarity <= 0.0 || similarity.is_nan() {
        return 0.0;
    }
    (2.0 * similarity) / (1.0 + similarity)
}

/// Strict acceptance test on a match score
pub fn is_accepted(score: f64) -> bool {
    score > ACCEPT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(match_score(0.0), 0.0);
        assert_eq!(match_score(-0.3), 0.0);
        assert_eq!(match_score(f64::NAN), 0.0);
        assert_eq!(match_score(1.0), 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let boundary = 1.0 / 3.0;
        assert_eq!(match_score(boundary), 0.5);
        assert!(!is_accepted(match_score(boundary)));
        assert!(is_accepted(match_score(boundary + 1e-9)));
    }

    #[test]
    fn test_concave_lift() {
        assert!(match_score(0.4) > 0.4);
        assert!(match_score(0.4) < match_score(0.5));
    }
}
