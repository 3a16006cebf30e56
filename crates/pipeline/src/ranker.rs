//! Deterministic ordering and truncation of scored candidates.
//!
//! The output order is a total order: score descending, then stream id
//! ascending. Two runs over identical inputs always produce identical
//! results, including when scores tie.

use sources::ScoredCandidate;
use thiserror::Error;

/// Errors raised when ranking.
#[derive(Error, Debug)]
pub enum RankError {
    /// The requested result size is negative
    #[error("invalid limit {0}: must be >= 0")]
    InvalidLimit(i64),
}

/// Order scored candidates and truncate to `limit`.
///
/// ## Algorithm
/// 1. Sort by score descending, breaking ties by stream id ascending
///    (`f64::total_cmp` keeps the comparator a total order)
/// 2. Truncate to `limit`
///
/// A limit of 0 yields an empty result, not an error. The result is never
/// padded: its length is `min(limit, candidates)`.
///
/// # Arguments
/// * `scored` - Candidates with finite scores (takes ownership)
/// * `limit` - Requested result size; negative values are rejected
pub fn rank(mut scored: Vec<ScoredCandidate>, limit: i64) -> Result<Vec<ScoredCandidate>, RankError> {
    if limit < 0 {
        return Err(RankError::InvalidLimit(limit));
    }

    scored.sort_unstable_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.stream_id.cmp(&b.stream_id))
    });
    scored.truncate(limit as usize);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sorts_by_score_descending() {
        let scored = vec![
            ScoredCandidate::new("a", 0.2),
            ScoredCandidate::new("b", 0.9),
            ScoredCandidate::new("c", 0.5),
        ];

        let ranked = rank(scored, 10).unwrap();
        let ids: Vec<_> = ranked.iter().map(|c| c.stream_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_breaks_ties_by_stream_id_ascending() {
        let scored = vec![
            ScoredCandidate::new("zebra", 0.5),
            ScoredCandidate::new("apple", 0.5),
            ScoredCandidate::new("mango", 0.5),
        ];

        let ranked = rank(scored, 10).unwrap();
        let ids: Vec<_> = ranked.iter().map(|c| c.stream_id.as_str()).collect();
        assert_eq!(ids, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let scored = vec![
            ScoredCandidate::new("a", 0.1),
            ScoredCandidate::new("b", 0.2),
            ScoredCandidate::new("c", 0.3),
        ];

        let ranked = rank(scored, 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].stream_id, "c");
        assert_eq!(ranked[1].stream_id, "b");
    }

    #[test]
    fn test_rank_limit_zero_yields_empty_result() {
        let scored = vec![ScoredCandidate::new("a", 0.5)];

        let ranked = rank(scored, 0).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_negative_limit_is_an_error() {
        let scored = vec![ScoredCandidate::new("a", 0.5)];

        let err = rank(scored, -1).unwrap_err();
        assert!(matches!(err, RankError::InvalidLimit(-1)));
    }

    #[test]
    fn test_rank_never_pads_short_pools() {
        let scored = vec![ScoredCandidate::new("a", 0.5)];

        let ranked = rank(scored, 10).unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_rank_is_reproducible() {
        let scored = vec![
            ScoredCandidate::new("b", 0.5),
            ScoredCandidate::new("a", 0.5),
            ScoredCandidate::new("c", 0.7),
        ];

        let first = rank(scored.clone(), 3).unwrap();
        let second = rank(scored, 3).unwrap();
        assert_eq!(first, second);
    }
}
