//! Filter to remove streams the user has recently watched.
//!
//! This is typically the first personalization step in the pipeline: a
//! recommendation must never repeat something from the user's recent
//! history, no matter how well it would score.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};

/// Removes candidates present in the user's recent history.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.recent_set for O(1) lookups.
pub struct HistoryFilter;

impl Filter for HistoryFilter {
    fn name(&self) -> &str {
        "HistoryFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.has_watched(&candidate.stream_id))
            .collect();
        Ok(filtered)
    }
}
