//! Filter to collapse duplicate candidates in the pool.
//!
//! Upstream pools carry no ordering contract, so "first" means the
//! encounter order of the input sequence. Callers that need a priority
//! rule must pre-sort before filtering.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, UserContext};
use std::collections::HashSet;

/// Collapses duplicate stream ids, keeping the first occurrence.
pub struct DuplicateFilter;

impl Filter for DuplicateFilter {
    fn name(&self) -> &str {
        "DuplicateFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.stream_id.clone()))
            .collect();
        Ok(filtered)
    }
}
