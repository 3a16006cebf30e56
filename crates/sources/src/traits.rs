//! Collaborator contracts for the ranking engine.
//!
//! The candidate pool and the per-candidate signals come from upstreams the
//! surrounding system owns (a candidate store, a feature store, ...). The
//! orchestrator only depends on these traits, so tests and the CLI demo can
//! substitute in-memory implementations.

use crate::types::{Candidate, SignalSet, StreamId};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by upstream collaborators.
///
/// How fatal a failure is depends on who failed: a dead candidate source
/// kills the request, a dead signal fetcher only degrades it. That policy
/// lives in the orchestrator, not here.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The upstream could not serve the request at all
    #[error("{source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

impl SourceError {
    /// Convenience constructor for the common case.
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Supplies the raw candidate pool for a user.
///
/// The pool may be larger than the requested result size and may contain
/// duplicates or streams the user has already watched; the pipeline cleans
/// that up downstream.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Returns the name of this source (for logging/debugging)
    fn name(&self) -> &str;

    /// Fetch the candidate pool for a user.
    async fn fetch_candidates(&self, user_id: &str) -> Result<Vec<Candidate>, SourceError>;
}

/// Supplies per-candidate signals for a set of streams.
///
/// Partial results are acceptable: callers treat missing entries as the
/// neutral `SignalSet`. A fetcher should return whatever it has rather
/// than failing the whole batch.
#[async_trait]
pub trait SignalFetcher: Send + Sync {
    /// Returns the name of this fetcher (for logging/debugging)
    fn name(&self) -> &str;

    /// Fetch signals for the given streams on behalf of a user.
    async fn fetch_signals(
        &self,
        user_id: &str,
        stream_ids: &[StreamId],
    ) -> Result<HashMap<StreamId, SignalSet>, SourceError>;
}
