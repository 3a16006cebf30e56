//! In-memory collaborator implementations.
//!
//! These back the CLI demo catalog, the benches, and the test suites.
//! They are deliberately simple: a per-user candidate pool with an optional
//! fallback, and a flat stream-id → signals table.

use crate::traits::{CandidateSource, SignalFetcher, SourceError};
use crate::types::{Candidate, SignalSet, StreamId};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Candidate source backed by a per-user map of pools.
///
/// Users without a dedicated pool receive the fallback pool (empty by
/// default), which keeps the demo usable for arbitrary user ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateSource {
    pools: HashMap<String, Vec<Candidate>>,
    fallback: Vec<Candidate>,
}

impl InMemoryCandidateSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate pool for a specific user (builder style).
    pub fn with_pool(mut self, user_id: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        self.pools.insert(user_id.into(), candidates);
        self
    }

    /// Set the pool served to users without a dedicated one (builder style).
    pub fn with_fallback(mut self, candidates: Vec<Candidate>) -> Self {
        self.fallback = candidates;
        self
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateSource {
    fn name(&self) -> &str {
        "InMemoryCandidateSource"
    }

    async fn fetch_candidates(&self, user_id: &str) -> Result<Vec<Candidate>, SourceError> {
        let pool = self
            .pools
            .get(user_id)
            .unwrap_or(&self.fallback)
            .clone();

        debug!(
            "Fetched {} candidates for user {} from {}",
            pool.len(),
            user_id,
            self.name()
        );
        Ok(pool)
    }
}

/// Signal fetcher backed by a flat stream-id → signals table.
///
/// Only requested streams present in the table appear in the response, so
/// this naturally exercises the partial-result path downstream.
#[derive(Debug, Clone, Default)]
pub struct InMemorySignalFetcher {
    signals: HashMap<StreamId, SignalSet>,
}

impl InMemorySignalFetcher {
    /// Create an empty fetcher (every lookup comes back neutral).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register signals for a stream (builder style).
    pub fn with_signals(mut self, stream_id: impl Into<StreamId>, signals: SignalSet) -> Self {
        self.signals.insert(stream_id.into(), signals);
        self
    }
}

#[async_trait]
impl SignalFetcher for InMemorySignalFetcher {
    fn name(&self) -> &str {
        "InMemorySignalFetcher"
    }

    async fn fetch_signals(
        &self,
        user_id: &str,
        stream_ids: &[StreamId],
    ) -> Result<HashMap<StreamId, SignalSet>, SourceError> {
        let found: HashMap<StreamId, SignalSet> = stream_ids
            .iter()
            .filter_map(|id| {
                self.signals
                    .get(id)
                    .map(|signals| (id.clone(), signals.clone()))
            })
            .collect();

        debug!(
            "Fetched signals for {}/{} streams for user {}",
            found.len(),
            stream_ids.len(),
            user_id
        );
        Ok(found)
    }
}
