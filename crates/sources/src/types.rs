//! Request-scoped domain types for the recommendation pipeline.
//!
//! Everything here is created at request entry and discarded after the
//! response is produced. There is no shared mutable state between requests.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque stream identifier, as supplied by the surrounding service.
pub type StreamId = String;

/// Aggregated view of the requesting user.
///
/// ## Design Note
/// This follows the "context builder" pattern: gather the user's history
/// once at request entry, keep both the ordered list (most-recent-first)
/// and a `HashSet` for O(1) membership checks during filtering.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// Opaque user identifier (non-empty; enforced at the request boundary)
    pub user_id: String,

    /// Recently watched streams, most-recent-first, duplicates collapsed
    pub recent_streams: Vec<StreamId>,

    /// Set view of `recent_streams` for O(1) lookups
    pub recent_set: HashSet<StreamId>,
}

impl UserContext {
    /// Build a context from the raw request history.
    ///
    /// Duplicate stream ids are collapsed on ingestion, keeping the first
    /// (most recent) occurrence so the ordering stays most-recent-first.
    pub fn new(user_id: impl Into<String>, recent_stream_ids: Vec<StreamId>) -> Self {
        let mut recent_streams = Vec::with_capacity(recent_stream_ids.len());
        let mut recent_set = HashSet::with_capacity(recent_stream_ids.len());

        for stream_id in recent_stream_ids {
            if recent_set.insert(stream_id.clone()) {
                recent_streams.push(stream_id);
            }
        }

        Self {
            user_id: user_id.into(),
            recent_streams,
            recent_set,
        }
    }

    /// Whether the user has recently watched the given stream.
    pub fn has_watched(&self, stream_id: &str) -> bool {
        self.recent_set.contains(stream_id)
    }
}

/// Per-candidate signals used by the scorer.
///
/// The key set is fixed; unknown signals are rejected at the edge rather
/// than silently carried through. `Default` is the neutral set: zero for
/// the numeric signals and no known co-occurrence data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalSet {
    /// Global popularity of the stream (higher is more popular)
    #[serde(default)]
    pub popularity: f64,

    /// Freshness of the stream (higher is more recent)
    #[serde(default)]
    pub recency: f64,

    /// Streams known to co-occur with this one in viewing sessions.
    /// Overlap with the user's recent history drives the affinity signal.
    #[serde(default)]
    pub co_occurring: HashSet<StreamId>,
}

impl SignalSet {
    /// Numeric signals with a fixed popularity value, everything else neutral.
    pub fn with_popularity(popularity: f64) -> Self {
        Self {
            popularity,
            ..Self::default()
        }
    }
}

/// A stream eligible for recommendation, before scoring and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub stream_id: StreamId,

    /// Signals attached to this candidate. Sources may prefill these;
    /// the orchestrator overwrites them with fetched signals when the
    /// signal fetcher responds in time.
    #[serde(default)]
    pub signals: SignalSet,
}

impl Candidate {
    /// Create a candidate with neutral signals.
    pub fn new(stream_id: impl Into<StreamId>) -> Self {
        Self {
            stream_id: stream_id.into(),
            signals: SignalSet::default(),
        }
    }

    /// Attach a signal set (builder style).
    pub fn with_signals(mut self, signals: SignalSet) -> Self {
        self.signals = signals;
        self
    }
}

/// A candidate with its final score. The score is always finite; the
/// scorer rejects anything that would produce NaN or an infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub stream_id: StreamId,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn new(stream_id: impl Into<StreamId>, score: f64) -> Self {
        Self {
            stream_id: stream_id.into(),
            score,
        }
    }
}
