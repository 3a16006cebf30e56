//! # Recommendation Orchestrator
//!
//! This module coordinates the entire recommendation pipeline:
//! 1. Validate the request (limit, user id) before touching any upstream
//! 2. Fetch the candidate pool under the request deadline
//! 3. Drop duplicates and recently-watched streams
//! 4. Fetch per-candidate signals under the remaining budget
//! 5. Score the eligible candidates in-process
//! 6. Rank deterministically and truncate to the requested size
//!
//! Each request moves through `Fetching → Scoring → Ranking → Done`, with
//! `Errored` reachable from the fetch and scoring stages. The partial
//! failure policy: a dead candidate source is fatal, a dead signal fetcher
//! only degrades the result to neutral signals.
//!
//! Everything is request-scoped. The orchestrator holds no mutable state,
//! so concurrent requests need no coordination. It never spawns detached
//! tasks either: cancelling the `recommend` future drops any in-flight
//! collaborator call and its deadline timer with it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::time::timeout_at;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::error::RecommendError;
use pipeline::filters::{DuplicateFilter, HistoryFilter};
use pipeline::{FilterPipeline, Scorer, rank};
use sources::{Candidate, CandidateSource, SignalFetcher, SignalSet, StreamId, UserContext};

/// Inbound request shape, mirroring the surrounding service's endpoint.
///
/// `limit: None` falls back to the configured `default_limit`. Negative
/// limits are representable so the caller-input error can be surfaced
/// instead of silently clamped.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    pub user_id: String,

    /// Most-recent-first viewing history
    #[serde(default)]
    pub recent_stream_ids: Vec<StreamId>,

    #[serde(default)]
    pub limit: Option<i64>,
}

impl RecommendRequest {
    /// Convenience constructor for callers not going through serde.
    pub fn new(user_id: impl Into<String>, recent_stream_ids: Vec<StreamId>) -> Self {
        Self {
            user_id: user_id.into(),
            recent_stream_ids,
            limit: None,
        }
    }

    /// Set an explicit result size (builder style).
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Stages a request moves through, used in transition logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestStage {
    Fetching,
    Scoring,
    Ranking,
    Done,
    Errored,
}

/// Per-request telemetry. Partial degradation is recorded here, not
/// surfaced as an error.
#[derive(Debug, Clone, Default)]
pub struct RequestDiagnostics {
    /// Size of the raw pool returned by the candidate source
    pub candidates_fetched: usize,

    /// Candidates surviving deduplication and the history filter
    pub eligible_candidates: usize,

    /// Candidates dropped because their signals were NaN or infinite
    pub dropped_invalid_signal: usize,

    /// True when the signal fetcher failed or timed out and neutral
    /// signals were used instead
    pub signals_degraded: bool,

    /// Wall-clock time spent producing the response
    pub elapsed: Duration,
}

/// A single ranked recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecommendation {
    pub stream_id: StreamId,
    pub score: f64,
}

/// Successful outcome of a recommend call.
///
/// An empty `streams` list is a valid result (nothing eligible), distinct
/// from the error cases.
#[derive(Debug, Clone)]
pub struct Recommendations {
    /// Ranked recommendations, best first
    pub streams: Vec<StreamRecommendation>,
    pub diagnostics: RequestDiagnostics,
}

impl Recommendations {
    /// Just the ordered stream ids, for callers that don't need scores.
    pub fn stream_ids(&self) -> Vec<StreamId> {
        self.streams.iter().map(|r| r.stream_id.clone()).collect()
    }
}

/// Main orchestrator that coordinates the recommendation pipeline.
pub struct RecommendationOrchestrator<C, F> {
    candidate_source: Arc<C>,
    signal_fetcher: Arc<F>,
    filter_pipeline: Arc<FilterPipeline>,
    scorer: Scorer,
    config: EngineConfig,
}

// Derived Clone would demand C: Clone and F: Clone; the Arcs make that
// unnecessary.
impl<C, F> Clone for RecommendationOrchestrator<C, F> {
    fn clone(&self) -> Self {
        Self {
            candidate_source: Arc::clone(&self.candidate_source),
            signal_fetcher: Arc::clone(&self.signal_fetcher),
            filter_pipeline: Arc::clone(&self.filter_pipeline),
            scorer: self.scorer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C, F> RecommendationOrchestrator<C, F>
where
    C: CandidateSource,
    F: SignalFetcher,
{
    /// Create a new orchestrator, validating the configuration up front.
    ///
    /// # Arguments
    /// * `candidate_source` - Upstream supplying the raw candidate pool
    /// * `signal_fetcher` - Upstream supplying per-candidate signals
    /// * `config` - Weights, latency budget, and default result size
    pub fn new(
        candidate_source: Arc<C>,
        signal_fetcher: Arc<F>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = Scorer::new(config.weights.clone())?;
        let filter_pipeline = Arc::new(
            FilterPipeline::new()
                .add_filter(DuplicateFilter)
                .add_filter(HistoryFilter),
        );
        Ok(Self {
            candidate_source,
            signal_fetcher,
            filter_pipeline,
            scorer,
            config,
        })
    }

    /// Liveness probe. No side effects.
    pub fn health_check(&self) -> &'static str {
        "ok"
    }

    /// Main entry point: get recommendations for a user.
    ///
    /// # Returns
    /// Ranked recommendations, or one of the fatal errors: invalid limit,
    /// empty user id, or an unavailable candidate source.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn recommend(
        &self,
        request: RecommendRequest,
    ) -> Result<Recommendations, RecommendError> {
        let start_time = Instant::now();

        // Caller-input errors fail fast, before any collaborator call
        let limit = self.effective_limit(&request)?;
        if request.user_id.is_empty() {
            return Err(RecommendError::EmptyUserId);
        }

        let context = UserContext::new(request.user_id, request.recent_stream_ids);
        let deadline = tokio::time::Instant::now() + self.config.timeout();
        let mut diagnostics = RequestDiagnostics::default();

        debug!(stage = ?RequestStage::Fetching, "Fetching candidate pool");
        let candidates = self.fetch_candidates(&context, deadline).await?;
        diagnostics.candidates_fetched = candidates.len();
        info!(
            "Fetched {} candidates for user {}",
            candidates.len(),
            context.user_id
        );

        let eligible = self.filter_pipeline.apply(candidates, &context)?;
        diagnostics.eligible_candidates = eligible.len();
        info!("Applied filters, {} candidates eligible", eligible.len());

        let eligible = self
            .attach_signals(&context, eligible, deadline, &mut diagnostics)
            .await;

        debug!(stage = ?RequestStage::Scoring, "Scoring eligible candidates");
        let (scored, dropped) = self.scorer.score_all(&context, &eligible);
        diagnostics.dropped_invalid_signal = dropped;
        if dropped > 0 {
            warn!(
                "Dropped {} candidates with invalid signals for user {}",
                dropped, context.user_id
            );
        }

        debug!(stage = ?RequestStage::Ranking, "Ranking {} scored candidates", scored.len());
        let ranked = rank(scored, limit)?;

        diagnostics.elapsed = start_time.elapsed();
        info!(
            stage = ?RequestStage::Done,
            returned = ranked.len(),
            degraded = diagnostics.signals_degraded,
            elapsed = ?diagnostics.elapsed,
            "Recommendation complete for user {}",
            context.user_id
        );

        Ok(Recommendations {
            streams: ranked
                .into_iter()
                .map(|c| StreamRecommendation {
                    stream_id: c.stream_id,
                    score: c.score,
                })
                .collect(),
            diagnostics,
        })
    }

    /// Resolve the effective result size, rejecting negative limits before
    /// any collaborator is contacted.
    fn effective_limit(&self, request: &RecommendRequest) -> Result<i64, RecommendError> {
        match request.limit {
            Some(limit) if limit < 0 => Err(RecommendError::InvalidLimit(limit)),
            Some(limit) => Ok(limit),
            None => Ok(self.config.default_limit as i64),
        }
    }

    /// Fetch the candidate pool under the request deadline.
    ///
    /// Both failure modes are fatal: with zero candidates gathered there
    /// is no best-effort result to degrade to.
    async fn fetch_candidates(
        &self,
        context: &UserContext,
        deadline: tokio::time::Instant,
    ) -> Result<Vec<Candidate>, RecommendError> {
        match timeout_at(deadline, self.candidate_source.fetch_candidates(&context.user_id)).await
        {
            Ok(Ok(candidates)) => Ok(candidates),
            Ok(Err(err)) => {
                warn!(
                    stage = ?RequestStage::Errored,
                    "Candidate source {} failed for user {}: {}",
                    self.candidate_source.name(),
                    context.user_id,
                    err
                );
                Err(RecommendError::UpstreamUnavailable {
                    reason: err.to_string(),
                    partial: false,
                })
            }
            Err(_elapsed) => {
                warn!(
                    stage = ?RequestStage::Errored,
                    "Candidate fetch exceeded the {}ms budget for user {}",
                    self.config.timeout_ms,
                    context.user_id
                );
                Err(RecommendError::UpstreamUnavailable {
                    reason: format!("no candidates gathered within {}ms", self.config.timeout_ms),
                    partial: true,
                })
            }
        }
    }

    /// Attach fetched signals to the eligible candidates.
    ///
    /// Never fails the request: if the fetcher errors or the remaining
    /// budget runs out, every candidate keeps whatever signals it already
    /// carries (neutral by default) and the degradation is recorded.
    /// Partial maps are fine; missing entries stay neutral.
    async fn attach_signals(
        &self,
        context: &UserContext,
        mut candidates: Vec<Candidate>,
        deadline: tokio::time::Instant,
        diagnostics: &mut RequestDiagnostics,
    ) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }

        let stream_ids: Vec<StreamId> =
            candidates.iter().map(|c| c.stream_id.clone()).collect();

        let fetched: Option<HashMap<StreamId, SignalSet>> = match timeout_at(
            deadline,
            self.signal_fetcher.fetch_signals(&context.user_id, &stream_ids),
        )
        .await
        {
            Ok(Ok(signals)) => Some(signals),
            Ok(Err(err)) => {
                warn!(
                    "Signal fetcher {} failed for user {}, using neutral signals: {}",
                    self.signal_fetcher.name(),
                    context.user_id,
                    err
                );
                None
            }
            Err(_elapsed) => {
                warn!(
                    "Signal fetch exceeded the {}ms budget for user {}, using neutral signals",
                    self.config.timeout_ms, context.user_id
                );
                None
            }
        };

        match fetched {
            Some(mut signals) => {
                for candidate in &mut candidates {
                    if let Some(signal_set) = signals.remove(&candidate.stream_id) {
                        candidate.signals = signal_set;
                    }
                }
            }
            None => {
                diagnostics.signals_degraded = true;
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sources::{InMemoryCandidateSource, InMemorySignalFetcher, SourceError};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn test_config() -> EngineConfig {
        EngineConfig {
            weights: pipeline::SignalWeights {
                popularity: 1.0,
                recency: 0.0,
                affinity: 0.0,
            },
            timeout_ms: 50,
            default_limit: 5,
        }
    }

    fn pool(entries: &[(&str, f64)]) -> Vec<Candidate> {
        entries
            .iter()
            .map(|(id, popularity)| {
                Candidate::new(*id).with_signals(SignalSet::with_popularity(*popularity))
            })
            .collect()
    }

    fn build_orchestrator(
        candidates: Vec<Candidate>,
    ) -> RecommendationOrchestrator<InMemoryCandidateSource, InMemorySignalFetcher> {
        let source = InMemoryCandidateSource::new().with_fallback(candidates);
        let fetcher = InMemorySignalFetcher::new();
        RecommendationOrchestrator::new(Arc::new(source), Arc::new(fetcher), test_config())
            .expect("valid test config")
    }

    // ============================================================================
    // Mock Collaborators
    // ============================================================================

    /// Candidate source that always fails.
    struct FailingCandidateSource {
        called: AtomicBool,
    }

    impl FailingCandidateSource {
        fn new() -> Self {
            Self {
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CandidateSource for FailingCandidateSource {
        fn name(&self) -> &str {
            "FailingCandidateSource"
        }

        async fn fetch_candidates(&self, _user_id: &str) -> Result<Vec<Candidate>, SourceError> {
            self.called.store(true, Ordering::SeqCst);
            Err(SourceError::unavailable(self.name(), "connection refused"))
        }
    }

    /// Candidate source that responds slower than any test budget.
    struct SlowCandidateSource;

    #[async_trait]
    impl CandidateSource for SlowCandidateSource {
        fn name(&self) -> &str {
            "SlowCandidateSource"
        }

        async fn fetch_candidates(&self, _user_id: &str) -> Result<Vec<Candidate>, SourceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![Candidate::new("too-late")])
        }
    }

    /// Signal fetcher that always fails.
    struct FailingSignalFetcher;

    #[async_trait]
    impl SignalFetcher for FailingSignalFetcher {
        fn name(&self) -> &str {
            "FailingSignalFetcher"
        }

        async fn fetch_signals(
            &self,
            _user_id: &str,
            _stream_ids: &[StreamId],
        ) -> Result<HashMap<StreamId, SignalSet>, SourceError> {
            Err(SourceError::unavailable(self.name(), "feature store down"))
        }
    }

    /// Signal fetcher that responds slower than any test budget.
    struct SlowSignalFetcher;

    #[async_trait]
    impl SignalFetcher for SlowSignalFetcher {
        fn name(&self) -> &str {
            "SlowSignalFetcher"
        }

        async fn fetch_signals(
            &self,
            _user_id: &str,
            stream_ids: &[StreamId],
        ) -> Result<HashMap<StreamId, SignalSet>, SourceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(stream_ids
                .iter()
                .map(|id| (id.clone(), SignalSet::with_popularity(1.0)))
                .collect())
        }
    }

    // ============================================================================
    // Unit Tests: request validation
    // ============================================================================

    #[tokio::test]
    async fn test_negative_limit_rejected_before_fetching() {
        let source = Arc::new(FailingCandidateSource::new());
        let orchestrator = RecommendationOrchestrator::new(
            Arc::clone(&source),
            Arc::new(InMemorySignalFetcher::new()),
            test_config(),
        )
        .unwrap();

        let request = RecommendRequest::new("user-1", vec![]).with_limit(-1);
        let err = orchestrator.recommend(request).await.unwrap_err();

        assert!(matches!(err, RecommendError::InvalidLimit(-1)));
        assert!(
            !source.called.load(Ordering::SeqCst),
            "collaborators must not be contacted on caller-input errors"
        );
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected() {
        let orchestrator = build_orchestrator(pool(&[("a", 0.5)]));

        let request = RecommendRequest::new("", vec![]);
        let err = orchestrator.recommend(request).await.unwrap_err();

        assert!(matches!(err, RecommendError::EmptyUserId));
    }

    #[tokio::test]
    async fn test_limit_zero_is_a_valid_empty_result() {
        let orchestrator = build_orchestrator(pool(&[("a", 0.5)]));

        let request = RecommendRequest::new("user-1", vec![]).with_limit(0);
        let result = orchestrator.recommend(request).await.unwrap();

        assert!(result.streams.is_empty());
    }

    #[tokio::test]
    async fn test_missing_limit_uses_default() {
        let orchestrator = build_orchestrator(pool(&[
            ("a", 0.9),
            ("b", 0.8),
            ("c", 0.7),
            ("d", 0.6),
            ("e", 0.5),
            ("f", 0.4),
            ("g", 0.3),
        ]));

        let request = RecommendRequest::new("user-1", vec![]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert_eq!(result.streams.len(), 5, "default_limit is 5");
    }

    // ============================================================================
    // Unit Tests: partial-failure policy
    // ============================================================================

    #[tokio::test]
    async fn test_candidate_source_failure_is_fatal() {
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(FailingCandidateSource::new()),
            Arc::new(InMemorySignalFetcher::new()),
            test_config(),
        )
        .unwrap();

        let request = RecommendRequest::new("user-1", vec![]);
        let err = orchestrator.recommend(request).await.unwrap_err();

        assert!(matches!(
            err,
            RecommendError::UpstreamUnavailable { partial: false, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidate_fetch_timeout_is_fatal_and_partial() {
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(SlowCandidateSource),
            Arc::new(InMemorySignalFetcher::new()),
            test_config(),
        )
        .unwrap();

        let request = RecommendRequest::new("user-1", vec![]);
        let err = orchestrator.recommend(request).await.unwrap_err();

        assert!(matches!(
            err,
            RecommendError::UpstreamUnavailable { partial: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_signal_fetcher_failure_degrades_not_fails() {
        let source = InMemoryCandidateSource::new().with_fallback(pool(&[("b", 0.0), ("a", 0.0)]));
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(source),
            Arc::new(FailingSignalFetcher),
            test_config(),
        )
        .unwrap();

        let request = RecommendRequest::new("user-1", vec![]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert!(result.diagnostics.signals_degraded);
        // Neutral signals everywhere: pure tie-break ordering
        assert_eq!(result.stream_ids(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_fetch_timeout_degrades_not_fails() {
        let source = InMemoryCandidateSource::new().with_fallback(pool(&[("a", 0.0)]));
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(source),
            Arc::new(SlowSignalFetcher),
            test_config(),
        )
        .unwrap();

        let request = RecommendRequest::new("user-1", vec![]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert!(result.diagnostics.signals_degraded);
        assert_eq!(result.stream_ids(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_empty_pool_is_done_not_errored() {
        let orchestrator = build_orchestrator(vec![]);

        let request = RecommendRequest::new("user-1", vec![]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert!(result.streams.is_empty());
        assert_eq!(result.diagnostics.candidates_fetched, 0);
    }

    // ============================================================================
    // Unit Tests: diagnostics
    // ============================================================================

    #[tokio::test]
    async fn test_invalid_signal_candidates_counted_in_diagnostics() {
        let candidates = vec![
            Candidate::new("good").with_signals(SignalSet::with_popularity(0.5)),
            Candidate::new("bad").with_signals(SignalSet::with_popularity(f64::NAN)),
        ];
        let orchestrator = build_orchestrator(candidates);

        let request = RecommendRequest::new("user-1", vec![]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert_eq!(result.diagnostics.dropped_invalid_signal, 1);
        assert_eq!(result.stream_ids(), vec!["good"]);
    }

    #[tokio::test]
    async fn test_diagnostics_track_pool_sizes() {
        let candidates = pool(&[("a", 0.5), ("a", 0.4), ("watched", 0.9), ("b", 0.3)]);
        let orchestrator = build_orchestrator(candidates);

        let request = RecommendRequest::new("user-1", vec!["watched".to_string()]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert_eq!(result.diagnostics.candidates_fetched, 4);
        assert_eq!(result.diagnostics.eligible_candidates, 2);
    }

    // ============================================================================
    // Unit Tests: construction & health
    // ============================================================================

    #[tokio::test]
    async fn test_invalid_config_rejected_at_construction() {
        let config = EngineConfig {
            timeout_ms: 0,
            ..EngineConfig::default()
        };
        let result = RecommendationOrchestrator::new(
            Arc::new(InMemoryCandidateSource::new()),
            Arc::new(InMemorySignalFetcher::new()),
            config,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let orchestrator = build_orchestrator(vec![]);
        assert_eq!(orchestrator.health_check(), "ok");
    }

    // ============================================================================
    // Unit Tests: signal attachment
    // ============================================================================

    #[tokio::test]
    async fn test_fetched_signals_override_source_signals() {
        let source = InMemoryCandidateSource::new()
            .with_fallback(vec![
                Candidate::new("a").with_signals(SignalSet::with_popularity(0.1)),
                Candidate::new("b").with_signals(SignalSet::with_popularity(0.9)),
            ]);
        let fetcher = InMemorySignalFetcher::new()
            .with_signals("a", SignalSet::with_popularity(1.0));
        let orchestrator =
            RecommendationOrchestrator::new(Arc::new(source), Arc::new(fetcher), test_config())
                .unwrap();

        let request = RecommendRequest::new("user-1", vec![]);
        let result = orchestrator.recommend(request).await.unwrap();

        // "a" got popularity 1.0 from the fetcher; "b" kept its 0.9
        assert_eq!(result.stream_ids(), vec!["a", "b"]);
        assert!(!result.diagnostics.signals_degraded);
    }

    #[tokio::test]
    async fn test_affinity_uses_co_occurrence_overlap() {
        let source = InMemoryCandidateSource::new()
            .with_fallback(vec![Candidate::new("x"), Candidate::new("y")]);
        let fetcher = InMemorySignalFetcher::new().with_signals(
            "x",
            SignalSet {
                popularity: 0.0,
                recency: 0.0,
                co_occurring: HashSet::from(["recent-1".to_string()]),
            },
        );
        let config = EngineConfig {
            weights: pipeline::SignalWeights {
                popularity: 0.0,
                recency: 0.0,
                affinity: 1.0,
            },
            ..test_config()
        };
        let orchestrator =
            RecommendationOrchestrator::new(Arc::new(source), Arc::new(fetcher), config).unwrap();

        let request = RecommendRequest::new("user-1", vec!["recent-1".to_string()]);
        let result = orchestrator.recommend(request).await.unwrap();

        assert_eq!(result.stream_ids(), vec!["x", "y"]);
        assert!(result.streams[0].score > result.streams[1].score);
    }
}
