//! Weighted-sum scoring of candidates.
//!
//! The scorer is a pure function from (user context, candidate signals) to
//! a single finite score:
//!
//! ```text
//! score = w_pop * popularity + w_rec * recency + w_aff * affinity
//! ```
//!
//! Affinity measures how strongly a candidate co-occurs with the user's
//! recent history: the overlap between the candidate's co-occurrence set
//! and `recent_streams`, normalized by the history length. No overlap data
//! (or no history) yields affinity 0.0, never an error.
//!
//! Raw signals that are NaN or infinite are rejected per candidate; the
//! caller drops that candidate and keeps going.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sources::{Candidate, ScoredCandidate, StreamId, UserContext};
use thiserror::Error;
use tracing::warn;

/// Errors raised when validating scoring weights at configuration time.
#[derive(Error, Debug)]
pub enum WeightError {
    /// A weight is NaN, infinite, or negative
    #[error("weight `{name}` must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    /// All weights are zero, so every candidate would score identically
    #[error("signal weights must sum to a positive total, got {total}")]
    NonPositiveTotal { total: f64 },
}

/// Errors raised while scoring a single candidate.
///
/// These are recovered locally: the offending candidate is dropped from
/// the ranking pass and the request continues.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// A raw signal (or the combined score) is NaN or infinite
    #[error("invalid `{signal}` signal for stream {stream_id}: {value}")]
    InvalidSignal {
        stream_id: StreamId,
        signal: &'static str,
        value: f64,
    },
}

/// Relative weight of each signal in the combined score.
///
/// All weights must be finite and non-negative, and at least one must be
/// positive. Validated at configuration time, not per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalWeights {
    pub popularity: f64,
    pub recency: f64,
    pub affinity: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            popularity: 0.4,
            recency: 0.2,
            affinity: 0.4,
        }
    }
}

impl SignalWeights {
    /// Check the weight invariants.
    pub fn validate(&self) -> Result<(), WeightError> {
        for (name, value) in [
            ("popularity", self.popularity),
            ("recency", self.recency),
            ("affinity", self.affinity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightError::InvalidWeight { name, value });
            }
        }

        let total = self.popularity + self.recency + self.affinity;
        if total <= 0.0 {
            return Err(WeightError::NonPositiveTotal { total });
        }
        Ok(())
    }
}

/// Pure, deterministic scorer. No I/O, no per-request state.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: SignalWeights,
}

impl Scorer {
    /// Create a scorer, validating the weights up front.
    pub fn new(weights: SignalWeights) -> Result<Self, WeightError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Score a single candidate against the user context.
    ///
    /// # Returns
    /// * `Ok(score)` - A finite combined score
    /// * `Err(ScoreError::InvalidSignal)` - A raw signal (or the combined
    ///   result) is NaN or infinite; the candidate should be excluded
    pub fn score(&self, context: &UserContext, candidate: &Candidate) -> Result<f64, ScoreError> {
        let signals = &candidate.signals;

        for (name, value) in [
            ("popularity", signals.popularity),
            ("recency", signals.recency),
        ] {
            if !value.is_finite() {
                return Err(ScoreError::InvalidSignal {
                    stream_id: candidate.stream_id.clone(),
                    signal: name,
                    value,
                });
            }
        }

        let affinity = self.affinity(context, candidate);

        let score = self.weights.popularity * signals.popularity
            + self.weights.recency * signals.recency
            + self.weights.affinity * affinity;

        // Extreme-but-finite inputs can still overflow the sum
        if !score.is_finite() {
            return Err(ScoreError::InvalidSignal {
                stream_id: candidate.stream_id.clone(),
                signal: "combined",
                value: score,
            });
        }
        Ok(score)
    }

    /// Score a whole pool in parallel.
    ///
    /// Candidates whose signals are invalid are dropped (not fatal) and
    /// counted, so the orchestrator can report them in diagnostics.
    ///
    /// # Returns
    /// `(scored, dropped)` where `scored` preserves the input order of the
    /// surviving candidates.
    pub fn score_all(
        &self,
        context: &UserContext,
        candidates: &[Candidate],
    ) -> (Vec<ScoredCandidate>, usize) {
        let results: Vec<Result<ScoredCandidate, ScoreError>> = candidates
            .par_iter()
            .map(|candidate| {
                self.score(context, candidate)
                    .map(|score| ScoredCandidate::new(candidate.stream_id.clone(), score))
            })
            .collect();

        let mut scored = Vec::with_capacity(results.len());
        let mut dropped = 0;
        for result in results {
            match result {
                Ok(candidate) => scored.push(candidate),
                Err(err) => {
                    warn!("Dropping candidate from ranking: {}", err);
                    dropped += 1;
                }
            }
        }
        (scored, dropped)
    }

    /// Overlap between the candidate's co-occurrence set and the user's
    /// recent history, normalized to [0, 1] by the history length.
    fn affinity(&self, context: &UserContext, candidate: &Candidate) -> f64 {
        if context.recent_streams.is_empty() || candidate.signals.co_occurring.is_empty() {
            return 0.0;
        }

        let overlap = context
            .recent_streams
            .iter()
            .filter(|stream_id| candidate.signals.co_occurring.contains(*stream_id))
            .count();

        overlap as f64 / context.recent_streams.len() as f64
    }
}
