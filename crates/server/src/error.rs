//! Caller-visible error taxonomy for the recommend operation.
//!
//! Only truly unrecoverable conditions surface here. Everything else
//! degrades to a smaller or lower-confidence result that is still
//! returned, with the degradation recorded in the request diagnostics.

use pipeline::RankError;
use thiserror::Error;

/// Errors surfaced to the caller of `recommend`.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// The candidate source failed, or the latency budget elapsed before a
    /// single candidate was gathered. `partial` distinguishes the two:
    /// `false` means the source failed outright, `true` means the deadline
    /// expired mid-fetch.
    #[error("candidate source unavailable: {reason}")]
    UpstreamUnavailable { reason: String, partial: bool },

    /// The caller asked for a negative number of results. Rejected before
    /// any collaborator is contacted.
    #[error("invalid limit {0}: must be >= 0")]
    InvalidLimit(i64),

    /// The caller sent an empty user id
    #[error("user_id must not be empty")]
    EmptyUserId,

    /// A pipeline stage failed in a way that is not the caller's fault
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RankError> for RecommendError {
    fn from(err: RankError) -> Self {
        match err {
            RankError::InvalidLimit(limit) => Self::InvalidLimit(limit),
        }
    }
}
