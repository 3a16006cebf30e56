//! Pipeline for filtering, scoring, and ranking stream candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Scorer for combining signals into a single finite score
//! - rank() for deterministic ordering and truncation
//!
//! ## Architecture
//! The pipeline processes candidates in stages:
//! 1. Filters remove unwanted candidates (duplicates, already watched)
//! 2. Scorer turns each candidate's signals into one finite score
//! 3. rank() orders by (score descending, stream_id ascending) and truncates
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, Scorer, SignalWeights, rank};
//! use pipeline::filters::{DuplicateFilter, HistoryFilter};
//!
//! // Build the filter pipeline
//! let pipeline = FilterPipeline::new()
//!     .add_filter(DuplicateFilter)
//!     .add_filter(HistoryFilter);
//!
//! // Apply filters
//! let eligible = pipeline.apply(candidates, &context)?;
//!
//! // Score and rank
//! let scorer = Scorer::new(SignalWeights::default())?;
//! let (scored, dropped) = scorer.score_all(&context, &eligible);
//! let top = rank(scored, 5)?;
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod ranker;
pub mod scorer;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use ranker::{RankError, rank};
pub use scorer::{ScoreError, Scorer, SignalWeights, WeightError};
pub use traits::Filter;
