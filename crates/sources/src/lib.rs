//! # Sources Crate
//!
//! Domain types and collaborator contracts for the StreamRecs ranking engine.
//!
//! ## Components
//!
//! ### Domain types
//! `UserContext`, `Candidate`, `SignalSet` and `ScoredCandidate`, all
//! request-scoped. Nothing in this crate is persisted or shared between
//! requests.
//!
//! ### Collaborator traits
//! The surrounding system supplies two upstreams:
//! - `CandidateSource`: the raw pool of candidate streams for a user
//! - `SignalFetcher`: per-candidate signals (popularity, recency, and the
//!   co-occurrence set used for affinity)
//!
//! Both are async and fallible; the orchestrator decides how much of a
//! failure is survivable.
//!
//! ### In-memory implementations
//! `InMemoryCandidateSource` and `InMemorySignalFetcher` back the CLI demo
//! catalog, the benches, and the test suites. Real deployments plug their
//! own implementations in at the trait seam.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CandidateSource, InMemoryCandidateSource, Candidate, UserContext};
//!
//! let source = InMemoryCandidateSource::new()
//!     .with_pool("user-1", vec![Candidate::new("lofi-beats")]);
//!
//! let context = UserContext::new("user-1", vec!["city-pop-radio".to_string()]);
//! let candidates = source.fetch_candidates(&context.user_id).await?;
//! ```

// Public modules
pub mod memory;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use memory::{InMemoryCandidateSource, InMemorySignalFetcher};
pub use traits::{CandidateSource, SignalFetcher, SourceError};
pub use types::{Candidate, ScoredCandidate, SignalSet, StreamId, UserContext};
