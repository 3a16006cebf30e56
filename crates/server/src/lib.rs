//! Server crate for the StreamRecs recommendation engine.
//!
//! This crate contains the orchestrator that coordinates all components
//! of the recommendation pipeline, the engine configuration, and the
//! caller-visible error taxonomy.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::{ConfigError, EngineConfig};
pub use error::RecommendError;
pub use orchestrator::{
    RecommendRequest, RecommendationOrchestrator, Recommendations, RequestDiagnostics,
    StreamRecommendation,
};
