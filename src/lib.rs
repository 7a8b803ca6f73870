//! puckcast: hockey analytics core.
//!
//! A multi-source ingestion pipeline feeding a relational store, a
//! weighted player-scoring prediction engine, and a query router that
//! assembles context for an external text generator.

pub mod config;
pub mod copilot;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod predict;
pub mod progress;
pub mod rag;
pub mod season;
pub mod sources;
pub mod storage;
pub mod teams;

// Re-export commonly used types
pub use config::Config;
pub use copilot::{Copilot, QueryOutcome};
pub use error::{PuckError, Result};
pub use predict::{MatchupPrediction, PlayerPrediction, PredictionEngine};
pub use progress::ProgressLedger;
pub use season::Season;
pub use storage::{StatKind, StatsDatabase};
