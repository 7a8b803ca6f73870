//! Adapters for the external data sources.
//!
//! Each adapter is a thin I/O layer: fetch with retry and timeout, then
//! project the payload into typed records. Transient source failures
//! surface as empty collections so the orchestrator can treat missing data
//! as "skip this task this run".

pub mod advanced_stats;
pub mod client;
pub mod game_log;
pub mod injuries;
pub mod roster;
pub mod schedule;
pub mod stats_api;

pub use client::SourceClient;
