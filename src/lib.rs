//! Guild compatibility scoring engine
//!
//! Scores a proposed set of co-planted species (a guild) from per-species
//! attributes and organism interaction tables:
//! - `climate`: climate tiers and the veto on guilds with no common tier
//! - `metrics/`: eleven independent risk (N*) and benefit (P*) metrics
//! - `calibration/`: tier-stratified percentile tables, built offline and
//!   published as versioned artifacts
//! - `composer`: weighted combination into a score in [-1, 1]
//! - `explanation/`: severity-classed feedback for a scored result
//!
//! Loaded tables and the calibration are immutable once built; a
//! `GuildScorer` can be shared across threads and scores guilds in parallel.

pub mod calibration;
pub mod climate;
pub mod composer;
pub mod config;
pub mod data;
pub mod error;
pub mod explanation;
pub mod guild;
pub mod metrics;
pub mod scorer;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use calibration::{CalibrationSet, CalibrationStore, Calibrator, FORMULA_VERSION};
pub use climate::{ClimateTier, VetoReport};
pub use composer::{ComposedScore, ScoreWeights};
pub use config::EngineConfig;
pub use data::GuildData;
pub use error::ScoringError;
pub use explanation::{explain, Explanation, Severity};
pub use guild::Guild;
pub use metrics::{MetricId, MetricMap, RawScores};
pub use scorer::{GuildScoreResult, GuildScorer, GuildWarning, ScoredGuild};
