//! Request-level error taxonomy
//!
//! Two classes of failure can end a single scoring request:
//! - malformed guild input (wrong size, duplicates, unknown species), rejected
//!   before any metric runs
//! - calibration mismatch (no profile, wrong guild size, missing tier or metric),
//!   a deployment problem surfaced immediately instead of borrowing a neighbouring
//!   table
//!
//! Neither class is transient, so nothing here is ever retried. Climate
//! incompatibility is not an error at all: it is reported as
//! `GuildScoreResult::Veto`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("guild has {size} species; supported sizes are {min}..={max}")]
    GuildSize { size: usize, min: usize, max: usize },

    #[error("species '{0}' appears more than once in the guild")]
    DuplicateSpecies(String),

    #[error("species '{0}' is not present in the species attribute table")]
    UnknownSpecies(String),

    #[error("no calibration profile named '{0}'")]
    UnknownProfile(String),

    #[error("calibration profile '{profile}' was built for {expected}-species guilds, got {actual}")]
    GuildSizeMismatch {
        profile: String,
        expected: usize,
        actual: usize,
    },

    #[error("calibration profile '{profile}' has no table for tier {tier}")]
    MissingTier { profile: String, tier: String },

    #[error("calibration table for tier {tier} has no percentiles for metric {metric}")]
    MissingMetric { tier: String, metric: String },
}

impl ScoringError {
    /// True for calibration/deployment problems, false for bad guild input.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ScoringError::UnknownProfile(_)
                | ScoringError::GuildSizeMismatch { .. }
                | ScoringError::MissingTier { .. }
                | ScoringError::MissingMetric { .. }
        )
    }

    /// Scoring errors are deterministic, so callers must not retry them.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
