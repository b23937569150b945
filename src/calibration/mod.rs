//! Tier-stratified percentile calibration
//!
//! Offline, random same-tier guilds are scored to build an empirical
//! percentile table per (guild size, climate tier, metric). At scoring time
//! each raw metric is ranked against its tier's table.
//!
//! Tables are versioned artifacts tied to the metric formulas that produced
//! them. A set is published under a new version and only becomes visible to
//! scorers once explicitly promoted.

pub mod calibrator;
pub mod normalizer;
pub mod store;
pub mod table;

pub use calibrator::Calibrator;
pub use normalizer::normalize_scores;
pub use store::CalibrationStore;
pub use table::{
    profile_name, CalibrationProfile, CalibrationSet, CalibrationTable, PercentileTable,
    PERCENTILE_POINTS,
};

use thiserror::Error;

/// Bump whenever any metric formula or the artifact layout changes; tables
/// generated under another version are refused at load. Tunable constants
/// are recorded in each set and checked separately.
pub const FORMULA_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("calibration was generated for formula version {found}, engine is at {expected}; re-run calibration")]
    StaleFormula { found: u32, expected: u32 },

    #[error("percentile table for {metric} in tier {tier} is not monotonic")]
    NonMonotonic { tier: String, metric: String },

    #[error("percentile table for {metric} in tier {tier} has {found} points, expected {expected}")]
    WrongLength {
        tier: String,
        metric: String,
        found: usize,
        expected: usize,
    },

    #[error("calibration was sampled with different metric constants ({}); re-run calibration", .fields.join(", "))]
    ConstantsMismatch { fields: Vec<String> },

    #[error("'{0}' is not a calibration version id")]
    InvalidVersion(String),

    #[error("no calibration version has been promoted")]
    NoCurrentVersion,

    #[error("calibration version '{0}' has not been published")]
    UnknownVersion(String),
}
