//! Guild scorer - main coordinator for scoring guilds
//!
//! Owns the immutable inputs of a scoring process: the loaded tables and one
//! calibration version, both behind `Arc` so worker threads share them without
//! locking. Replacing the calibration is an explicit reload through
//! `with_calibration`, which yields a new scorer and leaves the old one intact.

use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::calibration::{normalize_scores, CalibrationError, CalibrationSet};
use crate::climate::{check_climate, ClimateCheck, ClimateTier, VetoReport};
use crate::composer::{compose, ScoreWeights};
use crate::config::{EngineConfig, GuildLimits, MetricConstants};
use crate::data::GuildData;
use crate::error::ScoringError;
use crate::guild::Guild;
use crate::metrics::{self, MetricId, MetricMap, RawScores};

/// Outcome of scoring one guild. Climate incompatibility is a result, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GuildScoreResult {
    Veto(VetoReport),
    Scored(ScoredGuild),
}

impl GuildScoreResult {
    pub fn is_veto(&self) -> bool {
        matches!(self, GuildScoreResult::Veto(_))
    }

    pub fn scored(&self) -> Option<&ScoredGuild> {
        match self {
            GuildScoreResult::Scored(scored) => Some(scored),
            GuildScoreResult::Veto(_) => None,
        }
    }

    pub fn guild_score(&self) -> Option<f64> {
        self.scored().map(|s| s.guild_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGuild {
    /// Member ids, sorted
    pub members: Vec<String>,
    pub calibration_tier: ClimateTier,
    pub calibration_version: String,
    pub guild_score: f64,
    pub negative_risk: f64,
    pub positive_benefit: f64,
    pub per_metric_raw: MetricMap,
    pub per_metric_normalized: MetricMap,
    pub warnings: Vec<GuildWarning>,
    /// Metrics whose inputs were absent for every member
    pub low_confidence: Vec<MetricId>,
    pub details: RawScores,
}

/// Conditions worth surfacing that do not change the score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GuildWarning {
    /// More than two nitrogen fixers
    OverFixation { fixers: usize },
    /// Member pH preferences span more than 2.5 units
    PhIncompatible { range: f64 },
    /// P3 was halved because N1 is already high
    P3Dampened,
    /// The loaded tables differ from the data the calibration was drawn from
    CalibrationDrift { calibrated: String, current: String },
}

impl GuildWarning {
    pub fn code(&self) -> &'static str {
        match self {
            GuildWarning::OverFixation { .. } => "over-fixation",
            GuildWarning::PhIncompatible { .. } => "ph-incompatible",
            GuildWarning::P3Dampened => "p3-dampened",
            GuildWarning::CalibrationDrift { .. } => "calibration-drift",
        }
    }
}

pub struct GuildScorer {
    data: Arc<GuildData>,
    calibration: Arc<CalibrationSet>,
    limits: GuildLimits,
    weights: ScoreWeights,
    constants: MetricConstants,
    /// Current data fingerprint when it differs from the calibration's
    drift: Option<String>,
}

impl GuildScorer {
    /// Fails when the calibration was sampled with other metric constants;
    /// changed input data only raises a drift warning.
    pub fn new(
        data: Arc<GuildData>,
        calibration: Arc<CalibrationSet>,
        config: &EngineConfig,
    ) -> Result<Self, CalibrationError> {
        calibration.check_constants(&config.constants)?;
        let drift = detect_drift(&data, &calibration);
        Ok(Self {
            data,
            calibration,
            limits: config.guild,
            weights: config.weights.clone(),
            constants: config.constants.clone(),
            drift,
        })
    }

    /// Scorer over the same data with a different calibration version
    pub fn with_calibration(&self, calibration: Arc<CalibrationSet>) -> Result<Self, CalibrationError> {
        calibration.check_constants(&self.constants)?;
        Ok(Self {
            drift: detect_drift(&self.data, &calibration),
            data: Arc::clone(&self.data),
            calibration,
            limits: self.limits,
            weights: self.weights.clone(),
            constants: self.constants.clone(),
        })
    }

    pub fn data(&self) -> &GuildData {
        &self.data
    }

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    pub fn calibration_drift(&self) -> bool {
        self.drift.is_some()
    }

    /// Score one guild against the named calibration profile.
    ///
    /// Checks run in a fixed order and the first failure wins: guild input,
    /// profile, climate veto, tier table; only then are metrics computed.
    pub fn score_guild<S: AsRef<str>>(
        &self,
        species_ids: &[S],
        profile: &str,
    ) -> Result<GuildScoreResult, ScoringError> {
        let guild = Guild::resolve(species_ids, &self.data, &self.limits)?;

        let calibration_profile = self.calibration.profile(profile)?;
        if calibration_profile.guild_size != guild.len() {
            return Err(ScoringError::GuildSizeMismatch {
                profile: profile.to_string(),
                expected: calibration_profile.guild_size,
                actual: guild.len(),
            });
        }

        let tier = match check_climate(guild.members(), self.data.organizer()) {
            ClimateCheck::Compatible { calibration_tier, .. } => calibration_tier,
            ClimateCheck::Veto(report) => {
                debug!(outliers = ?report.outlier_species, "Guild vetoed");
                return Ok(GuildScoreResult::Veto(report));
            }
        };
        let table = calibration_profile.table(profile, tier)?;

        let details = self.compute_raw_scores(&guild);
        let per_metric_raw = details.values();
        let per_metric_normalized = normalize_scores(&per_metric_raw, table)?;
        let composed = compose(&per_metric_normalized, &self.weights);

        Ok(GuildScoreResult::Scored(ScoredGuild {
            members: guild.member_ids(),
            calibration_tier: tier,
            calibration_version: self.calibration.version.clone(),
            guild_score: composed.guild_score,
            negative_risk: composed.negative_risk,
            positive_benefit: composed.positive_benefit,
            per_metric_raw,
            per_metric_normalized,
            warnings: self.warnings(&details),
            low_confidence: details.low_confidence(),
            details,
        }))
    }

    /// Score independent requests in parallel; results keep request order.
    pub fn score_guilds(
        &self,
        requests: &[Vec<String>],
        profile: &str,
    ) -> Vec<Result<GuildScoreResult, ScoringError>> {
        requests
            .par_iter()
            .map(|ids| self.score_guild(ids.as_slice(), profile))
            .collect()
    }

    pub fn compute_raw_scores(&self, guild: &Guild<'_>) -> RawScores {
        metrics::compute_raw_scores(guild, self.data.relationships(), &self.constants)
    }

    fn warnings(&self, details: &RawScores) -> Vec<GuildWarning> {
        let mut warnings = Vec::new();
        if details.n5.over_fixation {
            warnings.push(GuildWarning::OverFixation {
                fixers: details.n5.fixers.len(),
            });
        }
        if details.n6.range > metrics::n6_soil_ph::INCOMPATIBLE_ABOVE {
            warnings.push(GuildWarning::PhIncompatible {
                range: details.n6.range,
            });
        }
        if details.p3.dampened {
            warnings.push(GuildWarning::P3Dampened);
        }
        if let Some(current) = &self.drift {
            warnings.push(GuildWarning::CalibrationDrift {
                calibrated: self.calibration.data_fingerprint.clone(),
                current: current.clone(),
            });
        }
        warnings
    }
}

fn detect_drift(data: &GuildData, calibration: &CalibrationSet) -> Option<String> {
    let current = data.fingerprint();
    if current == calibration.data_fingerprint {
        return None;
    }
    warn!(
        version = %calibration.version,
        calibrated = %calibration.data_fingerprint,
        current = %current,
        "Input tables changed since calibration; re-run calibration"
    );
    Some(current)
}
