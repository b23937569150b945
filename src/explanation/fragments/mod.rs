//! Per-metric explanation fragments
//!
//! Each fragment reads one group of metric details off a scored guild and
//! emits zero or more explanations:
//! - network: organism-sharing metrics (N1, N2, P1, P2, P3, P6)
//! - structure: CSR conflict, phylogenetic diversity, stratification
//! - soil: nitrogen fixation and pH
//! - veto: climate veto and calibration drift

pub mod network;
pub mod soil;
pub mod structure;
pub mod veto;

use super::types::{Explanation, Severity};
use crate::metrics::MetricId;
use crate::scorer::ScoredGuild;

/// Normalized benefit below which a benefit counts as absent
pub const MISSING_BENEFIT_BELOW: f64 = 0.05;
/// Normalized benefit at which a benefit is called out
pub const NOTABLE_BENEFIT_AT: f64 = 0.5;

pub(crate) fn normalized(scored: &ScoredGuild, metric: MetricId) -> f64 {
    scored.per_metric_normalized.get(&metric).copied().unwrap_or(0.0)
}

/// Severity of a risk metric; a zero raw value contributes nothing even
/// when its percentile is above zero
pub(crate) fn risk_severity(scored: &ScoredGuild, metric: MetricId) -> Option<Severity> {
    let raw = scored.per_metric_raw.get(&metric).copied().unwrap_or(0.0);
    if raw <= 0.0 {
        return None;
    }
    Severity::for_risk(normalized(scored, metric))
}

pub(crate) fn is_low_confidence(scored: &ScoredGuild, metric: MetricId) -> bool {
    scored.low_confidence.contains(&metric)
}

/// What a benefit metric's normalized value calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BenefitLevel {
    Notable,
    Missing,
    Unremarkable,
}

pub(crate) fn benefit_level(scored: &ScoredGuild, metric: MetricId) -> BenefitLevel {
    let value = normalized(scored, metric);
    if value >= NOTABLE_BENEFIT_AT {
        BenefitLevel::Notable
    } else if value < MISSING_BENEFIT_BELOW && !is_low_confidence(scored, metric) {
        BenefitLevel::Missing
    } else {
        BenefitLevel::Unremarkable
    }
}

/// Standard note for a metric whose inputs were absent for every member
pub(crate) fn data_gap(metric: MetricId) -> Explanation {
    Explanation::new(
        Some(metric),
        Severity::Informational,
        format!("{}: limited data", metric.label()),
        "No member of this guild has records for this metric, so it was scored as neutral.",
    )
    .low_confidence(true)
}
