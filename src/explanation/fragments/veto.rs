//! Guild-wide explanations

use crate::climate::VetoReport;
use crate::explanation::types::{name_list, Explanation, Severity};
use crate::scorer::{GuildWarning, ScoredGuild};

pub fn explain_veto(report: &VetoReport) -> Explanation {
    let rationale = match report.majority_tier {
        Some(tier) => format!(
            "Members share no climate tier. Most belong to {}; outside it: {}.",
            tier.label(),
            name_list(&report.outlier_species)
        ),
        None => "No member has a recorded climate tier.".to_string(),
    };
    Explanation::new(None, Severity::Critical, "Climate incompatible", rationale)
        .with_organisms(report.outlier_species.clone())
}

pub fn explain_drift(scored: &ScoredGuild) -> Option<Explanation> {
    scored.warnings.iter().find_map(|w| match w {
        GuildWarning::CalibrationDrift { .. } => Some(Explanation::new(
            None,
            Severity::Warning,
            "Calibration out of date",
            format!(
                "Input tables changed after calibration {} was generated; percentiles may be off.",
                scored.calibration_version
            ),
        )),
        _ => None,
    })
}
