//! Explanations for nitrogen fixation and soil pH

use super::{is_low_confidence, risk_severity};
use crate::explanation::types::{name_list, Explanation, Severity};
use crate::metrics::MetricId;
use crate::scorer::{GuildWarning, ScoredGuild};

pub fn explain_soil(scored: &ScoredGuild) -> Vec<Explanation> {
    let details = &scored.details;
    let mut out = Vec::new();

    if let Some(severity) = risk_severity(scored, MetricId::N5) {
        let rationale = match details.n5.fixers.as_slice() {
            [] => "No member fixes nitrogen; the guild depends on added fertility.".to_string(),
            [only] => format!("{} is the only nitrogen fixer.", only),
            fixers => format!("Nitrogen fixers: {}.", name_list(fixers)),
        };
        out.push(
            Explanation::new(Some(MetricId::N5), severity, "Nitrogen deficit", rationale)
                .with_organisms(details.n5.fixers.clone())
                .low_confidence(is_low_confidence(scored, MetricId::N5)),
        );
    }

    let over_fixation = scored
        .warnings
        .iter()
        .any(|w| matches!(w, GuildWarning::OverFixation { .. }));
    if over_fixation {
        out.push(
            Explanation::new(
                Some(MetricId::N5),
                Severity::Warning,
                "Too many nitrogen fixers",
                format!(
                    "{} fixers may over-fertilize and favour weeds: {}.",
                    details.n5.fixers.len(),
                    name_list(&details.n5.fixers)
                ),
            )
            .with_organisms(details.n5.fixers.clone()),
        );
    }

    // An incompatible pH span is at least a warning, whatever its percentile
    let ph_incompatible = scored
        .warnings
        .iter()
        .any(|w| matches!(w, GuildWarning::PhIncompatible { .. }));
    let risk = risk_severity(scored, MetricId::N6);
    let severity = if ph_incompatible {
        risk.max(Some(Severity::Warning))
    } else {
        risk
    };
    if let (Some(severity), Some(min), Some(max)) = (severity, details.n6.ph_min, details.n6.ph_max) {
        out.push(
            Explanation::new(
                Some(MetricId::N6),
                severity,
                "Soil pH mismatch",
                format!(
                    "Preferred surface pH ranges from {:.1} to {:.1} ({:.1} units).",
                    min, max, details.n6.range
                ),
            )
            .low_confidence(is_low_confidence(scored, MetricId::N6)),
        );
    }

    out
}
