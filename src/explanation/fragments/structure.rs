//! Explanations for growth strategy, relatedness and canopy layering

use super::{benefit_level, is_low_confidence, risk_severity, BenefitLevel};
use crate::explanation::types::{name_list, Explanation, Severity, MAX_NAMED};
use crate::metrics::MetricId;
use crate::scorer::ScoredGuild;

pub fn explain_structure(scored: &ScoredGuild) -> Vec<Explanation> {
    let details = &scored.details;
    let mut out = Vec::new();

    if let Some(severity) = risk_severity(scored, MetricId::N4) {
        let pairs: Vec<String> = details
            .n4
            .conflicts
            .iter()
            .map(|c| format!("{} × {} ({}, {:.2})", c.first, c.second, c.kind.label(), c.severity))
            .collect();
        out.push(
            Explanation::new(
                Some(MetricId::N4),
                severity,
                "Competing growth strategies",
                format!(
                    "{} pair(s) compete for the same resources: {}.",
                    pairs.len(),
                    name_list(&pairs)
                ),
            )
            .with_organisms(pairs.into_iter().take(MAX_NAMED).collect())
            .low_confidence(is_low_confidence(scored, MetricId::N4)),
        );
    }

    match benefit_level(scored, MetricId::P4) {
        BenefitLevel::Notable => out.push(Explanation::new(
            Some(MetricId::P4),
            Severity::Informational,
            MetricId::P4.label(),
            format!(
                "Members are distantly related (mean eigenvector distance {:.2} over {} pairs), so they rarely share pests.",
                details.p4.mean_distance, details.p4.pairs
            ),
        )),
        BenefitLevel::Missing => out.push(Explanation::new(
            Some(MetricId::P4),
            Severity::Informational,
            "Closely related members",
            "Members are close relatives and tend to share pests and pathogens.",
        )),
        BenefitLevel::Unremarkable => {}
    }

    match benefit_level(scored, MetricId::P5) {
        BenefitLevel::Notable => out.push(Explanation::new(
            Some(MetricId::P5),
            Severity::Informational,
            MetricId::P5.label(),
            format!(
                "{} growth forms fill separate canopy layers with compatible light needs.",
                details.p5.distinct_forms
            ),
        )),
        BenefitLevel::Missing => {
            let rationale = if details.p5.shaded_out.is_empty() {
                "Members occupy a single canopy layer.".to_string()
            } else {
                format!(
                    "Taller members shade out sun-demanding neighbours: {}.",
                    name_list(&details.p5.shaded_out)
                )
            };
            out.push(
                Explanation::new(Some(MetricId::P5), Severity::Informational, "No vertical layering", rationale)
                    .with_organisms(details.p5.shaded_out.clone()),
            );
        }
        BenefitLevel::Unremarkable => {}
    }

    out
}
