//! Explanations for shared-organism metrics

use super::{benefit_level, is_low_confidence, risk_severity, BenefitLevel};
use crate::explanation::types::{name_list, Explanation, Severity, MAX_NAMED};
use crate::metrics::p1_herbivore_control::ControlMatch;
use crate::metrics::MetricId;
use crate::scorer::ScoredGuild;
use crate::utils::SharedOrganism;

pub fn explain_network(scored: &ScoredGuild) -> Vec<Explanation> {
    let details = &scored.details;
    let n = scored.members.len();
    let mut out = Vec::new();

    // N1
    if let Some(severity) = risk_severity(scored, MetricId::N1) {
        let names = organism_names(&details.n1.shared);
        let mut rationale = format!(
            "{} pathogen(s) infect two or more members: {}.",
            details.n1.shared.len(),
            shared_summary(&details.n1.shared, n)
        );
        if !details.n1.host_specific_shared.is_empty() {
            rationale.push_str(&format!(
                " Host-specific: {}.",
                name_list(&details.n1.host_specific_shared)
            ));
        }
        out.push(
            Explanation::new(Some(MetricId::N1), severity, "Shared pathogens", rationale)
                .with_organisms(names)
                .low_confidence(is_low_confidence(scored, MetricId::N1)),
        );
    }

    // N2
    if let Some(severity) = risk_severity(scored, MetricId::N2) {
        out.push(
            Explanation::new(
                Some(MetricId::N2),
                severity,
                "Shared herbivores",
                format!(
                    "{} herbivore(s) feed on two or more members: {}.",
                    details.n2.shared.len(),
                    shared_summary(&details.n2.shared, n)
                ),
            )
            .with_organisms(organism_names(&details.n2.shared))
            .low_confidence(is_low_confidence(scored, MetricId::N2)),
        );
    }

    out.extend(control_note(
        scored,
        MetricId::P1,
        &details.p1.matches,
        details.p1.general_pairs,
        "Predators or parasites hosted by one member target another member's pests",
        "No member hosts predators or parasites of its neighbours' herbivores.",
    ));
    out.extend(control_note(
        scored,
        MetricId::P2,
        &details.p2.matches,
        details.p2.general_pairs,
        "Antagonists hosted by one member suppress another member's pathogens",
        "No member hosts antagonists of its neighbours' pathogens.",
    ));

    out.extend(sharing_note(
        scored,
        MetricId::P3,
        &details.p3.shared,
        "beneficial fungi (mycorrhizal, endophytic or saprotrophic) connect members",
        "Members share no beneficial fungi, so no common fungal network forms.",
    ));
    if details.p3.dampened {
        out.push(Explanation::new(
            Some(MetricId::P3),
            Severity::Informational,
            "Fungal benefit reduced",
            format!(
                "Shared pathogen pressure is high, so the fungal network benefit was halved ({:.2} to {:.2}).",
                details.p3.undampened, details.p3.raw
            ),
        ));
    }
    out.extend(sharing_note(
        scored,
        MetricId::P6,
        &details.p6.shared,
        "pollinators visit two or more members",
        "Members share no pollinators.",
    ));

    out
}

fn organism_names(shared: &[SharedOrganism]) -> Vec<String> {
    shared.iter().take(MAX_NAMED).map(|s| s.name.clone()).collect()
}

/// "a (5/5), b (3/5)" for the most widely shared organisms
fn shared_summary(shared: &[SharedOrganism], n: usize) -> String {
    let items: Vec<String> = shared
        .iter()
        .map(|s| format!("{} ({}/{})", s.name, s.count, n))
        .collect();
    name_list(&items)
}

fn control_note(
    scored: &ScoredGuild,
    metric: MetricId,
    matches: &[ControlMatch],
    general_pairs: usize,
    notable: &str,
    missing: &str,
) -> Option<Explanation> {
    let explanation = match benefit_level(scored, metric) {
        BenefitLevel::Notable => {
            let pairs: Vec<String> = matches
                .iter()
                .map(|m| format!("{} on {} controls {} on {}", m.agent, m.protector, m.target, m.protected))
                .collect();
            let mut rationale = notable.to_string();
            if pairs.is_empty() {
                rationale.push_str(&format!(" ({} pair(s) with general agents only).", general_pairs));
            } else {
                rationale.push_str(&format!(": {}.", name_list(&pairs)));
            }
            let agents = matches.iter().take(MAX_NAMED).map(|m| m.agent.clone()).collect();
            Explanation::new(Some(metric), Severity::Informational, metric.label(), rationale)
                .with_organisms(agents)
        }
        BenefitLevel::Missing => Explanation::new(
            Some(metric),
            Severity::Informational,
            format!("No {}", metric.label().to_lowercase()),
            missing,
        ),
        BenefitLevel::Unremarkable => return None,
    };
    Some(explanation.low_confidence(is_low_confidence(scored, metric)))
}

fn sharing_note(
    scored: &ScoredGuild,
    metric: MetricId,
    shared: &[SharedOrganism],
    notable: &str,
    missing: &str,
) -> Option<Explanation> {
    let explanation = match benefit_level(scored, metric) {
        BenefitLevel::Notable => Explanation::new(
            Some(metric),
            Severity::Informational,
            metric.label(),
            format!(
                "{} {}: {}.",
                shared.len(),
                notable,
                shared_summary(shared, scored.members.len())
            ),
        )
        .with_organisms(organism_names(shared)),
        BenefitLevel::Missing => Explanation::new(
            Some(metric),
            Severity::Informational,
            format!("No {}", metric.label().to_lowercase()),
            missing,
        ),
        BenefitLevel::Unremarkable => return None,
    };
    Some(explanation.low_confidence(is_low_confidence(scored, metric)))
}
