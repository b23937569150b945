//! METRIC P2: CROSS-SPECIES PATHOGEN CONTROL
//!
//! Mirror of P1 for disease. For every ordered pair (vulnerable A,
//! protector B), A carrying pathogens:
//!   1.0  B hosts a mycoparasite or fungivore recorded as antagonist of one
//!        of A's pathogens
//!   otherwise general credit: 0.2 if B hosts any mycoparasitic fungus,
//!   a further 0.2 if B hosts any fungivore (pair total capped at 1.0)
//!
//! Raw = Σ pair weight / n·(n-1), in [0, 1].

use serde::Serialize;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::types::{FungalRole, OrganismProfile, RelationshipTables};

pub use super::p1_herbivore_control::ControlMatch;

/// Result of P2 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct P2Result {
    pub raw: f64,
    pub specific_pairs: usize,
    pub general_pairs: usize,
    pub matches: Vec<ControlMatch>,
    pub data_available: bool,
}

pub fn calculate_p2(
    guild: &Guild<'_>,
    relationships: &RelationshipTables,
    constants: &MetricConstants,
) -> P2Result {
    let members = guild.members();
    let profiles = guild.profiles();

    let mut total = 0.0;
    let mut specific_pairs = 0;
    let mut general_pairs = 0;
    let mut matches = Vec::new();

    for (i, vulnerable) in profiles.iter().enumerate() {
        if vulnerable.pathogens().next().is_none() {
            continue;
        }
        for (j, protector) in profiles.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some((target, agent)) = specific_antagonist_match(vulnerable, protector, relationships) {
                total += 1.0;
                specific_pairs += 1;
                matches.push(ControlMatch {
                    protected: members[i].id.clone(),
                    protector: members[j].id.clone(),
                    target: target.to_string(),
                    agent: agent.to_string(),
                });
                continue;
            }

            let mut credit = 0.0;
            if protector.has_fungus_role(FungalRole::Mycoparasite) {
                credit += constants.general_agent_credit;
            }
            if !protector.fungivores.is_empty() {
                credit += constants.general_agent_credit;
            }
            if credit > 0.0 {
                total += credit.min(1.0);
                general_pairs += 1;
            }
        }
    }

    let pairs = guild.ordered_pairs();
    P2Result {
        raw: if pairs > 0 { total / pairs as f64 } else { 0.0 },
        specific_pairs,
        general_pairs,
        matches,
        data_available: profiles.iter().any(|p| p.pathogens().next().is_some()),
    }
}

fn specific_antagonist_match<'p>(
    vulnerable: &'p OrganismProfile,
    protector: &'p OrganismProfile,
    relationships: &RelationshipTables,
) -> Option<(&'p str, &'p str)> {
    for pathogen in vulnerable.pathogens() {
        let Some(antagonists) = relationships.pathogen_antagonists.get(pathogen) else {
            continue;
        };
        let agent = protector
            .fungi_with(FungalRole::Mycoparasite)
            .chain(protector.fungivores.iter().map(String::as_str))
            .find(|a| antagonists.contains(*a));
        if let Some(agent) = agent {
            return Some((pathogen, agent));
        }
    }
    None
}
