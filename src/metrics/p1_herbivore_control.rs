//! METRIC P1: CROSS-SPECIES HERBIVORE CONTROL
//!
//! Indirect benefit: a predator (or entomopathogenic fungus) hosted by one
//! member attacks the herbivores of another. For every ordered pair
//! (vulnerable A, protector B):
//!   1.0  B hosts an agent recorded as attacking one of A's herbivores
//!   0.2  B hosts entomopathogenic fungi, none linked to A's herbivores
//!
//! Raw = Σ pair weight / n·(n-1), in [0, 1].

use serde::Serialize;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::types::{FungalRole, OrganismProfile, RelationshipTables};

/// A specific protective link found for one ordered pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlMatch {
    /// Member whose pest or pathogen is controlled
    pub protected: String,
    /// Member hosting the control agent
    pub protector: String,
    /// The pest or pathogen
    pub target: String,
    pub agent: String,
}

/// Result of P1 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct P1Result {
    pub raw: f64,
    /// Ordered pairs with a specific match
    pub specific_pairs: usize,
    /// Ordered pairs earning general-agent credit only
    pub general_pairs: usize,
    /// First specific match per ordered pair
    pub matches: Vec<ControlMatch>,
    pub data_available: bool,
}

pub fn calculate_p1(
    guild: &Guild<'_>,
    relationships: &RelationshipTables,
    constants: &MetricConstants,
) -> P1Result {
    let members = guild.members();
    let profiles = guild.profiles();

    let mut total = 0.0;
    let mut specific_pairs = 0;
    let mut general_pairs = 0;
    let mut matches = Vec::new();

    for (i, vulnerable) in profiles.iter().enumerate() {
        if vulnerable.herbivores.is_empty() {
            continue;
        }
        for (j, protector) in profiles.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some((target, agent)) = specific_herbivore_match(vulnerable, protector, relationships) {
                total += 1.0;
                specific_pairs += 1;
                matches.push(ControlMatch {
                    protected: members[i].id.clone(),
                    protector: members[j].id.clone(),
                    target: target.to_string(),
                    agent: agent.to_string(),
                });
            } else if protector.has_fungus_role(FungalRole::Entomopathogenic) {
                total += constants.general_agent_credit;
                general_pairs += 1;
            }
        }
    }

    let pairs = guild.ordered_pairs();
    P1Result {
        raw: if pairs > 0 { total / pairs as f64 } else { 0.0 },
        specific_pairs,
        general_pairs,
        matches,
        data_available: profiles.iter().any(|p| !p.herbivores.is_empty()),
    }
}

/// First (herbivore, agent) where `protector` hosts a predator or
/// entomopathogen recorded against one of `vulnerable`'s herbivores
fn specific_herbivore_match<'p>(
    vulnerable: &'p OrganismProfile,
    protector: &'p OrganismProfile,
    relationships: &RelationshipTables,
) -> Option<(&'p str, &'p str)> {
    for herbivore in &vulnerable.herbivores {
        if let Some(predators) = relationships.herbivore_predators.get(herbivore) {
            if let Some(agent) = protector.predators.iter().find(|p| predators.contains(*p)) {
                return Some((herbivore.as_str(), agent.as_str()));
            }
        }
        if let Some(parasites) = relationships.insect_parasites.get(herbivore) {
            if let Some(agent) = protector
                .fungi_with(FungalRole::Entomopathogenic)
                .find(|f| parasites.contains(*f))
            {
                return Some((herbivore.as_str(), agent));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpeciesRecord;
    use approx::assert_relative_eq;
    use rustc_hash::FxHashSet;

    fn relationships() -> RelationshipTables {
        let mut tables = RelationshipTables::default();
        tables.herbivore_predators.insert(
            "Aphis fabae".into(),
            ["Coccinella septempunctata".to_string()].into_iter().collect::<FxHashSet<_>>(),
        );
        tables.insect_parasites.insert(
            "Pieris rapae".into(),
            ["Beauveria bassiana".to_string()].into_iter().collect::<FxHashSet<_>>(),
        );
        tables
    }

    #[test]
    fn test_specific_predator_and_parasite_matches() {
        let records: Vec<SpeciesRecord> = ["a", "b", "c"].into_iter().map(SpeciesRecord::new).collect();
        let mut profiles = vec![OrganismProfile::default(); 3];
        profiles[0].herbivores.insert("Aphis fabae".into());
        profiles[1].predators.insert("Coccinella septempunctata".into());
        profiles[2].herbivores.insert("Pieris rapae".into());
        profiles[1].add_fungus("Beauveria bassiana", FungalRole::Entomopathogenic);

        let guild = Guild::from_records(records.iter().zip(profiles.iter()).collect());
        let result = calculate_p1(&guild, &relationships(), &MetricConstants::default());

        // (a←b) specific, (c←b) specific, (a←c) none, (c←a) none
        assert_eq!(result.specific_pairs, 2);
        assert_eq!(result.general_pairs, 0);
        assert_relative_eq!(result.raw, 2.0 / 6.0, epsilon = 1e-12);
        assert_eq!(result.matches[0].protected, "a");
        assert_eq!(result.matches[0].agent, "Coccinella septempunctata");
        assert_eq!(result.matches[1].agent, "Beauveria bassiana");
    }

    #[test]
    fn test_general_entomopathogen_credit() {
        let records: Vec<SpeciesRecord> = ["a", "b"].into_iter().map(SpeciesRecord::new).collect();
        let mut profiles = vec![OrganismProfile::default(); 2];
        profiles[0].herbivores.insert("Popillia japonica".into());
        profiles[1].add_fungus("Metarhizium anisopliae", FungalRole::Entomopathogenic);

        let guild = Guild::from_records(records.iter().zip(profiles.iter()).collect());
        let result = calculate_p1(&guild, &relationships(), &MetricConstants::default());

        assert_eq!(result.general_pairs, 1);
        assert_relative_eq!(result.raw, 0.2 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_herbivores_is_low_confidence() {
        let records: Vec<SpeciesRecord> = ["a", "b"].into_iter().map(SpeciesRecord::new).collect();
        let profiles = vec![OrganismProfile::default(); 2];
        let guild = Guild::from_records(records.iter().zip(profiles.iter()).collect());

        let result = calculate_p1(&guild, &relationships(), &MetricConstants::default());
        assert_relative_eq!(result.raw, 0.0);
        assert!(!result.data_available);
    }
}
