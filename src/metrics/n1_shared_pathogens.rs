//! METRIC N1: SHARED PATHOGENS
//!
//! Penalizes pathogens (fungal and other) carried by two or more members.
//! The penalty grows with the square of the overlap fraction: one pathogen
//! on every member is a single outbreak able to take out the whole guild,
//! far worse than the same pathogen on two members.
//!
//! Host-specific pathogens carry full severity; generalists are discounted.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::types::OrganismProfile;
use crate::utils::{count_shared_organisms, saturate, shared_organisms, SharedOrganism};

/// Result of N1 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N1Result {
    /// tanh-saturated penalty in [0, 1)
    pub raw: f64,
    /// Penalty before saturation
    pub penalty: f64,
    /// Pathogens on ≥2 members, most widely shared first
    pub shared: Vec<SharedOrganism>,
    /// Subset of `shared` recorded as host-specific
    pub host_specific_shared: Vec<String>,
    pub data_available: bool,
}

pub fn calculate_n1(guild: &Guild<'_>, constants: &MetricConstants) -> N1Result {
    let n = guild.len() as f64;
    let counts = count_shared_organisms(guild.profiles(), OrganismProfile::pathogens);

    let host_specific: FxHashSet<&str> = guild
        .profiles()
        .iter()
        .flat_map(|p| p.host_specific_pathogens.iter().map(String::as_str))
        .collect();

    let shared = shared_organisms(&counts, 2);
    let mut penalty = 0.0;
    let mut host_specific_shared = Vec::new();

    for organism in &shared {
        let overlap = organism.count as f64 / n;
        let severity = if host_specific.contains(organism.name.as_str()) {
            host_specific_shared.push(organism.name.clone());
            constants.host_specific_severity
        } else {
            constants.generalist_severity
        };
        penalty += overlap * overlap * severity;
    }

    N1Result {
        raw: saturate(penalty, constants.n1_scale),
        penalty,
        shared,
        host_specific_shared,
        data_available: !counts.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FungalRole, SpeciesRecord};
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_overlap_with_severity() {
        let records: Vec<SpeciesRecord> = ["a", "b", "c"].into_iter().map(SpeciesRecord::new).collect();
        let mut profiles = vec![OrganismProfile::default(); 3];
        for p in profiles.iter_mut() {
            p.add_fungus("Puccinia", FungalRole::Pathogenic);
        }
        profiles[0].host_specific_pathogens.insert("Puccinia".into());
        profiles[0].pathogens_other.insert("Xanthomonas".into());
        profiles[1].pathogens_other.insert("Xanthomonas".into());
        profiles[2].pathogens_other.insert("Ralstonia".into());

        let guild = Guild::from_records(records.iter().zip(profiles.iter()).collect());
        let result = calculate_n1(&guild, &MetricConstants::default());

        // Puccinia: (3/3)² × 1.0, Xanthomonas: (2/3)² × 0.6
        let expected = 1.0 + (4.0 / 9.0) * 0.6;
        assert_relative_eq!(result.penalty, expected, epsilon = 1e-12);
        assert_relative_eq!(result.raw, (expected / 8.0).tanh(), epsilon = 1e-12);
        assert_eq!(result.shared.len(), 2);
        assert_eq!(result.shared[0].name, "Puccinia");
        assert_eq!(result.host_specific_shared, vec!["Puccinia"]);
        assert!(result.data_available);
    }

    #[test]
    fn test_no_pathogens_is_zero_and_flagged() {
        let records: Vec<SpeciesRecord> = ["a", "b"].into_iter().map(SpeciesRecord::new).collect();
        let profiles = vec![OrganismProfile::default(); 2];
        let guild = Guild::from_records(records.iter().zip(profiles.iter()).collect());

        let result = calculate_n1(&guild, &MetricConstants::default());
        assert_relative_eq!(result.raw, 0.0);
        assert!(!result.data_available);
    }

    #[test]
    fn test_unshared_pathogens_do_not_penalize() {
        let records: Vec<SpeciesRecord> = ["a", "b"].into_iter().map(SpeciesRecord::new).collect();
        let mut profiles = vec![OrganismProfile::default(); 2];
        profiles[0].add_fungus("Botrytis", FungalRole::Pathogenic);
        profiles[1].add_fungus("Fusarium", FungalRole::Pathogenic);
        let guild = Guild::from_records(records.iter().zip(profiles.iter()).collect());

        let result = calculate_n1(&guild, &MetricConstants::default());
        assert_relative_eq!(result.raw, 0.0);
        assert!(result.shared.is_empty());
        assert!(result.data_available);
    }
}
