//! Metric modules for guild scoring
//!
//! Eleven independent metrics, each a pure function of the resolved guild:
//! - risks: N1 shared pathogens, N2 shared herbivores, N4 CSR conflict,
//!   N5 nitrogen-fixation deficit, N6 soil pH incompatibility
//! - benefits: P1 herbivore control, P2 pathogen control, P3 shared
//!   beneficial fungi, P4 phylogenetic diversity, P5 stratification,
//!   P6 shared pollinators
//!
//! Every metric aggregates at guild level (shared organisms, conflicts per
//! pair count). None of them averages pairwise compatibility.

pub mod n1_shared_pathogens;
pub mod n2_shared_herbivores;
pub mod n4_csr_conflict;
pub mod n5_nitrogen;
pub mod n6_soil_ph;
pub mod p1_herbivore_control;
pub mod p2_pathogen_control;
pub mod p3_beneficial_fungi;
pub mod p4_phylo_diversity;
pub mod p5_stratification;
pub mod p6_pollinators;

// Re-export metric functions
pub use n1_shared_pathogens::{calculate_n1, N1Result};
pub use n2_shared_herbivores::{calculate_n2, N2Result};
pub use n4_csr_conflict::{calculate_n4, ConflictKind, N4Result, StrategyConflict};
pub use n5_nitrogen::{calculate_n5, N5Result};
pub use n6_soil_ph::{calculate_n6, N6Result};
pub use p1_herbivore_control::{calculate_p1, P1Result};
pub use p2_pathogen_control::{calculate_p2, P2Result};
pub use p3_beneficial_fungi::{calculate_p3, P3Result};
pub use p4_phylo_diversity::{calculate_p4, P4Result};
pub use p5_stratification::{calculate_p5, P5Result};
pub use p6_pollinators::{calculate_p6, P6Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::MetricConstants;
use crate::guild::Guild;
use crate::types::RelationshipTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricId {
    N1,
    N2,
    N4,
    N5,
    N6,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
}

impl MetricId {
    pub const ALL: [MetricId; 11] = [
        MetricId::N1,
        MetricId::N2,
        MetricId::N4,
        MetricId::N5,
        MetricId::N6,
        MetricId::P1,
        MetricId::P2,
        MetricId::P3,
        MetricId::P4,
        MetricId::P5,
        MetricId::P6,
    ];

    pub const RISKS: [MetricId; 5] = [
        MetricId::N1,
        MetricId::N2,
        MetricId::N4,
        MetricId::N5,
        MetricId::N6,
    ];

    pub const BENEFITS: [MetricId; 6] = [
        MetricId::P1,
        MetricId::P2,
        MetricId::P3,
        MetricId::P4,
        MetricId::P5,
        MetricId::P6,
    ];

    pub fn is_risk(self) -> bool {
        Self::RISKS.contains(&self)
    }

    pub fn key(self) -> &'static str {
        match self {
            MetricId::N1 => "n1",
            MetricId::N2 => "n2",
            MetricId::N4 => "n4",
            MetricId::N5 => "n5",
            MetricId::N6 => "n6",
            MetricId::P1 => "p1",
            MetricId::P2 => "p2",
            MetricId::P3 => "p3",
            MetricId::P4 => "p4",
            MetricId::P5 => "p5",
            MetricId::P6 => "p6",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricId::N1 => "Shared pathogens",
            MetricId::N2 => "Shared herbivores",
            MetricId::N4 => "Growth strategy conflict",
            MetricId::N5 => "Nitrogen fixation",
            MetricId::N6 => "Soil pH compatibility",
            MetricId::P1 => "Natural pest control",
            MetricId::P2 => "Natural disease control",
            MetricId::P3 => "Beneficial fungi network",
            MetricId::P4 => "Phylogenetic diversity",
            MetricId::P5 => "Vertical stratification",
            MetricId::P6 => "Pollinator support",
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub type MetricMap = BTreeMap<MetricId, f64>;

/// Raw results of all eleven metrics (unnormalized), with their details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawScores {
    pub n1: N1Result,
    pub n2: N2Result,
    pub n4: N4Result,
    pub n5: N5Result,
    pub n6: N6Result,
    pub p1: P1Result,
    pub p2: P2Result,
    pub p3: P3Result,
    pub p4: P4Result,
    pub p5: P5Result,
    pub p6: P6Result,
}

impl RawScores {
    pub fn raw(&self, metric: MetricId) -> f64 {
        match metric {
            MetricId::N1 => self.n1.raw,
            MetricId::N2 => self.n2.raw,
            MetricId::N4 => self.n4.raw,
            MetricId::N5 => self.n5.raw,
            MetricId::N6 => self.n6.raw,
            MetricId::P1 => self.p1.raw,
            MetricId::P2 => self.p2.raw,
            MetricId::P3 => self.p3.raw,
            MetricId::P4 => self.p4.raw,
            MetricId::P5 => self.p5.raw,
            MetricId::P6 => self.p6.raw,
        }
    }

    pub fn data_available(&self, metric: MetricId) -> bool {
        match metric {
            MetricId::N1 => self.n1.data_available,
            MetricId::N2 => self.n2.data_available,
            MetricId::N4 => self.n4.data_available,
            MetricId::N5 => self.n5.data_available,
            MetricId::N6 => self.n6.data_available,
            MetricId::P1 => self.p1.data_available,
            MetricId::P2 => self.p2.data_available,
            MetricId::P3 => self.p3.data_available,
            MetricId::P4 => self.p4.data_available,
            MetricId::P5 => self.p5.data_available,
            MetricId::P6 => self.p6.data_available,
        }
    }

    pub fn values(&self) -> MetricMap {
        MetricId::ALL.into_iter().map(|m| (m, self.raw(m))).collect()
    }

    /// Metrics whose inputs were absent for every member
    pub fn low_confidence(&self) -> Vec<MetricId> {
        MetricId::ALL
            .into_iter()
            .filter(|m| !self.data_available(*m))
            .collect()
    }
}

/// Compute every raw metric for a resolved guild
///
/// P3 depends on N1: beneficial fungi are dampened when the guild already
/// shares a devastating pathogen load.
pub fn compute_raw_scores(
    guild: &Guild<'_>,
    relationships: &RelationshipTables,
    constants: &MetricConstants,
) -> RawScores {
    let n1 = calculate_n1(guild, constants);
    let p3 = calculate_p3(guild, constants, n1.raw);

    RawScores {
        n2: calculate_n2(guild, constants),
        n4: calculate_n4(guild),
        n5: calculate_n5(guild),
        n6: calculate_n6(guild),
        p1: calculate_p1(guild, relationships, constants),
        p2: calculate_p2(guild, relationships, constants),
        p4: calculate_p4(guild, constants),
        p5: calculate_p5(guild),
        p6: calculate_p6(guild, constants),
        n1,
        p3,
    }
}
