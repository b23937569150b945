//! METRIC N4: CSR CONFLICT DENSITY
//!
//! Counts growth-strategy conflicts between dominant-strategy members:
//!   competitor–competitor    1.0
//!   competitor–stress        0.6
//!   competitor–ruderal       0.8
//!   ruderal–ruderal          0.3
//!
//! Each base severity is modulated, never summed as-is:
//! 1. Growth form: vine+tree ×0.2 (climbing is complementary), tree+herb ×0.4
//! 2. Otherwise height separation: <2m ×1.0, 2–5m ×0.6, >5m ×0.3
//! 3. Competitor–stress pairs only, stress-tolerator light preference:
//!    <3.2 ×0.0 (wants the competitor's shade), >7.47 ×1.5 (will be shaded out)
//!
//! Raw = Σ modulated severity / unordered pairs, clamped at ≥0.

use serde::Serialize;

use crate::guild::Guild;
use crate::types::{CsrStrategy, GrowthForm, SpeciesRecord};

pub const SHADE_ADAPTED_BELOW: f64 = 3.2;
pub const SUN_LOVING_ABOVE: f64 = 7.47;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    CompetitorCompetitor,
    CompetitorStress,
    CompetitorRuderal,
    RuderalRuderal,
}

impl ConflictKind {
    pub fn base_severity(self) -> f64 {
        match self {
            ConflictKind::CompetitorCompetitor => 1.0,
            ConflictKind::CompetitorStress => 0.6,
            ConflictKind::CompetitorRuderal => 0.8,
            ConflictKind::RuderalRuderal => 0.3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConflictKind::CompetitorCompetitor => "C-C",
            ConflictKind::CompetitorStress => "C-S",
            ConflictKind::CompetitorRuderal => "C-R",
            ConflictKind::RuderalRuderal => "R-R",
        }
    }
}

/// One conflicting pair. For mixed kinds `first` is the competitor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyConflict {
    pub first: String,
    pub second: String,
    pub kind: ConflictKind,
    pub severity: f64,
}

/// Result of N4 calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N4Result {
    pub raw: f64,
    pub total_severity: f64,
    /// Pairs with non-zero modulated severity
    pub conflicts: Vec<StrategyConflict>,
    pub data_available: bool,
}

pub fn calculate_n4(guild: &Guild<'_>) -> N4Result {
    let members = guild.members();
    let mut total_severity = 0.0;
    let mut conflicts = Vec::new();

    for i in 0..members.len() {
        for j in i + 1..members.len() {
            if let Some(conflict) = pair_conflict(members[i], members[j]) {
                total_severity += conflict.severity;
                if conflict.severity > 0.0 {
                    conflicts.push(conflict);
                }
            }
        }
    }

    let pairs = guild.unordered_pairs();
    let raw = if pairs > 0 {
        (total_severity / pairs as f64).max(0.0)
    } else {
        0.0
    };

    N4Result {
        raw,
        total_severity,
        conflicts,
        data_available: members.iter().any(|m| m.csr.is_some()),
    }
}

/// Modulated conflict between two members, `None` when their strategies
/// do not conflict (or CSR is missing)
pub fn pair_conflict(a: &SpeciesRecord, b: &SpeciesRecord) -> Option<StrategyConflict> {
    use CsrStrategy::*;

    let sa = a.csr?.dominant()?;
    let sb = b.csr?.dominant()?;

    // Orient mixed pairs so the competitor comes first
    let (first, second, kind) = match (sa, sb) {
        (Competitor, Competitor) => (a, b, ConflictKind::CompetitorCompetitor),
        (Competitor, StressTolerator) => (a, b, ConflictKind::CompetitorStress),
        (StressTolerator, Competitor) => (b, a, ConflictKind::CompetitorStress),
        (Competitor, Ruderal) => (a, b, ConflictKind::CompetitorRuderal),
        (Ruderal, Competitor) => (b, a, ConflictKind::CompetitorRuderal),
        (Ruderal, Ruderal) => (a, b, ConflictKind::RuderalRuderal),
        _ => return None,
    };

    let mut severity = kind.base_severity() * structural_modulation(first, second);
    if kind == ConflictKind::CompetitorStress {
        severity *= light_modulation(second.light_pref);
    }

    Some(StrategyConflict {
        first: first.id.clone(),
        second: second.id.clone(),
        kind,
        severity,
    })
}

/// Growth-form complementarity, falling back to height separation
pub fn structural_modulation(a: &SpeciesRecord, b: &SpeciesRecord) -> f64 {
    use GrowthForm::*;

    match (a.growth_form, b.growth_form) {
        (Vine, Tree) | (Tree, Vine) => 0.2,
        (Tree, Herb) | (Herb, Tree) => 0.4,
        _ => height_modulation(a.height_m, b.height_m),
    }
}

/// Same canopy layer conflicts fully; missing heights are treated as equal
pub fn height_modulation(a: Option<f64>, b: Option<f64>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 1.0;
    };
    let diff = (a - b).abs();
    if diff < 2.0 {
        1.0
    } else if diff <= 5.0 {
        0.6
    } else {
        0.3
    }
}

/// Stress-tolerator light preference factor for competitor–stress pairs
pub fn light_modulation(light_pref: Option<f64>) -> f64 {
    match light_pref {
        Some(light) if light < SHADE_ADAPTED_BELOW => 0.0,
        Some(light) if light > SUN_LOVING_ABOVE => 1.5,
        _ => 1.0,
    }
}
