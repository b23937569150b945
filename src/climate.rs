//! Climate tiers and the climate veto
//!
//! Every species belongs to zero or more of six coarse climate tiers. A guild is
//! only scoreable when all of its members share at least one tier; the shared
//! tier with the largest species pool becomes the calibration tier for every
//! percentile lookup that follows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::SpeciesRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClimateTier {
    #[serde(rename = "tier_1_tropical")]
    Tropical,
    #[serde(rename = "tier_2_mediterranean")]
    Mediterranean,
    #[serde(rename = "tier_3_humid_temperate")]
    HumidTemperate,
    #[serde(rename = "tier_4_continental")]
    Continental,
    #[serde(rename = "tier_5_boreal_polar")]
    BorealPolar,
    #[serde(rename = "tier_6_arid")]
    Arid,
}

impl ClimateTier {
    pub const ALL: [ClimateTier; 6] = [
        ClimateTier::Tropical,
        ClimateTier::Mediterranean,
        ClimateTier::HumidTemperate,
        ClimateTier::Continental,
        ClimateTier::BorealPolar,
        ClimateTier::Arid,
    ];

    /// Flag column in the species attribute table
    pub fn column(self) -> &'static str {
        match self {
            ClimateTier::Tropical => "tier_1_tropical",
            ClimateTier::Mediterranean => "tier_2_mediterranean",
            ClimateTier::HumidTemperate => "tier_3_humid_temperate",
            ClimateTier::Continental => "tier_4_continental",
            ClimateTier::BorealPolar => "tier_5_boreal_polar",
            ClimateTier::Arid => "tier_6_arid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClimateTier::Tropical => "tropical",
            ClimateTier::Mediterranean => "mediterranean",
            ClimateTier::HumidTemperate => "humid temperate",
            ClimateTier::Continental => "continental",
            ClimateTier::BorealPolar => "boreal/polar",
            ClimateTier::Arid => "arid",
        }
    }

    /// Accepts the column name (`tier_3_humid_temperate`) or the bare
    /// snake_case tier (`humid_temperate`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|tier| {
            let column = tier.column();
            raw == column || column.splitn(3, '_').nth(2) == Some(raw.as_str())
        })
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ClimateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Non-exclusive tier membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TierSet(u8);

impl TierSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        ClimateTier::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, tier: ClimateTier) {
        self.0 |= tier.bit();
    }

    pub fn contains(self, tier: ClimateTier) -> bool {
        self.0 & tier.bit() != 0
    }

    pub fn intersection(self, other: TierSet) -> TierSet {
        TierSet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Tiers in canonical order
    pub fn iter(self) -> impl Iterator<Item = ClimateTier> {
        ClimateTier::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<ClimateTier> for TierSet {
    fn from_iter<I: IntoIterator<Item = ClimateTier>>(iter: I) -> Self {
        let mut set = TierSet::empty();
        for tier in iter {
            set.insert(tier);
        }
        set
    }
}

/// Species pools per climate tier, used both to break ties when choosing a
/// calibration tier and to draw random guilds during calibration.
#[derive(Debug, Clone, Default)]
pub struct ClimateOrganizer {
    pools: BTreeMap<ClimateTier, Vec<String>>,
}

impl ClimateOrganizer {
    pub fn from_species(species: &[SpeciesRecord]) -> Self {
        let mut pools: BTreeMap<ClimateTier, Vec<String>> = BTreeMap::new();
        for record in species {
            for tier in record.climate_tiers.iter() {
                pools.entry(tier).or_default().push(record.id.clone());
            }
        }
        for ids in pools.values_mut() {
            ids.sort_unstable();
        }
        Self { pools }
    }

    /// Species ids in a tier, sorted
    pub fn pool(&self, tier: ClimateTier) -> &[String] {
        self.pools.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pool_size(&self, tier: ClimateTier) -> usize {
        self.pool(tier).len()
    }

    pub fn summary(&self) -> Vec<(ClimateTier, usize)> {
        ClimateTier::ALL
            .into_iter()
            .map(|tier| (tier, self.pool_size(tier)))
            .collect()
    }
}

/// Structured rejection for a guild with no common climate tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VetoReport {
    pub reason: String,
    /// Members outside the tier most of the guild shares, sorted by id
    pub outlier_species: Vec<String>,
    /// Tier the majority of members share, if any member has a tier at all
    pub majority_tier: Option<ClimateTier>,
    pub member_tiers: BTreeMap<String, Vec<ClimateTier>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClimateCheck {
    Compatible {
        calibration_tier: ClimateTier,
        shared: TierSet,
    },
    Veto(VetoReport),
}

pub const NO_SHARED_TIER: &str = "no shared climate tier";

/// Intersect the members' tier flags.
///
/// Both the veto decision and the outlier list depend only on the member set,
/// never on input order.
pub fn check_climate(members: &[&SpeciesRecord], organizer: &ClimateOrganizer) -> ClimateCheck {
    let shared = members
        .iter()
        .fold(TierSet::all(), |acc, m| acc.intersection(m.climate_tiers));

    if !shared.is_empty() {
        // Largest pool wins; canonical order breaks ties
        let mut best: Option<(ClimateTier, usize)> = None;
        for tier in shared.iter() {
            let size = organizer.pool_size(tier);
            if best.map_or(true, |(_, best_size)| size > best_size) {
                best = Some((tier, size));
            }
        }
        if let Some((calibration_tier, _)) = best {
            return ClimateCheck::Compatible { calibration_tier, shared };
        }
    }

    ClimateCheck::Veto(veto_report(members))
}

fn veto_report(members: &[&SpeciesRecord]) -> VetoReport {
    let mut majority: Option<(ClimateTier, usize)> = None;
    for tier in ClimateTier::ALL {
        let count = members.iter().filter(|m| m.climate_tiers.contains(tier)).count();
        if count > 0 && majority.map_or(true, |(_, best)| count > best) {
            majority = Some((tier, count));
        }
    }
    let majority_tier = majority.map(|(tier, _)| tier);

    let mut outlier_species: Vec<String> = members
        .iter()
        .filter(|m| majority_tier.map_or(true, |tier| !m.climate_tiers.contains(tier)))
        .map(|m| m.id.clone())
        .collect();
    outlier_species.sort_unstable();

    let member_tiers = members
        .iter()
        .map(|m| (m.id.clone(), m.climate_tiers.iter().collect()))
        .collect();

    VetoReport {
        reason: NO_SHARED_TIER.to_string(),
        outlier_species,
        majority_tier,
        member_tiers,
    }
}
