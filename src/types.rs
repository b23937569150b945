//! Species attribute and organism interaction records

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::climate::TierSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthForm {
    Tree,
    Shrub,
    Vine,
    Herb,
    Grass,
    Succulent,
    Other,
}

impl GrowthForm {
    /// Parse free-text growth form labels (`"tree"`, `"shrub/tree"`, `"liana"`, ...).
    ///
    /// Climbers are checked first: `"vine/shrub"` is a vine.
    pub fn parse(raw: &str) -> Self {
        let form = raw.to_ascii_lowercase();
        if form.contains("vine") || form.contains("liana") || form.contains("climb") {
            GrowthForm::Vine
        } else if form.contains("tree") {
            GrowthForm::Tree
        } else if form.contains("shrub") {
            GrowthForm::Shrub
        } else if form.contains("grass") || form.contains("graminoid") {
            GrowthForm::Grass
        } else if form.contains("succulent") {
            GrowthForm::Succulent
        } else if form.contains("herb") || form.contains("forb") {
            GrowthForm::Herb
        } else {
            GrowthForm::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GrowthForm::Tree => "tree",
            GrowthForm::Shrub => "shrub",
            GrowthForm::Vine => "vine",
            GrowthForm::Herb => "herb",
            GrowthForm::Grass => "grass",
            GrowthForm::Succulent => "succulent",
            GrowthForm::Other => "other",
        }
    }
}

/// Grime CSR scores (percentages)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Csr {
    pub c: f64,
    pub s: f64,
    pub r: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsrStrategy {
    Competitor,
    StressTolerator,
    Ruderal,
}

impl CsrStrategy {
    pub fn label(self) -> &'static str {
        match self {
            CsrStrategy::Competitor => "competitor",
            CsrStrategy::StressTolerator => "stress-tolerator",
            CsrStrategy::Ruderal => "ruderal",
        }
    }
}

impl Csr {
    pub const COMPETITOR_THRESHOLD: f64 = 60.0;
    pub const STRESS_THRESHOLD: f64 = 60.0;
    pub const RUDERAL_THRESHOLD: f64 = 50.0;

    pub fn new(c: f64, s: f64, r: f64) -> Self {
        Self { c, s, r }
    }

    /// Dominant strategy, or `None` for balanced species.
    ///
    /// The thresholds are mutually exclusive for scores summing to 100.
    pub fn dominant(&self) -> Option<CsrStrategy> {
        if self.c > Self::COMPETITOR_THRESHOLD {
            Some(CsrStrategy::Competitor)
        } else if self.s > Self::STRESS_THRESHOLD {
            Some(CsrStrategy::StressTolerator)
        } else if self.r > Self::RUDERAL_THRESHOLD {
            Some(CsrStrategy::Ruderal)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NitrogenFixation {
    Low,
    ModerateLow,
    ModerateHigh,
    High,
}

impl NitrogenFixation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "low" => Some(NitrogenFixation::Low),
            "moderate-low" => Some(NitrogenFixation::ModerateLow),
            "moderate-high" => Some(NitrogenFixation::ModerateHigh),
            "high" => Some(NitrogenFixation::High),
            _ => None,
        }
    }

    pub fn is_fixer(self) -> bool {
        matches!(self, NitrogenFixation::ModerateHigh | NitrogenFixation::High)
    }
}

/// Per-species functional traits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesRecord {
    pub id: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub height_m: Option<f64>,
    pub growth_form: GrowthForm,
    pub csr: Option<Csr>,
    /// Light indicator value (1 deep shade .. 9 full sun)
    pub light_pref: Option<f64>,
    pub nitrogen_fixation: Option<NitrogenFixation>,
    /// Surface soil pH median
    pub soil_ph: Option<f64>,
    /// Leading phylogenetic eigenvector components; `None` when incomplete
    pub phylo_eigenvectors: Option<Vec<f64>>,
    #[serde(skip)]
    pub climate_tiers: TierSet,
}

impl SpeciesRecord {
    /// Record with only an id; every trait missing.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            scientific_name: id.clone(),
            id,
            family: None,
            genus: None,
            height_m: None,
            growth_form: GrowthForm::Other,
            csr: None,
            light_pref: None,
            nitrogen_fixation: None,
            soil_ph: None,
            phylo_eigenvectors: None,
            climate_tiers: TierSet::empty(),
        }
    }
}

/// Ecological role of a fungus on a given host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FungalRole {
    Pathogenic,
    Amf,
    Emf,
    Endophytic,
    Saprotrophic,
    Mycoparasite,
    Entomopathogenic,
}

impl FungalRole {
    pub const ALL: [FungalRole; 7] = [
        FungalRole::Pathogenic,
        FungalRole::Amf,
        FungalRole::Emf,
        FungalRole::Endophytic,
        FungalRole::Saprotrophic,
        FungalRole::Mycoparasite,
        FungalRole::Entomopathogenic,
    ];

    /// Signed contribution of this role to the fungus's net benefit
    pub fn contribution(self) -> f64 {
        match self {
            FungalRole::Pathogenic => -1.0,
            _ => 1.0,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of roles one fungus plays. A single fungus may be pathogenic,
/// endophytic and a mycoparasite at once; contributions are summed, never
/// collapsed to one role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FungalRoles(u8);

impl FungalRoles {
    pub fn insert(&mut self, role: FungalRole) {
        self.0 |= role.bit();
    }

    pub fn contains(self, role: FungalRole) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: FungalRoles) -> FungalRoles {
        FungalRoles(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = FungalRole> {
        FungalRole::ALL.into_iter().filter(move |r| self.contains(*r))
    }

    /// Sum of signed role contributions, floored at zero
    pub fn net_benefit(self) -> f64 {
        self.iter().map(FungalRole::contribution).sum::<f64>().max(0.0)
    }
}

impl FromIterator<FungalRole> for FungalRoles {
    fn from_iter<I: IntoIterator<Item = FungalRole>>(iter: I) -> Self {
        let mut roles = FungalRoles::default();
        for role in iter {
            roles.insert(role);
        }
        roles
    }
}

impl Serialize for FungalRoles {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Organisms recorded on one species
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganismProfile {
    /// Herbivores, pollinators already excluded
    pub herbivores: BTreeSet<String>,
    /// Non-fungal pathogens; fungal pathogens live in `fungi`
    pub pathogens_other: BTreeSet<String>,
    pub pollinators: BTreeSet<String>,
    pub flower_visitors: BTreeSet<String>,
    /// Predators attracted by (recorded interacting with) this species
    pub predators: BTreeSet<String>,
    pub fungivores: BTreeSet<String>,
    pub fungi: BTreeMap<String, FungalRoles>,
    /// Pathogenic fungi recorded as specific to this host
    pub host_specific_pathogens: BTreeSet<String>,
}

pub(crate) static EMPTY_PROFILE: OrganismProfile = OrganismProfile {
    herbivores: BTreeSet::new(),
    pathogens_other: BTreeSet::new(),
    pollinators: BTreeSet::new(),
    flower_visitors: BTreeSet::new(),
    predators: BTreeSet::new(),
    fungivores: BTreeSet::new(),
    fungi: BTreeMap::new(),
    host_specific_pathogens: BTreeSet::new(),
};

impl OrganismProfile {
    pub fn fungi_with(&self, role: FungalRole) -> impl Iterator<Item = &str> + '_ {
        self.fungi
            .iter()
            .filter(move |(_, roles)| roles.contains(role))
            .map(|(name, _)| name.as_str())
    }

    pub fn has_fungus_role(&self, role: FungalRole) -> bool {
        self.fungi.values().any(|roles| roles.contains(role))
    }

    /// Pathogenic fungi followed by other pathogens
    pub fn pathogens(&self) -> impl Iterator<Item = &str> + '_ {
        self.fungi_with(FungalRole::Pathogenic)
            .chain(self.pathogens_other.iter().map(String::as_str))
    }

    /// Pollinators and flower visitors
    pub fn visitors(&self) -> impl Iterator<Item = &str> + '_ {
        self.pollinators
            .iter()
            .chain(self.flower_visitors.iter())
            .map(String::as_str)
    }

    pub fn add_fungus(&mut self, name: impl Into<String>, role: FungalRole) {
        self.fungi.entry(name.into()).or_default().insert(role);
    }
}

pub type Lookup = FxHashMap<String, FxHashSet<String>>;

/// Global relationship tables used for indirect cross-species benefits
#[derive(Debug, Clone, Default)]
pub struct RelationshipTables {
    /// herbivore → predators that eat it
    pub herbivore_predators: Lookup,
    /// herbivore → entomopathogenic fungi that infect it
    pub insect_parasites: Lookup,
    /// pathogen → antagonists (mycoparasites, fungivores) that attack it
    pub pathogen_antagonists: Lookup,
}

impl RelationshipTables {
    pub fn is_empty(&self) -> bool {
        self.herbivore_predators.is_empty()
            && self.insect_parasites.is_empty()
            && self.pathogen_antagonists.is_empty()
    }
}

impl fmt::Display for SpeciesRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.scientific_name, self.id)
    }
}
