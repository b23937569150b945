//! Shared fixtures for integration tests and benches
//!
//! Builds small in-memory datasets and an identity calibration in which a raw
//! value r in [0.01, 0.99] normalizes to exactly r, so expected scores can be
//! worked out by hand from the metric formulas.

#![allow(dead_code)]

use guild_compat::calibration::{
    profile_name, CalibrationProfile, CalibrationSet, CalibrationTable, PercentileTable, PERCENTILE_POINTS,
};
use guild_compat::config::MetricConstants;
use guild_compat::types::{Csr, FungalRole, GrowthForm, NitrogenFixation, OrganismProfile, RelationshipTables, SpeciesRecord};
use guild_compat::{ClimateTier, EngineConfig, GuildData, GuildScorer, MetricId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One species with its organism profile
#[derive(Debug, Clone)]
pub struct Plant {
    pub record: SpeciesRecord,
    pub profile: OrganismProfile,
}

impl Plant {
    /// Humid-temperate herb, 1 m, balanced CSR, non-fixer, pH 6.0
    pub fn new(id: &str, family: &str) -> Self {
        Self {
            record: SpeciesRecord {
                scientific_name: format!("{} sp.", family),
                family: Some(family.to_string()),
                height_m: Some(1.0),
                growth_form: GrowthForm::Herb,
                csr: Some(Csr::new(34.0, 33.0, 33.0)),
                light_pref: Some(5.0),
                nitrogen_fixation: Some(NitrogenFixation::Low),
                soil_ph: Some(6.0),
                climate_tiers: [ClimateTier::HumidTemperate].into_iter().collect(),
                ..SpeciesRecord::new(id)
            },
            profile: OrganismProfile::default(),
        }
    }

    pub fn tiers(mut self, tiers: &[ClimateTier]) -> Self {
        self.record.climate_tiers = tiers.iter().copied().collect();
        self
    }

    pub fn form(mut self, form: GrowthForm, height: f64, light: f64) -> Self {
        self.record.growth_form = form;
        self.record.height_m = Some(height);
        self.record.light_pref = Some(light);
        self
    }

    pub fn csr(mut self, c: f64, s: f64, r: f64) -> Self {
        self.record.csr = Some(Csr::new(c, s, r));
        self
    }

    pub fn fixer(mut self) -> Self {
        self.record.nitrogen_fixation = Some(NitrogenFixation::High);
        self
    }

    pub fn ph(mut self, ph: f64) -> Self {
        self.record.soil_ph = Some(ph);
        self
    }

    pub fn eigenvectors(mut self, ev: Vec<f64>) -> Self {
        self.record.phylo_eigenvectors = Some(ev);
        self
    }

    pub fn fungi<S: AsRef<str>>(mut self, role: FungalRole, names: &[S]) -> Self {
        for name in names {
            self.profile.add_fungus(name.as_ref(), role);
        }
        self
    }

    pub fn herbivores<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.profile.herbivores.extend(names.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn pollinators<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.profile.pollinators.extend(names.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn predators<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.profile.predators.extend(names.iter().map(|s| s.as_ref().to_string()));
        self
    }
}

/// `prefix-1 .. prefix-n`
pub fn names(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{}-{}", prefix, i)).collect()
}

#[derive(Debug, Default)]
pub struct FixtureBuilder {
    plants: Vec<Plant>,
    relationships: RelationshipTables,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plant(mut self, plant: Plant) -> Self {
        self.plants.push(plant);
        self
    }

    pub fn plants(mut self, plants: impl IntoIterator<Item = Plant>) -> Self {
        self.plants.extend(plants);
        self
    }

    pub fn herbivore_predators<S: AsRef<str>>(mut self, herbivore: &str, predators: &[S]) -> Self {
        self.relationships
            .herbivore_predators
            .entry(herbivore.to_string())
            .or_default()
            .extend(predators.iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn build(self) -> GuildData {
        let mut profiles = FxHashMap::default();
        let mut species = Vec::with_capacity(self.plants.len());
        for plant in self.plants {
            profiles.insert(plant.record.id.clone(), plant.profile);
            species.push(plant.record);
        }
        GuildData::from_parts(species, profiles, self.relationships)
    }
}

pub fn identity_table(tier: ClimateTier, guild_size: usize) -> CalibrationTable {
    let values: Vec<f64> = PERCENTILE_POINTS.iter().map(|p| p / 100.0).collect();
    let metrics = MetricId::ALL
        .into_iter()
        .map(|m| (m, PercentileTable::from_values(values.clone()).unwrap()))
        .collect();
    CalibrationTable {
        tier,
        guild_size,
        n_samples: 0,
        seed: 0,
        metrics,
    }
}

/// Identity tables for every tier, one profile per guild size
pub fn identity_calibration(data: &GuildData, guild_sizes: &[usize]) -> CalibrationSet {
    let profiles: BTreeMap<String, CalibrationProfile> = guild_sizes
        .iter()
        .map(|&size| {
            let tiers = ClimateTier::ALL
                .into_iter()
                .map(|tier| (tier, identity_table(tier, size)))
                .collect();
            (profile_name(size), CalibrationProfile { guild_size: size, tiers })
        })
        .collect();
    CalibrationSet::new(data.fingerprint(), MetricConstants::default(), profiles)
}

pub fn scorer(data: GuildData, guild_sizes: &[usize]) -> GuildScorer {
    let calibration = identity_calibration(&data, guild_sizes);
    GuildScorer::new(Arc::new(data), Arc::new(calibration), &EngineConfig::default()).unwrap()
}

pub fn ids(plants: &[Plant]) -> Vec<String> {
    plants.iter().map(|p| p.record.id.clone()).collect()
}
