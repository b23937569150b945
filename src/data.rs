//! Data Loading and Management
//!
//! Loads the read-only inputs with Polars and converts them into typed,
//! immutable records:
//! - species attribute table (traits, CSR, pH, eigenvectors, climate tiers)
//! - organism profiles (herbivores, pathogens, visitors, predators, fungivores)
//! - fungal guild memberships
//! - relationship lookups (herbivore → predators, herbivore → entomopathogens,
//!   pathogen → antagonists)
//!
//! List-valued cells may be Arrow list columns or pipe-separated strings.

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::climate::{ClimateOrganizer, ClimateTier, TierSet};
use crate::config::DataPaths;
use crate::types::{
    Csr, FungalRole, GrowthForm, Lookup, NitrogenFixation, OrganismProfile, RelationshipTables,
    SpeciesRecord, EMPTY_PROFILE,
};

pub const SPECIES_KEY: &str = "wfo_taxon_id";
pub const PROFILE_KEY: &str = "plant_wfo_id";
pub const SOIL_PH_COLUMN: &str = "phh2o_0_5cm_q50";
pub const LIGHT_COLUMN: &str = "EIVEres-L";

const PREDATOR_COLUMNS: [&str; 3] = [
    "predators_hasHost",
    "predators_interactsWith",
    "predators_adjacentTo",
];

const FUNGAL_COLUMNS: [(&str, FungalRole); 8] = [
    ("pathogenic_fungi", FungalRole::Pathogenic),
    ("pathogenic_fungi_host_specific", FungalRole::Pathogenic),
    ("amf_fungi", FungalRole::Amf),
    ("emf_fungi", FungalRole::Emf),
    ("endophytic_fungi", FungalRole::Endophytic),
    ("saprotrophic_fungi", FungalRole::Saprotrophic),
    ("mycoparasite_fungi", FungalRole::Mycoparasite),
    ("entomopathogenic_fungi", FungalRole::Entomopathogenic),
];

pub fn eigenvector_column(index: usize) -> String {
    format!("phylo_ev{}", index + 1)
}

/// Main data holder for guild scoring
///
/// Immutable after construction; shared across scoring threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct GuildData {
    species: Vec<SpeciesRecord>,
    index: FxHashMap<String, usize>,
    profiles: FxHashMap<String, OrganismProfile>,
    relationships: RelationshipTables,
    organizer: ClimateOrganizer,
}

impl GuildData {
    /// Load all datasets named in `paths`
    pub fn load(paths: &DataPaths, eigenvector_count: usize) -> Result<Self> {
        let start = Instant::now();

        let species_df = read_table(&paths.species_path)?;
        let species = species_from_frame(&species_df, eigenvector_count)
            .with_context(|| format!("Invalid species table: {:?}", paths.species_path))?;

        let organisms_df = read_table(&paths.organisms_path)?;
        let fungi_df = read_table(&paths.fungi_path)?;
        let profiles = profiles_from_frames(&organisms_df, Some(&fungi_df))
            .with_context(|| format!("Invalid organism tables: {:?}", paths.organisms_path))?;

        let relationships = RelationshipTables {
            herbivore_predators: load_lookup_table(
                &paths.herbivore_predators_path,
                "herbivore",
                "predators",
            )?,
            insect_parasites: load_lookup_table(
                &paths.insect_parasites_path,
                "herbivore",
                "entomopathogenic_fungi",
            )?,
            pathogen_antagonists: load_lookup_table(
                &paths.pathogen_antagonists_path,
                "pathogen",
                "antagonists",
            )?,
        };

        let data = Self::from_parts(species, profiles, relationships);

        info!(
            species = data.species.len(),
            profiles = data.profiles.len(),
            herbivore_predators = data.relationships.herbivore_predators.len(),
            insect_parasites = data.relationships.insect_parasites.len(),
            pathogen_antagonists = data.relationships.pathogen_antagonists.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded guild datasets"
        );
        for (tier, size) in data.organizer.summary() {
            debug!(tier = %tier, size, "Climate tier pool");
        }

        Ok(data)
    }

    /// Assemble from already-typed records. Later duplicates of a species id
    /// replace earlier ones.
    pub fn from_parts(
        species: Vec<SpeciesRecord>,
        profiles: FxHashMap<String, OrganismProfile>,
        relationships: RelationshipTables,
    ) -> Self {
        let mut by_id: FxHashMap<String, SpeciesRecord> = FxHashMap::default();
        for record in species {
            by_id.insert(record.id.clone(), record);
        }
        let mut species: Vec<SpeciesRecord> = by_id.into_values().collect();
        species.sort_unstable_by(|a, b| a.id.cmp(&b.id));

        let index = species
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let organizer = ClimateOrganizer::from_species(&species);

        Self {
            species,
            index,
            profiles,
            relationships,
            organizer,
        }
    }

    pub fn species(&self, id: &str) -> Option<&SpeciesRecord> {
        self.index.get(id).map(|&i| &self.species[i])
    }

    /// All species, sorted by id
    pub fn all_species(&self) -> &[SpeciesRecord] {
        &self.species
    }

    /// Organism profile for a species; species without any recorded
    /// organisms get an empty profile.
    pub fn profile(&self, id: &str) -> &OrganismProfile {
        self.profiles.get(id).unwrap_or(&EMPTY_PROFILE)
    }

    pub fn relationships(&self) -> &RelationshipTables {
        &self.relationships
    }

    pub fn organizer(&self) -> &ClimateOrganizer {
        &self.organizer
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Content hash of every input, recorded in calibration artifacts so a
    /// data refresh without re-calibration can be detected.
    pub fn fingerprint(&self) -> String {
        let mut hasher = FxHasher::default();

        for s in &self.species {
            s.id.hash(&mut hasher);
            s.family.hash(&mut hasher);
            s.growth_form.hash(&mut hasher);
            s.nitrogen_fixation.hash(&mut hasher);
            s.climate_tiers.hash(&mut hasher);
            for value in [s.height_m, s.light_pref, s.soil_ph] {
                value.map(f64::to_bits).hash(&mut hasher);
            }
            if let Some(csr) = &s.csr {
                [csr.c, csr.s, csr.r].map(f64::to_bits).hash(&mut hasher);
            }
            if let Some(ev) = &s.phylo_eigenvectors {
                for v in ev {
                    v.to_bits().hash(&mut hasher);
                }
            }
        }

        let mut profile_ids: Vec<&String> = self.profiles.keys().collect();
        profile_ids.sort_unstable();
        for id in profile_ids {
            id.hash(&mut hasher);
            let p = &self.profiles[id];
            for set in [
                &p.herbivores,
                &p.pathogens_other,
                &p.pollinators,
                &p.flower_visitors,
                &p.predators,
                &p.fungivores,
                &p.host_specific_pathogens,
            ] {
                set.len().hash(&mut hasher);
                for organism in set {
                    organism.hash(&mut hasher);
                }
            }
            for (fungus, roles) in &p.fungi {
                fungus.hash(&mut hasher);
                roles.hash(&mut hasher);
            }
        }

        for table in [
            &self.relationships.herbivore_predators,
            &self.relationships.insect_parasites,
            &self.relationships.pathogen_antagonists,
        ] {
            let mut entries: Vec<(&String, Vec<&String>)> = table
                .iter()
                .map(|(k, v)| {
                    let mut values: Vec<&String> = v.iter().collect();
                    values.sort_unstable();
                    (k, values)
                })
                .collect();
            entries.sort_unstable();
            entries.hash(&mut hasher);
        }

        format!(
            "{}s-{}p-{:016x}",
            self.species.len(),
            self.profiles.len(),
            hasher.finish()
        )
    }
}

/// Read a parquet or CSV file, chosen by extension
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load CSV: {:?}", path))
    } else {
        LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {:?}", path))?
            .collect()
            .with_context(|| format!("Failed to load parquet: {:?}", path))
    }
}

/// Convert the species attribute table into records.
///
/// Only the key column is mandatory; absent trait columns load as missing.
pub fn species_from_frame(df: &DataFrame, eigenvector_count: usize) -> Result<Vec<SpeciesRecord>> {
    let ids = df
        .column(SPECIES_KEY)
        .with_context(|| format!("Column '{}' not found", SPECIES_KEY))?
        .str()
        .with_context(|| format!("Column '{}' is not string type", SPECIES_KEY))?;

    let names = optional_str(df, "wfo_scientific_name")?;
    let families = optional_str(df, "family")?;
    let genera = optional_str(df, "genus")?;
    let growth_forms = optional_str(df, "try_growth_form")?;
    let fixation = optional_str(df, "nitrogen_fixation_rating")?;
    let heights = optional_f64(df, "height_m")?;
    let c = optional_f64(df, "C")?;
    let s = optional_f64(df, "S")?;
    let r = optional_f64(df, "R")?;
    let light = optional_f64(df, LIGHT_COLUMN)?;
    let ph = optional_f64(df, SOIL_PH_COLUMN)?;

    let eigenvectors = (0..eigenvector_count)
        .map(|i| optional_f64(df, &eigenvector_column(i)))
        .collect::<Result<Vec<_>>>()?;

    let tiers = ClimateTier::ALL
        .into_iter()
        .map(|tier| Ok((tier, optional_flag(df, tier.column())?)))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let Some(id) = ids.get(idx) else { continue };

        let csr = match (c[idx], s[idx], r[idx]) {
            (Some(c), Some(s), Some(r)) => Some(Csr::new(c, s, r)),
            _ => None,
        };

        let phylo_eigenvectors: Option<Vec<f64>> =
            eigenvectors.iter().map(|column| column[idx]).collect();

        let climate_tiers: TierSet = tiers
            .iter()
            .filter(|(_, flags)| flags[idx])
            .map(|(tier, _)| *tier)
            .collect();

        records.push(SpeciesRecord {
            id: id.to_string(),
            scientific_name: names[idx].clone().unwrap_or_else(|| id.to_string()),
            family: families[idx].clone(),
            genus: genera[idx].clone(),
            height_m: heights[idx].filter(|h| h.is_finite() && *h >= 0.0),
            growth_form: growth_forms[idx]
                .as_deref()
                .map_or(GrowthForm::Other, GrowthForm::parse),
            csr,
            light_pref: light[idx].filter(|v| v.is_finite()),
            nitrogen_fixation: fixation[idx].as_deref().and_then(NitrogenFixation::parse),
            soil_ph: ph[idx].filter(|v| v.is_finite()),
            phylo_eigenvectors: phylo_eigenvectors
                .filter(|ev| !ev.is_empty() && ev.iter().all(|v| v.is_finite())),
            climate_tiers,
        });
    }

    Ok(records)
}

/// Build organism profiles from the organism table and (optionally) the
/// fungal guild table, both keyed by `plant_wfo_id`.
pub fn profiles_from_frames(
    organisms: &DataFrame,
    fungi: Option<&DataFrame>,
) -> Result<FxHashMap<String, OrganismProfile>> {
    let mut profiles: FxHashMap<String, OrganismProfile> = FxHashMap::default();

    let ids = key_column(organisms, PROFILE_KEY)?;
    let herbivores = string_lists(organisms, "herbivores")?;
    let pathogens = string_lists(organisms, "pathogens")?;
    let pollinators = string_lists(organisms, "pollinators")?;
    let visitors = string_lists(organisms, "flower_visitors")?;
    let fungivores = string_lists(organisms, "fungivores_eats")?;
    let predators = PREDATOR_COLUMNS
        .iter()
        .map(|name| string_lists(organisms, name))
        .collect::<Result<Vec<_>>>()?;

    for (idx, id) in ids.iter().enumerate() {
        let Some(id) = id else { continue };
        let profile = profiles.entry(id.clone()).or_default();

        profile.pollinators.extend(pollinators[idx].iter().cloned());
        profile.flower_visitors.extend(visitors[idx].iter().cloned());
        profile.pathogens_other.extend(pathogens[idx].iter().cloned());
        profile.fungivores.extend(fungivores[idx].iter().cloned());
        for column in &predators {
            profile.predators.extend(column[idx].iter().cloned());
        }
        // Pollinators are never herbivores
        let excluded: FxHashSet<&String> = pollinators[idx].iter().chain(visitors[idx].iter()).collect();
        profile.herbivores.extend(
            herbivores[idx]
                .iter()
                .filter(|h| !excluded.contains(h))
                .cloned(),
        );
    }

    if let Some(fungi) = fungi {
        let ids = key_column(fungi, PROFILE_KEY)?;
        let columns = FUNGAL_COLUMNS
            .iter()
            .map(|(name, role)| Ok((*name, *role, string_lists(fungi, name)?)))
            .collect::<Result<Vec<_>>>()?;

        for (idx, id) in ids.iter().enumerate() {
            let Some(id) = id else { continue };
            let profile = profiles.entry(id.clone()).or_default();

            for (name, role, lists) in &columns {
                for fungus in &lists[idx] {
                    profile.add_fungus(fungus.clone(), *role);
                    if *name == "pathogenic_fungi_host_specific" {
                        profile.host_specific_pathogens.insert(fungus.clone());
                    }
                }
            }
            // A fungus recorded as a pathogen is not also a non-fungal pathogen
            let fungal: Vec<String> = profile
                .fungi_with(FungalRole::Pathogenic)
                .map(str::to_string)
                .collect();
            for fungus in fungal {
                profile.pathogens_other.remove(&fungus);
            }
        }
    }

    Ok(profiles)
}

/// Load lookup table: key → set of related organisms
///
/// Example: herbivore_id → "predator1|predator2|predator3"
pub fn load_lookup_table(path: &Path, key_col: &str, value_col: &str) -> Result<Lookup> {
    let df = read_table(path)?;
    lookup_from_frame(&df, key_col, value_col)
        .with_context(|| format!("Invalid lookup table: {:?}", path))
}

pub fn lookup_from_frame(df: &DataFrame, key_col: &str, value_col: &str) -> Result<Lookup> {
    let keys = key_column(df, key_col)?;
    if df.column(value_col).is_err() {
        anyhow::bail!("Column '{}' not found", value_col);
    }
    let values = string_lists(df, value_col)?;

    let mut map: Lookup = FxHashMap::default();
    for (key, related) in keys.into_iter().zip(values) {
        if let Some(key) = key {
            if !related.is_empty() {
                map.entry(key).or_default().extend(related);
            }
        }
    }

    Ok(map)
}

fn key_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if df.column(name).is_err() {
        anyhow::bail!("Column '{}' not found", name);
    }
    optional_str(df, name)
}

/// String column as owned values; all-missing when the column is absent
fn optional_str(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let column = column
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as string", name))?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty() && s != "NA"))
        .collect())
}

/// Numeric column cast to f64; all-missing when the column is absent
fn optional_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let column = column
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    Ok(column.f64()?.into_iter().collect())
}

/// Tier flag stored as boolean or 0/1 integer; absent means false
fn optional_flag(df: &DataFrame, name: &str) -> Result<Vec<bool>> {
    let Ok(column) = df.column(name) else {
        return Ok(vec![false; df.height()]);
    };
    if let Ok(flags) = column.bool() {
        return Ok(flags.into_iter().map(|v| v.unwrap_or(false)).collect());
    }
    let column = column
        .cast(&DataType::Int32)
        .with_context(|| format!("Column '{}' is not a flag column", name))?;
    Ok(column.i32()?.into_iter().map(|v| v == Some(1)).collect())
}

/// List-valued column: Arrow list of strings or pipe-separated string
fn string_lists(df: &DataFrame, name: &str) -> Result<Vec<Vec<String>>> {
    let height = df.height();
    let Ok(column) = df.column(name) else {
        return Ok(vec![Vec::new(); height]);
    };

    let mut lists = Vec::with_capacity(height);
    if let Ok(list_col) = column.list() {
        for idx in 0..height {
            let mut items = Vec::new();
            if let Some(series) = list_col.get_as_series(idx) {
                if let Ok(strings) = series.str() {
                    items.extend(
                        strings
                            .into_iter()
                            .flatten()
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string),
                    );
                }
            }
            lists.push(items);
        }
    } else if let Ok(strings) = column.str() {
        for value in strings.into_iter() {
            lists.push(
                value
                    .map(|v| {
                        v.split('|')
                            .map(str::trim)
                            .filter(|s| !s.is_empty() && *s != "NA")
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            );
        }
    } else {
        anyhow::bail!("Column '{}' is neither a list nor a string column", name);
    }

    Ok(lists)
}
