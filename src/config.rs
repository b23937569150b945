//! Engine configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file at all) yields the reference configuration. Two environment variables
//! override file values:
//! - `GUILD_DATA_DIR` rebases relative data paths
//! - `GUILD_CALIBRATION_DIR` replaces the calibration directory

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::composer::ScoreWeights;

pub const DATA_DIR_ENV: &str = "GUILD_DATA_DIR";
pub const CALIBRATION_DIR_ENV: &str = "GUILD_CALIBRATION_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub data: DataPaths,
    #[serde(default)]
    pub guild: GuildLimits,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub constants: MetricConstants,
    #[serde(default)]
    pub calibration: CalibrationSettings,
}

/// Input tables and the calibration artifact directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    #[serde(default = "default_species_path")]
    pub species_path: PathBuf,
    #[serde(default = "default_organisms_path")]
    pub organisms_path: PathBuf,
    #[serde(default = "default_fungi_path")]
    pub fungi_path: PathBuf,
    #[serde(default = "default_herbivore_predators_path")]
    pub herbivore_predators_path: PathBuf,
    #[serde(default = "default_insect_parasites_path")]
    pub insect_parasites_path: PathBuf,
    #[serde(default = "default_pathogen_antagonists_path")]
    pub pathogen_antagonists_path: PathBuf,
    #[serde(default = "default_calibration_dir")]
    pub calibration_dir: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            species_path: default_species_path(),
            organisms_path: default_organisms_path(),
            fungi_path: default_fungi_path(),
            herbivore_predators_path: default_herbivore_predators_path(),
            insect_parasites_path: default_insect_parasites_path(),
            pathogen_antagonists_path: default_pathogen_antagonists_path(),
            calibration_dir: default_calibration_dir(),
        }
    }
}

impl DataPaths {
    /// Rebase every relative path onto `root`. Absolute paths are kept.
    pub fn rebase(&mut self, root: &Path) {
        for path in [
            &mut self.species_path,
            &mut self.organisms_path,
            &mut self.fungi_path,
            &mut self.herbivore_predators_path,
            &mut self.insect_parasites_path,
            &mut self.pathogen_antagonists_path,
            &mut self.calibration_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
}

/// Supported guild sizes, inclusive
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuildLimits {
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for GuildLimits {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
        }
    }
}

/// Tunable constants inside the metric formulas
///
/// Calibration tables are only valid for the constants they were sampled
/// with, so every `CalibrationSet` records them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConstants {
    /// tanh scale for N1
    #[serde(default = "default_n1_scale")]
    pub n1_scale: f64,
    /// tanh scale for N2
    #[serde(default = "default_n2_scale")]
    pub n2_scale: f64,
    #[serde(default = "default_p3_scale")]
    pub p3_scale: f64,
    #[serde(default = "default_p4_scale")]
    pub p4_scale: f64,
    #[serde(default = "default_p6_scale")]
    pub p6_scale: f64,

    /// Severity of a shared pathogen known to be host-specific
    #[serde(default = "default_host_specific_severity")]
    pub host_specific_severity: f64,
    #[serde(default = "default_generalist_severity")]
    pub generalist_severity: f64,
    #[serde(default = "default_herbivore_severity")]
    pub herbivore_severity: f64,

    /// Saturated N1 above which P3 is dampened
    #[serde(default = "default_p3_dampening_threshold")]
    pub p3_dampening_threshold: f64,
    #[serde(default = "default_p3_dampening_factor")]
    pub p3_dampening_factor: f64,

    /// Credit for a control agent that is present but not linked to a specific target
    #[serde(default = "default_general_agent_credit")]
    pub general_agent_credit: f64,

    /// Phylogenetic eigenvector components used by P4
    #[serde(default = "default_eigenvector_count")]
    pub eigenvector_count: usize,
}

impl Default for MetricConstants {
    fn default() -> Self {
        Self {
            n1_scale: default_n1_scale(),
            n2_scale: default_n2_scale(),
            p3_scale: default_p3_scale(),
            p4_scale: default_p4_scale(),
            p6_scale: default_p6_scale(),
            host_specific_severity: default_host_specific_severity(),
            generalist_severity: default_generalist_severity(),
            herbivore_severity: default_herbivore_severity(),
            p3_dampening_threshold: default_p3_dampening_threshold(),
            p3_dampening_factor: default_p3_dampening_factor(),
            general_agent_credit: default_general_agent_credit(),
            eigenvector_count: default_eigenvector_count(),
        }
    }
}

impl MetricConstants {
    /// Names of the constants that differ from `other`.
    ///
    /// Floats are compared with a relative tolerance, since a JSON round trip
    /// may move a value by one ULP.
    pub fn differences(&self, other: &MetricConstants) -> Vec<&'static str> {
        let scalars = [
            ("n1_scale", self.n1_scale, other.n1_scale),
            ("n2_scale", self.n2_scale, other.n2_scale),
            ("p3_scale", self.p3_scale, other.p3_scale),
            ("p4_scale", self.p4_scale, other.p4_scale),
            ("p6_scale", self.p6_scale, other.p6_scale),
            ("host_specific_severity", self.host_specific_severity, other.host_specific_severity),
            ("generalist_severity", self.generalist_severity, other.generalist_severity),
            ("herbivore_severity", self.herbivore_severity, other.herbivore_severity),
            ("p3_dampening_threshold", self.p3_dampening_threshold, other.p3_dampening_threshold),
            ("p3_dampening_factor", self.p3_dampening_factor, other.p3_dampening_factor),
            ("general_agent_credit", self.general_agent_credit, other.general_agent_credit),
        ];

        let mut differing: Vec<&'static str> = scalars
            .iter()
            .filter(|(_, a, b)| (a - b).abs() > 1e-12 * a.abs().max(b.abs()).max(1.0))
            .map(|(name, _, _)| *name)
            .collect();
        if self.eigenvector_count != other.eigenvector_count {
            differing.push("eigenvector_count");
        }
        differing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSettings {
    /// Random guilds drawn per tier
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    /// Fixed seed for reproducible runs; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_profile")]
    pub default_profile: String,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            n_samples: default_n_samples(),
            seed: None,
            default_profile: default_profile(),
        }
    }
}

// Defaults
fn default_species_path() -> PathBuf { PathBuf::from("data/species_attributes.parquet") }
fn default_organisms_path() -> PathBuf { PathBuf::from("data/organism_profiles.parquet") }
fn default_fungi_path() -> PathBuf { PathBuf::from("data/fungal_guilds.parquet") }
fn default_herbivore_predators_path() -> PathBuf { PathBuf::from("data/herbivore_predators.parquet") }
fn default_insect_parasites_path() -> PathBuf { PathBuf::from("data/insect_fungal_parasites.parquet") }
fn default_pathogen_antagonists_path() -> PathBuf { PathBuf::from("data/pathogen_antagonists.parquet") }
fn default_calibration_dir() -> PathBuf { PathBuf::from("data/calibration") }
fn default_min_size() -> usize { 2 }
fn default_max_size() -> usize { 10 }
fn default_n1_scale() -> f64 { 8.0 }
fn default_n2_scale() -> f64 { 4.0 }
fn default_p3_scale() -> f64 { 3.0 }
fn default_p4_scale() -> f64 { 3.0 }
fn default_p6_scale() -> f64 { 5.0 }
fn default_host_specific_severity() -> f64 { 1.0 }
fn default_generalist_severity() -> f64 { 0.6 }
fn default_herbivore_severity() -> f64 { 0.5 }
fn default_p3_dampening_threshold() -> f64 { 0.5 }
fn default_p3_dampening_factor() -> f64 { 0.5 }
fn default_general_agent_credit() -> f64 { 0.2 }
fn default_eigenvector_count() -> usize { 10 }
fn default_n_samples() -> usize { 20_000 }
fn default_profile() -> String { "5plant".to_string() }

impl EngineConfig {
    /// Load from a TOML file (or defaults when `path` is `None`), apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                Self::from_toml(&contents)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var(DATA_DIR_ENV) {
            self.data.rebase(Path::new(&root));
        }
        if let Ok(dir) = std::env::var(CALIBRATION_DIR_ENV) {
            self.data.calibration_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.guild.min_size < 2 {
            anyhow::bail!("guild.min_size must be at least 2, got {}", self.guild.min_size);
        }
        if self.guild.min_size > self.guild.max_size {
            anyhow::bail!(
                "guild.min_size ({}) exceeds guild.max_size ({})",
                self.guild.min_size,
                self.guild.max_size
            );
        }

        let c = &self.constants;
        let scales = [
            ("n1_scale", c.n1_scale),
            ("n2_scale", c.n2_scale),
            ("p3_scale", c.p3_scale),
            ("p4_scale", c.p4_scale),
            ("p6_scale", c.p6_scale),
        ];
        for (name, value) in scales {
            if !(value.is_finite() && value > 0.0) {
                anyhow::bail!("constants.{} must be positive, got {}", name, value);
            }
        }
        if c.eigenvector_count == 0 {
            anyhow::bail!("constants.eigenvector_count must be at least 1");
        }
        if self.calibration.n_samples == 0 {
            anyhow::bail!("calibration.n_samples must be at least 1");
        }

        self.weights.validate()
    }
}
