//! Monte-Carlo calibration driver
//!
//! For each climate tier, draws `n_samples` random guilds of one size from
//! the tier's species pool, scores every raw metric and records the
//! empirical percentiles. Samples are scored in parallel; each sample gets its
//! own RNG derived from (seed, tier, sample index), so a fixed seed
//! reproduces the same tables regardless of thread scheduling.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::table::{profile_name, CalibrationProfile, CalibrationSet, CalibrationTable, PercentileTable};
use crate::climate::ClimateTier;
use crate::config::{EngineConfig, GuildLimits, MetricConstants};
use crate::data::GuildData;
use crate::error::ScoringError;
use crate::guild::Guild;
use crate::metrics::{compute_raw_scores, MetricId, MetricMap};

const PROGRESS_EVERY: usize = 5_000;

pub struct Calibrator<'d> {
    data: &'d GuildData,
    limits: GuildLimits,
    constants: MetricConstants,
    seed: u64,
}

impl<'d> Calibrator<'d> {
    /// Seed comes from the config, or from entropy when none is set; the
    /// seed actually used is recorded in every table.
    pub fn new(data: &'d GuildData, config: &EngineConfig) -> Self {
        Self {
            data,
            limits: config.guild,
            constants: config.constants.clone(),
            seed: config.calibration.seed.unwrap_or_else(rand::random),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Percentile tables for every metric in one tier at one guild size
    pub fn calibrate(&self, tier: ClimateTier, guild_size: usize, n_samples: usize) -> Result<CalibrationTable> {
        if n_samples == 0 {
            bail!("n_samples must be positive");
        }
        if guild_size < self.limits.min_size || guild_size > self.limits.max_size {
            bail!(
                "guild size {} outside supported range {}..={}",
                guild_size,
                self.limits.min_size,
                self.limits.max_size
            );
        }
        let pool = self.data.organizer().pool(tier);
        if pool.len() < guild_size {
            bail!(
                "tier {} has {} species, fewer than the guild size {}",
                tier,
                pool.len(),
                guild_size
            );
        }

        info!(%tier, guild_size, n_samples, pool = pool.len(), seed = self.seed, "Calibrating tier");
        let start = Instant::now();
        let progress = AtomicUsize::new(0);
        let relationships = self.data.relationships();

        let samples: Vec<MetricMap> = (0..n_samples)
            .into_par_iter()
            .map(|index| {
                let mut rng = StdRng::seed_from_u64(sample_seed(self.seed, tier, index));
                let ids: Vec<&String> = pool.choose_multiple(&mut rng, guild_size).collect();
                let guild = Guild::resolve(&ids, self.data, &self.limits)?;
                let values = compute_raw_scores(&guild, relationships, &self.constants).values();

                let count = progress.fetch_add(1, Ordering::Relaxed) + 1;
                if count % PROGRESS_EVERY == 0 {
                    debug!(%tier, count, total = n_samples, "Scoring samples");
                }
                Ok(values)
            })
            .collect::<Result<Vec<_>, ScoringError>>()?;

        let mut metrics = BTreeMap::new();
        for metric in MetricId::ALL {
            let column: Vec<f64> = samples
                .iter()
                .map(|s| s.get(&metric).copied().unwrap_or(0.0))
                .collect();
            if let Some(table) = PercentileTable::from_samples(column) {
                metrics.insert(metric, table);
            }
        }

        info!(%tier, elapsed_s = start.elapsed().as_secs_f64(), "Tier calibrated");
        Ok(CalibrationTable {
            tier,
            guild_size,
            n_samples,
            seed: self.seed,
            metrics,
        })
    }

    /// Tables for every tier in `tiers` whose pool is large enough; smaller
    /// tiers are skipped with a warning.
    pub fn calibrate_profile(
        &self,
        guild_size: usize,
        n_samples: usize,
        tiers: &[ClimateTier],
    ) -> Result<CalibrationProfile> {
        let mut tables = BTreeMap::new();
        for &tier in tiers {
            let pool = self.data.organizer().pool_size(tier);
            if pool < guild_size {
                warn!(%tier, pool, guild_size, "Skipping tier (insufficient species)");
                continue;
            }
            tables.insert(tier, self.calibrate(tier, guild_size, n_samples)?);
        }
        if tables.is_empty() {
            bail!("no tier has at least {} species", guild_size);
        }
        Ok(CalibrationProfile { guild_size, tiers: tables })
    }

    /// Calibrate one profile per guild size into a new, unpublished set
    pub fn calibrate_set(&self, guild_sizes: &[usize], n_samples: usize, tiers: &[ClimateTier]) -> Result<CalibrationSet> {
        let mut profiles = BTreeMap::new();
        for &size in guild_sizes {
            profiles.insert(profile_name(size), self.calibrate_profile(size, n_samples, tiers)?);
        }
        Ok(CalibrationSet::new(self.data.fingerprint(), self.constants.clone(), profiles))
    }
}

/// splitmix64 over (seed, tier, index)
fn sample_seed(seed: u64, tier: ClimateTier, index: usize) -> u64 {
    let tier_index = ClimateTier::ALL.iter().position(|t| *t == tier).unwrap_or(0) as u64;
    let mut z = seed
        ^ (tier_index + 1).wrapping_mul(0xD1B5_4A32_D192_ED03)
        ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
