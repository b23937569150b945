//! Offline calibration: sample random same-tier guilds, build percentile
//! tables, publish them as a new version and optionally promote it.
//!
//! Usage:
//!   calibrate run --guild-size 5 --guild-size 7 --samples 20000 --promote
//!   calibrate list
//!   calibrate promote 20261014T101500123Z

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guild_compat::calibration::{CalibrationStore, Calibrator};
use guild_compat::{ClimateTier, EngineConfig, GuildData};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calibrate")]
#[command(about = "Build and manage tier-stratified calibration tables")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "GUILD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Calibrate and publish a new version
    Run {
        /// Guild sizes to calibrate (one profile each)
        #[arg(long = "guild-size", required = true)]
        guild_sizes: Vec<usize>,

        /// Random guilds per tier (overrides config)
        #[arg(long)]
        samples: Option<usize>,

        /// Master seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Restrict to these tiers, e.g. `tier_6_arid` or `arid`
        #[arg(long = "tier")]
        tiers: Vec<String>,

        /// Promote the new version once published
        #[arg(long)]
        promote: bool,
    },
    /// List published versions
    List,
    /// Make a published version current
    Promote { version: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guild_compat=info,calibrate=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;
    let store = CalibrationStore::new(&config.data.calibration_dir).with_constants(config.constants.clone());

    match cli.command {
        Command::Run { guild_sizes, samples, seed, tiers, promote } => {
            let tiers = parse_tiers(&tiers)?;
            let n_samples = samples.unwrap_or(config.calibration.n_samples);

            let start = Instant::now();
            let data = GuildData::load(&config.data, config.constants.eigenvector_count)?;
            for (tier, size) in data.organizer().summary() {
                info!(%tier, species = size, "Tier pool");
            }

            let mut calibrator = Calibrator::new(&data, &config);
            if let Some(seed) = seed {
                calibrator = calibrator.with_seed(seed);
            }
            let set = calibrator.calibrate_set(&guild_sizes, n_samples, &tiers)?;
            let path = store.publish(&set)?;
            println!("Published {} ({})", set.version, path.display());

            if promote {
                store.promote(&set.version)?;
                println!("Promoted {}", set.version);
            }
            info!(elapsed_s = start.elapsed().as_secs_f64(), seed = calibrator.seed(), "Calibration complete");
        }
        Command::List => {
            let current = store.current_version()?;
            for version in store.list_versions()? {
                let marker = if current.as_deref() == Some(version.as_str()) { "*" } else { " " };
                println!("{} {}", marker, version);
            }
        }
        Command::Promote { version } => {
            store.promote(&version)?;
            println!("Promoted {}", version);
        }
    }

    Ok(())
}

fn parse_tiers(raw: &[String]) -> Result<Vec<ClimateTier>> {
    if raw.is_empty() {
        return Ok(ClimateTier::ALL.to_vec());
    }
    raw.iter()
        .map(|t| ClimateTier::parse(t).with_context(|| format!("Unknown climate tier: {}", t)))
        .collect()
}
