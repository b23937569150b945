//! Score one guild against the current calibration and print the result.
//!
//! Usage:
//!   score_guild wfo-0000001 wfo-0000002 wfo-0000003 wfo-0000004 wfo-0000005
//!   score_guild --explain --format markdown <ids...>

use anyhow::Result;
use clap::{Parser, ValueEnum};
use guild_compat::calibration::{profile_name, CalibrationStore};
use guild_compat::explanation::MarkdownFormatter;
use guild_compat::{explain, EngineConfig, GuildData, GuildScorer};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

#[derive(Parser)]
#[command(name = "score_guild")]
#[command(about = "Score a guild of species ids")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "GUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Calibration profile; defaults to "<n>plant" for an n-species guild
    #[arg(short, long)]
    profile: Option<String>,

    /// Include explanations
    #[arg(long)]
    explain: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Species ids
    #[arg(required = true)]
    species: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guild_compat=warn,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;

    let data = Arc::new(GuildData::load(&config.data, config.constants.eigenvector_count)?);
    let calibration = Arc::new(
        CalibrationStore::new(&config.data.calibration_dir)
            .with_constants(config.constants.clone())
            .load_current()?,
    );
    let scorer = GuildScorer::new(data, calibration, &config)?;

    let profile = cli.profile.unwrap_or_else(|| profile_name(cli.species.len()));
    let result = scorer.score_guild(cli.species.as_slice(), &profile)?;
    let explanations = if cli.explain || matches!(cli.format, Format::Markdown) {
        explain(&result)
    } else {
        Vec::new()
    };

    match cli.format {
        Format::Json if cli.explain => {
            println!("{}", serde_json::to_string_pretty(&json!({ "result": result, "explanations": explanations }))?)
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Markdown => print!("{}", MarkdownFormatter::format(&result, &explanations)),
    }

    Ok(())
}
