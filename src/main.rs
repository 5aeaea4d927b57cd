use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use salewatch::harness::{HarnessOptions, run_harness};
use salewatch::pipeline::{TrackOptions, ValidateOptions, track_profiles, validate_configs};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "salewatch", about = "Auction sale price tracker for collectible parts")]
struct Cli {
    #[arg(long, default_value = "configs/profiles")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Track {
        #[arg(long)]
        profile: Option<String>,
        /// Parse a saved search-results page instead of fetching one.
        #[arg(long)]
        html_file: Option<PathBuf>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    Validate {
        #[arg(long)]
        profile_file: Option<PathBuf>,
    },
    Harness {
        #[arg(long)]
        html_dir: PathBuf,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Track {
            profile,
            html_file,
            today,
        } => {
            let summaries = track_profiles(&TrackOptions {
                config_dir: cli.config_dir,
                profile,
                html_file,
                today,
            })?;
            info!(profiles = summaries.len(), "tracking complete");
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Validate { profile_file } => {
            let messages = validate_configs(&ValidateOptions {
                config_dir: Some(cli.config_dir),
                profile_file,
            })?;
            for line in messages {
                println!("{line}");
            }
        }
        Commands::Harness { html_dir, today } => {
            let report = run_harness(&HarnessOptions {
                config_dir: cli.config_dir,
                html_dir,
                today,
            })?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
