mod detect;
mod venues;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sailvenue-cli")]
#[command(about = "Sailing venue detection command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect the sailing venue for a GPS fix and print the result as JSON
    Detect {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in kilometres (defaults to `SAILVENUE_DETECT_RADIUS_KM`)
        #[arg(long)]
        radius_km: Option<f64>,
        /// Maximum number of alternatives to report
        #[arg(long)]
        max_alternatives: Option<usize>,
        /// Deadline for the AI attempt in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
    /// Validate the venue registry file and list its venues
    Venues {
        /// Registry file to read (defaults to `SAILVENUE_VENUES_PATH`)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("sailvenue-cli: run with --help for available commands");
        return Ok(());
    };

    let config = sailvenue_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Detect {
            lat,
            lng,
            radius_km,
            max_alternatives,
            deadline_ms,
        } => {
            let options = sailvenue_detect::DetectOptions {
                radius_km,
                max_alternatives,
                deadline_ms,
            };
            detect::run_detect(&config, lat, lng, &options).await
        }
        Commands::Venues { path } => {
            venues::run_venues(path.as_deref().unwrap_or(config.venues_path.as_path()))
        }
    }
}
