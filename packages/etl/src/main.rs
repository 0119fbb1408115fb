#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the conflict map ETL.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use conflict_map_conflict_models::DatasetKind;
use conflict_map_etl::config::EtlConfig;
use conflict_map_etl::load::load_dataset;
use conflict_map_etl::pipeline::{run_countries, run_events};
use conflict_map_store::elastic::ElasticStore;

#[derive(Parser)]
#[command(name = "conflict_map_etl", about = "Conflict map dataset builder and loader")]
struct Cli {
    /// TOML config file replacing the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the per country-year polygon dataset
    Countries {
        /// Conflict-episode CSV
        #[arg(long)]
        episodes: Option<PathBuf>,
        /// Country reference polygons (`GeoJSON`)
        #[arg(long)]
        reference: Option<PathBuf>,
        /// Output `GeoJSON` path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the per-event point dataset
    Events {
        /// Geocoded event CSV
        #[arg(long)]
        events: Option<PathBuf>,
        /// Output `GeoJSON` path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build both datasets
    All,
    /// Index a processed dataset into the store
    Load {
        /// Which dataset to load (`events` or `countries`)
        dataset: DatasetKind,
        /// Processed `GeoJSON` path (defaults to the configured output)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Target index (defaults to the configured index)
        #[arg(long)]
        index: Option<String>,
        /// Store base URL (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EtlConfig::load(path)?,
        None => EtlConfig::embedded(),
    };

    let start = Instant::now();

    match cli.command {
        Commands::Countries {
            episodes,
            reference,
            output,
        } => {
            let report = run_countries(
                &episodes.unwrap_or(config.input.episodes),
                &reference.unwrap_or(config.input.reference),
                &config.reference,
                &output.unwrap_or(config.output.countries),
            )?;
            println!(
                "[OK] countries: {} features ({} unmatched rows)",
                report.resolved, report.unmatched_rows
            );
        }
        Commands::Events { events, output } => {
            let count = run_events(
                &events.unwrap_or(config.input.events),
                &output.unwrap_or(config.output.events),
            )?;
            println!("[OK] events: {count} features");
        }
        Commands::All => {
            let report = run_countries(
                &config.input.episodes,
                &config.input.reference,
                &config.reference,
                &config.output.countries,
            )?;
            println!("[OK] countries: {} features", report.resolved);
            let count = run_events(&config.input.events, &config.output.events)?;
            println!("[OK] events: {count} features");
        }
        Commands::Load {
            dataset,
            input,
            index,
            host,
        } => {
            let host = host.unwrap_or(config.store.host);
            let store =
                ElasticStore::new(&host, Duration::from_secs(config.store.timeout_seconds))?;

            let (default_input, default_index) = match dataset {
                DatasetKind::Events => (config.output.events, config.store.events_index),
                DatasetKind::Countries => (config.output.countries, config.store.countries_index),
            };
            let input = input.unwrap_or(default_input);
            let index = index.unwrap_or(default_index);

            let report = load_dataset(&store, dataset, &index, &input).await?;
            println!(
                "[OK] {index}: {} succeeded, {} failed",
                report.succeeded, report.failed
            );
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
