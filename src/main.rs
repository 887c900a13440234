//! shopsafe - scores the stores around a location
//!
//! Reads a store discovery document, resolves each store's county severity and
//! check-in statistics concurrently, and prints the scored stores as JSON.
//!
//! Module structure:
//! - `domain/` - Core types and check-in aggregation
//! - `io/` - External collaborators (FCC API, percentile tables, ratings, stores)
//! - `services/` - Batch coordination, per-store scoring, county cache
//! - `infra/` - Config and metrics

use clap::Parser;
use shopsafe_engine::domain::types::{LatLng, StoresResponse};
use shopsafe_engine::infra::{Config, Metrics};
use shopsafe_engine::io::{load_places, FccCountyResolver, MemoryRatingSource};
use shopsafe_engine::services::BatchCoordinator;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Score nearby stores by check-in ratings and county severity
#[derive(Parser, Debug)]
#[command(name = "shopsafe", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// Store discovery document (Places text-search JSON)
    #[arg(short, long)]
    stores: String,

    /// User location as "lat,lng"
    #[arg(short, long)]
    location: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Structured logging to stderr; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(version = %env!("CARGO_PKG_VERSION"), "shopsafe starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        max_concurrency = %config.max_concurrency(),
        store_timeout = ?config.store_timeout(),
        batch_deadline = ?config.batch_deadline(),
        day_boundary = %config.day_boundary().as_str(),
        county_weight = %config.county_weight(),
        "config_loaded"
    );

    let user_location: LatLng = match args.location.parse() {
        Ok(location) => location,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    // A discovery failure is reported as "no stores", not as an error
    let stores = load_places(&args.stores).unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "store_discovery_failed");
        Vec::new()
    });

    let ratings = MemoryRatingSource::load_jsonl(config.ratings_file()).unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "ratings_unavailable");
        MemoryRatingSource::new()
    });

    let resolver = FccCountyResolver::from_config(&config)?;
    let metrics = Arc::new(Metrics::new());
    let coordinator = BatchCoordinator::from_config(
        &config,
        Arc::new(resolver),
        Arc::new(ratings),
        metrics.clone(),
    );

    let result = coordinator.aggregate(stores).await;

    if config.log_summary() {
        metrics.report().log();
    }

    if result.is_empty() {
        error!(location = %args.location, "no_valid_stores");
        eprintln!("Failed to find any valid stores near the address: {}", args.location);
        return Ok(ExitCode::FAILURE);
    }

    let response = StoresResponse { stores: result, user_location };
    println!("{}", serde_json::to_string(&response)?);

    Ok(ExitCode::SUCCESS)
}
