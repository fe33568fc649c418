//! cart-sync - Abandoned-cart synchronization into a marketing automation platform
//!
//! This is the main entry point for the cart-sync application.

use clap::Parser;
use tracing::info;

use cart_sync::config::Config;
use cart_sync::logging::init_tracing;
use cart_sync::source::{CartSource, FileSource};
use cart_sync::sync::SyncOrchestrator;

/// cart-sync - Push abandoned carts to marketing platform contacts
#[derive(Parser, Debug)]
#[command(name = "cart-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "CART_SYNC_CONFIG")]
    config: Option<String>,

    /// Path to a JSON or YAML file of abandoned-cart records
    #[arg(short, long)]
    records: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = load_config(&args)?;

    // Initialize tracing/logging
    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting cart-sync");

    let orchestrator = SyncOrchestrator::from_config(&config)?;
    info!(
        base_url = %config.platform.base_url,
        tag_id = %config.fields.tag_id,
        "Platform client initialized"
    );

    let records_path = args
        .records
        .clone()
        .or_else(|| config.source.path.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No record source: pass --records or set source.path")
        })?;

    let source = FileSource::new(&records_path);
    info!(source = source.name(), path = %records_path, "Record source selected");

    // Per-record failures are logged and counted, never fatal
    let summary = orchestrator.run_source(&source).await?;

    info!(
        total = summary.total,
        done = summary.done,
        skipped = summary.skipped,
        tag_failures = summary.tag_failures,
        attribute_failures = summary.attribute_failures,
        "cart-sync complete"
    );

    Ok(())
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}
