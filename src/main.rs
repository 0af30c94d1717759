//! health-tree service.
//!
//! Serves the configured probe tree over HTTP.
//!
//! ```text
//! GET /health            → whole tree
//! GET /health/db         → subtree "db"
//! GET /health/db/primary → subtree "db.primary"
//! ```

use std::path::PathBuf;

use clap::Parser;

use health_tree::lifecycle::{signals, startup, Shutdown};
use health_tree::observability::logging;

#[derive(Parser)]
#[command(name = "health-tree")]
#[command(about = "Hierarchical health-check service", long_about = None)]
struct Args {
    /// TOML configuration file; watched for probe changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = startup::load(args.config.as_deref())?;

    logging::init_logging(&config.observability.log_filter)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "health-tree starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        probes = config.probes.len(),
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    startup::run(config, args.config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
