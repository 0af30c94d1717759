//! Service startup sequence.

use std::net::AddrParseError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::checks::HealthChecks;
use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, ConfigError, ProbeConfig, ServiceConfig};
use crate::http::HealthServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::probes::{self, probe_client, ProbeClient, ProbeError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("probe setup: {0}")]
    Probe(#[from] ProbeError),

    #[error("invalid address: {0}")]
    Address(#[from] AddrParseError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the configuration file, or the validated defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = ServiceConfig::default();
            crate::config::validation::validate_config(&config)
                .map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Build the engine from `config`, serve it, and return after `shutdown`.
///
/// With a `config_path` the file is watched and probe changes are applied
/// to the live registry.
pub async fn run(
    config: ServiceConfig,
    config_path: Option<PathBuf>,
    shutdown: Shutdown,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let checks = HealthChecks::with_default_timeout(config.health.default_timeout());
    let client = probe_client();
    probes::register_all(&checks, &config.probes, &client)?;
    tracing::info!(procedures = checks.registry().len(), "Health checks ready");

    let _watcher = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            tokio::spawn(apply_updates(
                checks.clone(),
                config.probes.clone(),
                updates,
                client.clone(),
            ));
            Some(watcher.run()?)
        }
        None => None,
    };

    let tls = config.listener.tls.is_some();
    let bind_address = config.listener.bind_address.clone();
    let server = HealthServer::new(config, checks);

    if tls {
        server.run_tls(shutdown.listen()).await?;
    } else {
        let listener = TcpListener::bind(&bind_address).await?;
        server.run(listener, shutdown.listen()).await?;
    }
    Ok(())
}

async fn apply_updates(
    checks: HealthChecks,
    mut current: Vec<ProbeConfig>,
    mut updates: mpsc::UnboundedReceiver<ServiceConfig>,
    client: ProbeClient,
) {
    while let Some(config) = updates.recv().await {
        probes::sync(&checks, &current, &config.probes, &client);
        tracing::info!(procedures = checks.registry().len(), "Probe configuration applied");
        current = config.probes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(load(None).unwrap(), ServiceConfig::default());
    }
}
