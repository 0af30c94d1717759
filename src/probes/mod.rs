//! Built-in probes and config-driven registration.
//!
//! # Data Flow
//! ```text
//! [[probes]] entries
//!     → build() (tcp.rs / http.rs / static verdict)
//!     → HealthChecks::register_with_timeout
//!
//! On reload:
//!     sync(previous, next)
//!     → unregister ids that disappeared
//!     → register every current probe (overwrites in place)
//! ```
//!
//! # Design Decisions
//! - Probes report target trouble as DOWN; only machinery problems are faults
//! - Procedures registered from code are never touched by sync, unless they
//!   sit below a configured probe that was removed

pub mod http;
pub mod tcp;

use thiserror::Error;

use crate::checks::{CheckError, HealthChecks, Procedure, Status};
use crate::config::{ProbeConfig, ProbeKind};

pub use self::http::{http_probe, probe_client, ProbeClient};
pub use self::tcp::tcp_probe;

/// Errors turning probe definitions into registrations.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe '{0}' needs a target")]
    MissingTarget(String),

    #[error("failed to register probe: {0}")]
    Register(#[from] CheckError),
}

/// Build the procedure described by `config`.
pub fn build(config: &ProbeConfig, client: &ProbeClient) -> Result<Procedure, ProbeError> {
    let target = || {
        config
            .target
            .clone()
            .ok_or_else(|| ProbeError::MissingTarget(config.id.clone()))
    };

    Ok(match config.kind {
        ProbeKind::Tcp => tcp_probe(target()?),
        ProbeKind::Http => http_probe(client.clone(), target()?),
        ProbeKind::Static if config.up => Procedure::constant(Status::up()),
        ProbeKind::Static => Procedure::constant(Status::down()),
    })
}

fn register(
    checks: &HealthChecks,
    config: &ProbeConfig,
    client: &ProbeClient,
) -> Result<(), ProbeError> {
    let procedure = build(config, client)?;
    let timeout = config
        .timeout()
        .unwrap_or_else(|| checks.registry().default_timeout());
    checks.register_with_timeout(&config.id, timeout, procedure)?;
    tracing::info!(id = %config.id, kind = ?config.kind, "Probe registered");
    Ok(())
}

/// Register every configured probe.
pub fn register_all(
    checks: &HealthChecks,
    probes: &[ProbeConfig],
    client: &ProbeClient,
) -> Result<(), ProbeError> {
    probes.iter().try_for_each(|probe| register(checks, probe, client))
}

/// Bring the registry from the `previous` probe list to the `next` one.
///
/// Failures are logged and skipped so one bad entry does not block the rest.
pub fn sync(
    checks: &HealthChecks,
    previous: &[ProbeConfig],
    next: &[ProbeConfig],
    client: &ProbeClient,
) {
    for old in previous {
        if !next.iter().any(|probe| probe.id == old.id) && checks.unregister(&old.id) {
            tracing::info!(id = %old.id, "Probe unregistered");
        }
    }
    for probe in next {
        if let Err(e) = register(checks, probe, client) {
            tracing::error!(id = %probe.id, error = %e, "Failed to apply probe");
        }
    }
}
