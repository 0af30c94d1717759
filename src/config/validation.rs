//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs, identifiers and value ranges
//! - Detect duplicate probe identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::checks::Identifier;
use crate::config::schema::{ProbeConfig, ProbeKind, ServiceConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("route prefix '{0}' must start with '/'")]
    RoutePrefix(String),

    #[error("probe id '{0}' is not a valid check identifier")]
    ProbeId(String),

    #[error("probe id '{0}' is defined more than once")]
    DuplicateProbe(String),

    #[error("probe '{0}' needs a target")]
    MissingTarget(String),

    #[error("probe '{id}' has invalid target '{target}': {reason}")]
    InvalidTarget {
        id: String,
        target: String,
        reason: String,
    },

    #[error("probe '{0}' has a zero timeout")]
    ProbeTimeout(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.health.default_timeout_ms == 0 {
        errors.push(ValidationError::Zero("health.default_timeout_ms"));
    }
    if config.health.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("health.request_timeout_secs"));
    }
    if !config.health.route_prefix.starts_with('/') {
        errors.push(ValidationError::RoutePrefix(config.health.route_prefix.clone()));
    }

    let mut seen = HashSet::new();
    for probe in &config.probes {
        validate_probe(probe, &mut errors);
        if !seen.insert(probe.id.as_str()) {
            errors.push(ValidationError::DuplicateProbe(probe.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_probe(probe: &ProbeConfig, errors: &mut Vec<ValidationError>) {
    match Identifier::parse(&probe.id) {
        Ok(id) if !id.is_root() => {}
        _ => errors.push(ValidationError::ProbeId(probe.id.clone())),
    }

    if probe.timeout_ms == Some(0) {
        errors.push(ValidationError::ProbeTimeout(probe.id.clone()));
    }

    let invalid = |target: &str, reason: String| ValidationError::InvalidTarget {
        id: probe.id.clone(),
        target: target.to_string(),
        reason,
    };

    match (probe.kind, probe.target.as_deref()) {
        (ProbeKind::Static, _) => {}
        (_, None) => errors.push(ValidationError::MissingTarget(probe.id.clone())),
        (ProbeKind::Tcp, Some(target)) => match target.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => errors.push(invalid(target, "expected host:port".to_string())),
        },
        (ProbeKind::Http, Some(target)) => match Url::parse(target) {
            Ok(url) if url.scheme() == "http" && url.host().is_some() => {}
            Ok(url) => errors.push(invalid(
                target,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(invalid(target, e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(id: &str, kind: ProbeKind, target: Option<&str>) -> ProbeConfig {
        ProbeConfig {
            id: id.to_string(),
            kind,
            target: target.map(str::to_string),
            timeout_ms: None,
            up: true,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.health.default_timeout_ms = 0;
        config.health.route_prefix = "health".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_probe_errors() {
        let mut config = ServiceConfig::default();
        config.probes = vec![
            probe("db..primary", ProbeKind::Static, None),
            probe("db", ProbeKind::Tcp, None),
            probe("cache", ProbeKind::Tcp, Some("localhost")),
            probe("api", ProbeKind::Http, Some("https://example.com/health")),
            probe("api", ProbeKind::Http, Some("http://127.0.0.1:3000/health")),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ProbeId("db..primary".into())));
        assert!(errors.contains(&ValidationError::MissingTarget("db".into())));
        assert!(errors.contains(&ValidationError::DuplicateProbe("api".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidTarget { id, .. } if id == "cache")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidTarget { reason, .. } if reason.contains("https"))));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_zero_probe_timeout_rejected() {
        let mut config = ServiceConfig::default();
        let mut p = probe("maintenance", ProbeKind::Static, None);
        p.timeout_ms = Some(0);
        config.probes.push(p);

        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ProbeTimeout("maintenance".into())]
        );
    }
}
