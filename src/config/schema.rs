//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the health service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Engine and HTTP boundary settings.
    pub health: HealthConfig,

    /// Optional bearer-token gate.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Probes registered at startup and re-synced on reload.
    pub probes: Vec<ProbeConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Engine and boundary settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    /// Timeout for procedures registered without one, in milliseconds.
    pub default_timeout_ms: u64,

    /// Path under which the check tree is served.
    pub route_prefix: String,

    /// Upper bound for a whole HTTP request, in seconds.
    pub request_timeout_secs: u64,
}

impl HealthConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 1000,
            route_prefix: "/health".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Bearer-token gate. Disabled when no key is set.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Scrape endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "health_tree=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Kind of built-in probe.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// TCP connect to `host:port`.
    Tcp,
    /// HTTP GET, UP on 2xx.
    Http,
    /// Fixed verdict.
    Static,
}

/// A probe definition.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProbeConfig {
    /// Dot-separated check identifier.
    pub id: String,

    pub kind: ProbeKind,

    /// Address (tcp) or URL (http). Unused for static probes.
    #[serde(default)]
    pub target: Option<String>,

    /// Per-probe timeout; falls back to `health.default_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Verdict reported by static probes.
    #[serde(default = "default_up")]
    pub up: bool,
}

fn default_up() -> bool {
    true
}

impl ProbeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
