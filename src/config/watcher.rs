//! Configuration file watcher for hot reload.
//!
//! Only configurations that load, validate and differ from the last one
//! delivered are forwarded; an invalid edit keeps the running configuration.
//! An empty file is skipped: editors that truncate before writing surface
//! one mid-save, and it would otherwise parse as "no probes".

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::ServiceConfig;

/// Load `path` and return it if it should replace `last`.
///
/// `last` is updated to the returned configuration.
pub fn reload(path: &Path, last: &Mutex<ServiceConfig>) -> Result<Option<ServiceConfig>, ConfigError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        tracing::debug!(path = ?path, "Config file is empty, waiting for the write to land");
        return Ok(None);
    }

    let config = parse_config(&content)?;
    let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
    if *last == config {
        return Ok(None);
    }
    *last = config.clone();
    Ok(Some(config))
}

/// Watches a configuration file and streams reloaded configurations.
pub struct ConfigWatcher {
    path: PathBuf,
    current: ServiceConfig,
    update_tx: mpsc::UnboundedSender<ServiceConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, starting from the already-loaded
    /// `current` configuration.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(
        path: &Path,
        current: ServiceConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ServiceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let last = Arc::new(Mutex::new(self.current));

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match reload(&path, &last) {
                        Ok(Some(config)) => {
                            tracing::info!(probes = config.probes.len(), "Configuration reloaded");
                            let _ = tx.send(config);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_PROBE: &str = r#"
[[probes]]
id = "maintenance"
kind = "static"
"#;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("health-tree-watcher-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn test_empty_file_is_skipped() {
        let path = temp_path("empty");
        fs::write(&path, ONE_PROBE).unwrap();
        let last = Mutex::new(parse_config(ONE_PROBE).unwrap());

        fs::write(&path, "").unwrap();
        assert!(reload(&path, &last).unwrap().is_none());
        fs::write(&path, "  \n\n").unwrap();
        assert!(reload(&path, &last).unwrap().is_none());
        assert_eq!(last.lock().unwrap().probes.len(), 1);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_changed_file_is_forwarded_once() {
        let path = temp_path("changed");
        let last = Mutex::new(ServiceConfig::default());

        fs::write(&path, ONE_PROBE).unwrap();
        let config = reload(&path, &last).unwrap().unwrap();
        assert_eq!(config.probes[0].id, "maintenance");
        assert!(reload(&path, &last).unwrap().is_none());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_file_keeps_last() {
        let path = temp_path("invalid");
        let last = Mutex::new(parse_config(ONE_PROBE).unwrap());

        fs::write(&path, "[[probes]]\nid = \"\"\nkind = \"static\"\n").unwrap();
        assert!(reload(&path, &last).is_err());
        assert_eq!(last.lock().unwrap().probes[0].id, "maintenance");

        fs::remove_file(&path).ok();
    }
}
