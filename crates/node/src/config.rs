//! Daemon configuration
//!
//! Stored as TOML at `{home}/config/fleetcfgd.toml`. Every field has a default,
//! so a missing file or a partial one is fine.
//!
//! # Example fleetcfgd.toml
//!
//! ```toml
//! [metrics]
//! # Serve /metrics and /health
//! enabled = true
//!
//! # <host>:<port> for the metrics endpoint
//! listen-addr = "127.0.0.1:15014"
//!
//! # Optional prefix for every series name (e.g. "pilot" -> pilot_config_push_attempts)
//! namespace = ""
//! ```

use anyhow::{Context, Result};
use prometheus::Registry;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable for home directory override.
///
/// When set, this takes precedence over the default home directory
/// (`~/.fleetcfgd`).
pub const FLEETCFGD_HOME_ENV: &str = "FLEETCFGD_HOME";

/// Default home directory name (relative to user's home directory).
pub const DEFAULT_HOME_DIR: &str = ".fleetcfgd";

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "fleetcfgd.toml";

/// Default metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 15014;

/// Metrics exporter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetricsConfig {
    /// Serve the metrics endpoint.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Address the metrics endpoint binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Prefix applied to every series name. Empty means none.
    #[serde(default)]
    pub namespace: String,
}

fn default_enabled() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], DEFAULT_METRICS_PORT))
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            listen_addr: default_listen_addr(),
            namespace: String::new(),
        }
    }
}

impl MetricsConfig {
    /// Build the registry the catalog is registered into.
    pub fn registry(&self) -> Result<Registry> {
        if self.namespace.is_empty() {
            return Ok(Registry::new());
        }
        Registry::new_custom(Some(self.namespace.clone()), None)
            .with_context(|| format!("Invalid metrics namespace: {}", self.namespace))
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DaemonConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DaemonConfig {
    /// Get the path to the config file under `home`.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join("config").join(CONFIG_FILENAME)
    }

    /// Load configuration from `path`.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.listen_addr.port(), DEFAULT_METRICS_PORT);
        assert!(config.metrics.namespace.is_empty());
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempdir().unwrap();
        let path = DaemonConfig::config_path(dir.path());

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = DaemonConfig::config_path(dir.path());

        let mut config = DaemonConfig::default();
        config.metrics.listen_addr = "0.0.0.0:9100".parse().unwrap();
        config.metrics.namespace = "pilot".to_string();
        config.save(&path).unwrap();

        let loaded = DaemonConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[metrics]\nnamespace = \"pilot\"\n").unwrap();

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config.metrics.namespace, "pilot");
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.listen_addr, default_listen_addr());
    }

    #[test]
    fn test_kebab_case_keys() {
        let toml_str = toml::to_string_pretty(&DaemonConfig::default()).unwrap();
        assert!(toml_str.contains("listen-addr"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[metrics\n").unwrap();

        assert!(DaemonConfig::load(&path).is_err());
    }

    #[test]
    fn test_namespaced_registry_prefixes_series() {
        let metrics = MetricsConfig {
            namespace: "pilot".to_string(),
            ..Default::default()
        };
        let registry = metrics.registry().unwrap();
        let catalog = fleetcfg_metrics::init(&registry).unwrap();
        catalog.record_write_timeout();

        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"pilot_config_write_timeouts_total".to_string()));
    }
}
