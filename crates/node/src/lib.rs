//! Fleetcfg daemon
//!
//! Bootstraps the push metric catalog and serves it to Prometheus.

pub mod config;
pub mod daemon;

pub use config::{
    DaemonConfig, MetricsConfig, CONFIG_FILENAME, DEFAULT_HOME_DIR, DEFAULT_METRICS_PORT,
    FLEETCFGD_HOME_ENV,
};
pub use daemon::{catalog_table, Daemon};
