//! Daemon lifecycle: registry and catalog bootstrap, exporter, shutdown.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use fleetcfg_metrics::{MetricCatalog, SeriesDesc};
use prometheus::Registry;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::DaemonConfig;

/// A bootstrapped daemon. Holding one means the catalog is registered and
/// recorders may be handed to connection workers.
pub struct Daemon {
    config: DaemonConfig,
    registry: Registry,
    catalog: Arc<MetricCatalog>,
}

impl Daemon {
    /// Register the metric catalog. Any error here must stop the process.
    pub fn bootstrap(config: DaemonConfig) -> Result<Self> {
        let registry = config.metrics.registry()?;
        let catalog =
            fleetcfg_metrics::init(&registry).context("Failed to register metric catalog")?;
        Ok(Self {
            config,
            registry,
            catalog,
        })
    }

    /// Shared handle for recording.
    pub fn catalog(&self) -> Arc<MetricCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Serve metrics until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if !self.config.metrics.enabled {
            info!("Metrics endpoint disabled");
            shutdown.await;
            return Ok(());
        }

        let addr = self.config.metrics.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind metrics endpoint on {}", addr))?;
        let server = tokio::spawn(fleetcfg_metrics::server::serve(
            listener,
            self.registry.clone(),
        ));

        shutdown.await;
        info!("Shutting down metrics endpoint");
        server.abort();
        match server.await {
            Ok(Err(e)) => error!("Metrics server error: {}", e),
            Err(e) if !e.is_cancelled() => error!("Metrics server task failed: {}", e),
            _ => {}
        }
        Ok(())
    }
}

/// Human-readable table of every exported series.
pub fn catalog_table(series: &[SeriesDesc]) -> String {
    let width = series.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for desc in series {
        let labels = if desc.labels.is_empty() {
            "-".to_string()
        } else {
            desc.labels.join(",")
        };
        out.push_str(&format!(
            "{:<width$}  {:<12}  {:<12}  {}\n",
            desc.name,
            desc.kind.as_str(),
            labels,
            desc.help,
            width = width
        ));
    }
    out
}
