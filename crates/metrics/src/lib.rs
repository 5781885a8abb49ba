//! Fleetcfg push accounting and Prometheus metrics.
//!
//! This crate turns push pipeline events (pushes, sends, NACKs, client
//! connects, trigger reasons) into Prometheus series. All series live in a
//! [`MetricCatalog`] that is registered once at startup and then shared with
//! every connection worker; recording never fails and never blocks on I/O.

pub mod catalog;
mod clients;
pub mod error;
pub mod kind;
mod pipeline;
mod rejects;
pub mod send_errors;
pub mod server;
mod timing;
mod triggers;

pub use catalog::{MetricCatalog, SeriesDesc, SeriesKind, SERIES};
pub use error::{MetricsError, MetricsResult};
pub use kind::{InboundUpdate, ResourceKind, TriggerReason};
pub use send_errors::SendFailure;
pub use server::{render, serve};

use std::sync::Arc;

use prometheus::Registry;

/// Register the catalog with `registry`. Call once at startup.
pub fn init(registry: &Registry) -> MetricsResult<Arc<MetricCatalog>> {
    let catalog = MetricCatalog::register(registry)?;
    tracing::info!("Fleetcfg metrics initialized");
    Ok(Arc::new(catalog))
}
