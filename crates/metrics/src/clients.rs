//! Connected-client accounting by reported proxy version.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use prometheus::GaugeVec;

use crate::catalog::MetricCatalog;

/// Live client count per version, mirrored into a version-labeled gauge.
///
/// Each version has its own cell; the add and the gauge publish happen under
/// that cell's lock, so concurrent deltas for one version are linearized while
/// unrelated versions never contend. The index lock is only taken for writing
/// the first time a version is seen.
pub(crate) struct ClientVersionTracker {
    gauge: GaugeVec,
    counts: RwLock<HashMap<String, Arc<Mutex<f64>>>>,
}

impl ClientVersionTracker {
    pub(crate) fn new(gauge: GaugeVec) -> Self {
        Self {
            gauge,
            counts: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn apply(&self, version: &str, delta: f64) {
        let cell = self.cell(version);
        let mut count = cell.lock();
        *count += delta;
        self.gauge.with_label_values(&[version]).set(*count);
    }

    fn cell(&self, version: &str) -> Arc<Mutex<f64>> {
        if let Some(cell) = self.counts.read().get(version) {
            return Arc::clone(cell);
        }
        let mut counts = self.counts.write();
        Arc::clone(counts.entry(version.to_string()).or_default())
    }
}

impl MetricCatalog {
    /// Record a client connecting (`delta = 1.0`) or disconnecting (`-1.0`).
    ///
    /// Any version string is accepted. Counts can go negative when a
    /// disconnect arrives without a matching connect (e.g. after a restart);
    /// that is left as is.
    pub fn record_client_change(&self, version: &str, delta: f64) {
        self.clients.apply(version, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    fn connected(catalog: &MetricCatalog, version: &str) -> f64 {
        catalog.clients.gauge.with_label_values(&[version]).get()
    }

    #[test]
    fn test_connect_and_disconnect() {
        let catalog = MetricCatalog::register(&Registry::new()).unwrap();

        catalog.record_client_change("1.12", 1.0);
        catalog.record_client_change("1.12", 1.0);
        catalog.record_client_change("1.13", 1.0);
        catalog.record_client_change("1.12", -1.0);

        assert_eq!(connected(&catalog, "1.12"), 1.0);
        assert_eq!(connected(&catalog, "1.13"), 1.0);
    }

    #[test]
    fn test_unmatched_disconnect_goes_negative() {
        let catalog = MetricCatalog::register(&Registry::new()).unwrap();

        catalog.record_client_change("unknown", -1.0);
        assert_eq!(connected(&catalog, "unknown"), -1.0);

        catalog.record_client_change("unknown", 1.0);
        assert_eq!(connected(&catalog, "unknown"), 0.0);
    }

    #[test]
    fn test_concurrent_deltas_are_not_lost() {
        let catalog = MetricCatalog::register(&Registry::new()).unwrap();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..125 {
                        catalog.record_client_change("1.12", 1.0);
                    }
                });
            }
        });
        assert_eq!(connected(&catalog, "1.12"), 1000.0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        catalog.record_client_change("1.12", -1.0);
                        catalog.record_client_change("1.13", 1.0);
                    }
                });
            }
        });
        assert_eq!(connected(&catalog, "1.12"), 600.0);
        assert_eq!(connected(&catalog, "1.13"), 400.0);
    }
}
