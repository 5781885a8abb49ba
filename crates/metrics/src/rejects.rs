//! Configuration rejects (NACKs) reported by proxies.

use prometheus::GaugeVec;

use crate::catalog::MetricCatalog;
use crate::kind::ResourceKind;

impl MetricCatalog {
    /// Record a NACK of a `kind` push from proxy `node` with `error_code`.
    ///
    /// Two writes, always together: the unified `config_rejects_total` and the
    /// legacy per-kind gauge. The legacy write is a migration shim and goes
    /// away with the legacy series. Unknown kinds only get the unified write,
    /// labeled with their raw type URL.
    pub fn record_reject(&self, kind: &ResourceKind, node: &str, error_code: &str) {
        self.total_rejects
            .with_label_values(&[kind.metric_type()])
            .inc();

        if let Some(legacy) = self.legacy_rejects(kind) {
            legacy.with_label_values(&[node, error_code]).inc();
        }
    }

    fn legacy_rejects(&self, kind: &ResourceKind) -> Option<&GaugeVec> {
        match kind {
            ResourceKind::Listener => Some(&self.lds_rejects),
            ResourceKind::Route => Some(&self.rds_rejects),
            ResourceKind::Cluster => Some(&self.cds_rejects),
            ResourceKind::Endpoint => Some(&self.eds_rejects),
            ResourceKind::Unknown(_) => None,
        }
    }
}
