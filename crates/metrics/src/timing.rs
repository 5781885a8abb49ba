//! Push and send latency.
//!
//! Push time covers building and pushing one resource kind, so it is labeled
//! by kind. Send time is the wire transmission only; a single send can carry
//! several kinds, so it is unlabeled.

use std::time::Duration;

use crate::catalog::MetricCatalog;
use crate::kind::ResourceKind;

impl MetricCatalog {
    /// Observe a completed push of `kind` and count it as one attempt.
    pub fn record_push_time(&self, kind: &ResourceKind, duration: Duration) {
        let label = [kind.metric_type()];
        self.push_time
            .with_label_values(&label)
            .observe(duration.as_secs_f64());
        self.push_attempts.with_label_values(&label).inc();
    }

    /// Observe one wire transmission.
    pub fn record_send_time(&self, duration: Duration) {
        self.send_time.observe(duration.as_secs_f64());
    }

    /// Observe how long a proxy sat in the push queue.
    pub fn record_proxy_queue_time(&self, duration: Duration) {
        self.proxy_queue_time.observe(duration.as_secs_f64());
    }

    /// Observe the delay between a config change and a proxy having all of it.
    pub fn record_convergence_delay(&self, duration: Duration) {
        self.proxy_convergence.observe(duration.as_secs_f64());
    }
}
