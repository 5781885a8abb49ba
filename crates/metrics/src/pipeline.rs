//! Push pipeline health: delayed pushes, nonces, write timeouts and inbound updates.

use crate::catalog::MetricCatalog;
use crate::kind::{InboundUpdate, ResourceKind};

impl MetricCatalog {
    /// A push of `kind` was held back because the previous one is not yet ACKed.
    pub fn record_delayed_push(&self, kind: &ResourceKind) {
        self.delayed_pushes
            .with_label_values(&[kind.metric_type()])
            .inc();
    }

    /// A delayed push of `kind` was sent anyway after the failsafe timeout.
    pub fn record_delayed_push_timeout(&self, kind: &ResourceKind) {
        self.delayed_push_timeouts
            .with_label_values(&[kind.metric_type()])
            .inc();
    }

    /// A request for `kind` carried a nonce that is no longer current.
    pub fn record_expired_nonce(&self, kind: &ResourceKind) {
        self.expired_nonce
            .with_label_values(&[kind.metric_type()])
            .inc();
    }

    pub fn set_services(&self, count: f64) {
        self.services.set(count);
    }

    pub fn record_write_timeout(&self) {
        self.write_timeouts.inc();
    }

    pub fn record_push_context_error(&self) {
        self.push_context_errors.inc();
    }

    pub fn record_internal_error(&self) {
        self.internal_errors.inc();
    }

    pub fn record_inbound_update(&self, update: InboundUpdate) {
        self.inbound_updates
            .with_label_values(&[update.as_str()])
            .inc();
    }
}
