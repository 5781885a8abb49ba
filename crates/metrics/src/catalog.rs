//! Metric catalog: the fixed set of series exported by the push pipeline.
//!
//! Every series is declared once in [`SERIES`] and registered by
//! [`MetricCatalog::register`]. Recorders live in sibling modules as
//! `impl MetricCatalog` blocks, so nothing can record into a series that was
//! not registered first.

use std::collections::HashSet;
use std::fmt;

use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};
use tracing::{debug, info};

use crate::clients::ClientVersionTracker;
use crate::error::{MetricsError, MetricsResult};

/// Buckets shared by the push and send latency distributions.
pub const PUSH_BUCKETS: &[f64] = &[0.01, 0.1, 1.0, 3.0, 5.0, 10.0, 20.0, 30.0];
/// Buckets for time spent in the push queue.
pub const QUEUE_BUCKETS: &[f64] = &[0.1, 1.0, 3.0, 5.0, 10.0, 20.0, 30.0];
/// Buckets for config-change to proxy-converged delay.
pub const CONVERGENCE_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 3.0, 5.0, 10.0, 20.0, 30.0];

/// Instrument type of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Counter,
    Gauge,
    Distribution,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Counter => "counter",
            SeriesKind::Gauge => "gauge",
            SeriesKind::Distribution => "distribution",
        }
    }
}

/// Static description of one exported series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub kind: SeriesKind,
    /// Bucket boundaries; empty for counters and gauges.
    pub buckets: &'static [f64],
}

impl SeriesDesc {
    const fn counter(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: SeriesKind::Counter,
            buckets: &[],
        }
    }

    const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: SeriesKind::Gauge,
            buckets: &[],
        }
    }

    const fn distribution(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
        buckets: &'static [f64],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: SeriesKind::Distribution,
            buckets,
        }
    }
}

// Rejects
//
// The per-kind legacy gauges predate `config_rejects_total` and are kept only
// for existing dashboards. Drop them together with the second write in
// `record_reject` once those dashboards move to the unified series.
pub const LDS_REJECTS: SeriesDesc = SeriesDesc::gauge(
    "config_rejects_legacy_listener",
    "Listener configs rejected by proxies (legacy, use config_rejects_total)",
    &["node", "errcode"],
);
pub const RDS_REJECTS: SeriesDesc = SeriesDesc::gauge(
    "config_rejects_legacy_route",
    "Route configs rejected by proxies (legacy, use config_rejects_total)",
    &["node", "errcode"],
);
pub const CDS_REJECTS: SeriesDesc = SeriesDesc::gauge(
    "config_rejects_legacy_cluster",
    "Cluster configs rejected by proxies (legacy, use config_rejects_total)",
    &["node", "errcode"],
);
pub const EDS_REJECTS: SeriesDesc = SeriesDesc::gauge(
    "config_rejects_legacy_endpoint",
    "Endpoint configs rejected by proxies (legacy, use config_rejects_total)",
    &["node", "errcode"],
);
pub const TOTAL_REJECTS: SeriesDesc = SeriesDesc::counter(
    "config_rejects_total",
    "Total number of pushed configs rejected by proxies",
    &["kind"],
);

// Clients
pub const CLIENTS_CONNECTED: SeriesDesc = SeriesDesc::gauge(
    "config_clients_connected",
    "Proxies currently connected, by reported version",
    &["version"],
);

// Pushes
pub const PUSH_ATTEMPTS: SeriesDesc = SeriesDesc::counter(
    "config_push_attempts",
    "Push attempts, one per timed push",
    &["kind"],
);
pub const PUSH_DURATION: SeriesDesc = SeriesDesc::distribution(
    "config_push_duration_seconds",
    "Time to build and push an update of one resource kind",
    &["kind"],
    PUSH_BUCKETS,
);
pub const SEND_DURATION: SeriesDesc = SeriesDesc::distribution(
    "config_send_duration_seconds",
    "Time to send generated configuration over the wire",
    &[],
    PUSH_BUCKETS,
);
pub const PUSH_TRIGGERS: SeriesDesc = SeriesDesc::counter(
    "config_push_triggers_total",
    "Times a push was triggered, by reason",
    &["reason"],
);
pub const SEND_ERRORS: SeriesDesc = SeriesDesc::counter(
    "config_send_errors_total",
    "Send failures other than connection teardown",
    &["kind"],
);
pub const DELAYED_PUSHES: SeriesDesc = SeriesDesc::counter(
    "config_delayed_pushes_total",
    "Pushes delayed because the previous push was not yet acknowledged",
    &["kind"],
);
pub const DELAYED_PUSH_TIMEOUTS: SeriesDesc = SeriesDesc::counter(
    "config_delayed_push_timeouts_total",
    "Delayed pushes sent anyway after the failsafe timeout",
    &["kind"],
);
pub const EXPIRED_NONCE: SeriesDesc = SeriesDesc::counter(
    "config_expired_nonce_total",
    "Requests received with an expired nonce",
    &["kind"],
);

// Control plane state
pub const SERVICES: SeriesDesc = SeriesDesc::gauge(
    "config_services",
    "Services known to the control plane",
    &[],
);
pub const WRITE_TIMEOUTS: SeriesDesc = SeriesDesc::counter(
    "config_write_timeouts_total",
    "Response write timeouts",
    &[],
);
pub const PROXY_QUEUE_DURATION: SeriesDesc = SeriesDesc::distribution(
    "config_proxy_queue_duration_seconds",
    "Time a proxy waits in the push queue before being dequeued",
    &[],
    QUEUE_BUCKETS,
);
pub const PROXY_CONVERGENCE: SeriesDesc = SeriesDesc::distribution(
    "config_proxy_convergence_seconds",
    "Delay between a config change and a proxy receiving all required configuration",
    &[],
    CONVERGENCE_BUCKETS,
);
pub const PUSH_CONTEXT_ERRORS: SeriesDesc = SeriesDesc::counter(
    "config_push_context_errors_total",
    "Errors (timeouts) initiating a push context",
    &[],
);
pub const INTERNAL_ERRORS: SeriesDesc = SeriesDesc::counter(
    "config_internal_errors_total",
    "Internal push pipeline errors",
    &[],
);
pub const INBOUND_UPDATES: SeriesDesc = SeriesDesc::counter(
    "config_inbound_updates_total",
    "Updates received by the control plane",
    &["type"],
);

/// Every series owned by the catalog, in registration order.
pub const SERIES: &[SeriesDesc] = &[
    LDS_REJECTS,
    RDS_REJECTS,
    CDS_REJECTS,
    EDS_REJECTS,
    TOTAL_REJECTS,
    CLIENTS_CONNECTED,
    PUSH_ATTEMPTS,
    PUSH_DURATION,
    SEND_DURATION,
    PUSH_TRIGGERS,
    SEND_ERRORS,
    DELAYED_PUSHES,
    DELAYED_PUSH_TIMEOUTS,
    EXPIRED_NONCE,
    SERVICES,
    WRITE_TIMEOUTS,
    PROXY_QUEUE_DURATION,
    PROXY_CONVERGENCE,
    PUSH_CONTEXT_ERRORS,
    INTERNAL_ERRORS,
    INBOUND_UPDATES,
];

/// Reject any table in which a name appears twice.
pub fn validate_series(series: &[SeriesDesc]) -> MetricsResult<()> {
    let mut seen = HashSet::with_capacity(series.len());
    for desc in series {
        if !seen.insert(desc.name) {
            return Err(MetricsError::DuplicateSeries {
                name: desc.name.to_string(),
            });
        }
    }
    Ok(())
}

/// Registered instruments for the push pipeline.
///
/// Built once at startup and shared (usually behind an `Arc`) with every
/// connection worker and the push scheduler.
pub struct MetricCatalog {
    pub(crate) lds_rejects: GaugeVec,
    pub(crate) rds_rejects: GaugeVec,
    pub(crate) cds_rejects: GaugeVec,
    pub(crate) eds_rejects: GaugeVec,
    pub(crate) total_rejects: CounterVec,
    pub(crate) clients: ClientVersionTracker,
    pub(crate) push_attempts: CounterVec,
    pub(crate) push_time: HistogramVec,
    pub(crate) send_time: Histogram,
    pub(crate) push_triggers: CounterVec,
    pub(crate) send_errors: CounterVec,
    pub(crate) delayed_pushes: CounterVec,
    pub(crate) delayed_push_timeouts: CounterVec,
    pub(crate) expired_nonce: CounterVec,
    pub(crate) services: Gauge,
    pub(crate) write_timeouts: Counter,
    pub(crate) proxy_queue_time: Histogram,
    pub(crate) proxy_convergence: Histogram,
    pub(crate) push_context_errors: Counter,
    pub(crate) internal_errors: Counter,
    pub(crate) inbound_updates: CounterVec,
}

impl MetricCatalog {
    /// Register every series in [`SERIES`] with `registry`.
    ///
    /// Fails on the first duplicate name, whether it is duplicated inside the
    /// catalog or already present in the registry. The process must not
    /// continue after an error here.
    pub fn register(registry: &Registry) -> MetricsResult<Self> {
        validate_series(SERIES)?;
        let r = Registrar { registry };

        let catalog = Self {
            lds_rejects: r.gauge_vec(&LDS_REJECTS)?,
            rds_rejects: r.gauge_vec(&RDS_REJECTS)?,
            cds_rejects: r.gauge_vec(&CDS_REJECTS)?,
            eds_rejects: r.gauge_vec(&EDS_REJECTS)?,
            total_rejects: r.counter_vec(&TOTAL_REJECTS)?,
            clients: ClientVersionTracker::new(r.gauge_vec(&CLIENTS_CONNECTED)?),
            push_attempts: r.counter_vec(&PUSH_ATTEMPTS)?,
            push_time: r.histogram_vec(&PUSH_DURATION)?,
            send_time: r.histogram(&SEND_DURATION)?,
            push_triggers: r.counter_vec(&PUSH_TRIGGERS)?,
            send_errors: r.counter_vec(&SEND_ERRORS)?,
            delayed_pushes: r.counter_vec(&DELAYED_PUSHES)?,
            delayed_push_timeouts: r.counter_vec(&DELAYED_PUSH_TIMEOUTS)?,
            expired_nonce: r.counter_vec(&EXPIRED_NONCE)?,
            services: r.gauge(&SERVICES)?,
            write_timeouts: r.counter(&WRITE_TIMEOUTS)?,
            proxy_queue_time: r.histogram(&PROXY_QUEUE_DURATION)?,
            proxy_convergence: r.histogram(&PROXY_CONVERGENCE)?,
            push_context_errors: r.counter(&PUSH_CONTEXT_ERRORS)?,
            internal_errors: r.counter(&INTERNAL_ERRORS)?,
            inbound_updates: r.counter_vec(&INBOUND_UPDATES)?,
        };

        info!(series = SERIES.len(), "Push metrics registered");
        Ok(catalog)
    }
}

impl fmt::Debug for MetricCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricCatalog")
            .field("series", &SERIES.len())
            .finish_non_exhaustive()
    }
}

struct Registrar<'a> {
    registry: &'a Registry,
}

impl Registrar<'_> {
    fn add<C>(&self, desc: &SeriesDesc, collector: Result<C, prometheus::Error>) -> MetricsResult<C>
    where
        C: prometheus::core::Collector + Clone + 'static,
    {
        let wrap = |source| MetricsError::Registration {
            name: desc.name.to_string(),
            source,
        };
        let collector = collector.map_err(wrap)?;
        self.registry
            .register(Box::new(collector.clone()))
            .map_err(wrap)?;
        debug!(
            name = desc.name,
            kind = desc.kind.as_str(),
            "Registered series"
        );
        Ok(collector)
    }

    fn opts(desc: &SeriesDesc) -> Opts {
        Opts::new(desc.name, desc.help)
    }

    fn histogram_opts(desc: &SeriesDesc) -> HistogramOpts {
        HistogramOpts::new(desc.name, desc.help).buckets(desc.buckets.to_vec())
    }

    fn counter(&self, desc: &SeriesDesc) -> MetricsResult<Counter> {
        self.add(desc, Counter::with_opts(Self::opts(desc)))
    }

    fn counter_vec(&self, desc: &SeriesDesc) -> MetricsResult<CounterVec> {
        self.add(desc, CounterVec::new(Self::opts(desc), desc.labels))
    }

    fn gauge(&self, desc: &SeriesDesc) -> MetricsResult<Gauge> {
        self.add(desc, Gauge::with_opts(Self::opts(desc)))
    }

    fn gauge_vec(&self, desc: &SeriesDesc) -> MetricsResult<GaugeVec> {
        self.add(desc, GaugeVec::new(Self::opts(desc), desc.labels))
    }

    fn histogram(&self, desc: &SeriesDesc) -> MetricsResult<Histogram> {
        self.add(desc, Histogram::with_opts(Self::histogram_opts(desc)))
    }

    fn histogram_vec(&self, desc: &SeriesDesc) -> MetricsResult<HistogramVec> {
        self.add(
            desc,
            HistogramVec::new(Self::histogram_opts(desc), desc.labels),
        )
    }
}
