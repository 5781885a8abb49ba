//! Bootstrap errors.

use thiserror::Error;

/// Errors raised while building the metric catalog.
///
/// Recording never fails; only registration does, and callers are expected
/// to abort startup on any of these.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Two series in the catalog share a name.
    #[error("Duplicate series name: {name}")]
    DuplicateSeries { name: String },

    /// The registry refused a collector (already registered, bad label set).
    #[error("Failed to register series {name}: {source}")]
    Registration {
        name: String,
        #[source]
        source: prometheus::Error,
    },
}

/// Metrics result type alias.
pub type MetricsResult<T> = Result<T, MetricsError>;
