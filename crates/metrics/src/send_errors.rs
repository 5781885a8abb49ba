//! Send failure classification.
//!
//! Streams are torn down routinely (periodic rotation, pod shutdown) and the
//! transport reports that as `Unavailable` or `Cancelled`. Those are logged and
//! otherwise ignored; everything else counts as a genuine send error.

use std::error::Error;

use tonic::{Code, Status};
use tracing::{info, warn};

use crate::catalog::MetricCatalog;
use crate::kind::ResourceKind;

/// Outcome of inspecting a send failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// Expected connection teardown.
    Benign,
    /// Anything else.
    Genuine,
}

/// Find the gRPC status carried by `err` or anything in its source chain.
pub fn status_of<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Status> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(status) = e.downcast_ref::<Status>() {
            return Some(status);
        }
        current = e.source();
    }
    None
}

/// Classify a send failure. Errors without a gRPC status are genuine.
pub fn classify(err: &(dyn Error + 'static)) -> SendFailure {
    match status_of(err).map(Status::code) {
        Some(Code::Unavailable) | Some(Code::Cancelled) => SendFailure::Benign,
        _ => SendFailure::Genuine,
    }
}

impl MetricCatalog {
    /// Record a failed send on connection `connection_id`.
    ///
    /// Benign failures are logged at info and not counted. Genuine failures are
    /// logged as warnings and counted against `kind`; unknown kinds are logged
    /// but not counted.
    pub fn record_send_error(
        &self,
        kind: &ResourceKind,
        connection_id: &str,
        err: &(dyn Error + 'static),
    ) {
        match classify(err) {
            SendFailure::Benign => {
                info!(
                    kind = %kind,
                    connection = connection_id,
                    error = %err,
                    "Send closed by connection teardown"
                );
            }
            SendFailure::Genuine => {
                warn!(
                    kind = %kind,
                    connection = connection_id,
                    error = %err,
                    "Send failure"
                );
                if kind.is_known() {
                    self.send_errors
                        .with_label_values(&[kind.metric_type()])
                        .inc();
                }
            }
        }
    }
}
