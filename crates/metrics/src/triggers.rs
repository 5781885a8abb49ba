//! Push trigger reasons.

use crate::catalog::MetricCatalog;
use crate::kind::TriggerReason;

impl MetricCatalog {
    /// Count each reason behind one push.
    ///
    /// A push can have several reasons at once, so the sum over reasons may
    /// exceed the number of push attempts.
    pub fn record_push_triggers<I>(&self, reasons: I)
    where
        I: IntoIterator<Item = TriggerReason>,
    {
        for reason in reasons {
            self.push_triggers
                .with_label_values(&[reason.as_str()])
                .inc();
        }
    }
}
