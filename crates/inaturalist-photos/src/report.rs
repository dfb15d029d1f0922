//! Anomaly reporting hook

use tracing::warn;

/// Receives anomalies worth alerting on, such as a taxon name with no match
pub trait AnomalyReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Default reporter: a `warn!` on the `anomaly` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl AnomalyReporter for TracingReporter {
    fn report(&self, message: &str) {
        warn!(target: "anomaly", "{}", message);
    }
}
