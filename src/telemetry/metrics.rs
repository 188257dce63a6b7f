use std::sync::Arc;
use std::time::Duration;

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Reconciliation metrics, registered once and shared behind `Arc`.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    pub passes: Counter,
    pub skipped: Counter,
    pub pass_duration: Histogram,
}

impl Default for Metrics {
    fn default() -> Self {
        let mut registry = Registry::with_prefix("dr_reconciler");
        let passes = Counter::default();
        registry.register(
            "reconcile_passes",
            "Reconciliation passes that produced derived state",
            passes.clone(),
        );
        let skipped = Counter::default();
        registry.register(
            "reconcile_skipped",
            "Passes short-circuited by a pending or failed snapshot",
            skipped.clone(),
        );
        let pass_duration = Histogram::new(exponential_buckets(0.0005, 2.0, 12));
        registry.register(
            "reconcile_duration_seconds",
            "Wall time of one reconciliation pass",
            pass_duration.clone(),
        );
        Metrics {
            registry: Arc::new(registry),
            passes,
            skipped,
            pass_duration,
        }
    }
}

impl Metrics {
    pub fn observe_pass(&self, duration: Duration, ready: bool) {
        if ready {
            self.passes.inc();
        } else {
            self.skipped.inc();
        }
        self.pass_duration.observe(duration.as_secs_f64());
    }
}
