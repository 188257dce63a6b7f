use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::metrics::Metrics;

/// State shared between the reconciliation driver and whatever surface the
/// host exposes it on.
#[derive(Clone, Default)]
pub struct State {
    /// Diagnostics read by the host
    pub diagnostics: Arc<RwLock<Diagnostics>>,
    /// Prometheus metrics
    pub metrics: Arc<Metrics>,
}

impl State {
    /// Metrics getter, encoded in OpenMetrics text format.
    pub fn metrics(&self) -> String {
        let mut buffer = String::new();
        let registry = &*self.metrics.registry;
        prometheus_client::encoding::text::encode(&mut buffer, registry)
            .expect("string writes are infallible");
        buffer
    }

    /// State getter
    pub async fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().await.clone()
    }

    /// Records one reconciliation pass, ready or short-circuited.
    pub async fn record_pass(&self, duration: Duration, ready: bool) {
        self.metrics.observe_pass(duration, ready);
        self.diagnostics.write().await.last_pass = Utc::now();
    }
}

/// Diagnostics exposed alongside the metrics.
#[derive(Clone, Serialize)]
pub struct Diagnostics {
    pub last_pass: DateTime<Utc>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            last_pass: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_pass_updates_metrics_and_diagnostics() {
        let state = State::default();
        let before = state.diagnostics().await.last_pass;

        state.record_pass(Duration::from_millis(2), true).await;
        state.record_pass(Duration::from_millis(1), false).await;

        let encoded = state.metrics();
        assert!(encoded.contains("dr_reconciler_reconcile_passes_total 1"));
        assert!(encoded.contains("dr_reconciler_reconcile_skipped_total 1"));
        assert!(state.diagnostics().await.last_pass >= before);
    }
}
