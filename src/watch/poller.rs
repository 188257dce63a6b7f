//! Host-driven refresh ticks.
//!
//! Reconciliation itself is synchronous; something still has to decide when
//! to re-run it against fresh watch results. The `Poller` owns that timer
//! as an explicit object with its own cancellation handle, instead of a
//! free-standing module-level interval.

use std::future::Future;
use std::time::Duration;

use anyhow::bail;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::constants::DEFAULT_POLL_PERIOD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Unstarted,
    Polling,
    Stopped,
}

/// Periodic driver for reconciliation passes. The lifecycle is one-way:
/// a poller starts at most once and stays stopped once stopped.
pub struct Poller {
    period: Duration,
    state: PollerState,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(period: Duration) -> Self {
        Poller {
            period,
            state: PollerState::Unstarted,
            shutdown: None,
            handle: None,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawns the tick loop. The first tick fires immediately, then every
    /// period. A failing tick is logged and retried on the next period;
    /// it never tears the poller down.
    pub fn start<F, Fut>(&mut self, mut tick: F) -> anyhow::Result<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.state != PollerState::Unstarted {
            bail!("poller cannot start from state {:?}", self.state);
        }
        let (sender, mut receiver) = watch::channel(false);
        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = receiver.changed() => {
                        debug!("poller shutting down");
                        return;
                    }
                    _ = ticker.tick() => {
                        if let Err(error) = tick().await {
                            warn!(%error, "poll tick failed, retrying next period");
                        }
                    }
                }
            }
        });
        self.shutdown = Some(sender);
        self.handle = Some(handle);
        self.state = PollerState::Polling;
        Ok(())
    }

    /// Signals the tick loop to exit. Idempotent; safe from any state.
    pub fn stop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(true);
        }
        self.handle.take();
        self.state = PollerState::Stopped;
    }
}

impl Default for Poller {
    fn default() -> Self {
        Poller::new(DEFAULT_POLL_PERIOD)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use anyhow::anyhow;

    use super::*;

    #[tokio::test]
    async fn lifecycle_runs_ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new(Duration::from_millis(10));
        assert_eq!(poller.state(), PollerState::Unstarted);

        let counter = ticks.clone();
        poller
            .start(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();
        assert_eq!(poller.state(), PollerState::Polling);

        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.stop();
        assert_eq!(poller.state(), PollerState::Stopped);

        // Let any in-flight tick drain before sampling the counter.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let observed = ticks.load(Ordering::SeqCst);
        assert!(observed >= 2, "expected at least two ticks, saw {observed}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), observed, "ticks after stop");
    }

    #[tokio::test]
    async fn start_is_rejected_outside_unstarted() {
        let mut poller = Poller::new(Duration::from_millis(10));
        poller.start(|| async { Ok(()) }).unwrap();
        assert!(poller.start(|| async { Ok(()) }).is_err());

        poller.stop();
        assert!(poller.start(|| async { Ok(()) }).is_err());
        poller.stop();
        assert_eq!(poller.state(), PollerState::Stopped);
    }

    #[tokio::test]
    async fn failing_ticks_keep_polling() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new(Duration::from_millis(10));
        let counter = ticks.clone();
        poller
            .start(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow!("watch hiccup"))
                }
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 2);
        poller.stop();
    }
}
