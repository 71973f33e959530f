//! Periodic statistics refresh.
//!
//! A background task fetches spikes on a fixed interval and publishes the
//! latest snapshot on a watch channel. A failed refresh is logged and dropped;
//! the next attempt happens on the next tick, never sooner. Dropping the
//! [`StatsRefresher`] stops the task.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gateway::StatsSource;
use crate::types::SpikeRecord;

/// Refresh intervals below this are raised to it.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Spikes as of one successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub spikes: Vec<SpikeRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl StatsSnapshot {
    /// Snapshot stamped with the current time.
    pub fn new(spikes: Vec<SpikeRecord>) -> Self {
        Self {
            spikes,
            fetched_at: Utc::now(),
        }
    }

    /// Spike counts keyed by `"exchange_market"`.
    pub fn counts_by_market(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for spike in &self.spikes {
            *counts.entry(spike.exchange_market()).or_insert(0) += 1;
        }
        counts
    }
}

pub type SnapshotReceiver = watch::Receiver<Option<Arc<StatsSnapshot>>>;

/// Handle to a running refresh task.
pub struct StatsRefresher {
    cancel: CancellationToken,
    snapshot: SnapshotReceiver,
}

impl StatsRefresher {
    /// Spawn the refresh loop. Must be called inside a tokio runtime.
    ///
    /// The first fetch happens immediately.
    pub fn start(source: Arc<dyn StatsSource>, interval: Duration) -> Self {
        let interval = if interval < MIN_REFRESH_INTERVAL {
            debug!(requested = ?interval, "raising stats refresh interval to minimum");
            MIN_REFRESH_INTERVAL
        } else {
            interval
        };

        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(None);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => {
                        debug!("stats refresh stopped");
                        return;
                    }
                    _ = ticker.tick() => {
                        tokio::select! {
                            biased;
                            _ = task_cancel.cancelled() => {
                                debug!("stats refresh stopped mid-request");
                                return;
                            }
                            _ = refresh_once(source.as_ref(), &tx) => {}
                        }
                    }
                }
            }
        });

        Self {
            cancel,
            snapshot: rx,
        }
    }

    /// Most recent successful snapshot, if any.
    pub fn latest(&self) -> Option<Arc<StatsSnapshot>> {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every successful refresh.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshot.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for StatsRefresher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn refresh_once(
    source: &dyn StatsSource,
    tx: &watch::Sender<Option<Arc<StatsSnapshot>>>,
) {
    match source.fetch_spikes().await {
        Ok(spikes) => {
            debug!(count = spikes.len(), "stats refreshed");
            tx.send_replace(Some(Arc::new(StatsSnapshot::new(spikes))));
        }
        Err(e) => {
            warn!(error = %e, "stats refresh failed, waiting for next tick");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DashboardError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(fail),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsSource for CountingSource {
        async fn fetch_spikes(&self) -> Result<Vec<SpikeRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(DashboardError::Http {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            Ok(vec![spike("binance", "spot"), spike("binance", "spot"), spike("gate", "futures")])
        }
    }

    fn spike(exchange: &str, market: &str) -> SpikeRecord {
        SpikeRecord {
            exchange: exchange.into(),
            market: market.into(),
            symbol: "BTCUSDT".into(),
            delta: Some(2.5),
            volume: None,
            shadow: None,
            detected_at: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_interval_and_publishes() {
        let source = CountingSource::new(false);
        let refresher = StatsRefresher::start(source.clone(), Duration::from_secs(10));

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);
        let snapshot = refresher.latest().unwrap();
        let counts = snapshot.counts_by_market();
        assert_eq!(counts["binance_spot"], 2);
        assert_eq!(counts["gate_futures"], 1);

        time::sleep(Duration::from_secs(25)).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_dropped_not_retried() {
        let source = CountingSource::new(true);
        let refresher = StatsRefresher::start(source.clone(), Duration::from_secs(10));

        time::sleep(Duration::from_secs(15)).await;
        // One immediate attempt and one on the 10s tick; nothing in between.
        assert_eq!(source.calls(), 2);
        assert!(refresher.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_refreshing() {
        let source = CountingSource::new(false);
        let refresher = StatsRefresher::start(source.clone(), Duration::from_secs(10));
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);

        drop(refresher);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_sees_new_snapshots() {
        let source = CountingSource::new(false);
        let refresher = StatsRefresher::start(source.clone(), Duration::from_secs(10));
        let mut rx = refresher.subscribe();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        refresher.stop();
        assert!(refresher.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiny_interval_is_raised() {
        let source = CountingSource::new(false);
        let _refresher = StatsRefresher::start(source.clone(), Duration::ZERO);
        time::sleep(Duration::from_millis(2500)).await;
        // t=0, t=1s, t=2s.
        assert_eq!(source.calls(), 3);
    }
}
