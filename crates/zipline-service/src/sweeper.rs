use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use typed_builder::TypedBuilder;
use zipline_core::LinkStore;

/// Configuration for the background expiry sweep.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SweeperSettings {
    /// Time between sweeps.
    #[builder(default = Duration::from_secs(3600))]
    pub interval: Duration,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Timer-driven background sweep of expired records.
///
/// Lazy eviction already keeps hot codes correct; the sweeper bounds
/// staleness for cold codes nobody looks up, so their ids return to the
/// pool without waiting for a request. It runs on its own task and goes
/// through the store's ordinary eviction path, so it shares the same
/// locking discipline as request-path eviction.
#[derive(Debug)]
pub struct Sweeper {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns the sweep loop on the current runtime.
    pub fn spawn<S: LinkStore>(store: Arc<S>, settings: SweeperSettings) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match store.sweep_expired().await {
                            Ok(0) => {}
                            Ok(removed) => {
                                tracing::info!(removed, "sweep evicted expired links");
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "sweep failed");
                            }
                        }
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        Self { stop, task }
    }

    /// Stops the loop and waits for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use zipline_core::{LinkRecord, ManualClock, ShortCode};
    use zipline_idpool::IdPool;
    use zipline_storage::MemoryStore;

    fn record(id: u64, expires_at: Option<Timestamp>) -> LinkRecord {
        LinkRecord {
            id,
            code: ShortCode::generated(format!("{id}")),
            long_url: "https://example.com".to_string(),
            created_at: Timestamp::from_second(0).unwrap(),
            expires_at,
            delete_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn sweeper_evicts_cold_expired_records() {
        let base = Timestamp::from_second(1_000_000).unwrap();
        let clock = ManualClock::new(base);
        let pool = Arc::new(IdPool::new());
        pool.acquire().unwrap();
        let store = Arc::new(MemoryStore::with_clock(Arc::clone(&pool), clock.clone()));

        store
            .put(record(1, Some(base + SignedDuration::from_hours(1))))
            .await
            .unwrap();
        clock.advance(SignedDuration::from_hours(2));

        let settings = SweeperSettings::builder()
            .interval(Duration::from_millis(10))
            .build();
        let sweeper = Sweeper::spawn(Arc::clone(&store), settings);

        // The record was never looked up; only the sweep can reclaim it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.shutdown().await;

        assert!(store.is_empty());
        assert_eq!(pool.pooled(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_the_task() {
        let pool = Arc::new(IdPool::new());
        let store = Arc::new(MemoryStore::new(pool));
        let sweeper = Sweeper::spawn(
            store,
            SweeperSettings::builder()
                .interval(Duration::from_millis(5))
                .build(),
        );
        // Returns promptly instead of waiting out the interval forever.
        sweeper.shutdown().await;
    }
}
