//! Live offer countdowns.
//!
//! Each running [`Countdown`] is driven by its own spawned task that ticks
//! once per second and reports over a channel. When the countdown reaches
//! zero the task asks the server to expire the offer exactly once, then
//! ends. Dropping the [`CountdownHandle`] aborts the task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use jks_core::{Countdown, Tick};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::api::{ApiClientError, StoreApi};

const TICK: Duration = Duration::from_secs(1);

/// Whatever can clear an offer once its countdown ends.
pub trait OfferExpirer: Send + Sync + 'static {
    fn expire(&self, product_id: i64) -> impl Future<Output = Result<(), ApiClientError>> + Send;
}

impl OfferExpirer for StoreApi {
    fn expire(&self, product_id: i64) -> impl Future<Output = Result<(), ApiClientError>> + Send {
        self.expire_offer(product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { product_id: i64, remaining: u64 },
    /// The countdown hit zero. `cleared` reports whether the expire call
    /// succeeded.
    Expired { product_id: i64, cleared: bool },
}

pub struct CountdownHandle {
    product_id: i64,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    #[must_use]
    pub fn product_id(&self) -> i64 {
        self.product_id
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the ticking task for `countdown`. Returns `None` when the
/// countdown is not running, in which case nothing is spawned.
pub fn spawn_countdown<E: OfferExpirer>(
    mut countdown: Countdown,
    expirer: Arc<E>,
    events: UnboundedSender<CountdownEvent>,
) -> Option<CountdownHandle> {
    if !countdown.is_running() {
        return None;
    }
    let product_id = countdown.product_id();

    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match countdown.tick() {
                Tick::Running(remaining) => {
                    let _ = events.send(CountdownEvent::Tick {
                        product_id,
                        remaining,
                    });
                }
                Tick::Expired => {
                    let cleared = match expirer.expire(product_id).await {
                        Ok(()) => {
                            tracing::info!(product_id, "offer expired");
                            true
                        }
                        Err(e) => {
                            tracing::warn!(product_id, error = %e, "failed to expire offer");
                            false
                        }
                    };
                    let _ = events.send(CountdownEvent::Expired {
                        product_id,
                        cleared,
                    });
                    break;
                }
                Tick::Inactive => break,
            }
        }
    });

    Some(CountdownHandle { product_id, task })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use tokio::sync::mpsc;

    use super::*;

    #[derive(Default)]
    struct RecordingExpirer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl OfferExpirer for RecordingExpirer {
        fn expire(
            &self,
            _product_id: i64,
        ) -> impl Future<Output = Result<(), ApiClientError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            async move {
                if fail {
                    Err(ApiClientError::Api {
                        status: 500,
                        code: "internal_error".to_string(),
                        message: "boom".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    fn countdown(duration: &str) -> Countdown {
        Countdown::from_parts(7, true, Some(duration), None, Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn five_second_countdown_ticks_five_times_and_expires_once() {
        let expirer = Arc::new(RecordingExpirer::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();

        let _handle =
            spawn_countdown(countdown("00:00:05"), Arc::clone(&expirer), tx).expect("running");

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                CountdownEvent::Tick { product_id: 7, remaining: 4 },
                CountdownEvent::Tick { product_id: 7, remaining: 3 },
                CountdownEvent::Tick { product_id: 7, remaining: 2 },
                CountdownEvent::Tick { product_id: 7, remaining: 1 },
                CountdownEvent::Expired { product_id: 7, cleared: true },
            ]
        );
        assert_eq!(expirer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed().as_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_expiry_is_reported_and_not_retried() {
        let expirer = Arc::new(RecordingExpirer {
            fail: true,
            ..RecordingExpirer::default()
        });
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _handle =
            spawn_countdown(countdown("00:00:02"), Arc::clone(&expirer), tx).expect("running");

        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }

        assert_eq!(
            last,
            Some(CountdownEvent::Expired { product_id: 7, cleared: false })
        );
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(expirer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_countdown() {
        let expirer = Arc::new(RecordingExpirer::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle =
            spawn_countdown(countdown("00:00:05"), Arc::clone(&expirer), tx).expect("running");

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(10)).await;

        let mut ticks = 0;
        while let Some(event) = rx.recv().await {
            assert!(matches!(event, CountdownEvent::Tick { .. }));
            ticks += 1;
        }
        assert_eq!(ticks, 2);
        assert_eq!(expirer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn idle_countdowns_spawn_nothing() {
        let expirer = Arc::new(RecordingExpirer::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let disabled = Countdown::from_parts(1, false, Some("00:10:00"), None, Utc::now());
        assert!(spawn_countdown(disabled, Arc::clone(&expirer), tx.clone()).is_none());

        let lapsed = Countdown::from_parts(
            2,
            true,
            Some("00:10:00"),
            Some(Utc::now() - chrono::Duration::minutes(1)),
            Utc::now(),
        );
        assert!(spawn_countdown(lapsed, expirer, tx).is_none());
    }
}
