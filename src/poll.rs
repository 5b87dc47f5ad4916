//! Periodic refresh.
//!
//! A `Poller` runs a tick function on a fixed interval until it is stopped. Stopping also cancels
//! a tick that is still in flight, so a hung request cannot keep the poller alive.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub struct Poller {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Starts calling `tick` every `period`. The first call happens one period from now. Ticks
    /// never overlap: a tick that takes longer than `period` delays the next one.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (stop, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {}
                }
                debug!("Refresh tick");
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = tick() => {}
                }
            }
            debug!("Poller stopped");
        });
        Self { stop, handle }
    }

    /// Stops the poller and waits for its task to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            warn!("The refresh task ended abnormally: {e}");
        }
    }
}
