//! Cancel-and-restart repeating task.
//!
//! The first tick fires immediately, then once per period. Cancelling stops
//! the loop at the next wait; a tick body that is already running is allowed
//! to finish.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct RepeatingTask {
    period: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    /// Spawn onto the current tokio runtime.
    ///
    /// Ticks missed while `on_tick` is running are skipped rather than
    /// replayed in a burst.
    pub fn spawn<F, Fut>(period: Duration, on_tick: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => on_tick().await,
                }
            }
        });
        Self {
            period,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop future ticks without waiting for the task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for an in-progress tick to complete.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "repeating task ended abnormally");
            }
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
