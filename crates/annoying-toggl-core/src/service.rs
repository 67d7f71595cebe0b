//! Runtime wiring: the check loop, the progress loop and the controller.
//!
//! Both loops run as tokio tasks. The check loop awaits each check inline,
//! so checks never overlap; the progress loop is separate and keeps ticking
//! while a reminder prompt is open.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;

use crate::reminder::ReminderController;
use crate::timer::{PollScheduler, ProgressInfo, RepeatingTask};

const PROGRESS_PERIOD: Duration = Duration::from_secs(1);

pub struct ReminderService {
    controller: Arc<ReminderController>,
    scheduler: Arc<Mutex<PollScheduler>>,
    check_loop: RepeatingTask,
    progress_loop: RepeatingTask,
    progress_tx: Arc<watch::Sender<Option<ProgressInfo>>>,
}

impl ReminderService {
    /// Start both loops. The first check runs immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(controller: Arc<ReminderController>, interval_min: u32) -> Self {
        let scheduler = Arc::new(Mutex::new(PollScheduler::new(interval_min)));
        let (progress_tx, _) = watch::channel(None);
        let progress_tx = Arc::new(progress_tx);

        let check_loop = spawn_check_loop(&controller, &scheduler);
        let progress_loop = spawn_progress_loop(&controller, &scheduler, &progress_tx);
        info!(interval_min, "reminder service started");

        Self {
            controller,
            scheduler,
            check_loop,
            progress_loop,
            progress_tx,
        }
    }

    pub fn controller(&self) -> &Arc<ReminderController> {
        &self.controller
    }

    pub fn progress(&self) -> watch::Receiver<Option<ProgressInfo>> {
        self.progress_tx.subscribe()
    }

    pub fn interval(&self) -> chrono::Duration {
        lock(&self.scheduler).interval()
    }

    /// Replace the check cadence. The pending tick of the old cadence is
    /// discarded and a check fires right away.
    pub fn set_interval(&mut self, interval_min: u32) {
        lock(&self.scheduler).set_interval(interval_min);
        self.check_loop.cancel();
        self.check_loop = spawn_check_loop(&self.controller, &self.scheduler);
        info!(interval_min, "check interval changed");
    }

    /// Reset the controller and clear the progress indicator.
    pub fn logout(&self) {
        self.controller.logout();
        self.progress_tx.send_replace(None);
    }

    pub async fn shutdown(self) {
        self.check_loop.shutdown().await;
        self.progress_loop.shutdown().await;
        info!("reminder service stopped");
    }
}

fn spawn_check_loop(
    controller: &Arc<ReminderController>,
    scheduler: &Arc<Mutex<PollScheduler>>,
) -> RepeatingTask {
    let period = lock(scheduler).interval_std();
    let controller = Arc::clone(controller);
    let scheduler = Arc::clone(scheduler);
    RepeatingTask::spawn(period, move || {
        let controller = Arc::clone(&controller);
        let scheduler = Arc::clone(&scheduler);
        async move {
            let now = Utc::now();
            lock(&scheduler).record_check(now);
            controller.perform_check(now).await;
        }
    })
}

fn spawn_progress_loop(
    controller: &Arc<ReminderController>,
    scheduler: &Arc<Mutex<PollScheduler>>,
    progress_tx: &Arc<watch::Sender<Option<ProgressInfo>>>,
) -> RepeatingTask {
    let controller = Arc::clone(controller);
    let scheduler = Arc::clone(scheduler);
    let progress_tx = Arc::clone(progress_tx);
    RepeatingTask::spawn(PROGRESS_PERIOD, move || {
        let now = Utc::now();
        let mute = controller.mute_status(now);
        let progress = lock(&scheduler).progress(now, mute);
        progress_tx.send_if_modified(|current| {
            if *current != progress {
                *current = progress;
                true
            } else {
                false
            }
        });
        std::future::ready(())
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
