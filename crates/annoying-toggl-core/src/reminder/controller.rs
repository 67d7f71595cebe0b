//! Reminder orchestration.
//!
//! The controller is the single owner of session state: mute window, usage
//! counter, adopted workspace and the current-entry projection. All of it
//! sits behind one mutex that is never held across an `.await`; remote calls
//! work on cloned handles and write their results back afterwards.
//!
//! ## Check cycle
//!
//! ```text
//! rollover usage -> muted / unconfigured? -> skip
//!                -> current entry? -> record it
//!                -> none -> suggestions -> prompt -> start | mute | dismiss
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::prompt::{Prompt, PromptOutcome, PromptRequest};
use crate::error::{ReminderError, RemoteError};
use crate::events::{Event, SkipReason};
use crate::integrations::{suggestions, TimeEntry, TimeTracker, Workspace, MAX_SUGGESTIONS};
use crate::mute::{MuteStatus, MuteWindow};
use crate::usage::UsageMeter;

pub const DEFAULT_MUTE_MINUTES: u32 = 120;

const PROMPT_TITLE: &str = "No Timer Running!";
const PROMPT_MESSAGE: &str = "Please enter what you're working on:";
const EVENT_CAPACITY: usize = 64;

/// What the session believes is being tracked right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentEntry {
    /// Cleared after a task change until the next check reports the new id.
    pub id: Option<i64>,
    pub description: String,
}

/// Result of one check cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Skipped(SkipReason),
    Running(TimeEntry),
    Started(TimeEntry),
    Muted { until: DateTime<Utc> },
    Dismissed,
    Failed(String),
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub configured: bool,
    pub workspace_id: Option<i64>,
    pub current: CurrentEntry,
    pub muted_until: Option<DateTime<Utc>>,
    pub api_calls: u32,
    pub near_limit: bool,
    pub usage_label: String,
}

struct SessionState {
    tracker: Option<Arc<dyn TimeTracker>>,
    workspace_id: Option<i64>,
    mute: MuteWindow,
    mute_minutes: u32,
    current: CurrentEntry,
}

pub struct ReminderController {
    prompt: Arc<dyn Prompt>,
    state: Mutex<SessionState>,
    usage: Arc<Mutex<UsageMeter>>,
    in_flight: AtomicBool,
    events: broadcast::Sender<Event>,
}

impl ReminderController {
    /// An unconfigured controller. Call [`configure`](Self::configure) once a
    /// credential is known.
    pub fn new(prompt: Arc<dyn Prompt>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            prompt,
            state: Mutex::new(SessionState {
                tracker: None,
                workspace_id: None,
                mute: MuteWindow::new(),
                mute_minutes: DEFAULT_MUTE_MINUTES,
                current: CurrentEntry::default(),
            }),
            usage: Arc::new(Mutex::new(UsageMeter::new())),
            in_flight: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Install a tracker, wire it to the usage meter and adopt the first
    /// workspace it reports.
    ///
    /// The tracker stays installed when the workspace lookup fails; checks
    /// skip with [`SkipReason::NoWorkspace`] until `configure` succeeds.
    pub async fn configure<T>(&self, mut tracker: T) -> Result<Option<Workspace>, RemoteError>
    where
        T: TimeTracker + 'static,
    {
        let usage = Arc::clone(&self.usage);
        tracker.set_call_observer(Arc::new(move || lock(&usage).record_call()));
        let tracker: Arc<dyn TimeTracker> = Arc::new(tracker);

        {
            let mut state = self.lock();
            state.tracker = Some(Arc::clone(&tracker));
            state.workspace_id = None;
        }

        let workspaces = tracker.workspaces().await.inspect_err(|e| {
            warn!(error = %e, "failed to fetch workspaces");
        })?;
        let first = workspaces.into_iter().next();

        let mut state = self.lock();
        // A logout or reconfigure may have happened while we were waiting.
        let still_current = state
            .tracker
            .as_ref()
            .is_some_and(|t| Arc::ptr_eq(t, &tracker));
        if still_current {
            state.workspace_id = first.as_ref().map(|w| w.id);
            drop(state);
            info!(workspace = ?first.as_ref().map(|w| &w.name), "tracker configured");
            self.emit(Event::Configured {
                workspace_id: first.as_ref().map(|w| w.id),
                at: Utc::now(),
            });
        }
        Ok(first)
    }

    /// Mute length used when the user picks "mute" in a reminder prompt.
    pub fn set_mute_minutes(&self, minutes: u32) {
        self.lock().mute_minutes = minutes;
    }

    pub fn mute_minutes(&self) -> u32 {
        self.lock().mute_minutes
    }

    // ── Check cycle ──────────────────────────────────────────────────

    /// One scheduled check. Never returns an error: failures are logged and
    /// the next scheduled tick is the retry.
    pub async fn perform_check(&self, now: DateTime<Utc>) -> CheckOutcome {
        lock(&self.usage).maybe_rollover(now);

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return self.skip(SkipReason::InFlight, now);
        };

        let eligible = {
            let mut state = self.lock();
            if state.mute.is_active(now) {
                Err(SkipReason::Muted)
            } else {
                match (state.tracker.clone(), state.workspace_id) {
                    (None, _) => Err(SkipReason::NoCredential),
                    (Some(_), None) => Err(SkipReason::NoWorkspace),
                    (Some(tracker), Some(wid)) => Ok((tracker, wid)),
                }
            }
        };
        let (tracker, workspace_id) = match eligible {
            Ok(pair) => pair,
            Err(reason) => return self.skip(reason, now),
        };

        match tracker.current_entry().await {
            Ok(Some(entry)) => {
                self.record_current(Some(&entry), now);
                CheckOutcome::Running(entry)
            }
            Ok(None) => {
                self.record_current(None, now);
                self.remind(tracker.as_ref(), workspace_id, now).await
            }
            Err(e) => self.fail("failed to check timer", &e, now),
        }
    }

    /// Ask the service what is running and update the projection. Never
    /// prompts, so an idle timer costs exactly one call.
    ///
    /// Returns `Ok(None)` without a remote call when no tracker is installed.
    pub async fn refresh_current(&self) -> Result<Option<TimeEntry>, RemoteError> {
        let now = Utc::now();
        lock(&self.usage).maybe_rollover(now);
        let Some(tracker) = self.lock().tracker.clone() else {
            return Ok(None);
        };
        let entry = tracker.current_entry().await?;
        self.record_current(entry.as_ref(), now);
        Ok(entry)
    }

    fn record_current(&self, entry: Option<&TimeEntry>, now: DateTime<Utc>) {
        let Some(entry) = entry else {
            self.lock().current = CurrentEntry::default();
            return;
        };
        debug!(id = entry.id, description = %entry.description, "timer running");
        self.lock().current = CurrentEntry {
            id: Some(entry.id),
            description: entry.description.clone(),
        };
        self.emit(Event::TimerRunning {
            entry_id: entry.id,
            description: entry.description.clone(),
            at: now,
        });
    }

    async fn remind(
        &self,
        tracker: &dyn TimeTracker,
        workspace_id: i64,
        now: DateTime<Utc>,
    ) -> CheckOutcome {
        let suggestions = match tracker.recent_entries().await {
            Ok(entries) => suggestions(&entries, MAX_SUGGESTIONS),
            Err(e) => {
                warn!(error = %e, "failed to get recent entries, prompting without suggestions");
                Vec::new()
            }
        };

        info!(suggestions = suggestions.len(), "no timer running, prompting");
        self.emit(Event::ReminderShown {
            suggestions: suggestions.len(),
            at: now,
        });

        let asked = tokio::time::Instant::now();
        let outcome = self
            .prompt
            .ask(PromptRequest {
                title: PROMPT_TITLE.to_string(),
                message: PROMPT_MESSAGE.to_string(),
                suggestions,
            })
            .await;
        // A prompt can stay open for a long time; mute from when it was answered.
        let waited = Duration::from_std(asked.elapsed()).unwrap_or_else(|_| Duration::zero());
        let answered_at = now + waited;

        match outcome {
            PromptOutcome::Start(text) if !text.trim().is_empty() => {
                let description = text.as_str();
                match tracker.start_entry(description, workspace_id).await {
                    Ok(entry) => {
                        info!(id = entry.id, %description, "timer started");
                        self.lock().current = CurrentEntry {
                            id: Some(entry.id),
                            description: description.to_string(),
                        };
                        self.emit(Event::EntryStarted {
                            entry_id: entry.id,
                            description: description.to_string(),
                            at: now,
                        });
                        CheckOutcome::Started(entry)
                    }
                    Err(e) => self.fail("failed to start timer", &e, now),
                }
            }
            PromptOutcome::Mute => {
                let minutes = self.lock().mute_minutes;
                let until = self.apply_mute(minutes, answered_at);
                CheckOutcome::Muted { until }
            }
            PromptOutcome::Start(_) | PromptOutcome::Dismiss => {
                debug!("reminder dismissed");
                CheckOutcome::Dismissed
            }
        }
    }

    // ── User actions ─────────────────────────────────────────────────

    /// Stop the current entry and start a new one with `description`.
    ///
    /// Returns `Ok(false)` without any remote call when there is no known
    /// current entry, workspace or credential. Not atomic: if the stop
    /// succeeds and the start fails, nothing is tracked until the next check
    /// and the error is [`ReminderError::PartialFailure`].
    pub async fn change_task(&self, description: &str) -> Result<bool, ReminderError> {
        let description = description.trim();
        let target = {
            let state = self.lock();
            match (state.tracker.clone(), state.current.id, state.workspace_id) {
                (Some(t), Some(id), Some(wid)) if !description.is_empty() => Some((t, id, wid)),
                _ => None,
            }
        };
        let Some((tracker, entry_id, workspace_id)) = target else {
            debug!("change task ignored: no running entry known");
            return Ok(false);
        };

        tracker.stop_entry(entry_id, workspace_id).await?;
        tracker
            .start_entry(description, workspace_id)
            .await
            .map_err(|source| {
                warn!(stopped = entry_id, error = %source, "task change left no running entry");
                ReminderError::PartialFailure {
                    stopped_entry: entry_id,
                    source,
                }
            })?;

        // The new id is picked up by the next check.
        self.lock().current = CurrentEntry {
            id: None,
            description: description.to_string(),
        };
        info!(%description, "task changed");
        self.emit(Event::TaskChanged {
            description: description.to_string(),
            at: Utc::now(),
        });
        Ok(true)
    }

    pub fn mute_for(&self, minutes: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        self.apply_mute(minutes, now)
    }

    pub fn mute_for_hours(&self, hours: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        self.apply_mute(hours.saturating_mul(60), now)
    }

    /// Full reset to the unconfigured state.
    pub fn logout(&self) {
        {
            let mut state = self.lock();
            state.tracker = None;
            state.workspace_id = None;
            state.mute.clear();
            state.current = CurrentEntry::default();
        }
        lock(&self.usage).reset();
        info!("logged out");
        self.emit(Event::LoggedOut { at: Utc::now() });
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_muted(&self, now: DateTime<Utc>) -> bool {
        self.lock().mute.is_active(now)
    }

    pub fn mute_status(&self, now: DateTime<Utc>) -> Option<MuteStatus> {
        self.lock().mute.status(now)
    }

    pub fn current_entry(&self) -> CurrentEntry {
        self.lock().current.clone()
    }

    pub fn workspace_id(&self) -> Option<i64> {
        self.lock().workspace_id
    }

    pub fn is_configured(&self) -> bool {
        let state = self.lock();
        state.tracker.is_some() && state.workspace_id.is_some()
    }

    pub fn usage(&self) -> UsageMeter {
        lock(&self.usage).clone()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        let usage = self.usage();
        let mut state = self.lock();
        let muted_until = if state.mute.is_active(now) {
            state.mute.end_time()
        } else {
            None
        };
        StatusSnapshot {
            configured: state.tracker.is_some() && state.workspace_id.is_some(),
            workspace_id: state.workspace_id,
            current: state.current.clone(),
            muted_until,
            api_calls: usage.count(),
            near_limit: usage.is_near_limit(),
            usage_label: usage.summary(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    fn apply_mute(&self, minutes: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        self.lock().mute.mute(minutes, now);
        let until = now + Duration::minutes(i64::from(minutes));
        info!(minutes, %until, "muted");
        self.emit(Event::Muted { until, at: now });
        until
    }

    fn skip(&self, reason: SkipReason, now: DateTime<Utc>) -> CheckOutcome {
        debug!(?reason, "check skipped");
        self.emit(Event::CheckSkipped { reason, at: now });
        CheckOutcome::Skipped(reason)
    }

    fn fail(&self, what: &str, err: &RemoteError, now: DateTime<Utc>) -> CheckOutcome {
        warn!(error = %err, "{what}");
        self.emit(Event::CheckFailed {
            message: err.to_string(),
            at: now,
        });
        CheckOutcome::Failed(err.to_string())
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the in-flight flag when the check finishes, however it finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
