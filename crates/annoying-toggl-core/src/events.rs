use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a scheduled check did not reach the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Muted,
    NoCredential,
    NoWorkspace,
    /// A previous check (and possibly its prompt) is still running.
    InFlight,
}

/// Every state change in the reminder produces an Event.
/// The view layer subscribes to them instead of observing shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Configured {
        workspace_id: Option<i64>,
        at: DateTime<Utc>,
    },
    CheckSkipped {
        reason: SkipReason,
        at: DateTime<Utc>,
    },
    TimerRunning {
        entry_id: i64,
        description: String,
        at: DateTime<Utc>,
    },
    /// No timer was running and the user was asked.
    ReminderShown {
        suggestions: usize,
        at: DateTime<Utc>,
    },
    EntryStarted {
        entry_id: i64,
        description: String,
        at: DateTime<Utc>,
    },
    Muted {
        until: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TaskChanged {
        description: String,
        at: DateTime<Utc>,
    },
    CheckFailed {
        message: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        at: DateTime<Utc>,
    },
}
