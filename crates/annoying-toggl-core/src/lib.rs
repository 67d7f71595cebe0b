//! # Annoying Toggl Core Library
//!
//! This library provides the core logic for a reminder that periodically
//! checks whether a Toggl Track timer is running and, if not, asks the user
//! to start one. All behavior lives here; the CLI binary is a thin host
//! that supplies configuration and a prompt surface.
//!
//! ## Architecture
//!
//! - **Integrations**: Async Toggl Track v9 client behind the [`TimeTracker`] trait
//! - **Reminder**: Session state, the check cycle, and the [`Prompt`] seam
//! - **Timer**: Check cadence, progress reporting, and the repeating task primitive
//! - **Usage / Mute**: Hourly API-call meter and the snooze window
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ReminderController`]: Runs checks and owns the session state
//! - [`ReminderService`]: Drives the controller on a schedule
//! - [`TogglClient`]: Remote API client
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod integrations;
pub mod mute;
pub mod reminder;
pub mod service;
pub mod storage;
pub mod timer;
pub mod usage;

#[cfg(test)]
mod testing;

/// Tag sent as `created_with` on every entry this app starts.
pub const CREATED_WITH: &str = "annoying-toggl";

pub use error::{ConfigError, CoreError, ReminderError, RemoteError};
pub use events::{Event, SkipReason};
pub use integrations::{TimeEntry, TimeTracker, TogglClient, Workspace};
pub use mute::{MuteStatus, MuteWindow};
pub use reminder::{
    CheckOutcome, CurrentEntry, Prompt, PromptOutcome, PromptRequest, ReminderController,
    StatusSnapshot,
};
pub use service::ReminderService;
pub use storage::Config;
pub use timer::{PollScheduler, ProgressInfo};
pub use usage::UsageMeter;
