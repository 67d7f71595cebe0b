use std::sync::Arc;

use async_trait::async_trait;

use super::models::{TimeEntry, Workspace};
use crate::error::RemoteError;

/// Callback invoked once per remote call, when the call is initiated.
pub type CallObserver = Arc<dyn Fn() + Send + Sync>;

/// The capability set the reminder loop needs from a time-tracking service.
///
/// Every method issues exactly one authenticated request. Implementations
/// hold no state beyond their credential and call observer.
#[async_trait]
pub trait TimeTracker: Send + Sync {
    /// The running entry, or `None` when nothing is being tracked.
    async fn current_entry(&self) -> Result<Option<TimeEntry>, RemoteError>;

    /// Workspaces visible to the credential. May be empty.
    async fn workspaces(&self) -> Result<Vec<Workspace>, RemoteError>;

    /// Recent entries, most recent first.
    async fn recent_entries(&self) -> Result<Vec<TimeEntry>, RemoteError>;

    /// Start a running entry now.
    async fn start_entry(
        &self,
        description: &str,
        workspace_id: i64,
    ) -> Result<TimeEntry, RemoteError>;

    async fn stop_entry(&self, entry_id: i64, workspace_id: i64) -> Result<TimeEntry, RemoteError>;

    async fn update_entry(
        &self,
        entry_id: i64,
        workspace_id: i64,
        description: &str,
    ) -> Result<TimeEntry, RemoteError>;

    /// Register the metering hook. Replaces any previous observer.
    fn set_call_observer(&mut self, observer: CallObserver);
}
