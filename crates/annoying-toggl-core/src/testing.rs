//! In-memory collaborators for unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use crate::error::RemoteError;
use crate::integrations::{CallObserver, TimeEntry, TimeTracker, Workspace};
use crate::reminder::{Prompt, PromptOutcome, PromptRequest};

/// Shared, drainable record of tracker calls.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub(crate) struct FakeTracker {
    calls: CallLog,
    current: Option<TimeEntry>,
    recent: Vec<TimeEntry>,
    workspaces: Vec<Workspace>,
    failing: HashSet<&'static str>,
    observer: Option<CallObserver>,
}

impl FakeTracker {
    pub(crate) fn new() -> Self {
        Self {
            calls: CallLog::default(),
            current: None,
            recent: Vec::new(),
            workspaces: vec![
                Workspace {
                    id: 7,
                    name: "Personal".into(),
                },
                Workspace {
                    id: 9,
                    name: "Work".into(),
                },
            ],
            failing: HashSet::new(),
            observer: None,
        }
    }

    pub(crate) fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub(crate) fn with_current(mut self, entry: Option<TimeEntry>) -> Self {
        self.current = entry;
        self
    }

    pub(crate) fn with_recent(mut self, entries: Vec<TimeEntry>) -> Self {
        self.recent = entries;
        self
    }

    pub(crate) fn with_workspaces(mut self, workspaces: Vec<Workspace>) -> Self {
        self.workspaces = workspaces;
        self
    }

    pub(crate) fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    fn record(&self, method: &'static str, call: String) -> Result<(), RemoteError> {
        if let Some(observer) = &self.observer {
            observer();
        }
        self.calls.push(call);
        if self.failing.contains(method) {
            return Err(RemoteError::Status {
                status: 500,
                body: format!("{method} failed"),
            });
        }
        Ok(())
    }

    fn entry_like(&self, id: i64, workspace_id: i64, description: &str) -> TimeEntry {
        let mut entry = crate::integrations::models::entry(id, description);
        entry.wid = workspace_id;
        entry
    }
}

#[async_trait]
impl TimeTracker for FakeTracker {
    async fn current_entry(&self) -> Result<Option<TimeEntry>, RemoteError> {
        self.record("current_entry", "current_entry".into())?;
        Ok(self.current.clone())
    }

    async fn workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        self.record("workspaces", "workspaces".into())?;
        Ok(self.workspaces.clone())
    }

    async fn recent_entries(&self) -> Result<Vec<TimeEntry>, RemoteError> {
        self.record("recent_entries", "recent_entries".into())?;
        Ok(self.recent.clone())
    }

    async fn start_entry(
        &self,
        description: &str,
        workspace_id: i64,
    ) -> Result<TimeEntry, RemoteError> {
        self.record(
            "start_entry",
            format!("start_entry({description},{workspace_id})"),
        )?;
        Ok(self.entry_like(1000, workspace_id, description))
    }

    async fn stop_entry(&self, entry_id: i64, workspace_id: i64) -> Result<TimeEntry, RemoteError> {
        self.record("stop_entry", format!("stop_entry({entry_id},{workspace_id})"))?;
        let mut entry = self.entry_like(entry_id, workspace_id, "");
        entry.duration = 600;
        Ok(entry)
    }

    async fn update_entry(
        &self,
        entry_id: i64,
        workspace_id: i64,
        description: &str,
    ) -> Result<TimeEntry, RemoteError> {
        self.record(
            "update_entry",
            format!("update_entry({entry_id},{workspace_id},{description})"),
        )?;
        Ok(self.entry_like(entry_id, workspace_id, description))
    }

    fn set_call_observer(&mut self, observer: CallObserver) {
        self.observer = Some(observer);
    }
}

/// Answers prompts from a script, or holds one open until released.
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    outcomes: Mutex<VecDeque<PromptOutcome>>,
    requests: Mutex<Vec<PromptRequest>>,
    held: Mutex<Option<oneshot::Receiver<PromptOutcome>>>,
    release: Mutex<Option<oneshot::Sender<PromptOutcome>>>,
    asked: Notify,
}

impl ScriptedPrompt {
    /// Exhausted scripts answer `Dismiss`.
    pub(crate) fn new(outcomes: Vec<PromptOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The next prompt blocks until [`release`](Self::release).
    pub(crate) fn hold(&self) {
        let (tx, rx) = oneshot::channel();
        *self.held.lock().unwrap() = Some(rx);
        *self.release.lock().unwrap() = Some(tx);
    }

    pub(crate) fn release(&self, outcome: PromptOutcome) {
        if let Some(tx) = self.release.lock().unwrap().take() {
            let _ = tx.send(outcome);
        }
    }

    pub(crate) async fn wait_until_asked(&self) {
        self.asked.notified().await;
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn ask(&self, request: PromptRequest) -> PromptOutcome {
        self.requests.lock().unwrap().push(request);
        self.asked.notify_one();
        let held = self.held.lock().unwrap().take();
        if let Some(rx) = held {
            return rx.await.unwrap_or(PromptOutcome::Dismiss);
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PromptOutcome::Dismiss)
    }
}
