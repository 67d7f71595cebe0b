//! Wire types for the Toggl Track v9 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel duration the service uses for an entry that is still running.
pub const RUNNING_DURATION: i64 = -1;

/// A tracked work interval as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub wid: i64,
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub billable: bool,
    pub start: String,
    pub duration: i64,
    /// Toggl sends `null` for entries created without a description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub at: String,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.duration < 0
    }
}

/// A remote account/organization scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
}

/// Body of the create-entry request.
#[derive(Debug, Clone, Serialize)]
pub struct NewTimeEntry<'a> {
    pub description: &'a str,
    pub created_with: &'a str,
    pub workspace_id: i64,
    pub duration: i64,
    pub start: String,
    pub stop: Option<String>,
}

impl<'a> NewTimeEntry<'a> {
    /// A running entry starting at `now`.
    pub fn running(description: &'a str, workspace_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            description,
            created_with: crate::CREATED_WITH,
            workspace_id,
            duration: RUNNING_DURATION,
            start: now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            stop: None,
        }
    }
}

/// Body of the update-entry request.
#[derive(Debug, Clone, Serialize)]
pub struct EntryUpdate<'a> {
    pub description: &'a str,
}

/// Maximum number of suggestions offered in a reminder prompt.
pub const MAX_SUGGESTIONS: usize = 10;

/// Distinct, non-blank descriptions in first-occurrence order, capped at
/// `limit`. Text is kept exactly as the service returned it.
pub fn suggestions(entries: &[TimeEntry], limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in entries {
        if out.len() >= limit {
            break;
        }
        let desc = &entry.description;
        if desc.trim().is_empty() || out.contains(desc) {
            continue;
        }
        out.push(desc.clone());
    }
    out
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) fn entry(id: i64, description: &str) -> TimeEntry {
    TimeEntry {
        id,
        wid: 7,
        pid: None,
        billable: false,
        start: "2024-03-01T09:00:00Z".into(),
        duration: RUNNING_DURATION,
        description: description.into(),
        at: "2024-03-01T09:00:00Z".into(),
    }
}
