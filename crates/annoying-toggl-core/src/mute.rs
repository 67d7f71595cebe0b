//! Temporary suppression of reminder checks.
//!
//! Expiry is lazy: the window is cleared the first time a query observes
//! that its end has passed. No background timer is involved.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveMute {
    end: DateTime<Utc>,
    total: Duration,
}

/// Remaining and total length of an active mute, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteStatus {
    pub remaining: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuteWindow {
    active: Option<ActiveMute>,
}

impl MuteWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress checks for `minutes` from `now`. Overwrites any current window.
    pub fn mute(&mut self, minutes: u32, now: DateTime<Utc>) {
        let total = Duration::minutes(i64::from(minutes));
        self.active = Some(ActiveMute {
            end: now + total,
            total,
        });
    }

    pub fn is_active(&mut self, now: DateTime<Utc>) -> bool {
        match self.active {
            Some(m) if m.end > now => true,
            Some(_) => {
                tracing::info!("mute expired");
                self.active = None;
                false
            }
            None => false,
        }
    }

    pub fn remaining(&mut self, now: DateTime<Utc>) -> Option<Duration> {
        self.status(now).map(|s| s.remaining)
    }

    pub fn status(&mut self, now: DateTime<Utc>) -> Option<MuteStatus> {
        if !self.is_active(now) {
            return None;
        }
        self.active.map(|m| MuteStatus {
            remaining: m.end - now,
            total: m.total,
        })
    }

    /// End of the current window, without checking expiry.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.active.map(|m| m.end)
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}
