//! Check cadence and progress projection.
//!
//! `PollScheduler` is wall-clock based and owns no threads. The check loop
//! records each firing here; the progress loop asks it once per second how
//! far along the current cycle is.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::mute::MuteStatus;

pub const DEFAULT_CHECK_INTERVAL_MIN: u32 = 5;

/// Derived progress toward the next check or the end of a mute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// 0.0 .. 1.0
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    interval: Duration,
    last_check: Option<DateTime<Utc>>,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_INTERVAL_MIN)
    }
}

impl PollScheduler {
    /// Intervals below one minute are raised to one minute.
    pub fn new(interval_min: u32) -> Self {
        Self {
            interval: minutes(interval_min),
            last_check: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn interval_std(&self) -> std::time::Duration {
        self.interval.to_std().unwrap_or(std::time::Duration::from_secs(60))
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    /// Mute progress wins over check progress. `None` before the first check.
    pub fn progress(&self, now: DateTime<Utc>, mute: Option<MuteStatus>) -> Option<ProgressInfo> {
        if let Some(mute) = mute {
            let total = mute.total.num_milliseconds().max(1) as f64;
            let remaining = mute.remaining.num_milliseconds() as f64;
            return Some(ProgressInfo {
                value: (1.0 - remaining / total).clamp(0.0, 1.0),
                label: format!("Muted: {} min left", round_minutes(mute.remaining)),
            });
        }

        let last = self.last_check?;
        let elapsed = now - last;
        let total = self.interval.num_milliseconds().max(1) as f64;
        let value = (elapsed.num_milliseconds() as f64 / total).clamp(0.0, 1.0);
        let left = (self.interval - elapsed).max(Duration::zero());
        Some(ProgressInfo {
            value,
            label: format!("Next check: {} min", round_minutes(left)),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_interval(&mut self, interval_min: u32) {
        self.interval = minutes(interval_min);
    }

    pub fn record_check(&mut self, now: DateTime<Utc>) {
        self.last_check = Some(now);
    }
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m.max(1)))
}

/// Whole minutes, rounded to nearest.
fn round_minutes(d: Duration) -> i64 {
    (d.num_seconds() as f64 / 60.0).round() as i64
}
