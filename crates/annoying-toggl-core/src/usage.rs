//! Hourly API call metering.
//!
//! Toggl allows roughly 30 requests per hour on the free plan. The meter only
//! surfaces the number; nothing is ever blocked on it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Assumed hourly request budget.
pub const HOURLY_BUDGET: u32 = 30;

/// Above this count the UI should warn.
pub const WARNING_THRESHOLD: u32 = 25;

/// Calls counted in a rolling one-hour window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMeter {
    count: u32,
    window_start: Option<DateTime<Utc>>,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Open the first window, or reset once a full hour has passed.
    pub fn maybe_rollover(&mut self, now: DateTime<Utc>) {
        match self.window_start {
            None => self.window_start = Some(now),
            Some(start) if now - start >= Duration::hours(1) => {
                tracing::debug!(previous = self.count, "api call count reset");
                self.count = 0;
                self.window_start = Some(now);
            }
            Some(_) => {}
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn window_start(&self) -> Option<DateTime<Utc>> {
        self.window_start
    }

    pub fn is_near_limit(&self) -> bool {
        self.count > WARNING_THRESHOLD
    }

    pub fn summary(&self) -> String {
        format!("API calls this hour: {}/{}", self.count, HOURLY_BUDGET)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
