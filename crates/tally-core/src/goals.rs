//! Focus-time goals and completion percentages.
//!
//! Goals are targets for display only; nothing is enforced against them.

use serde::{Deserialize, Serialize};

use crate::period::Granularity;

pub const MIN_DAILY_MINUTES: u64 = 30;
pub const MIN_WEEKLY_MINUTES: u64 = 180;
pub const MIN_MONTHLY_MINUTES: u64 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goals {
    pub daily_minutes: u64,
    pub weekly_minutes: u64,
    pub monthly_minutes: u64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_minutes: 120,
            weekly_minutes: 840,
            monthly_minutes: 3600,
        }
    }
}

impl Goals {
    /// Builds goals, raising each value to its floor.
    #[must_use]
    pub fn new(daily_minutes: u64, weekly_minutes: u64, monthly_minutes: u64) -> Self {
        Self {
            daily_minutes: daily_minutes.max(MIN_DAILY_MINUTES),
            weekly_minutes: weekly_minutes.max(MIN_WEEKLY_MINUTES),
            monthly_minutes: monthly_minutes.max(MIN_MONTHLY_MINUTES),
        }
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.daily_minutes, self.weekly_minutes, self.monthly_minutes)
    }

    #[must_use]
    pub const fn target(&self, granularity: Granularity) -> u64 {
        match granularity {
            Granularity::Day => self.daily_minutes,
            Granularity::Week => self.weekly_minutes,
            Granularity::Month => self.monthly_minutes,
        }
    }
}

/// `min(100, 100 * minutes / goal)`. A zero goal reports zero.
#[allow(clippy::cast_precision_loss)]
pub fn completion_percent(minutes: u64, goal: u64) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    (100.0 * minutes as f64 / goal as f64).min(100.0)
}

/// Completion of the current day, week and month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
}
