//! Retention policy and the cleanup sweep.
//!
//! Buckets are the durable record; raw events only exist to answer the
//! rolling-window query and so have a much shorter horizon.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::StatsDocument;
use crate::event::WorkEvent;
use crate::period::{DayKey, Granularity, MonthKey, PeriodKeys, WeekKey};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetentionError {
    /// A horizon is shorter than the lookback used for previous-period views.
    #[error("{field} must be at least {min}, got {value}")]
    TooShort {
        field: &'static str,
        min: u64,
        value: u64,
    },
}

/// How long each kind of data is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub day_bucket_days: u32,
    pub week_bucket_weeks: u32,
    pub month_bucket_months: u32,
    pub raw_event_days: u32,
    pub max_raw_events: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            day_bucket_days: 30,
            week_bucket_weeks: 12,
            month_bucket_months: 12,
            raw_event_days: 7,
            max_raw_events: 5000,
        }
    }
}

impl RetentionPolicy {
    /// Previous-period views look back one period, so every bucket horizon
    /// must cover at least one.
    pub fn validate(&self) -> Result<(), RetentionError> {
        let checks = [
            ("day_bucket_days", self.day_bucket_days, 1),
            ("week_bucket_weeks", self.week_bucket_weeks, 1),
            ("month_bucket_months", self.month_bucket_months, 1),
        ];
        for (field, value, min) in checks {
            if value < min {
                return Err(RetentionError::TooShort {
                    field,
                    min: u64::from(min),
                    value: u64::from(value),
                });
            }
        }
        if self.max_raw_events == 0 {
            return Err(RetentionError::TooShort {
                field: "max_raw_events",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }
}

/// What a sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    /// The sweep already ran for this engine and did nothing.
    pub skipped: bool,
    pub removed_days: usize,
    pub removed_weeks: usize,
    pub removed_months: usize,
    pub removed_events: usize,
    /// Current-period buckets that had to be re-created.
    pub restored_current: usize,
}

impl CleanupReport {
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            skipped: true,
            removed_days: 0,
            removed_weeks: 0,
            removed_months: 0,
            removed_events: 0,
            restored_current: 0,
        }
    }

    #[must_use]
    pub const fn changed(&self) -> bool {
        self.removed_days > 0
            || self.removed_weeks > 0
            || self.removed_months > 0
            || self.removed_events > 0
            || self.restored_current > 0
    }
}

/// Removes buckets and raw events past their horizons, then makes sure the
/// current day, week and month buckets exist.
///
/// Keys that do not parse are kept.
pub fn sweep(
    doc: &mut StatsDocument,
    policy: &RetentionPolicy,
    keys: &PeriodKeys,
    now: DateTime<Utc>,
) -> CleanupReport {
    let day_cutoff = keys.day.days_before(policy.day_bucket_days);
    let week_cutoff = keys.week.weeks_before(policy.week_bucket_weeks);
    let month_cutoff = keys.month.months_before(policy.month_bucket_months);

    let removed_days = retain_keys(doc, Granularity::Day, |key| {
        key.parse::<DayKey>().ok().map(|day| day >= day_cutoff)
    });
    let removed_weeks = retain_keys(doc, Granularity::Week, |key| {
        key.parse::<WeekKey>().ok().map(|week| week >= week_cutoff)
    });
    let removed_months = retain_keys(doc, Granularity::Month, |key| {
        key.parse::<MonthKey>().ok().map(|month| month >= month_cutoff)
    });

    let event_cutoff = now
        .checked_sub_signed(Duration::days(i64::from(policy.raw_event_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let before = doc.recent_events.len();
    doc.recent_events.retain(|event| event.timestamp >= event_cutoff);
    enforce_event_cap(&mut doc.recent_events, policy.max_raw_events);
    let removed_events = before - doc.recent_events.len();

    let restored_current = doc.ensure_current(keys);

    CleanupReport {
        skipped: false,
        removed_days,
        removed_weeks,
        removed_months,
        removed_events,
        restored_current,
    }
}

/// Keeps buckets for which `keep` returns `Some(true)` or `None` (unparseable).
fn retain_keys(
    doc: &mut StatsDocument,
    granularity: Granularity,
    keep: impl Fn(&str) -> Option<bool>,
) -> usize {
    let buckets = doc.buckets_mut(granularity);
    let before = buckets.len();
    buckets.retain(|key, _| {
        keep(key).unwrap_or_else(|| {
            tracing::warn!(%granularity, key, "keeping bucket with unparseable key");
            true
        })
    });
    before - buckets.len()
}

/// Drops the oldest events beyond `max`. `events` must be sorted.
pub(crate) fn enforce_event_cap(events: &mut Vec<WorkEvent>, max: usize) {
    if events.len() > max {
        let excess = events.len() - max;
        events.drain(..excess);
    }
}
