//! Exact totals over a trailing time window.
//!
//! Computed from raw events only. A trailing window crosses bucket
//! boundaries, so bucket totals cannot answer it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::bucket::CategoryBreakdown;
use crate::event::WorkEvent;

/// Default trailing window: six hours.
pub const DEFAULT_WINDOW_MINUTES: i64 = 6 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentStats {
    pub window_minutes: i64,
    pub total_minutes: u64,
    pub session_count: u64,
    pub event_count: usize,
    pub category_breakdown: CategoryBreakdown,
}

/// Sums events with `timestamp` in `[now - window, now]`.
///
/// `events` must be sorted by timestamp; the range is located by binary
/// search.
pub fn recent_stats(events: &[WorkEvent], now: DateTime<Utc>, window: Duration) -> RecentStats {
    let start = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let lo = events.partition_point(|e| e.timestamp < start);
    let hi = events.partition_point(|e| e.timestamp <= now);

    let mut stats = RecentStats {
        window_minutes: window.num_minutes(),
        ..RecentStats::default()
    };
    if lo >= hi {
        return stats;
    }

    for event in &events[lo..hi] {
        stats.total_minutes = stats.total_minutes.saturating_add(event.duration_minutes);
        stats.session_count = stats.session_count.saturating_add(event.session_count);
        stats.event_count += 1;
        let entry = stats
            .category_breakdown
            .entry(event.category.clone())
            .or_insert(0);
        *entry = entry.saturating_add(event.duration_minutes);
    }
    stats
}
