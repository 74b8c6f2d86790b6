//! Folding one event into every aggregate it touches.

use crate::document::StatsDocument;
use crate::event::{WorkEvent, insert_sorted};
use crate::period::{Granularity, PeriodKeys};
use crate::retention::enforce_event_cap;

/// Adds `event` to the day, week and month buckets named by `keys` and to the
/// lifetime aggregate, appends it to the raw log, then runs the best-record
/// check against the updated buckets.
///
/// Returns the granularities that set a new record.
pub fn apply_event(
    doc: &mut StatsDocument,
    keys: &PeriodKeys,
    event: WorkEvent,
    max_events: usize,
) -> Vec<Granularity> {
    let minutes = event.duration_minutes;
    let sessions = event.session_count;
    let mut new_records = Vec::new();

    for granularity in Granularity::ALL {
        let key = keys.key(granularity);
        let bucket = doc.buckets_mut(granularity).entry(key.clone()).or_default();
        bucket.add(minutes, sessions, &event.category);
        let updated = bucket.clone();
        if doc.best_records.observe(granularity, &key, &updated) {
            new_records.push(granularity);
        }
    }
    doc.lifetime.add(minutes, sessions, &event.category);

    insert_sorted(&mut doc.recent_events, event);
    enforce_event_cap(&mut doc.recent_events, max_events);

    new_records
}
