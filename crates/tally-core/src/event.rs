//! Raw timed-work events.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One logged stretch of work.
///
/// Events are immutable once appended. `session_count` lets a single append
/// stand for several merged sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEvent {
    /// When the work was logged. Older documents stored epoch milliseconds.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub duration_minutes: u64,
    pub category: String,
    #[serde(default = "default_session_count")]
    pub session_count: u64,
}

const fn default_session_count() -> u64 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
    }
}

/// Inserts `event` keeping `events` sorted by timestamp. Equal timestamps keep
/// insertion order.
pub fn insert_sorted(events: &mut Vec<WorkEvent>, event: WorkEvent) {
    let index = events.partition_point(|e| e.timestamp <= event.timestamp);
    events.insert(index, event);
}
