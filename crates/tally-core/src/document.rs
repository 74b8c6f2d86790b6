//! The persisted root document and its loader.
//!
//! # Schema evolution
//!
//! There is no schema version number. Older documents are recognized by which
//! fields they carry, and [`StatsDocument::from_json`] is the single place that
//! fills the gaps:
//!
//! - absent `goals`, `labels`, `previousPeriods`, `bestRecords`,
//!   `recentEvents` get defaults (best records are seeded from the buckets
//!   that are still retained)
//! - an absent `lifetime` starts at the earliest retained day
//! - buckets without a `categoryBreakdown` attribute their minutes to
//!   `uncategorized`
//! - a present but malformed field is dropped with a warning; the rest of the
//!   document survives
//! - top-level fields this crate does not know about are carried through
//!   rewrites untouched
//!
//! Loading never writes. Defaults reach the store with the next mutation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::bucket::{Bucket, LifetimeStats, PeriodView};
use crate::event::WorkEvent;
use crate::goals::Goals;
use crate::labels::LabelSet;
use crate::period::{DayKey, Granularity, PeriodKeys};
use crate::records::BestRecords;

/// Snapshots of the periods before the current ones, as of the last write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousPeriods {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<PeriodView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<PeriodView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<PeriodView>,
}

impl PreviousPeriods {
    #[must_use]
    pub const fn get(&self, granularity: Granularity) -> Option<&PeriodView> {
        match granularity {
            Granularity::Day => self.day.as_ref(),
            Granularity::Week => self.week.as_ref(),
            Granularity::Month => self.month.as_ref(),
        }
    }

    fn slot_mut(&mut self, granularity: Granularity) -> &mut Option<PeriodView> {
        match granularity {
            Granularity::Day => &mut self.day,
            Granularity::Week => &mut self.week,
            Granularity::Month => &mut self.month,
        }
    }
}

/// Everything the engine persists, as one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDocument {
    pub daily: BTreeMap<String, Bucket>,
    pub weekly: BTreeMap<String, Bucket>,
    pub monthly: BTreeMap<String, Bucket>,
    pub lifetime: LifetimeStats,
    pub best_records: BestRecords,
    pub goals: Goals,
    pub labels: LabelSet,
    pub previous_periods: PreviousPeriods,
    /// Raw events, sorted by timestamp.
    pub recent_events: Vec<WorkEvent>,
    /// Unknown top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of [`StatsDocument::load`].
#[derive(Debug, Clone)]
pub struct Loaded {
    pub document: StatsDocument,
    /// Current-period buckets the stored document lacked. Non-zero means the
    /// store does not yet hold them.
    pub created_current: usize,
}

impl Loaded {
    fn fresh(keys: &PeriodKeys) -> Self {
        Self {
            document: StatsDocument::skeleton(keys),
            created_current: Granularity::ALL.len(),
        }
    }
}

impl StatsDocument {
    /// A fresh document with zeroed buckets for the current periods.
    #[must_use]
    pub fn skeleton(keys: &PeriodKeys) -> Self {
        let mut doc = Self {
            daily: BTreeMap::new(),
            weekly: BTreeMap::new(),
            monthly: BTreeMap::new(),
            lifetime: LifetimeStats::starting(keys.day.to_string()),
            best_records: BestRecords::default(),
            goals: Goals::default(),
            labels: LabelSet::default(),
            previous_periods: PreviousPeriods::default(),
            recent_events: Vec::new(),
            extra: Map::new(),
        };
        doc.ensure_current(keys);
        doc
    }

    /// Parses and normalizes a stored blob.
    ///
    /// Input that is not a JSON object is logged and replaced with a
    /// skeleton; this never fails.
    #[must_use]
    pub fn from_json(raw: &str, keys: &PeriodKeys) -> Self {
        Self::load(Some(raw), keys).document
    }

    /// Builds the in-memory document from whatever the store returned.
    #[must_use]
    pub fn load(raw: Option<&str>, keys: &PeriodKeys) -> Loaded {
        let Some(raw) = raw else {
            return Loaded::fresh(keys);
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::from_map(map, keys),
            Ok(other) => {
                tracing::warn!(
                    kind = json_kind(&other),
                    "stored statistics document is not an object, reinitializing"
                );
                Loaded::fresh(keys)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "stored statistics document is not valid JSON, reinitializing"
                );
                Loaded::fresh(keys)
            }
        }
    }

    fn from_map(mut map: Map<String, Value>, keys: &PeriodKeys) -> Loaded {
        let mut document = Self {
            daily: take_buckets(&mut map, "daily"),
            weekly: take_buckets(&mut map, "weekly"),
            monthly: take_buckets(&mut map, "monthly"),
            lifetime: take_field(&mut map, "lifetime").unwrap_or_default(),
            best_records: take_field(&mut map, "bestRecords").unwrap_or_default(),
            goals: take_field(&mut map, "goals").unwrap_or_default(),
            labels: take_field(&mut map, "labels").unwrap_or_default(),
            previous_periods: take_field(&mut map, "previousPeriods").unwrap_or_default(),
            recent_events: take_events(&mut map, "recentEvents"),
            extra: map,
        };
        let created_current = document.normalize(keys);
        Loaded {
            document,
            created_current,
        }
    }

    /// In-memory repairs. Idempotent.
    ///
    /// Returns how many current-period buckets had to be created.
    pub fn normalize(&mut self, keys: &PeriodKeys) -> usize {
        let mut reconciled = 0usize;
        for granularity in Granularity::ALL {
            for bucket in self.buckets_mut(granularity).values_mut() {
                if bucket.reconcile() {
                    reconciled += 1;
                }
            }
        }
        if self.lifetime.reconcile() {
            reconciled += 1;
        }
        if reconciled > 0 {
            tracing::debug!(reconciled, "reconciled category breakdowns");
        }

        if self.lifetime.start_date.is_empty() {
            self.lifetime.start_date = self
                .daily
                .keys()
                .find_map(|key| key.parse::<DayKey>().ok())
                .unwrap_or(keys.day)
                .to_string();
        }

        self.goals = self.goals.clamped();

        let before = self.recent_events.len();
        self.recent_events.retain(|event| event.duration_minutes > 0);
        if self.recent_events.len() != before {
            tracing::debug!(
                dropped = before - self.recent_events.len(),
                "dropped zero-length events"
            );
        }
        self.recent_events.sort_by_key(|event| event.timestamp);

        for granularity in Granularity::ALL {
            let buckets = match granularity {
                Granularity::Day => &self.daily,
                Granularity::Week => &self.weekly,
                Granularity::Month => &self.monthly,
            };
            self.best_records.observe_all(granularity, buckets);
        }

        self.ensure_current(keys)
    }

    /// Inserts zeroed buckets for the current periods. Returns how many were
    /// missing.
    pub fn ensure_current(&mut self, keys: &PeriodKeys) -> usize {
        let mut created = 0;
        for granularity in Granularity::ALL {
            let key = keys.key(granularity);
            let buckets = self.buckets_mut(granularity);
            if !buckets.contains_key(&key) {
                buckets.insert(key, Bucket::default());
                created += 1;
            }
        }
        created
    }

    #[must_use]
    pub const fn buckets(&self, granularity: Granularity) -> &BTreeMap<String, Bucket> {
        match granularity {
            Granularity::Day => &self.daily,
            Granularity::Week => &self.weekly,
            Granularity::Month => &self.monthly,
        }
    }

    pub fn buckets_mut(&mut self, granularity: Granularity) -> &mut BTreeMap<String, Bucket> {
        match granularity {
            Granularity::Day => &mut self.daily,
            Granularity::Week => &mut self.weekly,
            Granularity::Month => &mut self.monthly,
        }
    }

    /// The bucket stored under `key`, or a zeroed view.
    #[must_use]
    pub fn view(&self, granularity: Granularity, key: &str) -> PeriodView {
        self.buckets(granularity)
            .get(key)
            .map_or_else(|| PeriodView::empty(key), |b| PeriodView::new(key, b.clone()))
    }

    /// Like [`view`](Self::view), falling back to the previous-periods
    /// snapshot when the bucket itself is gone.
    #[must_use]
    pub fn previous_view(&self, granularity: Granularity, key: &str) -> PeriodView {
        if let Some(bucket) = self.buckets(granularity).get(key) {
            return PeriodView::new(key, bucket.clone());
        }
        self.previous_periods
            .get(granularity)
            .filter(|snapshot| snapshot.period_key == key)
            .cloned()
            .unwrap_or_else(|| PeriodView::empty(key))
    }

    /// Re-snapshots the periods before `keys`. A snapshot whose bucket has
    /// been swept is kept while its key is still the previous one.
    pub fn refresh_previous_periods(&mut self, keys: &PeriodKeys) {
        let previous = keys.previous();
        for granularity in Granularity::ALL {
            let key = previous.key(granularity);
            let fresh = self
                .buckets(granularity)
                .get(&key)
                .map(|bucket| PeriodView::new(key.clone(), bucket.clone()));
            let slot = self.previous_periods.slot_mut(granularity);
            match fresh {
                Some(view) => *slot = Some(view),
                None => {
                    if slot.as_ref().is_some_and(|view| view.period_key != key) {
                        *slot = None;
                    }
                }
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Removes and decodes one field. Absent or `null` yields `None` silently;
/// malformed values are logged and yield `None`.
fn take_field<T: DeserializeOwned>(map: &mut Map<String, Value>, name: &'static str) -> Option<T> {
    let value = map.remove(name)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(field = name, error = %err, "discarding malformed field");
            None
        }
    }
}

/// Decodes a bucket map entry by entry so one bad bucket does not take the
/// rest with it.
fn take_buckets(map: &mut Map<String, Value>, name: &'static str) -> BTreeMap<String, Bucket> {
    let entries = match map.remove(name) {
        None | Some(Value::Null) => return BTreeMap::new(),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            tracing::warn!(field = name, kind = json_kind(&other), "discarding malformed bucket map");
            return BTreeMap::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<Bucket>(value) {
            Ok(bucket) => Some((key, bucket)),
            Err(err) => {
                tracing::warn!(field = name, key = %key, error = %err, "discarding malformed bucket");
                None
            }
        })
        .collect()
}

fn take_events(map: &mut Map<String, Value>, name: &'static str) -> Vec<WorkEvent> {
    let entries = match map.remove(name) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            tracing::warn!(field = name, kind = json_kind(&other), "discarding malformed event log");
            return Vec::new();
        }
    };
    let total = entries.len();
    let events: Vec<WorkEvent> = entries
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if events.len() != total {
        tracing::warn!(
            field = name,
            discarded = total - events.len(),
            "discarding malformed events"
        );
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use serde_json::json;

    fn keys() -> PeriodKeys {
        PeriodKeys::for_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    #[test]
    fn test_skeleton_has_zeroed_current_buckets() {
        let doc = StatsDocument::skeleton(&keys());
        assert_eq!(doc.daily["2026-10-16"], Bucket::default());
        assert_eq!(doc.weekly["2026-10-10"], Bucket::default());
        assert_eq!(doc.monthly["2026-10"], Bucket::default());
        assert_eq!(doc.lifetime.start_date, "2026-10-16");
        assert!(doc.recent_events.is_empty());
    }

    #[test]
    fn test_load_reports_missing_current_buckets() {
        assert_eq!(StatsDocument::load(None, &keys()).created_current, 3);

        let stored = StatsDocument::skeleton(&keys()).to_json().unwrap();
        assert_eq!(StatsDocument::load(Some(&stored), &keys()).created_current, 0);

        let next_day = PeriodKeys::for_date(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        // New day and new week, same month.
        assert_eq!(StatsDocument::load(Some(&stored), &next_day).created_current, 2);
    }

    #[test]
    fn test_garbage_reinitializes() {
        for raw in ["", "{not json", "[1, 2, 3]", "42", "null"] {
            let doc = StatsDocument::from_json(raw, &keys());
            assert_eq!(doc, StatsDocument::skeleton(&keys()), "input {raw:?}");
        }
    }

    #[test]
    fn test_legacy_document_gets_defaults() {
        let legacy = json!({
            "daily": {
                "2026-10-14": {"totalMinutes": 90, "sessionCount": 3},
                "2026-10-15": {"totalMinutes": 30, "sessionCount": 1,
                               "categoryBreakdown": {"study": 30}}
            },
            "weekly": {"2026-10-10": {"totalMinutes": 120, "sessionCount": 4}},
            "monthly": {"2026-10": {"totalMinutes": 120, "sessionCount": 4}},
            "lifetime": {"totalMinutes": 500, "totalSessions": 20}
        });
        let doc = StatsDocument::from_json(&legacy.to_string(), &keys());

        assert_eq!(doc.goals, Goals::default());
        assert_eq!(doc.labels, LabelSet::default());
        assert!(doc.recent_events.is_empty());
        assert_eq!(doc.lifetime.start_date, "2026-10-14");
        assert_eq!(doc.lifetime.category_breakdown["uncategorized"], 500);
        assert_eq!(doc.daily["2026-10-14"].category_breakdown["uncategorized"], 90);
        assert_eq!(doc.best_records.best_day.minutes, 90);
        assert_eq!(doc.best_records.best_day.period_key, "2026-10-14");
        assert_eq!(doc.best_records.best_week.minutes, 120);
        assert!(doc.daily.contains_key("2026-10-16"));
        for granularity in Granularity::ALL {
            assert!(doc.buckets(granularity).values().all(Bucket::is_conserved));
        }
    }

    #[test]
    fn test_malformed_field_is_salvaged() {
        let raw = json!({
            "goals": "lots",
            "labels": ["Music"],
            "daily": {
                "2026-10-15": {"totalMinutes": "many"},
                "2026-10-14": {"totalMinutes": 20, "categoryBreakdown": {"music": 20}}
            },
            "recentEvents": [
                {"timestamp": "2026-10-15T10:00:00Z", "durationMinutes": 20, "category": "music"},
                {"timestamp": "garbage"}
            ]
        });
        let doc = StatsDocument::from_json(&raw.to_string(), &keys());

        assert_eq!(doc.goals, Goals::default());
        assert_eq!(doc.labels.as_slice(), ["music"]);
        assert!(!doc.daily.contains_key("2026-10-15"));
        assert_eq!(doc.daily["2026-10-14"].total_minutes, 20);
        assert_eq!(doc.recent_events.len(), 1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "daily": {"2026-10-14": {"totalMinutes": 90}},
            "goals": {"dailyMinutes": 5},
            "recentEvents": [
                {"timestamp": "2026-10-15T10:00:00Z", "durationMinutes": 20, "category": "a"},
                {"timestamp": "2026-10-14T10:00:00Z", "durationMinutes": 0, "category": "b"},
                {"timestamp": "2026-10-13T10:00:00Z", "durationMinutes": 10, "category": "c"}
            ]
        });
        let doc = StatsDocument::from_json(&raw.to_string(), &keys());
        let mut again = doc.clone();
        assert_eq!(again.normalize(&keys()), 0);

        assert_eq!(doc, again);
        assert_eq!(doc.goals.daily_minutes, crate::goals::MIN_DAILY_MINUTES);
        let categories: Vec<&str> = doc.recent_events.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, ["c", "a"]);
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let raw = json!({"tasks": [{"title": "read"}], "theme": "dark"});
        let doc = StatsDocument::from_json(&raw.to_string(), &keys());
        let rewritten: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(rewritten["tasks"][0]["title"], "read");
        assert_eq!(rewritten["theme"], "dark");
        assert!(rewritten["daily"].is_object());
    }

    #[test]
    fn test_previous_view_falls_back_to_snapshot() {
        let mut doc = StatsDocument::skeleton(&keys());
        doc.daily
            .entry("2026-10-15".to_string())
            .or_default()
            .add(45, 1, "work");
        doc.refresh_previous_periods(&keys());
        doc.daily.remove("2026-10-15");

        assert_eq!(doc.previous_view(Granularity::Day, "2026-10-15").bucket.total_minutes, 45);
        assert_eq!(doc.previous_view(Granularity::Day, "2026-10-14").bucket, Bucket::default());
        assert_eq!(doc.view(Granularity::Day, "2026-10-15").bucket, Bucket::default());
    }
}
