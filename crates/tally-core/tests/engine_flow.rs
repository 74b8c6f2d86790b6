//! End-to-end engine scenarios against an in-memory store.
//!
//! All scenarios pin the clock; period keys follow the local date of the
//! pinned offset.

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{Value, json};
use tally_core::{
    BlobStore, DEFAULT_DOCUMENT_KEY, EngineOptions, Granularity, LabelChange, ManualClock,
    MemoryStore, RetentionPolicy, StatsEngine,
};

fn at(ts: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(ts).unwrap()
}

/// Saturday 2026-10-17, 09:00 local.
fn saturday() -> ManualClock {
    ManualClock::new(at("2026-10-17T09:00:00+02:00"))
}

fn stored(store: &MemoryStore) -> Value {
    serde_json::from_str(store.raw(DEFAULT_DOCUMENT_KEY).unwrap()).unwrap()
}

#[test]
fn test_records_accumulate_per_category() {
    let clock = saturday();
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    engine.record(25, "study", 1).unwrap();
    let outcome = engine.record(30, "programming", 1).unwrap();

    let today = engine.today();
    assert_eq!(today.period_key, "2026-10-17");
    assert_eq!(today.bucket.total_minutes, 55);
    assert_eq!(today.bucket.session_count, 2);
    assert_eq!(today.bucket.minutes_for("study"), 25);
    assert_eq!(today.bucket.minutes_for("programming"), 30);
    assert_eq!(outcome.day, today);
    assert_eq!(engine.this_week().period_key, "2026-10-17");
    assert_eq!(engine.this_month().period_key, "2026-10");
    assert_eq!(engine.lifetime().total_minutes, 55);
    assert_eq!(engine.best_records().best_day.minutes, 55);
    assert_eq!(engine.best_records().best_day.period_key, "2026-10-17");
}

#[test]
fn test_friday_belongs_to_week_started_previous_saturday() {
    let clock = ManualClock::new(at("2026-10-16T18:00:00+02:00"));
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    // Monday of the week before.
    engine
        .record_at(at("2026-10-05T10:00:00+02:00"), 40, "reading", 1)
        .unwrap();

    assert_eq!(engine.this_week().period_key, "2026-10-10");
    let previous = engine.previous_week();
    assert_eq!(previous.period_key, "2026-10-03");
    assert_eq!(previous.bucket.total_minutes, 40);
    assert_eq!(engine.previous_day().period_key, "2026-10-15");
    assert_eq!(engine.previous_month().period_key, "2026-09");
    assert_eq!(engine.previous_month().bucket.total_minutes, 0);
}

#[test]
fn test_same_month_different_weeks() {
    let clock = saturday();
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    engine
        .record_at(at("2026-10-05T10:00:00+02:00"), 20, "work", 1)
        .unwrap();
    engine
        .record_at(at("2026-10-12T10:00:00+02:00"), 20, "work", 1)
        .unwrap();

    let doc = engine.document();
    assert_eq!(doc.monthly["2026-10"].total_minutes, 40);
    assert_eq!(doc.weekly["2026-10-03"].total_minutes, 20);
    assert_eq!(doc.weekly["2026-10-10"].total_minutes, 20);
    assert_eq!(doc.daily["2026-10-05"].total_minutes, 20);
}

#[test]
fn test_local_midnight_splits_days() {
    let clock = ManualClock::new(at("2026-10-16T23:59:00+02:00"));
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    engine.record(15, "study", 1).unwrap();
    clock.set(at("2026-10-17T00:01:00+02:00"));
    engine.record(10, "study", 1).unwrap();

    assert_eq!(engine.today().bucket.total_minutes, 10);
    assert_eq!(engine.previous_day().period_key, "2026-10-16");
    assert_eq!(engine.previous_day().bucket.total_minutes, 15);
    // Friday and Saturday fall in different weeks.
    assert_eq!(engine.this_week().bucket.total_minutes, 10);
    assert_eq!(engine.previous_week().bucket.total_minutes, 15);
    assert_eq!(engine.this_month().bucket.total_minutes, 25);
}

#[test]
fn test_state_survives_reopen() {
    let clock = saturday();
    let mut store = MemoryStore::new();
    {
        let mut engine = StatsEngine::open(&mut store, &clock).unwrap();
        engine.record(45, "work", 2).unwrap();
        engine.set_goals(60, 600, 2400).unwrap();
        engine.add_label("music").unwrap();
    }

    let engine = StatsEngine::open(&mut store, &clock).unwrap();
    assert_eq!(engine.today().bucket.total_minutes, 45);
    assert_eq!(engine.today().bucket.session_count, 2);
    assert_eq!(engine.goals().daily_minutes, 60);
    assert!(engine.labels().contains(&"music".to_string()));
    assert_eq!(engine.lifetime().start_date, "2026-10-17");
}

#[test]
fn test_best_records_only_grow() {
    let clock = saturday();
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    let first = engine.record(60, "work", 1).unwrap();
    assert_eq!(first.new_records, Granularity::ALL);

    clock.advance(Duration::days(1));
    let second = engine.record(30, "work", 1).unwrap();
    // Sunday is still the same week and month.
    assert_eq!(second.new_records, [Granularity::Week, Granularity::Month]);

    let best = engine.best_records();
    assert_eq!(best.best_day.minutes, 60);
    assert_eq!(best.best_day.period_key, "2026-10-17");
    assert_eq!(best.best_week.minutes, 90);
    assert_eq!(best.best_month.minutes, 90);
}

#[test]
fn test_cleanup_removes_expired_data_only() {
    let clock = saturday();
    let mut store = MemoryStore::new();
    let mut engine = StatsEngine::open(&mut store, &clock).unwrap();

    engine
        .record_at(at("2026-08-01T10:00:00+02:00"), 50, "work", 1)
        .unwrap();
    engine.record(20, "work", 1).unwrap();

    let report = engine.cleanup().unwrap();
    assert_eq!(report.removed_days, 1);
    // 2026-08-01 is still within twelve weeks and twelve months.
    assert_eq!(report.removed_weeks, 0);
    assert_eq!(report.removed_months, 0);
    assert_eq!(report.removed_events, 1);

    let doc = engine.document();
    assert!(!doc.daily.contains_key("2026-08-01"));
    assert!(doc.weekly.contains_key("2026-08-01"));
    assert_eq!(doc.lifetime.total_minutes, 70);
    assert_eq!(engine.today().bucket.total_minutes, 20);
    assert_eq!(engine.best_records().best_day.minutes, 50);

    assert!(engine.cleanup().unwrap().skipped);
}

#[test]
fn test_cleanup_keeps_current_buckets_and_persists() {
    let clock = saturday();
    let mut store = MemoryStore::new();
    {
        let mut engine = StatsEngine::open(&mut store, &clock).unwrap();
        engine.cleanup().unwrap();
    }
    let doc = stored(&store);
    assert!(doc["daily"]["2026-10-17"].is_object());
    assert!(doc["weekly"]["2026-10-17"].is_object());
    assert!(doc["monthly"]["2026-10"].is_object());
}

#[test]
fn test_recent_window_is_exact_and_inclusive() {
    let clock = saturday();
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    engine
        .record_at(at("2026-10-17T02:00:00+02:00"), 30, "study", 1)
        .unwrap();
    engine
        .record_at(at("2026-10-17T03:00:00+02:00"), 20, "study", 1)
        .unwrap();
    engine
        .record_at(at("2026-10-16T23:00:00+02:00"), 100, "work", 1)
        .unwrap();
    engine.record(10, "reading", 1).unwrap();

    let recent = engine.recent_stats(Duration::hours(6));
    // 02:00 is seven hours back; 03:00 sits exactly on the boundary.
    assert_eq!(recent.total_minutes, 30);
    assert_eq!(recent.event_count, 2);
    assert_eq!(recent.window_minutes, 360);
    assert_eq!(recent.category_breakdown["study"], 20);
    assert_eq!(recent.category_breakdown["reading"], 10);

    let wide = engine.recent_stats(Duration::hours(12));
    assert_eq!(wide.total_minutes, 160);
}

#[test]
fn test_labels_never_become_empty() {
    let clock = saturday();
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();

    for label in ["study", "programming", "reading"] {
        assert_eq!(engine.remove_label(label).unwrap(), LabelChange::Removed);
    }
    assert_eq!(engine.remove_label("work").unwrap(), LabelChange::LastLabel);
    assert_eq!(engine.labels(), ["work"]);

    // Historical breakdowns keep removed categories.
    engine.record(5, "study", 1).unwrap();
    assert_eq!(engine.today().bucket.minutes_for("study"), 5);
}

#[test]
fn test_legacy_document_is_migrated_on_first_write() {
    let legacy = json!({
        "daily": {"2026-10-16": {"totalMinutes": 90, "sessionCount": 3}},
        "weekly": {"2026-10-10": {"totalMinutes": 90, "sessionCount": 3}},
        "monthly": {"2026-10": {"totalMinutes": 90, "sessionCount": 3}},
        "lifetime": {"totalMinutes": 90, "totalSessions": 3},
        "tasks": [{"title": "write report"}]
    });
    let clock = saturday();
    let mut store = MemoryStore::with_entry(DEFAULT_DOCUMENT_KEY, &legacy.to_string());

    let mut engine = StatsEngine::open(&mut store, &clock).unwrap();
    assert_eq!(engine.previous_day().bucket.total_minutes, 90);
    assert_eq!(engine.best_records().best_day.minutes, 90);
    assert_eq!(engine.lifetime().start_date, "2026-10-16");
    engine.record(10, "study", 1).unwrap();
    drop(engine);

    let doc = stored(&store);
    assert_eq!(doc["tasks"][0]["title"], "write report");
    assert_eq!(doc["goals"]["dailyMinutes"], 120);
    assert_eq!(doc["labels"], json!(["study", "programming", "reading", "work"]));
    assert_eq!(doc["daily"]["2026-10-16"]["categoryBreakdown"]["uncategorized"], 90);
    assert_eq!(doc["lifetime"]["totalMinutes"], 100);
    assert_eq!(doc["previousPeriods"]["day"]["periodKey"], "2026-10-16");
    assert_eq!(doc["recentEvents"].as_array().unwrap().len(), 1);
}

#[test]
fn test_corrupt_document_is_reinitialized() {
    let clock = saturday();
    let mut store = MemoryStore::with_entry(DEFAULT_DOCUMENT_KEY, "{\"daily\": [");

    let mut engine = StatsEngine::open(&mut store, &clock).unwrap();
    assert_eq!(engine.lifetime().total_minutes, 0);
    engine.record(10, "study", 1).unwrap();
    drop(engine);

    assert_eq!(stored(&store)["lifetime"]["totalMinutes"], 10);
}

#[test]
fn test_custom_document_key() {
    let clock = saturday();
    let options = EngineOptions {
        document_key: "alice".to_string(),
        retention: RetentionPolicy::default(),
    };
    let mut store = MemoryStore::new();
    let mut engine = StatsEngine::open_with(&mut store, &clock, options).unwrap();
    engine.record(10, "study", 1).unwrap();
    drop(engine);

    assert!(store.get("alice").unwrap().is_some());
    assert!(store.get(DEFAULT_DOCUMENT_KEY).unwrap().is_none());
}

#[test]
fn test_summary_is_consistent() {
    let clock = saturday();
    let mut engine = StatsEngine::open(MemoryStore::new(), &clock).unwrap();
    engine.record(60, "work", 1).unwrap();

    let summary = engine.summary();
    assert_eq!(summary.today, engine.today());
    assert_eq!(summary.previous_week.period_key, "2026-10-10");
    assert!((summary.progress.daily - 50.0).abs() < f64::EPSILON);
    assert_eq!(summary.best_records.best_day.minutes, 60);
}
