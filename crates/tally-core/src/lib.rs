//! Core domain logic for focus statistics.
//!
//! This crate contains:
//! - Period keys: local-calendar day, Saturday-anchored week and month keys
//! - Rollups: per-period buckets, lifetime totals and best records
//! - The engine: load/normalize/mutate/persist over a pluggable blob store
//! - Retention: sweeping expired buckets and raw events

pub mod bucket;
pub mod clock;
pub mod document;
pub mod engine;
pub mod event;
pub mod goals;
pub mod labels;
pub mod period;
pub mod records;
pub mod retention;
mod rollup;
pub mod store;
pub mod window;

pub use bucket::{Bucket, CategoryBreakdown, LifetimeStats, PeriodView, UNCATEGORIZED};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{Loaded, PreviousPeriods, StatsDocument};
pub use engine::{
    DEFAULT_DOCUMENT_KEY, EngineError, EngineOptions, PostWriteHook, RecordOutcome, StatsEngine,
    Summary,
};
pub use event::WorkEvent;
pub use goals::{GoalProgress, Goals, completion_percent};
pub use labels::{DEFAULT_LABELS, LabelChange, LabelSet, normalize_category};
pub use period::{
    DayKey, Granularity, MonthKey, PeriodKeyError, PeriodKeys, WeekKey, day_key, month_key,
    week_key,
};
pub use records::{BestRecord, BestRecords};
pub use retention::{CleanupReport, RetentionError, RetentionPolicy};
pub use store::{BlobStore, BoxError, MemoryStore, StoreError};
pub use window::{DEFAULT_WINDOW_MINUTES, RecentStats, recent_stats};
