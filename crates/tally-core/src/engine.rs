//! The statistics engine.
//!
//! One [`StatsEngine`] owns the store handle and the clock for the lifetime
//! of the application. Reads are served from the last loaded document and
//! never touch the store. Every mutation re-reads the full document, applies
//! the change in memory and writes the full document back.
//!
//! # Concurrency
//!
//! Mutations take `&mut self`, so within one process the borrow checker
//! serializes read-modify-write. To share an engine across threads, put it
//! behind a `Mutex`. Two *processes* writing the same store can still lose an
//! update: each re-reads before writing, but nothing spans the gap between a
//! read and the following write.
//!
//! # Failure model
//!
//! A corrupt stored document is replaced with defaults and logged. Invalid
//! input is a no-op. Store failures are returned as [`EngineError::Store`] and
//! leave the in-memory document at its last known good state; there are no
//! retries.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::bucket::{LifetimeStats, PeriodView};
use crate::clock::Clock;
use crate::document::StatsDocument;
use crate::event::WorkEvent;
use crate::goals::{GoalProgress, Goals, completion_percent};
use crate::labels::{LabelChange, LabelSet, normalize_category};
use crate::period::{Granularity, PeriodKeys};
use crate::records::BestRecords;
use crate::retention::{CleanupReport, RetentionError, RetentionPolicy, sweep};
use crate::rollup::apply_event;
use crate::store::{BlobStore, StoreError};
use crate::window::{RecentStats, recent_stats};

/// Store key the document lives under unless configured otherwise.
pub const DEFAULT_DOCUMENT_KEY: &str = "focus-stats";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode statistics document")]
    Encode(#[source] serde_json::Error),
    #[error("invalid retention policy")]
    Retention(#[from] RetentionError),
}

/// Called with the document after every successful write.
pub type PostWriteHook = Box<dyn FnMut(&StatsDocument) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub document_key: String,
    pub retention: RetentionPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            document_key: DEFAULT_DOCUMENT_KEY.to_string(),
            retention: RetentionPolicy::default(),
        }
    }
}

/// Aggregates touched by a `record` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    /// `false` when the input was rejected and nothing changed.
    pub recorded: bool,
    pub day: PeriodView,
    pub week: PeriodView,
    pub month: PeriodView,
    pub lifetime: LifetimeStats,
    pub new_records: Vec<Granularity>,
}

/// Everything a dashboard shows, from one snapshot of "now".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub generated_at: DateTime<FixedOffset>,
    pub today: PeriodView,
    pub this_week: PeriodView,
    pub this_month: PeriodView,
    pub previous_day: PeriodView,
    pub previous_week: PeriodView,
    pub previous_month: PeriodView,
    pub lifetime: LifetimeStats,
    pub goals: Goals,
    pub progress: GoalProgress,
    pub best_records: BestRecords,
}

pub struct StatsEngine<S, C> {
    store: S,
    clock: C,
    options: EngineOptions,
    doc: StatsDocument,
    swept: bool,
    hook: Option<PostWriteHook>,
}

impl<S, C> std::fmt::Debug for StatsEngine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsEngine")
            .field("options", &self.options)
            .field("swept", &self.swept)
            .field("hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: BlobStore, C: Clock> StatsEngine<S, C> {
    /// Opens the engine with default options.
    pub fn open(store: S, clock: C) -> Result<Self, EngineError> {
        Self::open_with(store, clock, EngineOptions::default())
    }

    /// Validates `options` and loads the stored document.
    pub fn open_with(store: S, clock: C, options: EngineOptions) -> Result<Self, EngineError> {
        options.retention.validate()?;
        let keys = PeriodKeys::at(&clock.now());
        let raw = store.get(&options.document_key)?;
        let doc = StatsDocument::load(raw.as_deref(), &keys).document;
        tracing::debug!(key = %options.document_key, "opened statistics engine");
        Ok(Self {
            store,
            clock,
            options,
            doc,
            swept: false,
            hook: None,
        })
    }

    /// Installs a callback run after every successful write, e.g. to mirror
    /// the document elsewhere.
    pub fn set_post_write_hook(&mut self, hook: impl FnMut(&StatsDocument) + Send + 'static) {
        self.hook = Some(Box::new(hook));
    }

    pub const fn document(&self) -> &StatsDocument {
        &self.doc
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Re-reads the stored document.
    pub fn reload(&mut self) -> Result<(), EngineError> {
        let keys = self.current_keys();
        self.doc = self.load(&keys)?;
        Ok(())
    }

    fn current_keys(&self) -> PeriodKeys {
        PeriodKeys::at(&self.clock.now())
    }

    fn load(&self, keys: &PeriodKeys) -> Result<StatsDocument, EngineError> {
        Ok(self.load_counting(keys)?.0)
    }

    fn load_counting(&self, keys: &PeriodKeys) -> Result<(StatsDocument, usize), EngineError> {
        let raw = self.store.get(&self.options.document_key)?;
        let loaded = StatsDocument::load(raw.as_deref(), keys);
        Ok((loaded.document, loaded.created_current))
    }

    fn persist(&mut self, mut doc: StatsDocument, keys: &PeriodKeys) -> Result<(), EngineError> {
        doc.refresh_previous_periods(keys);
        let json = doc.to_json().map_err(EngineError::Encode)?;
        self.store.set(&self.options.document_key, &json)?;
        tracing::debug!(
            key = %self.options.document_key,
            bytes = json.len(),
            "persisted statistics document"
        );
        if let Some(hook) = self.hook.as_mut() {
            hook(&doc);
        }
        self.doc = doc;
        Ok(())
    }

    // ========== Ingestion ==========

    /// Records `duration_minutes` of work now. Non-positive durations are
    /// ignored.
    pub fn record(
        &mut self,
        duration_minutes: i64,
        category: &str,
        session_count: u32,
    ) -> Result<RecordOutcome, EngineError> {
        let at = self.clock.now();
        self.record_at(at, duration_minutes, category, session_count)
    }

    /// Records work at an explicit instant; buckets follow the local date of
    /// `at`.
    pub fn record_at(
        &mut self,
        at: DateTime<FixedOffset>,
        duration_minutes: i64,
        category: &str,
        session_count: u32,
    ) -> Result<RecordOutcome, EngineError> {
        let event_keys = PeriodKeys::at(&at);
        let Some(minutes) = u64::try_from(duration_minutes).ok().filter(|m| *m > 0) else {
            tracing::debug!(duration_minutes, "ignoring non-positive duration");
            return Ok(self.outcome(&event_keys, false, Vec::new()));
        };
        let category = normalize_category(category);

        let keys = self.current_keys();
        let mut doc = self.load(&keys)?;
        let event = WorkEvent {
            timestamp: at.with_timezone(&Utc),
            duration_minutes: minutes,
            category: category.clone(),
            session_count: u64::from(session_count),
        };
        let new_records = apply_event(
            &mut doc,
            &event_keys,
            event,
            self.options.retention.max_raw_events,
        );
        self.persist(doc, &keys)?;

        tracing::info!(
            minutes,
            category = %category,
            sessions = session_count,
            day = %event_keys.day,
            "recorded focus time"
        );
        for granularity in &new_records {
            tracing::info!(%granularity, "new best record");
        }
        Ok(self.outcome(&event_keys, true, new_records))
    }

    fn outcome(
        &self,
        keys: &PeriodKeys,
        recorded: bool,
        new_records: Vec<Granularity>,
    ) -> RecordOutcome {
        RecordOutcome {
            recorded,
            day: self.doc.view(Granularity::Day, &keys.key(Granularity::Day)),
            week: self.doc.view(Granularity::Week, &keys.key(Granularity::Week)),
            month: self.doc.view(Granularity::Month, &keys.key(Granularity::Month)),
            lifetime: self.doc.lifetime.clone(),
            new_records,
        }
    }

    // ========== Period views ==========

    pub fn today(&self) -> PeriodView {
        self.current(Granularity::Day)
    }

    pub fn this_week(&self) -> PeriodView {
        self.current(Granularity::Week)
    }

    pub fn this_month(&self) -> PeriodView {
        self.current(Granularity::Month)
    }

    pub const fn lifetime(&self) -> &LifetimeStats {
        &self.doc.lifetime
    }

    pub fn previous_day(&self) -> PeriodView {
        self.previous(Granularity::Day)
    }

    pub fn previous_week(&self) -> PeriodView {
        self.previous(Granularity::Week)
    }

    pub fn previous_month(&self) -> PeriodView {
        self.previous(Granularity::Month)
    }

    /// The current bucket for `granularity`, zeroed if absent.
    pub fn current(&self, granularity: Granularity) -> PeriodView {
        let keys = self.current_keys();
        self.doc.view(granularity, &keys.key(granularity))
    }

    /// The bucket before the current one, zeroed if absent.
    pub fn previous(&self, granularity: Granularity) -> PeriodView {
        let keys = self.current_keys().previous();
        self.doc.previous_view(granularity, &keys.key(granularity))
    }

    /// Exact totals over the trailing `window`, from raw events.
    pub fn recent_stats(&self, window: Duration) -> RecentStats {
        let now = self.clock.now().with_timezone(&Utc);
        recent_stats(&self.doc.recent_events, now, window)
    }

    pub const fn best_records(&self) -> &BestRecords {
        &self.doc.best_records
    }

    pub fn summary(&self) -> Summary {
        let now = self.clock.now();
        let keys = PeriodKeys::at(&now);
        let previous = keys.previous();
        let view = |g: Granularity| self.doc.view(g, &keys.key(g));
        let previous_view = |g: Granularity| self.doc.previous_view(g, &previous.key(g));
        let today = view(Granularity::Day);
        let this_week = view(Granularity::Week);
        let this_month = view(Granularity::Month);
        let progress = self.progress_for(&today, &this_week, &this_month);

        Summary {
            generated_at: now,
            previous_day: previous_view(Granularity::Day),
            previous_week: previous_view(Granularity::Week),
            previous_month: previous_view(Granularity::Month),
            today,
            this_week,
            this_month,
            lifetime: self.doc.lifetime.clone(),
            goals: self.doc.goals,
            progress,
            best_records: self.doc.best_records.clone(),
        }
    }

    // ========== Goals ==========

    pub const fn goals(&self) -> Goals {
        self.doc.goals
    }

    /// Stores new goals, raising values below their floors. Returns the
    /// goals as stored.
    pub fn set_goals(
        &mut self,
        daily_minutes: u64,
        weekly_minutes: u64,
        monthly_minutes: u64,
    ) -> Result<Goals, EngineError> {
        let goals = Goals::new(daily_minutes, weekly_minutes, monthly_minutes);
        let keys = self.current_keys();
        let mut doc = self.load(&keys)?;
        if doc.goals == goals {
            self.doc = doc;
            return Ok(goals);
        }
        doc.goals = goals;
        self.persist(doc, &keys)?;
        tracing::info!(
            daily = goals.daily_minutes,
            weekly = goals.weekly_minutes,
            monthly = goals.monthly_minutes,
            "updated goals"
        );
        Ok(goals)
    }

    /// Completion of the current day, week and month against the goals.
    pub fn goal_progress(&self) -> GoalProgress {
        self.progress_for(&self.today(), &self.this_week(), &self.this_month())
    }

    fn progress_for(&self, day: &PeriodView, week: &PeriodView, month: &PeriodView) -> GoalProgress {
        let goals = &self.doc.goals;
        GoalProgress {
            daily: completion_percent(day.bucket.total_minutes, goals.daily_minutes),
            weekly: completion_percent(week.bucket.total_minutes, goals.weekly_minutes),
            monthly: completion_percent(month.bucket.total_minutes, goals.monthly_minutes),
        }
    }

    // ========== Labels ==========

    pub fn labels(&self) -> &[String] {
        self.doc.labels.as_slice()
    }

    pub fn add_label(&mut self, name: &str) -> Result<LabelChange, EngineError> {
        self.update_labels(|labels| labels.add(name))
    }

    /// Removes a label. Refused if it is the last one.
    pub fn remove_label(&mut self, name: &str) -> Result<LabelChange, EngineError> {
        self.update_labels(|labels| labels.remove(name))
    }

    fn update_labels(
        &mut self,
        change: impl FnOnce(&mut LabelSet) -> LabelChange,
    ) -> Result<LabelChange, EngineError> {
        let keys = self.current_keys();
        let mut doc = self.load(&keys)?;
        let result = change(&mut doc.labels);
        if result.changed() {
            self.persist(doc, &keys)?;
            tracing::info!(?result, "updated labels");
        } else {
            tracing::debug!(?result, "label change ignored");
            self.doc = doc;
        }
        Ok(result)
    }

    // ========== Retention ==========

    /// Runs the retention sweep once per engine; later calls return a skipped
    /// report without touching the store.
    pub fn cleanup(&mut self) -> Result<CleanupReport, EngineError> {
        if self.swept {
            tracing::debug!("cleanup already ran for this engine");
            return Ok(CleanupReport::skipped());
        }
        self.cleanup_forced()
    }

    /// Runs the retention sweep regardless of earlier runs. Writes only if
    /// something was removed or the store lacked a current-period bucket.
    pub fn cleanup_forced(&mut self) -> Result<CleanupReport, EngineError> {
        let now = self.clock.now();
        let keys = PeriodKeys::at(&now);
        let (mut doc, missing_current) = self.load_counting(&keys)?;
        let mut report = sweep(
            &mut doc,
            &self.options.retention,
            &keys,
            now.with_timezone(&Utc),
        );
        report.restored_current += missing_current;

        if report.changed() {
            self.persist(doc, &keys)?;
        } else {
            self.doc = doc;
        }
        self.swept = true;

        tracing::info!(
            removed_days = report.removed_days,
            removed_weeks = report.removed_weeks,
            removed_months = report.removed_months,
            removed_events = report.removed_events,
            restored_current = report.restored_current,
            "retention sweep finished"
        );
        Ok(report)
    }
}
