//! Rollup aggregates for a single period and for all time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category used when an event or legacy bucket carries no usable category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Minutes per category.
pub type CategoryBreakdown = BTreeMap<String, u64>;

/// Aggregate for one day, week or month.
///
/// `total_minutes` always equals the sum of `category_breakdown`; both only
/// grow while the bucket exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    #[serde(default)]
    pub total_minutes: u64,
    #[serde(default)]
    pub session_count: u64,
    #[serde(default)]
    pub category_breakdown: CategoryBreakdown,
}

impl Bucket {
    /// Adds one contribution. `category` must already be normalized.
    pub fn add(&mut self, minutes: u64, sessions: u64, category: &str) {
        self.total_minutes = self.total_minutes.saturating_add(minutes);
        self.session_count = self.session_count.saturating_add(sessions);
        add_to_breakdown(&mut self.category_breakdown, category, minutes);
    }

    #[must_use]
    pub fn minutes_for(&self, category: &str) -> u64 {
        self.category_breakdown.get(category).copied().unwrap_or(0)
    }

    /// Whether the breakdown sums to the total.
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        breakdown_sum(&self.category_breakdown) == self.total_minutes
    }

    /// Restores `total == sum(breakdown)`. Returns `true` if anything changed.
    pub(crate) fn reconcile(&mut self) -> bool {
        reconcile(&mut self.total_minutes, &mut self.category_breakdown)
    }
}

/// All-time aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeStats {
    #[serde(default)]
    pub total_minutes: u64,
    #[serde(default)]
    pub total_sessions: u64,
    /// Day key of first initialization. Never changes once set.
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub category_breakdown: CategoryBreakdown,
}

impl LifetimeStats {
    #[must_use]
    pub fn starting(start_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, minutes: u64, sessions: u64, category: &str) {
        self.total_minutes = self.total_minutes.saturating_add(minutes);
        self.total_sessions = self.total_sessions.saturating_add(sessions);
        add_to_breakdown(&mut self.category_breakdown, category, minutes);
    }

    #[must_use]
    pub fn is_conserved(&self) -> bool {
        breakdown_sum(&self.category_breakdown) == self.total_minutes
    }

    pub(crate) fn reconcile(&mut self) -> bool {
        reconcile(&mut self.total_minutes, &mut self.category_breakdown)
    }
}

/// A bucket together with the key it is stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodView {
    pub period_key: String,
    #[serde(flatten)]
    pub bucket: Bucket,
}

impl PeriodView {
    #[must_use]
    pub fn new(period_key: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            period_key: period_key.into(),
            bucket,
        }
    }

    /// A zeroed view for a period with no data.
    #[must_use]
    pub fn empty(period_key: impl Into<String>) -> Self {
        Self::new(period_key, Bucket::default())
    }
}

fn add_to_breakdown(breakdown: &mut CategoryBreakdown, category: &str, minutes: u64) {
    let entry = breakdown.entry(category.to_string()).or_insert(0);
    *entry = entry.saturating_add(minutes);
}

fn breakdown_sum(breakdown: &CategoryBreakdown) -> u64 {
    breakdown
        .values()
        .fold(0u64, |acc, minutes| acc.saturating_add(*minutes))
}

/// Minutes the breakdown does not account for go to [`UNCATEGORIZED`]; a
/// breakdown that overshoots raises the total instead, so totals never shrink.
fn reconcile(total: &mut u64, breakdown: &mut CategoryBreakdown) -> bool {
    let sum = breakdown_sum(breakdown);
    match sum.cmp(total) {
        std::cmp::Ordering::Equal => false,
        std::cmp::Ordering::Less => {
            add_to_breakdown(breakdown, UNCATEGORIZED, *total - sum);
            true
        }
        std::cmp::Ordering::Greater => {
            *total = sum;
            true
        }
    }
}
