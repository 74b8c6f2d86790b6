//! All-time high-water marks per granularity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::period::Granularity;

/// The best total ever observed for one granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRecord {
    #[serde(default)]
    pub minutes: u64,
    /// Key of the bucket that set the record; empty until one exists.
    #[serde(default)]
    pub period_key: String,
    #[serde(default)]
    pub sessions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRecords {
    #[serde(default)]
    pub best_day: BestRecord,
    #[serde(default)]
    pub best_week: BestRecord,
    #[serde(default)]
    pub best_month: BestRecord,
}

impl BestRecords {
    #[must_use]
    pub const fn get(&self, granularity: Granularity) -> &BestRecord {
        match granularity {
            Granularity::Day => &self.best_day,
            Granularity::Week => &self.best_week,
            Granularity::Month => &self.best_month,
        }
    }

    fn get_mut(&mut self, granularity: Granularity) -> &mut BestRecord {
        match granularity {
            Granularity::Day => &mut self.best_day,
            Granularity::Week => &mut self.best_week,
            Granularity::Month => &mut self.best_month,
        }
    }

    /// Compares a bucket's current total against the stored best and replaces
    /// it on a strictly greater total. Ties keep the earlier holder.
    ///
    /// Returns `true` when a new record was set.
    pub fn observe(&mut self, granularity: Granularity, period_key: &str, bucket: &Bucket) -> bool {
        let best = self.get_mut(granularity);
        if bucket.total_minutes <= best.minutes {
            return false;
        }
        *best = BestRecord {
            minutes: bucket.total_minutes,
            period_key: period_key.to_string(),
            sessions: bucket.session_count,
        };
        true
    }

    /// Observes every bucket in key order, oldest first.
    pub fn observe_all(&mut self, granularity: Granularity, buckets: &BTreeMap<String, Bucket>) {
        for (key, bucket) in buckets {
            self.observe(granularity, key, bucket);
        }
    }
}
