use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;

use crate::model::summary::MonthlySummary;

pub type MonthlyReport = Arc<BTreeMap<String, MonthlySummary>>;

/// "today" is part of the key, so a report never outlives its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub year: i32,
    pub month_index: u32,
    pub today: NaiveDate,
}

/// Holds computed monthly reports until the next store change.
#[derive(Clone)]
pub struct ReportCache {
    inner: Cache<ReportKey, MonthlyReport>,
    /// Bumped on every invalidation so a report computed from data fetched
    /// before a change is never stored after it.
    generation: Arc<AtomicU64>,
}

impl ReportCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: &ReportKey) -> Option<MonthlyReport> {
        self.inner.get(key).await
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stores `report` unless the cache was invalidated after `generation`
    /// was read. Returns whether it was stored.
    pub async fn insert_if_current(
        &self,
        key: ReportKey,
        report: MonthlyReport,
        generation: u64,
    ) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.inner.insert(key, report).await;
        true
    }

    /// Drops every cached report; the next read re-aggregates.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate_all();
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        // 24 months over a couple of "today" values is plenty.
        Self::new(64, Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ReportKey {
        ReportKey {
            year: 2026,
            month_index: 9,
            today: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
        }
    }

    #[tokio::test]
    async fn invalidation_clears_reports() {
        let cache = ReportCache::default();
        let generation = cache.generation();
        assert!(cache.insert_if_current(key(), Arc::new(BTreeMap::new()), generation).await);
        assert!(cache.get(&key()).await.is_some());

        cache.invalidate_all();
        assert!(cache.get(&key()).await.is_none());
    }

    #[tokio::test]
    async fn different_today_is_a_different_report() {
        let cache = ReportCache::default();
        cache
            .insert_if_current(key(), Arc::new(BTreeMap::new()), cache.generation())
            .await;
        let tomorrow = ReportKey {
            today: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            ..key()
        };
        assert!(cache.get(&tomorrow).await.is_none());
    }

    #[tokio::test]
    async fn stale_report_is_not_stored() {
        let cache = ReportCache::default();
        let generation = cache.generation();
        cache.invalidate_all();
        assert!(!cache.insert_if_current(key(), Arc::new(BTreeMap::new()), generation).await);
        assert!(cache.get(&key()).await.is_none());
    }
}
