// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process entry store.
//!
//! Used for local development (`STORE_BACKEND=memory`) and as the store
//! double in tests. Besides the [`EntryStore`] operations it can simulate a
//! slow or failing network: per-day lookup latency, upsert latency, an
//! offline switch, and per-day upsert failures.

use crate::db::{EntryQuery, EntryStore, SortOrder};
use crate::error::AppError;
use crate::models::{DailyRecord, DayKey, EntryPatch};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Entry store held in memory.
#[derive(Default)]
pub struct MemoryEntryStore {
    records: DashMap<DayKey, DailyRecord>,
    /// Every upsert that reached the store, in arrival order
    upsert_log: Mutex<Vec<(DayKey, EntryPatch)>>,
    query_count: AtomicUsize,
    offline: AtomicBool,
    failing_upserts: DashSet<DayKey>,
    get_delays: DashMap<DayKey, Duration>,
    upsert_delay_ms: AtomicU64,
    upserts_in_flight: AtomicUsize,
    max_upserts_in_flight: AtomicUsize,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the upsert log.
    pub fn insert(&self, record: DailyRecord) {
        self.records.insert(record.day_key, record);
    }

    /// Current stored row for a day.
    pub fn record(&self, day_key: DayKey) -> Option<DailyRecord> {
        self.records.get(&day_key).map(|r| r.clone())
    }

    /// Upserts received so far, oldest first.
    pub async fn upserts(&self) -> Vec<(DayKey, EntryPatch)> {
        self.upsert_log.lock().await.clone()
    }

    pub async fn upsert_count(&self) -> usize {
        self.upsert_log.lock().await.len()
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    /// Highest number of upserts observed in flight at the same time.
    pub fn max_upserts_in_flight(&self) -> usize {
        self.max_upserts_in_flight.load(Ordering::SeqCst)
    }

    /// Make every operation fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make upserts for one day fail.
    pub fn fail_upserts_for(&self, day_key: DayKey) {
        self.failing_upserts.insert(day_key);
    }

    /// Delay lookups of one day.
    pub fn set_get_delay(&self, day_key: DayKey, delay: Duration) {
        self.get_delays.insert(day_key, delay);
    }

    /// Delay every upsert.
    pub fn set_upsert_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.upsert_delay_ms.store(millis, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Store("Entry store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get(&self, day_key: DayKey) -> Result<Option<DailyRecord>, AppError> {
        let delay = self.get_delays.get(&day_key).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_online()?;
        Ok(self.record(day_key))
    }

    async fn upsert(&self, day_key: DayKey, patch: &EntryPatch) -> Result<DailyRecord, AppError> {
        let in_flight = self.upserts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_upserts_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.upsert_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let result = self.check_online().and_then(|()| {
            if self.failing_upserts.contains(&day_key) {
                return Err(AppError::Store(format!("Write rejected for {}", day_key)));
            }

            let mut entry = self
                .records
                .entry(day_key)
                .or_insert_with(|| DailyRecord::new_default(day_key));
            patch.apply_to(&mut entry);
            if entry.id.is_none() {
                entry.id = Some(day_key.to_string());
            }
            Ok(entry.clone())
        });

        if result.is_ok() {
            self.upsert_log.lock().await.push((day_key, patch.clone()));
        }
        self.upserts_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn query(&self, query: &EntryQuery) -> Result<Vec<DailyRecord>, AppError> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let mut rows: Vec<DailyRecord> = self
            .records
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();

        rows.sort_by_key(|r| r.day_key);
        if query.order == SortOrder::Descending {
            rows.reverse();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoolFlag, WorkoutCategory};

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_merges_onto_existing_row() {
        let store = MemoryEntryStore::new();
        let mut record = DailyRecord::new_default(key("2026-01-02"));
        record.reflection = "long day".to_string();
        store.insert(record);

        let stored = store
            .upsert(key("2026-01-02"), &EntryPatch::flag(BoolFlag::StreakCheck, true))
            .await
            .unwrap();

        assert!(stored.streak_check);
        assert_eq!(stored.reflection, "long day");
        assert_eq!(stored.id.as_deref(), Some("2026-01-02"));
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let store = MemoryEntryStore::new();
        for (day, category) in [
            ("2026-01-01", "push"),
            ("2026-01-02", "legs"),
            ("2026-01-03", "push"),
            ("2026-01-04", "push"),
        ] {
            let mut record = DailyRecord::new_default(key(day));
            record.workout_type = WorkoutCategory::from(category);
            store.insert(record);
        }

        let rows = store
            .query(
                &EntryQuery::newest_first()
                    .workout_type(WorkoutCategory::from("push"))
                    .before(key("2026-01-04"))
                    .limit(1),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day_key, key("2026-01-03"));
        assert_eq!(store.query_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_operation() {
        let store = MemoryEntryStore::new();
        store.set_offline(true);

        assert!(store.get(key("2026-01-01")).await.is_err());
        assert!(store
            .upsert(key("2026-01-01"), &EntryPatch::default())
            .await
            .is_err());
        assert!(store.query(&EntryQuery::newest_first()).await.is_err());
        assert_eq!(store.upsert_count().await, 0);
    }

    #[test]
    fn test_upsert_delay_saturates() {
        let store = MemoryEntryStore::new();

        store.set_upsert_delay(Duration::from_millis(250));
        assert_eq!(store.upsert_delay_ms.load(Ordering::SeqCst), 250);

        store.set_upsert_delay(Duration::MAX);
        assert_eq!(store.upsert_delay_ms.load(Ordering::SeqCst), u64::MAX);
    }
}
