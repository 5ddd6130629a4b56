// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry store layer.
//!
//! The journal core only ever talks to the store through [`EntryStore`]:
//! point lookup, point upsert, and filtered range queries, all keyed by
//! [`DayKey`]. Absence of a row is `Ok(None)`, never an error.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryEntryStore;

use crate::error::AppError;
use crate::models::{DailyRecord, DayKey, EntryPatch, WorkoutCategory};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// One document per journal day, keyed by `YYYY-MM-DD`
    pub const DAILY_ENTRIES: &str = "daily_entries";
}

/// Remote store of day-keyed journal records.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Point lookup by day.
    async fn get(&self, day_key: DayKey) -> Result<Option<DailyRecord>, AppError>;

    /// Write the fields set in `patch` onto the row for `day_key`, creating
    /// it if needed. Returns the stored row.
    async fn upsert(&self, day_key: DayKey, patch: &EntryPatch) -> Result<DailyRecord, AppError>;

    /// Filtered, ordered, limited scan.
    async fn query(&self, query: &EntryQuery) -> Result<Vec<DailyRecord>, AppError>;
}

/// Ordering by day key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Filter, order and limit for [`EntryStore::query`].
///
/// Filters are conjunctive; unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryQuery {
    pub streak_check: Option<bool>,
    pub workout_type: Option<WorkoutCategory>,
    /// Only days strictly before this one
    pub before: Option<DayKey>,
    pub order: SortOrder,
    pub limit: Option<u32>,
}

impl EntryQuery {
    /// All records, newest first.
    pub fn newest_first() -> Self {
        Self::default()
    }

    pub fn streak_checked(mut self) -> Self {
        self.streak_check = Some(true);
        self
    }

    pub fn workout_type(mut self, category: WorkoutCategory) -> Self {
        self.workout_type = Some(category);
        self
    }

    pub fn before(mut self, day_key: DayKey) -> Self {
        self.before = Some(day_key);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record passes every filter of this query.
    pub fn matches(&self, record: &DailyRecord) -> bool {
        self.streak_check
            .map_or(true, |checked| record.streak_check == checked)
            && self
                .workout_type
                .as_ref()
                .map_or(true, |category| record.workout_type == *category)
            && self.before.map_or(true, |before| record.day_key < before)
    }
}
