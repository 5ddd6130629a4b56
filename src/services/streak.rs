// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak computation and restoration.
//!
//! Handles:
//! - Deriving [`StreakState`] from the most recent checked rows
//! - Caching the derived state per "today" until something invalidates it
//! - Backfilling missed check-ins inside the restoration window

use crate::db::{EntryQuery, EntryStore};
use crate::error::AppError;
use crate::models::{BoolFlag, DayKey, EntryPatch, StreakState};
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Restoration writes at most a few days; keep them bounded anyway.
const MAX_CONCURRENT_RESTORE_WRITES: usize = 4;

/// Shared cache of derived streak state, keyed by the "today" it was derived for.
///
/// Shared with the draft manager so a saved check-in invalidates it.
pub type StreakCache = Arc<DashMap<DayKey, StreakState>>;

/// Result of a successful restoration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RestoreOutcome {
    /// Days that were backfilled, oldest first
    #[cfg_attr(feature = "binding-generation", ts(type = "string[]"))]
    pub restored_days: Vec<DayKey>,
}

/// Streak engine over the entry store.
#[derive(Clone)]
pub struct StreakService {
    store: Arc<dyn EntryStore>,
    cache: StreakCache,
    /// How many recent checked rows are scanned
    lookback: u32,
}

impl StreakService {
    pub fn new(store: Arc<dyn EntryStore>, cache: StreakCache, lookback: u32) -> Self {
        Self {
            store,
            cache,
            lookback,
        }
    }

    /// Streak state as of `today`, from cache when available.
    pub async fn compute_streak(&self, today: DayKey) -> Result<StreakState, AppError> {
        if let Some(cached) = self.cache.get(&today) {
            return Ok(cached.clone());
        }
        self.refresh(today).await
    }

    /// Re-derive streak state from the store and cache it.
    pub async fn refresh(&self, today: DayKey) -> Result<StreakState, AppError> {
        let rows = self
            .store
            .query(
                &EntryQuery::newest_first()
                    .streak_checked()
                    .before(today.succ())
                    .limit(self.lookback),
            )
            .await?;

        let state = StreakState::derive(today, rows.iter().map(|record| record.day_key));

        tracing::debug!(
            today = %today,
            scanned = rows.len(),
            current_streak = state.current_streak,
            can_restore = state.can_restore,
            "Streak derived"
        );

        self.cache.insert(today, state.clone());
        Ok(state)
    }

    /// Drop all cached streak state.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Backfill the check-ins missed since the last checked day.
    ///
    /// Only allowed when the gap is inside the restoration window. Each
    /// missed day gets an upsert that sets `streak_check` and nothing else.
    /// If any write fails the whole restoration fails, even though other
    /// days may already have been written; callers should re-derive.
    pub async fn restore_streak(&self, today: DayKey) -> Result<RestoreOutcome, AppError> {
        let state = self.refresh(today).await?;

        let Some(last_checked) = state.last_checked_day else {
            return Err(AppError::NotRestorable(
                "no check-ins recorded yet".to_string(),
            ));
        };
        if !state.can_restore {
            return Err(AppError::NotRestorable(format!(
                "last check-in {} is outside the restoration window",
                last_checked
            )));
        }

        let days = state.missed_day_keys(today);
        let patch = EntryPatch::flag(BoolFlag::StreakCheck, true);
        let store = &self.store;

        let results = stream::iter(days.clone())
            .map(|day_key| {
                let patch = &patch;
                async move { (day_key, store.upsert(day_key, patch).await) }
            })
            .buffer_unordered(MAX_CONCURRENT_RESTORE_WRITES)
            .collect::<Vec<_>>()
            .await;

        // Even a partial batch changed the store.
        self.invalidate();

        let failures: Vec<(DayKey, AppError)> = results
            .into_iter()
            .filter_map(|(day_key, result)| result.err().map(|e| (day_key, e)))
            .collect();

        if let Some((failed_day, first_error)) = failures.first() {
            tracing::warn!(
                today = %today,
                attempted = days.len(),
                failed = failures.len(),
                failed_day = %failed_day,
                "Streak restoration partially failed"
            );
            return Err(AppError::PartialRestore {
                attempted: days.len(),
                failed: failures.len(),
                first_error: first_error.to_string(),
            });
        }

        tracing::info!(
            today = %today,
            last_checked = %last_checked,
            missed_days = days.len(),
            "Streak restored"
        );

        Ok(RestoreOutcome {
            restored_days: days,
        })
    }
}
