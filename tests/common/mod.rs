// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use habit_journal_sync::config::Config;
use habit_journal_sync::db::{FirestoreDb, MemoryEntryStore};
use habit_journal_sync::models::{DailyRecord, DayKey};
use habit_journal_sync::routes::create_router;
use habit_journal_sync::services::{DraftManager, StreakCache, StreakService};
use habit_journal_sync::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Debounce used by draft tests.
#[allow(dead_code)]
pub const DEBOUNCE: Duration = Duration::from_millis(800);

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Parse a `YYYY-MM-DD` day key.
#[allow(dead_code)]
pub fn key(s: &str) -> DayKey {
    s.parse().expect("valid day key")
}

/// A default record for `day` with the check-in flag set.
#[allow(dead_code)]
pub fn checked(day: &str) -> DailyRecord {
    let mut record = DailyRecord::new_default(key(day));
    record.streak_check = true;
    record
}

/// Create a test database connection against the emulator, writing to
/// its own collection.
#[allow(dead_code)]
pub async fn test_db(collection: &str) -> FirestoreDb {
    FirestoreDb::new("test-project", collection)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Draft manager over an in-memory store, with its own streak cache.
#[allow(dead_code)]
pub fn test_drafts() -> (DraftManager, Arc<MemoryEntryStore>, StreakCache) {
    let store = Arc::new(MemoryEntryStore::new());
    let cache: StreakCache = Arc::new(dashmap::DashMap::new());
    let drafts = DraftManager::new(store.clone(), DEBOUNCE, cache.clone());
    (drafts, store, cache)
}

/// Streak service over an in-memory store.
#[allow(dead_code)]
pub fn test_streaks() -> (StreakService, Arc<MemoryEntryStore>, StreakCache) {
    let store = Arc::new(MemoryEntryStore::new());
    let cache: StreakCache = Arc::new(dashmap::DashMap::new());
    let streaks = StreakService::new(store.clone(), cache.clone(), 100);
    (streaks, store, cache)
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryEntryStore>) {
    let store = Arc::new(MemoryEntryStore::new());
    let state = Arc::new(AppState::new(Config::test_default(), store.clone()));
    (create_router(state.clone()), state, store)
}

/// Create a test app whose store is never connected.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(test_db_offline()),
    ));
    (create_router(state.clone()), state)
}
