// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak service tests: derivation from the store, caching, restoration.

use habit_journal_sync::error::AppError;
use habit_journal_sync::models::{BoolFlag, DailyRecord, EntryPatch, StreakState};

mod common;
use common::{checked, key, test_streaks};

// ═══════════════════════════════════════════════════════════════════════════
// DERIVATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_no_checkins_is_empty_state() {
    let (streaks, store, _) = test_streaks();
    store.insert(DailyRecord::new_default(key("2026-01-05")));

    let state = streaks.compute_streak(key("2026-01-10")).await.unwrap();

    assert_eq!(state, StreakState::empty());
}

#[tokio::test]
async fn test_streak_includes_checked_today() {
    let (streaks, store, _) = test_streaks();
    for day in ["2026-01-06", "2026-01-08", "2026-01-09", "2026-01-10"] {
        store.insert(checked(day));
    }

    let state = streaks.compute_streak(key("2026-01-10")).await.unwrap();

    assert_eq!(state.current_streak, 3);
    assert!(state.is_checked_today);
    assert!(!state.can_restore);
    assert_eq!(state.missed_days, 0);
    assert_eq!(state.last_checked_day, Some(key("2026-01-10")));
}

#[tokio::test]
async fn test_streak_survives_until_today_ends() {
    let (streaks, store, _) = test_streaks();
    store.insert(checked("2026-01-08"));
    store.insert(checked("2026-01-09"));

    let state = streaks.compute_streak(key("2026-01-10")).await.unwrap();

    assert_eq!(state.current_streak, 2);
    assert!(!state.is_checked_today);
    assert!(!state.can_restore, "a one-day gap is not a miss yet");
}

#[tokio::test]
async fn test_restore_window_bounds() {
    let (streaks, store, _) = test_streaks();
    store.insert(checked("2026-01-01"));

    let two_days = streaks.compute_streak(key("2026-01-03")).await.unwrap();
    assert!(two_days.can_restore);
    assert_eq!(two_days.missed_days, 1);
    assert_eq!(two_days.current_streak, 0);

    let three_days = streaks.compute_streak(key("2026-01-04")).await.unwrap();
    assert!(three_days.can_restore);
    assert_eq!(three_days.missed_days, 2);

    let four_days = streaks.compute_streak(key("2026-01-05")).await.unwrap();
    assert!(!four_days.can_restore);
    assert_eq!(four_days.missed_days, 0);
}

#[tokio::test]
async fn test_future_checkins_are_ignored() {
    let (streaks, store, _) = test_streaks();
    store.insert(checked("2026-01-09"));
    store.insert(checked("2026-01-11"));

    let state = streaks.compute_streak(key("2026-01-10")).await.unwrap();

    assert_eq!(state.last_checked_day, Some(key("2026-01-09")));
    assert_eq!(state.current_streak, 1);
    assert!(!state.is_checked_today);
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let (streaks, store, _) = test_streaks();
    store.set_offline(true);

    let result = streaks.compute_streak(key("2026-01-10")).await;

    assert!(matches!(result, Err(AppError::Store(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHING
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_cached_state_until_invalidated() {
    let (streaks, store, cache) = test_streaks();
    let today = key("2026-01-10");
    store.insert(checked("2026-01-09"));

    let first = streaks.compute_streak(today).await.unwrap();
    assert_eq!(first.current_streak, 1);

    // Written behind the service's back.
    store.insert(checked("2026-01-10"));
    let cached = streaks.compute_streak(today).await.unwrap();
    assert_eq!(cached, first);
    assert_eq!(store.query_count(), 1);
    assert_eq!(cache.len(), 1);

    streaks.invalidate();
    let fresh = streaks.compute_streak(today).await.unwrap();
    assert_eq!(fresh.current_streak, 2);
    assert!(fresh.is_checked_today);
    assert_eq!(store.query_count(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// RESTORATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_restore_backfills_exactly_the_missed_days() {
    let (streaks, store, _) = test_streaks();
    let mut last = checked("2026-01-01");
    last.reflection = "new year".to_string();
    store.insert(last.clone());
    let mut existing = DailyRecord::new_default(key("2026-01-02"));
    existing.reflection = "sick".to_string();
    store.insert(existing);

    let today = key("2026-01-04");
    let outcome = streaks.restore_streak(today).await.unwrap();

    assert_eq!(
        outcome.restored_days,
        vec![key("2026-01-02"), key("2026-01-03")]
    );

    let mut upserts = store.upserts().await;
    upserts.sort_by_key(|(day, _)| *day);
    let expected_patch = EntryPatch::flag(BoolFlag::StreakCheck, true);
    assert_eq!(
        upserts,
        vec![
            (key("2026-01-02"), expected_patch.clone()),
            (key("2026-01-03"), expected_patch),
        ]
    );

    // Only the flag was written.
    let restored = store.record(key("2026-01-02")).unwrap();
    assert!(restored.streak_check);
    assert_eq!(restored.reflection, "sick");
    assert_eq!(store.record(key("2026-01-01")).unwrap(), last);

    let state = streaks.compute_streak(today).await.unwrap();
    assert_eq!(state.current_streak, 3);
    assert!(!state.can_restore);
}

#[tokio::test]
async fn test_restore_outside_window_is_rejected() {
    let (streaks, store, _) = test_streaks();
    store.insert(checked("2026-01-01"));

    let result = streaks.restore_streak(key("2026-01-05")).await;

    assert!(matches!(result, Err(AppError::NotRestorable(_))));
    assert_eq!(store.upsert_count().await, 0);
}

#[tokio::test]
async fn test_restore_without_gap_is_rejected() {
    let (streaks, store, _) = test_streaks();
    store.insert(checked("2026-01-09"));
    store.insert(checked("2026-01-10"));

    assert!(matches!(
        streaks.restore_streak(key("2026-01-10")).await,
        Err(AppError::NotRestorable(_))
    ));
    assert!(matches!(
        streaks.restore_streak(key("2026-01-11")).await,
        Err(AppError::NotRestorable(_))
    ));
    assert_eq!(store.upsert_count().await, 0);
}

#[tokio::test]
async fn test_restore_with_no_history_is_rejected() {
    let (streaks, store, _) = test_streaks();

    let result = streaks.restore_streak(key("2026-01-10")).await;

    assert!(matches!(result, Err(AppError::NotRestorable(_))));
    assert_eq!(store.upsert_count().await, 0);
}

#[tokio::test]
async fn test_restore_rederives_before_checking() {
    let (streaks, store, _) = test_streaks();
    let today = key("2026-01-04");
    store.insert(checked("2026-01-01"));
    // Cached state still counts 01-02 as missed.
    streaks.compute_streak(key("2026-01-04")).await.unwrap();
    store.insert(checked("2026-01-02"));

    let outcome = streaks.restore_streak(today).await.unwrap();

    assert_eq!(outcome.restored_days, vec![key("2026-01-03")]);
}

#[tokio::test]
async fn test_partial_restore_reports_failure_and_invalidates() {
    let (streaks, store, cache) = test_streaks();
    let today = key("2026-01-04");
    store.insert(checked("2026-01-01"));
    store.fail_upserts_for(key("2026-01-03"));

    let result = streaks.restore_streak(today).await;

    match result {
        Err(AppError::PartialRestore {
            attempted, failed, ..
        }) => {
            assert_eq!(attempted, 2);
            assert_eq!(failed, 1);
        }
        other => panic!("expected partial restore, got {:?}", other),
    }
    assert!(cache.is_empty());

    // The write that succeeded stays; the state reflects it.
    assert!(store.record(key("2026-01-02")).unwrap().streak_check);
    let state = streaks.compute_streak(today).await.unwrap();
    assert_eq!(state.last_checked_day, Some(key("2026-01-02")));
    assert!(state.can_restore);
    assert_eq!(state.missed_days, 1);
}
