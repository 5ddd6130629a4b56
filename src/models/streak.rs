// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in streak derivation.
//!
//! Streak state is never stored. It is derived from the set of days whose
//! `streak_check` flag is set, walking backward one calendar day at a time.

use crate::models::DayKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Smallest gap (in days since the last check-in) that can be restored.
pub const RESTORE_MIN_GAP: i64 = 2;
/// Largest gap that can be restored. Product policy, kept exact.
pub const RESTORE_MAX_GAP: i64 = 3;

/// Derived streak state for a given "today".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakState {
    /// Consecutive checked days ending today, or yesterday if today is unchecked
    pub current_streak: u32,
    /// Most recent checked day (not after today)
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub last_checked_day: Option<DayKey>,
    pub is_checked_today: bool,
    /// Whether the missed days since `last_checked_day` can be backfilled
    pub can_restore: bool,
    /// Days strictly between `last_checked_day` and today (only when restorable)
    pub missed_days: u32,
}

impl StreakState {
    /// State when nothing was ever checked.
    pub fn empty() -> Self {
        Self {
            current_streak: 0,
            last_checked_day: None,
            is_checked_today: false,
            can_restore: false,
            missed_days: 0,
        }
    }

    /// Derive the streak as of `today` from checked days in any order.
    ///
    /// Days after `today` are ignored.
    pub fn derive<I>(today: DayKey, checked_days: I) -> Self
    where
        I: IntoIterator<Item = DayKey>,
    {
        let checked: BTreeSet<DayKey> = checked_days
            .into_iter()
            .filter(|day| *day <= today)
            .collect();

        let Some(last_checked) = checked.last().copied() else {
            return Self::empty();
        };

        let is_checked_today = checked.contains(&today);

        let mut cursor = if is_checked_today { today } else { today.pred() };
        let mut current_streak = 0;
        while checked.contains(&cursor) {
            current_streak += 1;
            cursor = cursor.pred();
        }

        let (can_restore, missed_days) = if is_checked_today {
            (false, 0)
        } else {
            restore_window(last_checked, today)
        };

        Self {
            current_streak,
            last_checked_day: Some(last_checked),
            is_checked_today,
            can_restore,
            missed_days,
        }
    }

    /// The days a restoration would backfill, oldest first.
    ///
    /// Empty unless the state is restorable.
    pub fn missed_day_keys(&self, today: DayKey) -> Vec<DayKey> {
        match self.last_checked_day {
            Some(last) if self.can_restore => last.days_between_exclusive(today),
            _ => Vec::new(),
        }
    }
}

/// Whether the gap from `last_checked` to `today` is restorable, and how many
/// days are missing in between.
fn restore_window(last_checked: DayKey, today: DayKey) -> (bool, u32) {
    let gap = last_checked.days_until(today);
    if (RESTORE_MIN_GAP..=RESTORE_MAX_GAP).contains(&gap) {
        (true, (gap - 1) as u32)
    } else {
        (false, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn keys(days: &[&str]) -> Vec<DayKey> {
        days.iter().map(|d| key(d)).collect()
    }

    #[test]
    fn test_no_checked_days() {
        let state = StreakState::derive(key("2026-01-05"), Vec::new());
        assert_eq!(state, StreakState::empty());
    }

    #[test]
    fn test_unbroken_run_through_today() {
        let checked = keys(&[
            "2026-01-03",
            "2026-01-01",
            "2026-01-05",
            "2026-01-02",
            "2026-01-04",
        ]);
        let state = StreakState::derive(key("2026-01-05"), checked);

        assert_eq!(state.current_streak, 5);
        assert!(state.is_checked_today);
        assert!(!state.can_restore);
        assert_eq!(state.last_checked_day, Some(key("2026-01-05")));
    }

    #[test]
    fn test_unchecked_today_counts_run_ending_yesterday() {
        let checked = keys(&["2026-01-02", "2026-01-03", "2026-01-04"]);
        let state = StreakState::derive(key("2026-01-05"), checked);

        assert_eq!(state.current_streak, 3);
        assert!(!state.is_checked_today);
        // gap of 1: nothing missed yet
        assert!(!state.can_restore);
        assert_eq!(state.missed_days, 0);
    }

    #[test]
    fn test_walk_stops_at_first_gap() {
        let checked = keys(&["2026-01-01", "2026-01-02", "2026-01-04", "2026-01-05"]);
        let state = StreakState::derive(key("2026-01-05"), checked);
        assert_eq!(state.current_streak, 2);
    }

    #[test]
    fn test_restore_window_bounds() {
        let checked = keys(&["2026-01-01"]);

        let gap1 = StreakState::derive(key("2026-01-02"), checked.clone());
        assert!(!gap1.can_restore);
        assert_eq!(gap1.current_streak, 1);

        let gap2 = StreakState::derive(key("2026-01-03"), checked.clone());
        assert!(gap2.can_restore);
        assert_eq!(gap2.missed_days, 1);
        assert_eq!(gap2.current_streak, 0);

        let gap3 = StreakState::derive(key("2026-01-04"), checked.clone());
        assert!(gap3.can_restore);
        assert_eq!(gap3.missed_days, 2);

        let gap4 = StreakState::derive(key("2026-01-05"), checked);
        assert!(!gap4.can_restore);
        assert_eq!(gap4.missed_days, 0);
    }

    #[test]
    fn test_missed_day_keys_exclusive_of_both_ends() {
        let state = StreakState::derive(key("2026-01-04"), keys(&["2026-01-01"]));
        assert_eq!(
            state.missed_day_keys(key("2026-01-04")),
            keys(&["2026-01-02", "2026-01-03"])
        );

        let not_restorable = StreakState::derive(key("2026-01-09"), keys(&["2026-01-01"]));
        assert!(not_restorable.missed_day_keys(key("2026-01-09")).is_empty());
    }

    #[test]
    fn test_future_checks_are_ignored() {
        let checked = keys(&["2026-01-01", "2026-01-07"]);
        let state = StreakState::derive(key("2026-01-03"), checked);

        assert_eq!(state.last_checked_day, Some(key("2026-01-01")));
        assert!(state.can_restore);
        assert_eq!(state.missed_days, 1);
    }

    #[test]
    fn test_duplicate_days_count_once() {
        let checked = keys(&["2026-01-05", "2026-01-05", "2026-01-04"]);
        let state = StreakState::derive(key("2026-01-05"), checked);
        assert_eq!(state.current_streak, 2);
    }
}
