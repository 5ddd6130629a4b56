// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the journal core.

pub mod day_key;
pub mod entry;
pub mod streak;
pub mod sync;

pub use day_key::DayKey;
pub use entry::{BoolFlag, DailyRecord, EntryPatch, Exercise, ExerciseSet, WeightUnit, WorkoutCategory};
pub use streak::StreakState;
pub use sync::{DraftView, SyncStatus};
