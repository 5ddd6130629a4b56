// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - journal synchronization and streak logic.

pub mod drafts;
pub mod streak;
pub mod templates;

pub use drafts::DraftManager;
pub use streak::{RestoreOutcome, StreakCache, StreakService};
pub use templates::WorkoutTemplates;
