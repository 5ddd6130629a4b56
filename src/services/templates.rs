// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lookup of the most recent prior workout in a category.

use crate::db::{EntryQuery, EntryStore};
use crate::error::AppError;
use crate::models::{DayKey, Exercise, WorkoutCategory};
use std::sync::Arc;

/// Read-only helper for copying a previous workout into a new day.
#[derive(Clone)]
pub struct WorkoutTemplates {
    store: Arc<dyn EntryStore>,
}

impl WorkoutTemplates {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Exercises from the latest day strictly before `before` whose workout
    /// category is `category`.
    ///
    /// Returns `None` for the rest category (without querying), when no such
    /// day exists, or when that day logged no exercises.
    pub async fn last_workout(
        &self,
        before: DayKey,
        category: &WorkoutCategory,
    ) -> Result<Option<Vec<Exercise>>, AppError> {
        if category.is_rest() {
            return Ok(None);
        }

        let rows = self
            .store
            .query(
                &EntryQuery::newest_first()
                    .workout_type(category.clone())
                    .before(before)
                    .limit(1),
            )
            .await?;

        let exercises = rows
            .into_iter()
            .next()
            .map(|record| record.exercises)
            .filter(|exercises| !exercises.is_empty());

        tracing::debug!(
            before = %before,
            category = %category,
            found = exercises.is_some(),
            "Workout template lookup"
        );

        Ok(exercises)
    }
}
