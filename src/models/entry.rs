// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily journal record model and partial updates.

use crate::models::DayKey;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One journal day as stored in the entry store.
///
/// Every field except `day_key` is defaulted on read, so rows written by a
/// partial upsert (e.g. a streak restoration that only sets `streak_check`)
/// deserialize into a complete record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyRecord {
    /// Store-assigned document ID (round-trips back into the draft after save)
    #[serde(
        alias = "_firestore_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Calendar day (also used as document ID)
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub day_key: DayKey,
    /// Primary activity (exercise) done
    #[serde(default)]
    pub exercise_done: bool,
    #[serde(default)]
    pub exercise_note: String,
    /// Secondary activity (focused work) done
    #[serde(default)]
    pub work_done: bool,
    #[serde(default)]
    pub work_note: String,
    /// Workout category ("rest" when no workout)
    #[serde(default)]
    pub workout_type: WorkoutCategory,
    /// Structured workout log
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// Body weight sample
    #[serde(default)]
    pub body_weight: Option<f64>,
    /// Step count
    #[serde(default)]
    pub steps: Option<u32>,
    /// Free-text reflection for the day
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub highlighted: bool,
    /// Counts toward the check-in streak
    #[serde(default)]
    pub streak_check: bool,
}

impl DailyRecord {
    /// The record a day has before anything was ever saved for it.
    pub fn new_default(day_key: DayKey) -> Self {
        Self {
            id: None,
            day_key,
            exercise_done: false,
            exercise_note: String::new(),
            work_done: false,
            work_note: String::new(),
            workout_type: WorkoutCategory::default(),
            exercises: Vec::new(),
            body_weight: None,
            steps: None,
            reflection: String::new(),
            highlighted: false,
            streak_check: false,
        }
    }

    /// Canonical serialized form, used for dirty checks against the last
    /// acknowledged snapshot.
    pub fn serialized(&self) -> String {
        // Plain structs of strings/numbers/bools cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn flag(&self, flag: BoolFlag) -> bool {
        match flag {
            BoolFlag::ExerciseDone => self.exercise_done,
            BoolFlag::WorkDone => self.work_done,
            BoolFlag::Highlighted => self.highlighted,
            BoolFlag::StreakCheck => self.streak_check,
        }
    }
}

/// One exercise within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub unit: WeightUnit,
    /// Sets in the order they were performed
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseSet {
    pub reps: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

/// Workout category, e.g. "push", "legs". The neutral value is "rest".
///
/// Kept as an open string so categories added by the UI later still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(transparent)]
pub struct WorkoutCategory(String);

impl WorkoutCategory {
    pub const REST: &'static str = "rest";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn rest() -> Self {
        Self(Self::REST.to_string())
    }

    /// Whether this is the neutral "no workout" category.
    pub fn is_rest(&self) -> bool {
        self.0 == Self::REST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkoutCategory {
    fn default() -> Self {
        Self::rest()
    }
}

impl fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkoutCategory {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Boolean fields that can be toggled directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolFlag {
    ExerciseDone,
    WorkDone,
    Highlighted,
    StreakCheck,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown flag '{0}'")]
pub struct UnknownFlag(String);

impl FromStr for BoolFlag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exercise_done" => Ok(Self::ExerciseDone),
            "work_done" => Ok(Self::WorkDone),
            "highlighted" => Ok(Self::Highlighted),
            "streak_check" => Ok(Self::StreakCheck),
            other => Err(UnknownFlag(other.to_string())),
        }
    }
}

/// A partial record: only the fields that are `Some` are written.
///
/// Used both for local draft edits and as the upsert payload, so an upsert
/// never touches fields the caller did not set. Nullable fields use a double
/// `Option` so that an explicit `null` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub body_weight: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub steps: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak_check: Option<bool>,
}

/// Distinguish a missing field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl EntryPatch {
    /// Patch that sets a single boolean flag.
    pub fn flag(flag: BoolFlag, value: bool) -> Self {
        let mut patch = Self::default();
        match flag {
            BoolFlag::ExerciseDone => patch.exercise_done = Some(value),
            BoolFlag::WorkDone => patch.work_done = Some(value),
            BoolFlag::Highlighted => patch.highlighted = Some(value),
            BoolFlag::StreakCheck => patch.streak_check = Some(value),
        }
        patch
    }

    pub fn exercises(exercises: Vec<Exercise>) -> Self {
        Self {
            exercises: Some(exercises),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch into a record.
    pub fn apply_to(&self, record: &mut DailyRecord) {
        if let Some(v) = self.exercise_done {
            record.exercise_done = v;
        }
        if let Some(v) = &self.exercise_note {
            record.exercise_note = v.clone();
        }
        if let Some(v) = self.work_done {
            record.work_done = v;
        }
        if let Some(v) = &self.work_note {
            record.work_note = v.clone();
        }
        if let Some(v) = &self.workout_type {
            record.workout_type = v.clone();
        }
        if let Some(v) = &self.exercises {
            record.exercises = v.clone();
        }
        if let Some(v) = self.body_weight {
            record.body_weight = v;
        }
        if let Some(v) = self.steps {
            record.steps = v;
        }
        if let Some(v) = &self.reflection {
            record.reflection = v.clone();
        }
        if let Some(v) = self.highlighted {
            record.highlighted = v;
        }
        if let Some(v) = self.streak_check {
            record.streak_check = v;
        }
    }

    /// Fold a later patch into this one; fields set in `later` win.
    pub fn merge(&mut self, later: EntryPatch) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if later.$field.is_some() {
                    self.$field = later.$field;
                })*
            };
        }
        take!(
            exercise_done,
            exercise_note,
            work_done,
            work_note,
            workout_type,
            exercises,
            body_weight,
            steps,
            reflection,
            highlighted,
            streak_check
        );
    }

    /// Names of the fields this patch sets, as stored.
    pub fn field_names(&self) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

impl From<&DailyRecord> for EntryPatch {
    /// A patch that writes every field of the record.
    fn from(record: &DailyRecord) -> Self {
        Self {
            exercise_done: Some(record.exercise_done),
            exercise_note: Some(record.exercise_note.clone()),
            work_done: Some(record.work_done),
            work_note: Some(record.work_note.clone()),
            workout_type: Some(record.workout_type.clone()),
            exercises: Some(record.exercises.clone()),
            body_weight: Some(record.body_weight),
            steps: Some(record.steps),
            reflection: Some(record.reflection.clone()),
            highlighted: Some(record.highlighted),
            streak_check: Some(record.streak_check),
        }
    }
}
