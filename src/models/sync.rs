// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Draft synchronization state exposed to the presentation layer.

use crate::models::{DailyRecord, DayKey};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Sync status of the active draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Loading,
    Synced,
    Saving,
    Error,
}

/// Point-in-time view of the active draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DraftView {
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub day_key: Option<DayKey>,
    /// `None` only before the first day is selected
    pub draft: Option<DailyRecord>,
    pub status: SyncStatus,
    /// Human-readable message when `status` is `error`
    pub error: Option<String>,
    /// Draft differs from the last acknowledged snapshot
    pub dirty: bool,
}

impl DraftView {
    /// View before any day has been selected.
    pub fn idle() -> Self {
        Self {
            day_key: None,
            draft: None,
            status: SyncStatus::Loading,
            error: None,
            dirty: false,
        }
    }
}
