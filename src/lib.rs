// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit journal sync: the core behind a daily-habit journal.
//!
//! This crate keeps an editable draft of the selected day in sync with a
//! remote row-per-day store, and derives (and restores) the check-in streak
//! from that store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::EntryStore;
use models::DayKey;
use services::{DraftManager, StreakCache, StreakService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn EntryStore>,
    pub drafts: DraftManager,
    pub streaks: StreakService,
}

impl AppState {
    /// Wire the draft manager and streak service to one store, sharing the
    /// streak cache between them.
    pub fn new(config: Config, store: Arc<dyn EntryStore>) -> Self {
        let streak_cache: StreakCache = Arc::new(dashmap::DashMap::new());
        let drafts = DraftManager::new(store.clone(), config.save_debounce, streak_cache.clone());
        let streaks = StreakService::new(store.clone(), streak_cache, config.streak_lookback);

        Self {
            config,
            store,
            drafts,
            streaks,
        }
    }

    /// The journal's current day.
    pub fn today(&self) -> DayKey {
        time_utils::today(self.config.utc_offset_minutes)
    }
}
