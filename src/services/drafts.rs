// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry draft manager: the editable in-memory copy of the selected day.
//!
//! Lifecycle of a draft:
//! 1. `select_day` starts a fresh session (status `loading`) and issues a load
//! 2. The load resolves to the stored record, or the default record if the
//!    day has none; that becomes the acknowledged snapshot (status `synced`)
//! 3. Edits merge into the draft; a draft that differs from the snapshot
//!    arms a trailing-edge debounce timer, restarted by every further edit
//! 4. When the timer fires the draft is upserted (status `saving`), then the
//!    stored row becomes the new snapshot (`synced`) or the error is
//!    recorded (`error`) with the edits left in place
//!
//! Every async step is tagged with the `(day_key, generation)` it was
//! issued for. Selecting another day bumps the generation, so late load or
//! save results for the previous day are dropped on arrival.
//! Saves and loads for one day are serialized by a per-day lock, so a
//! reload of a day never reads the row from under its own in-flight save.

use crate::db::EntryStore;
use crate::error::AppError;
use crate::models::{BoolFlag, DailyRecord, DayKey, DraftView, EntryPatch, SyncStatus, WorkoutCategory};
use crate::services::streak::StreakCache;
use crate::services::templates::WorkoutTemplates;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

/// Per-day lock serializing saves and loads, shared by every session of
/// that day. Entries are dropped once nobody holds or waits on them.
type SaveLocks = DashMap<DayKey, Arc<Mutex<()>>>;

/// Trailing-edge debounce state of one draft.
#[derive(Debug, Default)]
struct Debounce {
    /// When the pending save should fire; pushed back by every edit
    deadline: Option<Instant>,
    /// A timer task is running for this session
    timer_armed: bool,
}

/// One selected day.
struct Session {
    generation: u64,
    draft: DailyRecord,
    /// Serialized last acknowledged record. `None` until a load succeeds.
    snapshot: Option<String>,
    status: SyncStatus,
    error: Option<String>,
    /// Edits made before the load resolved, replayed onto the loaded record
    pending_edits: EntryPatch,
    debounce: Debounce,
}

impl Session {
    fn new(day_key: DayKey, generation: u64) -> Self {
        Self {
            generation,
            draft: DailyRecord::new_default(day_key),
            snapshot: None,
            status: SyncStatus::Loading,
            error: None,
            pending_edits: EntryPatch::default(),
            debounce: Debounce::default(),
        }
    }

    fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    fn is_dirty(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| *snapshot != self.draft.serialized())
    }
}

struct ManagerState {
    sessions: HashMap<DayKey, Session>,
    active: Option<DayKey>,
    last_generation: u64,
}

impl ManagerState {
    /// Replace whatever was selected with a fresh session for `day_key`.
    fn begin(&mut self, day_key: DayKey) -> u64 {
        self.last_generation += 1;
        let generation = self.last_generation;
        self.sessions.clear();
        self.sessions
            .insert(day_key, Session::new(day_key, generation));
        self.active = Some(day_key);
        generation
    }

    /// The session an async result was issued for, if it is still current.
    fn current_mut(&mut self, day_key: DayKey, generation: u64) -> Option<&mut Session> {
        if self.active != Some(day_key) {
            return None;
        }
        self.sessions
            .get_mut(&day_key)
            .filter(|session| session.generation == generation)
    }

    fn active_mut(&mut self) -> Result<(DayKey, &mut Session), AppError> {
        let day_key = self.active.ok_or(AppError::NoActiveDay)?;
        self.sessions
            .get_mut(&day_key)
            .map(|session| (day_key, session))
            .ok_or(AppError::NoActiveDay)
    }

    fn view(&self) -> DraftView {
        match self.active.and_then(|day_key| self.sessions.get(&day_key)) {
            Some(session) => DraftView {
                day_key: self.active,
                draft: Some(session.draft.clone()),
                status: session.status,
                error: session.error.clone(),
                dirty: session.is_dirty(),
            },
            None => DraftView::idle(),
        }
    }
}

struct Inner {
    store: Arc<dyn EntryStore>,
    templates: WorkoutTemplates,
    streak_cache: StreakCache,
    debounce: Duration,
    state: Mutex<ManagerState>,
    save_locks: SaveLocks,
    view_tx: watch::Sender<DraftView>,
}

/// Owns the draft of the selected day and keeps the store in sync with it.
///
/// Cheap to clone; clones share the same sessions.
#[derive(Clone)]
pub struct DraftManager {
    inner: Arc<Inner>,
}

impl DraftManager {
    /// Create a manager saving through `store` after `debounce` of quiet.
    ///
    /// Successful saves clear `streak_cache`, since they may change a check-in.
    pub fn new(store: Arc<dyn EntryStore>, debounce: Duration, streak_cache: StreakCache) -> Self {
        let (view_tx, _) = watch::channel(DraftView::idle());
        Self {
            inner: Arc::new(Inner {
                templates: WorkoutTemplates::new(store.clone()),
                store,
                streak_cache,
                debounce,
                state: Mutex::new(ManagerState {
                    sessions: HashMap::new(),
                    active: None,
                    last_generation: 0,
                }),
                save_locks: DashMap::new(),
                view_tx,
            }),
        }
    }

    /// Current view of the active draft.
    pub fn view(&self) -> DraftView {
        self.inner.view_tx.borrow().clone()
    }

    /// Receive every change of the draft view.
    pub fn subscribe(&self) -> watch::Receiver<DraftView> {
        self.inner.view_tx.subscribe()
    }

    /// Make `day_key` the active day and load it in the background.
    ///
    /// Supersedes any load or pending save of the previously selected day.
    /// Selecting the already active day does nothing.
    pub async fn select_day(&self, day_key: DayKey) {
        let generation = {
            let mut state = self.inner.state.lock().await;
            if state.active == Some(day_key) {
                return;
            }
            let generation = state.begin(day_key);
            self.inner.publish(&state);
            generation
        };

        tracing::debug!(day_key = %day_key, generation, "Day selected");
        self.inner.spawn_load(day_key, generation);
    }

    /// Select `day_key` if needed and wait for its load to resolve.
    pub async fn load(&self, day_key: DayKey) -> DraftView {
        let generation = {
            let mut state = self.inner.state.lock().await;
            let generation = match state.current_generation(day_key) {
                Some((_, true)) => {
                    // Already loaded; nothing to fetch.
                    return state.view();
                }
                Some((generation, false)) => generation,
                None => state.begin(day_key),
            };
            self.inner.publish(&state);
            generation
        };

        self.inner.load(day_key, generation).await;
        self.view()
    }

    /// Shallow-merge `patch` into the active draft.
    ///
    /// No network effect of its own; a resulting difference from the last
    /// acknowledged snapshot (re)starts the save debounce.
    pub async fn update(&self, patch: EntryPatch) -> Result<DraftView, AppError> {
        let mut state = self.inner.state.lock().await;
        self.inner.edit(&mut state, patch)?;
        self.inner.publish(&state);
        Ok(state.view())
    }

    /// Flip one boolean field of the active draft.
    pub async fn toggle(&self, flag: BoolFlag) -> Result<DraftView, AppError> {
        let mut state = self.inner.state.lock().await;
        let (_, session) = state.active_mut()?;
        let patch = EntryPatch::flag(flag, !session.draft.flag(flag));
        self.inner.edit(&mut state, patch)?;
        self.inner.publish(&state);
        Ok(state.view())
    }

    /// Copy the exercises of the latest earlier day in `category` into the
    /// active draft.
    ///
    /// Returns whether a workout was found. The rest category never queries
    /// the store. Nothing is written directly; the copied exercises go
    /// through the normal edit and debounce path.
    pub async fn copy_last_workout(&self, category: &WorkoutCategory) -> Result<bool, AppError> {
        if category.is_rest() {
            return Ok(false);
        }

        let (day_key, generation) = {
            let mut state = self.inner.state.lock().await;
            let (day_key, session) = state.active_mut()?;
            (day_key, session.generation)
        };

        let Some(exercises) = self
            .inner
            .templates
            .last_workout(day_key, category)
            .await?
        else {
            return Ok(false);
        };

        let mut state = self.inner.state.lock().await;
        if state.current_mut(day_key, generation).is_none() {
            tracing::debug!(day_key = %day_key, "Discarding workout template for superseded day");
            return Ok(false);
        }
        self.inner
            .edit(&mut state, EntryPatch::exercises(exercises))?;
        self.inner.publish(&state);
        Ok(true)
    }

    /// Save the active draft now if it has unsaved changes.
    pub async fn flush(&self) -> Result<DraftView, AppError> {
        let (day_key, generation) = {
            let mut state = self.inner.state.lock().await;
            let (day_key, session) = state.active_mut()?;
            (day_key, session.generation)
        };
        self.inner.save(day_key, generation).await;
        Ok(self.view())
    }

    /// Explicit retry after an error: reload if the day never loaded,
    /// otherwise save immediately.
    pub async fn retry(&self) -> Result<DraftView, AppError> {
        let reload = {
            let mut state = self.inner.state.lock().await;
            let (day_key, session) = state.active_mut()?;
            if session.is_loaded() {
                None
            } else {
                session.status = SyncStatus::Loading;
                session.error = None;
                let generation = session.generation;
                self.inner.publish(&state);
                Some((day_key, generation))
            }
        };

        match reload {
            Some((day_key, generation)) => {
                self.inner.load(day_key, generation).await;
                Ok(self.view())
            }
            None => self.flush().await,
        }
    }
}

impl ManagerState {
    /// Generation of the session for `day_key` if it is active, and whether
    /// it has loaded.
    fn current_generation(&self, day_key: DayKey) -> Option<(u64, bool)> {
        if self.active != Some(day_key) {
            return None;
        }
        self.sessions
            .get(&day_key)
            .map(|session| (session.generation, session.is_loaded()))
    }
}

impl Inner {
    fn publish(&self, state: &ManagerState) {
        self.view_tx.send_replace(state.view());
    }

    fn spawn_load(self: &Arc<Self>, day_key: DayKey, generation: u64) {
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.load(day_key, generation).await });
    }

    fn day_lock(&self, day_key: DayKey) -> Arc<Mutex<()>> {
        self.save_locks
            .entry(day_key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry for `day_key` if `lock` was the last outside handle.
    fn release_day_lock(&self, day_key: DayKey, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.save_locks
            .remove_if(&day_key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Fetch `day_key` and apply the result if the session is still current.
    ///
    /// Waits for any save of the same day to settle first.
    async fn load(self: &Arc<Self>, day_key: DayKey, generation: u64) {
        let lock = self.day_lock(day_key);
        let result = {
            let _guard = lock.lock().await;
            self.store.get(day_key).await
        };
        self.release_day_lock(day_key, lock);

        let mut state = self.state.lock().await;
        let Some(session) = state.current_mut(day_key, generation) else {
            tracing::debug!(day_key = %day_key, generation, "Discarding stale load result");
            return;
        };
        if session.is_loaded() {
            // A concurrent load for this session already applied.
            return;
        }

        match result {
            Ok(found) => {
                let existed = found.is_some();
                let base = found.unwrap_or_else(|| DailyRecord::new_default(day_key));
                session.snapshot = Some(base.serialized());

                let mut draft = base;
                std::mem::take(&mut session.pending_edits).apply_to(&mut draft);
                session.draft = draft;
                session.status = SyncStatus::Synced;
                session.error = None;

                tracing::debug!(day_key = %day_key, generation, existed, "Draft loaded");

                if session.is_dirty() {
                    self.arm_debounce(day_key, session);
                }
            }
            Err(e) => {
                tracing::warn!(day_key = %day_key, error = %e, "Failed to load entry");
                session.status = SyncStatus::Error;
                session.error = Some(e.to_string());
            }
        }

        self.publish(&state);
    }

    /// Apply an edit to the active session and decide what it triggers.
    fn edit(self: &Arc<Self>, state: &mut ManagerState, patch: EntryPatch) -> Result<(), AppError> {
        let (day_key, session) = state.active_mut()?;
        patch.apply_to(&mut session.draft);

        if !session.is_loaded() {
            session.pending_edits.merge(patch);
            if session.status == SyncStatus::Error {
                // Editing after a failed load retries the load.
                session.status = SyncStatus::Loading;
                session.error = None;
                self.spawn_load(day_key, session.generation);
            }
        } else if session.is_dirty() {
            self.arm_debounce(day_key, session);
        } else {
            // Edited back to the acknowledged state; nothing to save.
            session.debounce.deadline = None;
            if session.status == SyncStatus::Error {
                session.status = SyncStatus::Synced;
                session.error = None;
            }
        }
        Ok(())
    }

    /// Push the save deadline back by the debounce period, starting a timer
    /// task if none is running for this session.
    fn arm_debounce(self: &Arc<Self>, day_key: DayKey, session: &mut Session) {
        session.debounce.deadline = Some(Instant::now() + self.debounce);
        if session.debounce.timer_armed {
            return;
        }
        session.debounce.timer_armed = true;

        let inner = Arc::clone(self);
        let generation = session.generation;
        tokio::spawn(async move { inner.run_debounce(day_key, generation).await });
    }

    /// Sleep until the (possibly moving) deadline passes, then save.
    async fn run_debounce(self: Arc<Self>, day_key: DayKey, generation: u64) {
        loop {
            let deadline = {
                let mut state = self.state.lock().await;
                let Some(session) = state.current_mut(day_key, generation) else {
                    return;
                };
                match session.debounce.deadline {
                    Some(deadline) if deadline > Instant::now() => deadline,
                    _ => {
                        session.debounce.timer_armed = false;
                        session.debounce.deadline = None;
                        break;
                    }
                }
            };
            tokio::time::sleep_until(deadline).await;
        }

        self.save(day_key, generation).await;
    }

    /// Upsert the draft if it still differs from the snapshot.
    async fn save(self: &Arc<Self>, day_key: DayKey, generation: u64) {
        let lock = self.day_lock(day_key);
        {
            let _guard = lock.lock().await;
            self.save_locked(day_key, generation).await;
        }
        self.release_day_lock(day_key, lock);
    }

    async fn save_locked(self: &Arc<Self>, day_key: DayKey, generation: u64) {
        let payload = {
            let mut state = self.state.lock().await;
            let Some(session) = state.current_mut(day_key, generation) else {
                return;
            };
            if !session.is_loaded() || !session.is_dirty() {
                return;
            }
            session.status = SyncStatus::Saving;
            let payload = session.draft.clone();
            self.publish(&state);
            payload
        };

        let result = self
            .store
            .upsert(day_key, &EntryPatch::from(&payload))
            .await;

        let mut state = self.state.lock().await;
        let Some(session) = state.current_mut(day_key, generation) else {
            tracing::debug!(day_key = %day_key, generation, "Discarding stale save result");
            return;
        };

        match result {
            Ok(stored) => {
                session.snapshot = Some(stored.serialized());
                if session.draft == payload {
                    session.draft = stored;
                } else if session.draft.id.is_none() {
                    session.draft.id = stored.id;
                }
                session.status = SyncStatus::Synced;
                session.error = None;
                self.streak_cache.clear();

                tracing::info!(day_key = %day_key, "Draft saved");

                // Edits that arrived while the save was in flight.
                if session.is_dirty() {
                    self.arm_debounce(day_key, session);
                }
            }
            Err(e) => {
                tracing::warn!(day_key = %day_key, error = %e, "Failed to save draft");
                session.status = SyncStatus::Error;
                session.error = Some(e.to_string());
            }
        }

        self.publish(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEntryStore;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_day_locks_are_released_after_use() {
        let store = Arc::new(MemoryEntryStore::new());
        let drafts = DraftManager::new(
            store.clone(),
            Duration::from_millis(800),
            Arc::new(DashMap::new()),
        );

        for day in ["2026-03-01", "2026-03-02", "2026-03-03"] {
            drafts.load(key(day)).await;
            drafts
                .update(EntryPatch {
                    reflection: Some(day.to_string()),
                    ..EntryPatch::default()
                })
                .await
                .unwrap();
            drafts.flush().await.unwrap();
        }

        assert_eq!(store.upsert_count().await, 3);
        assert!(drafts.inner.save_locks.is_empty());
    }
}
