// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON API consumed by the journal frontend.
//!
//! Handlers are thin: they parse input, call the draft manager or streak
//! service, and return their state as data.

use crate::db::EntryQuery;
use crate::error::{AppError, Result};
use crate::models::{BoolFlag, DailyRecord, DayKey, DraftView, EntryPatch, StreakState, WorkoutCategory};
use crate::services::RestoreOutcome;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_ENTRIES_LIMIT: u32 = 366;

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/draft", get(get_draft).patch(update_draft))
        .route("/api/draft/day/{day_key}", put(select_day))
        .route("/api/draft/toggle/{flag}", post(toggle_flag))
        .route("/api/draft/copy-last-workout", post(copy_last_workout))
        .route("/api/draft/retry", post(retry_draft))
        .route("/api/streak", get(get_streak))
        .route("/api/streak/restore", post(restore_streak))
        .route("/api/entries", get(list_entries))
}

fn parse_day_key(raw: &str) -> Result<DayKey> {
    raw.parse()
        .map_err(|e: crate::models::day_key::DayKeyParseError| AppError::BadRequest(e.to_string()))
}

// ─── Draft ───────────────────────────────────────────────────

/// Select the day being edited. The load continues in the background;
/// poll `GET /api/draft` for its status.
async fn select_day(
    State(state): State<Arc<AppState>>,
    Path(day_key): Path<String>,
) -> Result<(StatusCode, Json<DraftView>)> {
    let day_key = parse_day_key(&day_key)?;
    state.drafts.select_day(day_key).await;
    Ok((StatusCode::ACCEPTED, Json(state.drafts.view())))
}

async fn get_draft(State(state): State<Arc<AppState>>) -> Json<DraftView> {
    Json(state.drafts.view())
}

async fn update_draft(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<EntryPatch>,
) -> Result<Json<DraftView>> {
    Ok(Json(state.drafts.update(patch).await?))
}

async fn toggle_flag(
    State(state): State<Arc<AppState>>,
    Path(flag): Path<String>,
) -> Result<Json<DraftView>> {
    let flag: BoolFlag = flag
        .parse()
        .map_err(|e: crate::models::entry::UnknownFlag| AppError::BadRequest(e.to_string()))?;
    Ok(Json(state.drafts.toggle(flag).await?))
}

#[derive(Deserialize)]
struct CopyWorkoutRequest {
    category: WorkoutCategory,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CopyWorkoutResponse {
    pub found: bool,
    pub draft: DraftView,
}

async fn copy_last_workout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CopyWorkoutRequest>,
) -> Result<Json<CopyWorkoutResponse>> {
    let found = state.drafts.copy_last_workout(&request.category).await?;
    Ok(Json(CopyWorkoutResponse {
        found,
        draft: state.drafts.view(),
    }))
}

async fn retry_draft(State(state): State<Arc<AppState>>) -> Result<Json<DraftView>> {
    Ok(Json(state.drafts.retry().await?))
}

// ─── Streak ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct TodayQuery {
    /// The client's current day; defaults to the server's journal day
    today: Option<String>,
}

impl TodayQuery {
    fn resolve(&self, state: &AppState) -> Result<DayKey> {
        match &self.today {
            Some(raw) => parse_day_key(raw),
            None => Ok(state.today()),
        }
    }
}

async fn get_streak(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<StreakState>> {
    let today = query.resolve(&state)?;
    Ok(Json(state.streaks.compute_streak(today).await?))
}

async fn restore_streak(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<RestoreOutcome>> {
    let today = query.resolve(&state)?;
    tracing::info!(today = %today, "Streak restoration requested");
    Ok(Json(state.streaks.restore_streak(today).await?))
}

// ─── Entries ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct EntriesQuery {
    #[serde(default = "default_entries_limit")]
    limit: u32,
}

fn default_entries_limit() -> u32 {
    100
}

/// Recent records, newest first (e.g. for an external summarizer).
async fn list_entries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<DailyRecord>>> {
    if query.limit == 0 || query.limit > MAX_ENTRIES_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_ENTRIES_LIMIT
        )));
    }

    let records = state
        .store
        .query(&EntryQuery::newest_first().limit(query.limit))
        .await?;
    Ok(Json(records))
}
