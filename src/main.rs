// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit journal API server
//!
//! Serves the draft-sync and streak engines of a daily-habit journal over
//! JSON, backed by a row-per-day store.

use anyhow::Context;
use habit_journal_sync::{
    config::{Config, StoreBackend},
    db::{EntryStore, FirestoreDb, MemoryEntryStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        debounce_ms = u64::try_from(config.save_debounce.as_millis()).unwrap_or(u64::MAX),
        "Starting habit journal API"
    );

    let store: Arc<dyn EntryStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id, &config.entries_collection)
                .await
                .context("Failed to connect to Firestore")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory entry store; entries are lost on restart");
            Arc::new(MemoryEntryStore::new())
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, store));
    tracing::info!(today = %state.today(), "Journal day resolved");

    // Build router
    let app = habit_journal_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("habit_journal_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
