// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed entry store.
//!
//! One document per journal day in the entries collection, with the
//! `YYYY-MM-DD` day key as document ID and also stored as a field so it
//! can be filtered and ordered on.

use crate::db::{EntryQuery, EntryStore, SortOrder};
use crate::error::AppError;
use crate::models::{DailyRecord, DayKey, EntryPatch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Document body written on upsert: the key plus only the patched fields.
#[derive(Debug, Serialize, Deserialize)]
struct EntryDocument {
    day_key: DayKey,
    #[serde(flatten)]
    fields: EntryPatch,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    collection: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, collection: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, collection).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, collection, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            collection: collection.to_string(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| AppError::Store(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            collection,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            collection: collection.to_string(),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All store operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            collection: crate::db::collections::DAILY_ENTRIES.to_string(),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Store("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl EntryStore for FirestoreDb {
    async fn get(&self, day_key: DayKey) -> Result<Option<DailyRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(self.collection.as_str())
            .obj()
            .one(&day_key.to_string())
            .await
            .map_err(|e| AppError::Store(e.to_string()))
    }

    async fn upsert(&self, day_key: DayKey, patch: &EntryPatch) -> Result<DailyRecord, AppError> {
        // Update mask limited to the patched fields, so unrelated fields on
        // an existing document are left alone.
        let mut mask = patch.field_names();
        mask.push("day_key".to_string());

        let document = EntryDocument {
            day_key,
            fields: patch.clone(),
        };

        let stored: DailyRecord = self
            .get_client()?
            .fluent()
            .update()
            .fields(mask)
            .in_col(self.collection.as_str())
            .document_id(day_key.to_string())
            .object(&document)
            .execute()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        tracing::debug!(day_key = %day_key, "Entry upserted");
        Ok(stored)
    }

    async fn query(&self, query: &EntryQuery) -> Result<Vec<DailyRecord>, AppError> {
        let streak_check = query.streak_check;
        let workout_type = query
            .workout_type
            .as_ref()
            .map(|category| category.as_str().to_string());
        let before = query.before.map(|day_key| day_key.to_string());
        let direction = match query.order {
            SortOrder::Ascending => firestore::FirestoreQueryDirection::Ascending,
            SortOrder::Descending => firestore::FirestoreQueryDirection::Descending,
        };

        let select = self
            .get_client()?
            .fluent()
            .select()
            .from(self.collection.as_str())
            .filter(move |q| {
                q.for_all([
                    streak_check.and_then(|checked| q.field("streak_check").eq(checked)),
                    workout_type
                        .clone()
                        .and_then(|category| q.field("workout_type").eq(category)),
                    before
                        .clone()
                        .and_then(|day_key| q.field("day_key").less_than(day_key)),
                ])
            })
            .order_by([("day_key", direction)]);

        let select = match query.limit {
            Some(limit) => select.limit(limit),
            None => select,
        };

        select
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Store(e.to_string()))
    }
}
