// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use crate::db::collections::DAILY_ENTRIES;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default quiet period before a dirty draft is persisted.
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 800;
/// Default number of recent checked rows scanned for the streak.
pub const DEFAULT_STREAK_LOOKBACK: u32 = 100;

/// Which entry store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store, contents lost on restart (local development).
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firestore => "firestore",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    /// Firestore collection holding one document per day
    pub entries_collection: String,
    /// Quiet period before a dirty draft is saved
    pub save_debounce: Duration,
    /// Max checked rows fetched when deriving the streak
    pub streak_lookback: u32,
    /// Fixed UTC offset for "today"; `None` uses the host's local time zone
    pub utc_offset_minutes: Option<i32>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        let gcp_project_id = match (store_backend, env::var("GCP_PROJECT_ID")) {
            (_, Ok(id)) => id,
            (StoreBackend::Memory, Err(_)) => "local-dev".to_string(),
            (StoreBackend::Firestore, Err(_)) => {
                return Err(ConfigError::Missing("GCP_PROJECT_ID"))
            }
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            store_backend,
            gcp_project_id,
            entries_collection: env::var("ENTRIES_COLLECTION")
                .unwrap_or_else(|_| DAILY_ENTRIES.to_string()),
            save_debounce: Duration::from_millis(parse_or(
                "SAVE_DEBOUNCE_MS",
                DEFAULT_SAVE_DEBOUNCE_MS,
            )?),
            streak_lookback: parse_or("STREAK_LOOKBACK", DEFAULT_STREAK_LOOKBACK)?,
            utc_offset_minutes: env::var("JOURNAL_UTC_OFFSET_MINUTES")
                .ok()
                .map(|raw| {
                    raw.trim()
                        .parse()
                        .map_err(|_| ConfigError::Invalid("JOURNAL_UTC_OFFSET_MINUTES"))
                })
                .transpose()?,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            entries_collection: DAILY_ENTRIES.to_string(),
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            streak_lookback: DEFAULT_STREAK_LOOKBACK,
            utc_offset_minutes: Some(0),
        }
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Single test touching the process environment to avoid races.
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("SAVE_DEBOUNCE_MS", "250");
        env::remove_var("GCP_PROJECT_ID");
        env::remove_var("STREAK_LOOKBACK");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.gcp_project_id, "local-dev");
        assert_eq!(config.save_debounce, Duration::from_millis(250));
        assert_eq!(config.streak_lookback, DEFAULT_STREAK_LOOKBACK);

        env::set_var("SAVE_DEBOUNCE_MS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("SAVE_DEBOUNCE_MS"))
        ));

        env::set_var("SAVE_DEBOUNCE_MS", "800");
        env::set_var("STORE_BACKEND", "firestore");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("GCP_PROJECT_ID"))
        ));

        env::remove_var("STORE_BACKEND");
        env::remove_var("SAVE_DEBOUNCE_MS");
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(
            "Firestore".parse::<StoreBackend>().unwrap(),
            StoreBackend::Firestore
        );
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
