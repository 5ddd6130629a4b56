// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar day identity for journal records.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// A calendar date serialized as `YYYY-MM-DD`.
///
/// This is the document ID in the store and the only identity a record has.
/// The string form sorts lexicographically in calendar order, which the
/// store relies on for range filters and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a key from calendar parts, `None` if the date does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.
    pub fn pred(&self) -> Self {
        Self(self.0 - Duration::days(1))
    }

    /// The next calendar day.
    pub fn succ(&self) -> Self {
        Self(self.0 + Duration::days(1))
    }

    /// Whole days from `self` to `later` (negative if `later` is earlier).
    pub fn days_until(&self, later: DayKey) -> i64 {
        (later.0 - self.0).num_days()
    }

    /// Days strictly between `self` and `end`, oldest first.
    pub fn days_between_exclusive(&self, end: DayKey) -> Vec<DayKey> {
        let mut days = Vec::new();
        let mut cursor = self.succ();
        while cursor < end {
            days.push(cursor);
            cursor = cursor.succ();
        }
        days
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

/// Errors from parsing a day key.
#[derive(Debug, thiserror::Error)]
#[error("Invalid day key '{0}': expected YYYY-MM-DD")]
pub struct DayKeyParseError(String);

impl FromStr for DayKey {
    type Err = DayKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields; the wire contract does not.
        if s.len() != 10 {
            return Err(DayKeyParseError(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT)
            .map(Self)
            .map_err(|_| DayKeyParseError(s.to_string()))
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_is_zero_padded() {
        let day = DayKey::from_ymd(2026, 2, 1).unwrap();
        assert_eq!(day.to_string(), "2026-02-01");
    }

    #[test]
    fn test_parse_rejects_unpadded_and_garbage() {
        assert!("2026-2-1".parse::<DayKey>().is_err());
        assert!("2026-02-30".parse::<DayKey>().is_err());
        assert!("yesterday".parse::<DayKey>().is_err());
    }

    #[test]
    fn test_string_order_matches_date_order() {
        let a = key("2025-12-31");
        let b = key("2026-01-01");
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_pred_succ_cross_month() {
        assert_eq!(key("2026-03-01").pred(), key("2026-02-28"));
        assert_eq!(key("2024-02-28").succ(), key("2024-02-29"));
    }

    #[test]
    fn test_days_between_exclusive() {
        let days = key("2026-01-01").days_between_exclusive(key("2026-01-04"));
        assert_eq!(days, vec![key("2026-01-02"), key("2026-01-03")]);
        assert!(key("2026-01-01")
            .days_between_exclusive(key("2026-01-02"))
            .is_empty());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&key("2026-01-05")).unwrap();
        assert_eq!(json, "\"2026-01-05\"");
        let back: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2026-01-05"));
    }
}
