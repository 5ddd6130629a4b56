// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for resolving the journal's current day.

use crate::models::DayKey;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// The journal day containing `now`, in a fixed offset from UTC.
pub fn day_key_at(now: DateTime<Utc>, utc_offset_minutes: i32) -> DayKey {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    DayKey::new(now.with_timezone(&offset).date_naive())
}

/// Today's journal day: in the configured offset, or the host's local zone.
pub fn today(utc_offset_minutes: Option<i32>) -> DayKey {
    match utc_offset_minutes {
        Some(minutes) => day_key_at(Utc::now(), minutes),
        None => DayKey::new(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_key_at_respects_offset() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 23, 30, 0).unwrap();
        assert_eq!(day_key_at(now, 0).to_string(), "2026-01-05");
        assert_eq!(day_key_at(now, 60).to_string(), "2026-01-06");
        assert_eq!(day_key_at(now, -8 * 60).to_string(), "2026-01-05");
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 23, 30, 0).unwrap();
        assert_eq!(day_key_at(now, 100_000).to_string(), "2026-01-05");
    }
}
