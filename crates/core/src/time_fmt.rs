// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting shared by journal entries and job info.

use chrono::{Local, NaiveDateTime, TimeZone};

/// Layout of every timestamp the adapter writes (local time, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format epoch milliseconds as a local `YYYY-MM-DD HH:MM:SS` timestamp.
///
/// Returns an empty string for instants chrono cannot map to local time.
pub fn format_timestamp(epoch_ms: u64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms as i64)
        .earliest()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parse a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

/// Elapsed seconds between two epoch-millisecond instants (never negative).
pub fn duration_seconds(start_ms: u64, end_ms: u64) -> f64 {
    end_ms.saturating_sub(start_ms) as f64 / 1000.0
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
