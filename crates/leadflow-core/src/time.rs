// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp helpers.
//!
//! All persisted timestamps use the same UTC RFC3339-with-milliseconds
//! format that SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` emits.
//! Fixed width means string comparison and string ordering agree with
//! chronological ordering, which the scheduler's due-execution query
//! relies on.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time in the canonical persisted format.
pub fn now() -> String {
    format(Utc::now())
}

/// Format an instant in the canonical persisted format.
pub fn format(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// An instant `minutes` from now, in the canonical persisted format.
pub fn minutes_from_now(minutes: i64) -> String {
    format(Utc::now() + chrono::Duration::minutes(minutes))
}
