//! Wall-clock source and the textual timestamp format stored on records.
//!
//! Every "now" the engine needs (record creation, history attribution) is
//! read through a [`Clock`] so callers and tests can pin time.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Format used for `created_at`, `last_updated_at` and history `datetime`.
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset-carrying variant some servers stamp onto `last_synced_at`.
const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// A source of the current time.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant in [`DEFAULT_FORMAT`].
    fn now_text(&self) -> String {
        format_timestamp(self.now())
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant. The default clock reads the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    /// Create a clock that always reports `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Move the clock forward (or backward for negative durations).
    pub fn advance(&mut self, by: chrono::Duration) {
        self.at = self.at + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Render an instant in [`DEFAULT_FORMAT`].
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(DEFAULT_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts [`DEFAULT_FORMAT`] (read as UTC), the same layout with a numeric
/// offset, and RFC 3339. `field` only labels the error.
pub fn parse_timestamp(field: &str, text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, DEFAULT_FORMAT) {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_str(trimmed, OFFSET_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp {
            field: field.to_string(),
            value: text.to_string(),
        })
}
