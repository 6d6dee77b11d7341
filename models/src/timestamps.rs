// models/src/timestamps.rs

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::errors::{ValidationError, ValidationResult};

/// Format used for appointment slots, e.g. `2024-06-01T10:00`.
pub const APPOINTMENT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// RFC 3339 in UTC with fixed millisecond precision. Fixed width means
/// lexicographic order is chronological order, which the store relies on when
/// ordering by a timestamp field.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

static LAST_ISSUED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// The current time, strictly later than every timestamp this process issued
/// before. Writes landing in the same millisecond are pushed one millisecond
/// apart, so ordering by a generated timestamp never ties.
pub fn now_timestamp() -> String {
    let now = Utc::now();
    let now_millis = now.timestamp_millis();
    let previous = LAST_ISSUED_MILLIS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(now_millis.max(last + 1)))
        .unwrap_or_else(|last| last);
    let issued = now_millis.max(previous + 1);
    format_timestamp(DateTime::<Utc>::from_timestamp_millis(issued).unwrap_or(now))
}

/// Normalises an appointment date to `YYYY-MM-DDTHH:MM`.
///
/// Accepts the `datetime-local` form (`2024-06-01T10:00`), the same with
/// seconds, or a full RFC 3339 timestamp (converted to UTC).
pub fn normalize_appointment_date(raw: &str) -> ValidationResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingDate);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, APPOINTMENT_FORMAT) {
        return Ok(naive.format(APPOINTMENT_FORMAT).to_string());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.format(APPOINTMENT_FORMAT).to_string());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc).format(APPOINTMENT_FORMAT).to_string());
    }

    Err(ValidationError::InvalidDate(raw.to_string()))
}

/// The current instant in appointment format, for "upcoming" comparisons.
pub fn appointment_cutoff(now: DateTime<Utc>) -> String {
    now.format(APPOINTMENT_FORMAT).to_string()
}
