//! "What is new since last time"
//!
//! Records are compared by their upstream update timestamp against the
//! watermark (`last_checked_at`). Upstream order is not chronological, so
//! every record is checked, never a prefix.
//!
//! The next watermark is the time of the check, not the newest record
//! timestamp. Upstream clock skew therefore never hides a record that is
//! newer than the previous check.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::normalize::NormalizedRecord;

/// Upstream timestamp format (always UTC)
pub const UPSTREAM_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse an upstream timestamp
///
/// Accepts the upstream format and, failing that, any RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, UPSTREAM_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}

/// Whether a record is newer than the watermark
///
/// With no watermark every record is new. A record whose timestamp does not
/// parse is never new.
pub fn is_new(record: &NormalizedRecord, since: Option<DateTime<Utc>>) -> bool {
    let Some(updated) = parse_timestamp(&record.update_timestamp) else {
        tracing::warn!(
            "Record {} has unparsable timestamp '{}'",
            record.id,
            record.update_timestamp
        );
        return false;
    };

    match since {
        Some(since) => updated > since,
        None => true,
    }
}

/// Whether any record is newer than the watermark
pub fn has_newer(records: &[NormalizedRecord], since: Option<DateTime<Utc>>) -> bool {
    records.iter().any(|record| is_new(record, since))
}

/// Keep the records newer than `since` and compute the next watermark
///
/// # Returns
///
/// `(new_records, new_since)` where `new_records` keeps input order and
/// `new_since` is `now`, or the previous watermark if that is later.
pub fn filter_new(
    records: Vec<NormalizedRecord>,
    since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (Vec<NormalizedRecord>, DateTime<Utc>) {
    let fresh: Vec<NormalizedRecord> = records
        .into_iter()
        .filter(|record| is_new(record, since))
        .collect();

    let new_since = match since {
        Some(since) if since > now => since,
        _ => now,
    };

    (fresh, new_since)
}
