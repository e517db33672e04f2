//! Self-imposed rate limiting
//!
//! The sensor decides on its own whether a live call is permitted, from the
//! bookkeeping kept in [`Settings`]. Two strategies exist; a settings
//! document carries exactly one of them:
//!
//! - **Counter**: at most `request_count_limit` attempts per one-day quota
//!   window. The window restarts on the first attempt after it expires.
//! - **Interval**: strictly more than `min_request_interval_seconds` must
//!   have passed since the last attempt.
//!
//! `offline_mode` disallows live calls under either strategy.
//!
//! Usage counts *attempts*: [`record_usage`] is called before the transport
//! is invoked, whatever the outcome.

use chrono::{DateTime, Duration, Utc};

use crate::config::{CounterThrottle, IntervalThrottle, Settings, Throttle};

/// Length of the counter strategy's quota window
pub fn quota_window() -> Duration {
    Duration::days(1)
}

/// Whether a live call is permitted at `now`
pub fn allowed(settings: &Settings, now: DateTime<Utc>) -> bool {
    if settings.offline_mode {
        tracing::debug!("Live call disallowed: offline mode");
        return false;
    }

    let permitted = match &settings.throttle {
        Throttle::Counter(counter) => counter_allows(counter, now),
        Throttle::Interval(interval) => interval_allows(interval, now),
    };

    if !permitted {
        tracing::debug!("Live call disallowed by throttle: {:?}", settings.throttle);
    }
    permitted
}

/// Record a live-call attempt made at `now`
pub fn record_usage(settings: &mut Settings, now: DateTime<Utc>) {
    match &mut settings.throttle {
        Throttle::Counter(counter) => {
            if window_expired(counter, now) {
                tracing::info!(
                    "Quota window expired, resetting usage (was {}/{})",
                    counter.requests_used,
                    counter.request_count_limit
                );
                counter.quota_window_started_at = Some(now);
                counter.requests_used = 1;
            } else {
                counter.requests_used = counter.requests_used.saturating_add(1);
            }
        }
        Throttle::Interval(interval) => {
            interval.last_request_at = Some(now);
        }
    }
}

fn counter_allows(counter: &CounterThrottle, now: DateTime<Utc>) -> bool {
    counter.requests_used < counter.request_count_limit || window_expired(counter, now)
}

fn window_expired(counter: &CounterThrottle, now: DateTime<Utc>) -> bool {
    match counter.quota_window_started_at {
        Some(started) => now.signed_duration_since(started) >= quota_window(),
        None => true,
    }
}

fn interval_allows(interval: &IntervalThrottle, now: DateTime<Utc>) -> bool {
    match interval.last_request_at {
        Some(last) => {
            let min = Duration::seconds(
                i64::try_from(interval.min_request_interval_seconds).unwrap_or(i64::MAX),
            );
            now.signed_duration_since(last) > min
        }
        None => true,
    }
}
