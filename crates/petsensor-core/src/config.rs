//! Configuration types for the petsensor system
//!
//! [`Settings`] is the flat JSON document owned by one sensor instance. It
//! carries the service credentials, the throttle bookkeeping and the
//! change-detection watermark, and is persisted through
//! [`ConfigStore`](crate::store::ConfigStore) after every mutation.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "service_endpoint": "https://api.petfinder.com/",
//!   "service_method": "shelter.getPets",
//!   "api_key": "...",
//!   "shelter_or_query_id": "CA1234",
//!   "result_count": 25,
//!   "response_format": "json",
//!   "offline_mode": false,
//!   "min_request_interval_seconds": 10,
//!   "last_request_at": "2026-10-19T12:00:00Z",
//!   "last_checked_at": "2026-10-19T12:00:00Z"
//! }
//! ```
//!
//! The throttle keys select the strategy: `request_count_limit` /
//! `requests_used` for the counter strategy, `min_request_interval_seconds` /
//! `last_request_at` for the elapsed-time strategy. A document carrying both
//! `request_count_limit` and `min_request_interval_seconds` is rejected.
//!
//! `service_endpoint` must be an absolute URL whose path ends in `/`;
//! `service_method` is resolved against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Settings document for a single sensor instance
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the upstream service (e.g. "https://api.petfinder.com/")
    pub service_endpoint: String,

    /// API method appended to the endpoint (e.g. "shelter.getPets")
    pub service_method: String,

    /// Upstream API key
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Shelter (or query) identifier sent as `id`
    pub shelter_or_query_id: String,

    /// Number of records requested per call
    #[serde(default = "default_result_count")]
    pub result_count: u32,

    /// Response format requested from upstream
    #[serde(default = "default_response_format")]
    pub response_format: String,

    /// Extra query parameters forwarded verbatim
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,

    /// Forces cache fallback regardless of throttle state
    #[serde(default)]
    pub offline_mode: bool,

    /// Active throttle strategy and its bookkeeping
    #[serde(flatten)]
    pub throttle: Throttle,

    /// Change-detection watermark
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("service_endpoint", &self.service_endpoint)
            .field("service_method", &self.service_method)
            .field("api_key", &"<REDACTED>")
            .field("shelter_or_query_id", &self.shelter_or_query_id)
            .field("result_count", &self.result_count)
            .field("response_format", &self.response_format)
            .field("query_params", &self.query_params)
            .field("offline_mode", &self.offline_mode)
            .field("throttle", &self.throttle)
            .field("last_checked_at", &self.last_checked_at)
            .finish()
    }
}

/// Key that selects the counter strategy
const COUNTER_KEY: &str = "request_count_limit";

/// Key that selects the elapsed-time strategy
const INTERVAL_KEY: &str = "min_request_interval_seconds";

impl Settings {
    /// Parse and validate a settings document
    ///
    /// Every failure is [`Error::ConfigUnavailable`].
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::config_unavailable(format!("Invalid settings JSON: {}", e)))?;

        if doc.get(COUNTER_KEY).is_some() && doc.get(INTERVAL_KEY).is_some() {
            return Err(Error::config_unavailable(format!(
                "Both {} and {} are set; choose one throttle strategy",
                COUNTER_KEY, INTERVAL_KEY
            )));
        }

        let settings: Settings = serde_json::from_value(doc)
            .map_err(|e| Error::config_unavailable(format!("Invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    ///
    /// Any failure here is fatal to sensor construction.
    pub fn validate(&self) -> Result<()> {
        if self.service_endpoint.trim().is_empty() {
            return Err(Error::config_unavailable("service_endpoint cannot be empty"));
        }
        if self.service_method.trim().is_empty() {
            return Err(Error::config_unavailable("service_method cannot be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::config_unavailable("api_key cannot be empty"));
        }
        if self.shelter_or_query_id.trim().is_empty() {
            return Err(Error::config_unavailable(
                "shelter_or_query_id cannot be empty",
            ));
        }
        if self.result_count == 0 {
            return Err(Error::config_unavailable("result_count must be > 0"));
        }
        if let Throttle::Counter(counter) = &self.throttle {
            if counter.request_count_limit == 0 {
                return Err(Error::config_unavailable(
                    "request_count_limit must be > 0",
                ));
            }
        }

        self.request_url()
            .map_err(|e| Error::config_unavailable(e.to_string()))?;

        Ok(())
    }

    /// Build the upstream request URL
    ///
    /// `{endpoint}{method}?key=..&count=..&id=..&format=..` followed by
    /// every entry of `query_params`.
    pub fn request_url(&self) -> Result<Url> {
        let endpoint = Url::parse(&self.service_endpoint).map_err(|e| {
            Error::Other(format!(
                "Invalid service endpoint '{}': {}",
                self.service_endpoint, e
            ))
        })?;
        if endpoint.cannot_be_a_base() || endpoint.host_str().is_none() {
            return Err(Error::Other(format!(
                "Service endpoint '{}' has no host",
                self.service_endpoint
            )));
        }
        // join() would drop a last path segment without the slash
        if !endpoint.path().ends_with('/') {
            return Err(Error::Other(format!(
                "Service endpoint '{}' must end with '/'",
                self.service_endpoint
            )));
        }

        let mut url = endpoint.join(&self.service_method).map_err(|e| {
            Error::Other(format!(
                "Invalid service method '{}': {}",
                self.service_method, e
            ))
        })?;
        if url.host_str() != endpoint.host_str() {
            return Err(Error::Other(format!(
                "Service method '{}' leaves the endpoint host",
                self.service_method
            )));
        }

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("key", &self.api_key)
                .append_pair("count", &self.result_count.to_string())
                .append_pair("id", &self.shelter_or_query_id)
                .append_pair("format", &self.response_format);
            for (name, value) in &self.query_params {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }

    /// Minimum time a caller must leave between two public operations for
    /// the second one to be allowed a live call
    ///
    /// `has_updates` performs a live call when permitted. A caller that wants
    /// the following `get_content` to hit the service as well (rather than
    /// the cache) must wait at least this long. The sensor itself never
    /// sleeps.
    pub fn min_call_interval(&self) -> Duration {
        match &self.throttle {
            Throttle::Interval(interval) => {
                Duration::from_secs(interval.min_request_interval_seconds.saturating_add(1))
            }
            Throttle::Counter(_) => Duration::ZERO,
        }
    }
}

/// Throttle strategy, selected by which keys the settings document carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Throttle {
    /// Fixed number of requests per quota window
    Counter(CounterThrottle),
    /// Minimum elapsed time between requests
    Interval(IntervalThrottle),
}

/// Counter strategy bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterThrottle {
    /// Requests allowed per quota window
    pub request_count_limit: u32,

    /// Requests made in the current window
    #[serde(default)]
    pub requests_used: u32,

    /// Start of the current quota window
    #[serde(default)]
    pub quota_window_started_at: Option<DateTime<Utc>>,
}

/// Elapsed-time strategy bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalThrottle {
    /// Seconds that must pass between two requests
    pub min_request_interval_seconds: u64,

    /// Time of the last attempted request
    #[serde(default)]
    pub last_request_at: Option<DateTime<Utc>>,
}

fn default_result_count() -> u32 {
    25
}

fn default_response_format() -> String {
    "json".to_string()
}
