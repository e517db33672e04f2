//! Petfinder shelter sensor
//!
//! [`PetFinderSensor`] composes the settings store, the record cache, the
//! throttle, the fetcher, the normalizer and the change detector into the
//! [`Sensor`] contract.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ── settings load ──► Ready ──► get_all / has_updates / get_content ──► Ready
//!   │
//!   └── ConfigUnavailable: no sensor is returned
//! ```
//!
//! ## Watermark Policy
//!
//! - `get_all` never touches the watermark
//! - `has_updates` peeks: it compares against the watermark without moving it
//! - `get_content` filters, then advances and persists the watermark
//!
//! ## Pacing
//!
//! `has_updates` makes a live call when permitted. A `get_content` issued
//! right after it will usually be throttled and served from the cache that
//! call just refreshed. Callers that want two live calls must wait
//! [`Sensor::min_call_interval`] in between; the sensor never sleeps.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::change;
use crate::config::Settings;
use crate::error::Result;
use crate::fetch::{self, PayloadSource};
use crate::normalize::{self, NormalizedRecord};
use crate::store::{ConfigStore, DEFAULT_CACHE_KEY, DEFAULT_SETTINGS_KEY, RecordCache};
use crate::throttle;
use crate::traits::{DocumentStore, Sensor, Transport};

/// Sensor name reported by [`Sensor::name`]
pub const SENSOR_NAME: &str = "PetFinderSensor";

/// Polling sensor for one shelter's adoptable animals
pub struct PetFinderSensor {
    /// Settings document access
    config: ConfigStore,

    /// Last good upstream response
    cache: RecordCache,

    /// Upstream HTTP call
    transport: Box<dyn Transport>,

    /// Loaded settings, kept in sync with the store
    settings: Settings,
}

impl PetFinderSensor {
    /// Create a sensor using the default document keys
    ///
    /// # Errors
    ///
    /// [`Error::ConfigUnavailable`](crate::Error::ConfigUnavailable) when the
    /// settings document is missing, unparsable or invalid.
    pub async fn new(store: Arc<dyn DocumentStore>, transport: Box<dyn Transport>) -> Result<Self> {
        Self::with_keys(store, transport, DEFAULT_SETTINGS_KEY, DEFAULT_CACHE_KEY).await
    }

    /// Create a sensor whose documents live under the given keys
    pub async fn with_keys(
        store: Arc<dyn DocumentStore>,
        transport: Box<dyn Transport>,
        settings_key: &str,
        cache_key: &str,
    ) -> Result<Self> {
        let config = ConfigStore::new(store.clone(), settings_key);
        let cache = RecordCache::new(store, cache_key);

        let settings = config.load().await?;
        info!(
            "This sensor just woke up .. ready to call {}{}",
            settings.service_endpoint, settings.service_method
        );

        Ok(Self {
            config,
            cache,
            transport,
            settings,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch and normalize, reporting where the data came from
    pub async fn fetch_records(&mut self) -> Result<(Vec<NormalizedRecord>, PayloadSource)> {
        let fetched = fetch::fetch_or_fallback(
            &mut self.settings,
            self.transport.as_ref(),
            &self.config,
            &self.cache,
            Utc::now(),
        )
        .await?;

        let records = match normalize::normalize_lenient(&fetched.payload) {
            Ok(records) => records,
            // The payload envelope was checked when it was parsed
            Err(e) => {
                tracing::warn!("Payload has no usable item list: {}", e);
                Vec::new()
            }
        };

        debug!(
            "Normalized {} record(s) from {:?}",
            records.len(),
            fetched.source
        );
        Ok((records, fetched.source))
    }
}

impl std::fmt::Debug for PetFinderSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetFinderSensor")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("settings", &self.settings)
            .finish()
    }
}

impl std::fmt::Display for PetFinderSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(SENSOR_NAME)
    }
}

#[async_trait]
impl Sensor for PetFinderSensor {
    fn name(&self) -> &str {
        SENSOR_NAME
    }

    fn min_call_interval(&self) -> Duration {
        self.settings.min_call_interval()
    }

    async fn has_updates(&mut self, _token: Option<&str>) -> Result<u32> {
        if !throttle::allowed(&self.settings, Utc::now()) {
            debug!("has_updates: live call not permitted");
            return Ok(0);
        }

        let records = self.get_all().await?;
        let available = change::has_newer(&records, self.settings.last_checked_at);
        if available {
            info!("Updates are available");
        }
        Ok(u32::from(available))
    }

    async fn get_content(&mut self, _token: Option<&str>) -> Result<Vec<NormalizedRecord>> {
        let records = self.get_all().await?;

        let (fresh, new_since) =
            change::filter_new(records, self.settings.last_checked_at, Utc::now());

        self.settings.last_checked_at = Some(new_since);
        self.config.persist(&self.settings).await;
        info!(
            "{} new record(s), watermark advanced to {}",
            fresh.len(),
            new_since
        );

        Ok(fresh)
    }

    async fn get_all(&mut self) -> Result<Vec<NormalizedRecord>> {
        let (records, _source) = self.fetch_records().await?;
        Ok(records)
    }
}
