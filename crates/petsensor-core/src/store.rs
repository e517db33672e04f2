//! Settings and cache adapters over a [`DocumentStore`]
//!
//! - [`ConfigStore`]: typed access to the sensor's [`Settings`] document
//! - [`RecordCache`]: the last successful upstream body, served on fallback
//!
//! Loading settings is fatal when it fails; saving is not. A lost "a request
//! was made" record is preferable to aborting a fetch half-way.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::payload::RawPayload;
use crate::traits::DocumentStore;

/// Default settings document key
pub const DEFAULT_SETTINGS_KEY: &str = "petfindersensor";

/// Default cached-response document key
pub const DEFAULT_CACHE_KEY: &str = "petfinder_saved_records";

/// Typed access to the settings document
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn DocumentStore>,
    key: String,
}

impl ConfigStore {
    /// Create a config store for the document under `key`
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Document key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load and validate the settings
    ///
    /// Every failure (missing document, unreadable, unparsable, invalid)
    /// is reported as [`Error::ConfigUnavailable`].
    pub async fn load(&self) -> Result<Settings> {
        let text = self.store.load(&self.key).await.map_err(|e| {
            Error::config_unavailable(format!("Cannot read settings '{}': {}", self.key, e))
        })?;

        let settings = Settings::from_json(&text).map_err(|e| {
            Error::config_unavailable(format!("Settings '{}' are unusable: {}", self.key, e))
        })?;

        tracing::debug!(
            "Loaded settings '{}' for {}{}",
            self.key,
            settings.service_endpoint,
            settings.service_method
        );
        Ok(settings)
    }

    /// Serialize and write the settings
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        self.store.save(&self.key, &json).await
    }

    /// Write the settings, logging instead of failing
    pub async fn persist(&self, settings: &Settings) {
        if let Err(e) = self.save(settings).await {
            tracing::warn!("Unable to save settings '{}': {}", self.key, e);
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").field("key", &self.key).finish()
    }
}

/// Last successful upstream response
#[derive(Clone)]
pub struct RecordCache {
    store: Arc<dyn DocumentStore>,
    key: String,
}

impl RecordCache {
    /// Create a record cache for the document under `key`
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Document key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and parse the cached body
    ///
    /// Fails with [`Error::NoDataAvailable`] when the cache is missing,
    /// unreadable or no longer parses.
    pub async fn read(&self) -> Result<RawPayload> {
        let body = self.store.load(&self.key).await.map_err(|e| {
            Error::no_data(format!("Cannot read cached records '{}': {}", self.key, e))
        })?;

        let payload = RawPayload::parse(&body).map_err(|e| {
            Error::no_data(format!("Cached records '{}' are unusable: {}", self.key, e))
        })?;

        tracing::info!("Read response from cache '{}'", self.key);
        Ok(payload)
    }

    /// Overwrite the cached body, logging instead of failing
    pub async fn write(&self, body: &str) {
        match self.store.save(&self.key, body).await {
            Ok(()) => tracing::info!("Saved response to cache '{}'", self.key),
            Err(e) => tracing::warn!("Cache write for '{}' failed: {}", self.key, e),
        }
    }
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache").field("key", &self.key).finish()
    }
}
