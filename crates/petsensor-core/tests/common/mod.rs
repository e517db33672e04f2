//! Test doubles and common utilities for sensor contract tests
//!
//! This module provides a scripted transport and payload fixtures so that
//! contract tests can drive the sensor without a network.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use petsensor_core::error::{Error, Result};
use petsensor_core::state::MemoryDocumentStore;
use petsensor_core::store::{DEFAULT_CACHE_KEY, DEFAULT_SETTINGS_KEY};
use petsensor_core::traits::{Transport, TransportResponse};
use petsensor_core::Settings;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum Step {
    /// Respond with a status and body
    Respond(u16, String),
    /// Fail as if the connection was refused
    ConnectionError,
}

/// A transport that replays a script and counts calls
///
/// Clones share the script and the counters.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicUsize>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            ..Self::default()
        }
    }

    /// A transport that must never be called
    pub fn unused() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &Url) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Respond(status, body)) => Ok(TransportResponse::new(status, body)),
            Some(Step::ConnectionError) => Err(Error::transport("connection refused")),
            None => Err(Error::transport("script exhausted")),
        }
    }
}

/// Upstream timestamp text for `at`
pub fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// A well-formed upstream item
pub fn pet(id: &str, updated: DateTime<Utc>) -> Value {
    json!({
        "id": {"$t": id},
        "name": {"$t": format!("Pet {}", id)},
        "age": {"$t": "Adult"},
        "sex": {"$t": "M"},
        "animal": {"$t": "Cat"},
        "shelterId": {"$t": "CA1234"},
        "lastUpdate": {"$t": stamp(updated)},
        "description": {"$t": "Indoor cat, FIV negative."},
        "breeds": {"breed": {"$t": "Domestic Short Hair"}},
        "media": {"photos": {"photo": [
            {"@size": "pnt", "$t": format!("https://photos.example/{}-pnt.jpg", id)},
            {"@size": "x", "$t": format!("https://photos.example/{}-x.jpg", id)}
        ]}}
    })
}

/// A response body listing `items`
pub fn body(items: Vec<Value>) -> String {
    json!({
        "petfinder": {
            "header": {"status": {"code": {"$t": "100"}}},
            "pets": {"pet": items}
        }
    })
    .to_string()
}

/// Settings using the interval strategy
pub fn interval_settings(
    min_interval_secs: u64,
    last_request_at: Option<DateTime<Utc>>,
    last_checked_at: Option<DateTime<Utc>>,
) -> Value {
    let mut doc = json!({
        "service_endpoint": "https://api.petfinder.com/",
        "service_method": "shelter.getPets",
        "api_key": "test-key",
        "shelter_or_query_id": "CA1234",
        "result_count": 25,
        "response_format": "json",
        "offline_mode": false,
        "min_request_interval_seconds": min_interval_secs,
    });
    let obj = doc.as_object_mut().unwrap();
    if let Some(at) = last_request_at {
        obj.insert("last_request_at".into(), json!(at.to_rfc3339()));
    }
    if let Some(at) = last_checked_at {
        obj.insert("last_checked_at".into(), json!(at.to_rfc3339()));
    }
    doc
}

/// Settings using the counter strategy
pub fn counter_settings(limit: u32, used: u32) -> Value {
    json!({
        "service_endpoint": "https://api.petfinder.com/",
        "service_method": "shelter.getPets",
        "api_key": "test-key",
        "shelter_or_query_id": "CA1234",
        "request_count_limit": limit,
        "requests_used": used,
    })
}

/// A memory store holding settings and, optionally, a cached body
pub fn seeded_store(settings: &Value, cache: Option<&str>) -> MemoryDocumentStore {
    let mut documents = vec![(DEFAULT_SETTINGS_KEY.to_string(), settings.to_string())];
    if let Some(cache) = cache {
        documents.push((DEFAULT_CACHE_KEY.to_string(), cache.to_string()));
    }
    MemoryDocumentStore::with_documents(documents)
}

/// Settings as currently persisted in `store`
pub async fn persisted_settings(store: &MemoryDocumentStore) -> Settings {
    let text = store
        .get(DEFAULT_SETTINGS_KEY)
        .await
        .expect("settings document present");
    serde_json::from_str(&text).expect("persisted settings parse")
}

/// Ids of a batch, in order
pub fn ids(records: &[petsensor_core::NormalizedRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}
