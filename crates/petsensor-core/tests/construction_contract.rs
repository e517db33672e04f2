//! Contract Test: Construction and Persistence
//!
//! This test verifies that a sensor cannot exist without valid settings, and
//! that a file-backed sensor keeps its state across restarts.
//!
//! Constraints verified:
//! - Missing, unparsable or invalid settings abort construction with
//!   ConfigUnavailable
//! - Throttle bookkeeping and the watermark survive a restart
//! - The cached response on disk is the verbatim last good body
//!
//! If this test fails, a restarted sensor may hammer the upstream service or
//! report already-seen records again.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use petsensor_core::store::{DEFAULT_CACHE_KEY, DEFAULT_SETTINGS_KEY};
use petsensor_core::traits::DocumentStore;
use petsensor_core::{Error, FileDocumentStore, MemoryDocumentStore, PetFinderSensor, Sensor};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn missing_settings_abort_construction() {
    let store = Arc::new(MemoryDocumentStore::new());
    let result = PetFinderSensor::new(store, Box::new(ScriptedTransport::unused())).await;

    assert!(matches!(result, Err(Error::ConfigUnavailable(_))));
}

#[tokio::test]
async fn unparsable_settings_abort_construction() {
    let store = Arc::new(MemoryDocumentStore::with_documents([(
        DEFAULT_SETTINGS_KEY,
        "service_url = nope",
    )]));
    let result = PetFinderSensor::new(store, Box::new(ScriptedTransport::unused())).await;

    assert!(matches!(result, Err(Error::ConfigUnavailable(_))));
}

#[tokio::test]
async fn invalid_settings_abort_construction() {
    let mut settings = interval_settings(10, None, None);
    settings["api_key"] = serde_json::json!("");
    let store = Arc::new(seeded_store(&settings, None));

    let result = PetFinderSensor::new(store, Box::new(ScriptedTransport::unused())).await;
    assert!(matches!(result, Err(Error::ConfigUnavailable(_))));

    let zero_quota = counter_settings(0, 0);
    let store = Arc::new(seeded_store(&zero_quota, None));
    let result = PetFinderSensor::new(store, Box::new(ScriptedTransport::unused())).await;
    assert!(matches!(result, Err(Error::ConfigUnavailable(_))));
}

#[tokio::test]
async fn file_backed_sensor_survives_restart() {
    let dir = tempdir().unwrap();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let fresh = body(vec![pet("newer", t0 + Duration::hours(1))]);

    let store = FileDocumentStore::new(dir.path()).await.unwrap();
    store
        .save(
            DEFAULT_SETTINGS_KEY,
            &interval_settings(3600, None, Some(t0)).to_string(),
        )
        .await
        .unwrap();

    // First run: live call, content consumed
    {
        let transport = ScriptedTransport::new([Step::Respond(200, fresh.clone())]);
        let mut sensor =
            PetFinderSensor::new(Arc::new(store.clone()), Box::new(transport.clone()))
                .await
                .unwrap();

        let content = sensor.get_content(None).await.unwrap();
        assert_eq!(ids(&content), vec!["newer"]);
        assert_eq!(transport.call_count(), 1);
    }

    let cached = tokio::fs::read_to_string(store.path_for(DEFAULT_CACHE_KEY))
        .await
        .unwrap();
    assert_eq!(cached, fresh);

    // Second run: still throttled, watermark remembered
    {
        let transport = ScriptedTransport::unused();
        let mut sensor =
            PetFinderSensor::new(Arc::new(store.clone()), Box::new(transport.clone()))
                .await
                .unwrap();

        assert!(sensor.settings().last_checked_at.unwrap() > t0);
        assert_eq!(sensor.has_updates(None).await.unwrap(), 0);
        assert!(sensor.get_content(None).await.unwrap().is_empty());
        assert_eq!(ids(&sensor.get_all().await.unwrap()), vec!["newer"]);
        assert_eq!(transport.call_count(), 0);
    }
}
