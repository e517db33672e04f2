//! Live fetch with cache fallback
//!
//! ## Decision Flow
//!
//! ```text
//! allowed? ──no──► cache                         (no usage recorded)
//!    │
//!   yes ─► record usage + persist settings
//!    │
//! transport ──error──► cache
//!    │
//! parse body ──fail──► cache
//!    │
//! status 2xx? ──no──► cache
//!    │
//! upstream code 100? ──no──► cache
//!    │
//!   yes ─► write body to cache, return live payload
//! ```
//!
//! A cache that cannot be read on any fallback branch ends the call with
//! [`Error::NoDataAvailable`].

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::payload::RawPayload;
use crate::store::{ConfigStore, RecordCache};
use crate::throttle;
use crate::traits::Transport;

/// Why the cache was served instead of a live response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// `offline_mode` is set
    Offline,
    /// The throttle did not permit a live call
    Throttled,
    /// The transport could not complete the request
    TransportFailure,
    /// The response body was not a usable payload
    MalformedResponse,
    /// The HTTP status was not 2xx
    BadStatus(u16),
    /// HTTP succeeded but the upstream header refused the request (e.g. quota)
    UpstreamStatus(String),
}

/// Where a payload came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Fresh response from the service
    Live,
    /// Cached response, with the reason the live path was not used
    Cache(FallbackReason),
}

impl PayloadSource {
    /// Whether a network attempt was made for this payload
    pub fn attempted(&self) -> bool {
        !matches!(
            self,
            PayloadSource::Cache(FallbackReason::Offline | FallbackReason::Throttled)
        )
    }
}

/// Payload returned by [`fetch_or_fallback`]
#[derive(Debug, Clone)]
pub struct Fetched {
    /// The parsed payload
    pub payload: RawPayload,
    /// Where it came from
    pub source: PayloadSource,
}

/// Fetch a live payload when permitted, otherwise serve the cache
///
/// # Side Effects
///
/// When a live call is attempted, usage is recorded in `settings` and the
/// settings are persisted exactly once, before the transport is invoked.
/// When the throttle disallows the call, neither happens.
///
/// # Errors
///
/// Only [`Error::NoDataAvailable`], when a fallback is needed and the cache
/// is unusable.
pub async fn fetch_or_fallback(
    settings: &mut Settings,
    transport: &dyn Transport,
    config: &ConfigStore,
    cache: &RecordCache,
    now: DateTime<Utc>,
) -> Result<Fetched> {
    if !throttle::allowed(settings, now) {
        let reason = if settings.offline_mode {
            FallbackReason::Offline
        } else {
            FallbackReason::Throttled
        };
        warn!("The request was not allowed ({:?}), using saved data", reason);
        return from_cache(cache, reason).await;
    }

    throttle::record_usage(settings, now);
    config.persist(settings).await;
    debug!("Usage recorded before live call");

    let response = match settings.request_url() {
        Ok(url) => {
            info!(
                "Requesting {}{}",
                settings.service_endpoint, settings.service_method
            );
            transport.fetch(&url).await
        }
        Err(e) => Err(Error::transport(e.to_string())),
    };

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!("HTTP request failed: {}", e);
            return from_cache(cache, FallbackReason::TransportFailure).await;
        }
    };

    let payload = match RawPayload::parse(&response.body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                "The response from {} was not usable: {}",
                settings.service_endpoint, e
            );
            return from_cache(cache, FallbackReason::MalformedResponse).await;
        }
    };

    if !response.is_success() {
        warn!("The response status was {}, using saved data", response.status);
        return from_cache(cache, FallbackReason::BadStatus(response.status)).await;
    }

    if !payload.upstream_ok() {
        let code = payload.upstream_status().unwrap_or_default();
        warn!("Upstream refused the request with code {}, using saved data", code);
        return from_cache(cache, FallbackReason::UpstreamStatus(code)).await;
    }

    cache.write(&response.body).await;
    Ok(Fetched {
        payload,
        source: PayloadSource::Live,
    })
}

async fn from_cache(cache: &RecordCache, reason: FallbackReason) -> Result<Fetched> {
    match cache.read().await {
        Ok(payload) => Ok(Fetched {
            payload,
            source: PayloadSource::Cache(reason),
        }),
        Err(e) => {
            error!("Fallback after {:?} failed: {}", reason, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IntervalThrottle, Throttle};
    use crate::state::MemoryDocumentStore;
    use crate::store::{DEFAULT_CACHE_KEY, DEFAULT_SETTINGS_KEY};
    use crate::traits::TransportResponse;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    const CACHED: &str = r#"{"petfinder":{"pets":{"pet":{"id":{"$t":"cached"}}}}}"#;
    const LIVE: &str = r#"{"petfinder":{"pets":{"pet":{"id":{"$t":"live"}}}}}"#;

    struct OneShot {
        response: Option<TransportResponse>,
        calls: AtomicUsize,
    }

    impl OneShot {
        fn new(response: Option<TransportResponse>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for OneShot {
        async fn fetch(&self, _url: &Url) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .ok_or_else(|| Error::transport("connection refused"))
        }
    }

    fn settings() -> Settings {
        Settings {
            service_endpoint: "https://api.petfinder.com/".to_string(),
            service_method: "shelter.getPets".to_string(),
            api_key: "k".to_string(),
            shelter_or_query_id: "CA1234".to_string(),
            result_count: 25,
            response_format: "json".to_string(),
            query_params: BTreeMap::new(),
            offline_mode: false,
            throttle: Throttle::Interval(IntervalThrottle {
                min_request_interval_seconds: 10,
                last_request_at: None,
            }),
            last_checked_at: None,
        }
    }

    fn stores(cache: Option<&str>) -> (MemoryDocumentStore, ConfigStore, RecordCache) {
        let store = match cache {
            Some(body) => MemoryDocumentStore::with_documents([(DEFAULT_CACHE_KEY, body)]),
            None => MemoryDocumentStore::new(),
        };
        let shared: Arc<dyn crate::traits::DocumentStore> = Arc::new(store.clone());
        (
            store,
            ConfigStore::new(shared.clone(), DEFAULT_SETTINGS_KEY),
            RecordCache::new(shared, DEFAULT_CACHE_KEY),
        )
    }

    fn first_id(fetched: &Fetched) -> String {
        fetched.payload.items().unwrap()[0]["id"]["$t"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_live_success_writes_cache() {
        let (store, config, cache) = stores(Some(CACHED));
        let transport = OneShot::new(Some(TransportResponse::new(200, LIVE)));
        let mut s = settings();

        let fetched = fetch_or_fallback(&mut s, &transport, &config, &cache, Utc::now())
            .await
            .unwrap();

        assert_eq!(fetched.source, PayloadSource::Live);
        assert_eq!(first_id(&fetched), "live");
        assert_eq!(store.get(DEFAULT_CACHE_KEY).await.as_deref(), Some(LIVE));
    }

    #[tokio::test]
    async fn test_throttled_skips_transport_and_usage() {
        let (store, config, cache) = stores(Some(CACHED));
        let transport = OneShot::new(Some(TransportResponse::new(200, LIVE)));
        let now = Utc::now();
        let mut s = settings();
        s.throttle = Throttle::Interval(IntervalThrottle {
            min_request_interval_seconds: 3600,
            last_request_at: Some(now),
        });
        let before = s.clone();

        let fetched = fetch_or_fallback(&mut s, &transport, &config, &cache, now)
            .await
            .unwrap();

        assert_eq!(fetched.source, PayloadSource::Cache(FallbackReason::Throttled));
        assert!(!fetched.source.attempted());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(s, before);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_reason() {
        let (_store, config, cache) = stores(Some(CACHED));
        let transport = OneShot::new(None);
        let mut s = settings();
        s.offline_mode = true;

        let fetched = fetch_or_fallback(&mut s, &transport, &config, &cache, Utc::now())
            .await
            .unwrap();

        assert_eq!(fetched.source, PayloadSource::Cache(FallbackReason::Offline));
    }

    #[tokio::test]
    async fn test_bad_status_with_json_body_falls_back() {
        let (store, config, cache) = stores(Some(CACHED));
        let transport = OneShot::new(Some(TransportResponse::new(500, LIVE)));
        let mut s = settings();

        let fetched = fetch_or_fallback(&mut s, &transport, &config, &cache, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            fetched.source,
            PayloadSource::Cache(FallbackReason::BadStatus(500))
        );
        assert_eq!(first_id(&fetched), "cached");
        assert_eq!(store.get(DEFAULT_CACHE_KEY).await.as_deref(), Some(CACHED));
        // one usage record persisted
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_code_falls_back() {
        let (_store, config, cache) = stores(Some(CACHED));
        let body = r#"{"petfinder":{"header":{"status":{"code":{"$t":"300"}}},"pets":{}}}"#;
        let transport = OneShot::new(Some(TransportResponse::new(200, body)));
        let mut s = settings();

        let fetched = fetch_or_fallback(&mut s, &transport, &config, &cache, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            fetched.source,
            PayloadSource::Cache(FallbackReason::UpstreamStatus("300".to_string()))
        );
        assert!(fetched.source.attempted());
        assert_eq!(first_id(&fetched), "cached");
    }

    #[tokio::test]
    async fn test_fallback_without_cache_is_no_data() {
        let (_store, config, cache) = stores(None);
        let transport = OneShot::new(None);
        let mut s = settings();

        let err = fetch_or_fallback(&mut s, &transport, &config, &cache, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoDataAvailable(_)));
        // the attempt still counts
        assert!(matches!(
            s.throttle,
            Throttle::Interval(IntervalThrottle {
                last_request_at: Some(_),
                ..
            })
        ));
    }
}
