// # HTTP Transport
//
// This crate provides the reqwest-based Transport for the petsensor system.
//
// ## Purpose
//
// Performs the single GET request the sensor asks for and hands back the
// status and the verbatim body. All interpretation (parsing, status policy,
// cache fallback) belongs to petsensor-core.
//
// ## Constraints
//
// - One request per `fetch` call: no retries, the sensor counts attempts
// - Any response is `Ok`, whatever its status
// - Connection errors and timeouts are `Error::TransportFailure`
// - The request URL carries the API key and is never logged

use async_trait::async_trait;
use petsensor_core::traits::{Transport, TransportResponse};
use petsensor_core::{Error, Result};
use std::time::Duration;
use url::Url;

/// Default connect timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default overall request timeout
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// HTTP client
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the default timeouts
    pub fn new() -> Result<Self> {
        Self::with_timeouts(DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport with custom timeouts
    ///
    /// # Parameters
    ///
    /// - `connect_timeout`: Limit for establishing the connection
    /// - `request_timeout`: Limit for the whole request, body included
    pub fn with_timeouts(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("petsensor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &Url) -> Result<TransportResponse> {
        let host = url.host_str().unwrap_or("<unknown>").to_string();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::transport(describe(&host, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(describe(&host, e)))?;

        tracing::debug!("{} answered {} ({} bytes)", host, status, body.len());
        Ok(TransportResponse::new(status, body))
    }
}

/// Error text without the request URL (it carries the API key)
fn describe(host: &str, err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    format!("Request to {} {}: {}", host, kind, err.without_url())
}
