// # Transport Trait
//
// Defines the interface for the upstream HTTP call.
//
// ## Implementations
//
// - reqwest: `petsensor-http` crate
// - Tests: scripted doubles returning canned responses
//
// ## Usage
//
// ```rust,ignore
// use petsensor_core::Transport;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let transport = /* Transport implementation */;
//
//     let response = transport.fetch(&url).await?;
//     println!("{} ({} bytes)", response.status, response.body.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use url::Url;

/// Raw response from the upstream service
///
/// The body is kept verbatim so that it can be written to the record cache
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for transport implementations
///
/// # Contract
///
/// - Any response that arrives, whatever its status, is `Ok`.
/// - Connection failures and timeouts are `Err(Error::TransportFailure)`.
/// - No retries: the sensor's throttle counts attempts, and a hidden retry
///   would spend quota the sensor does not know about.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET request against `url`
    async fn fetch(&self, url: &Url) -> Result<TransportResponse, crate::Error>;
}
