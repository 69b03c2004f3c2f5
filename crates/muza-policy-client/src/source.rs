//! Policy source.
//!
//! The single network boundary of the policy client: one GET against the
//! policy endpoint per call, no internal retry, no side effects beyond the
//! request itself. Retry policy, coalescing, and fallback substitution all
//! belong to the resolver.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::PolicyClientConfig;

/// Transport-layer failures when fetching the policy document.
///
/// These are recoverable: the resolver substitutes the fallback policy for
/// any of them. They are logged distinctly from validation failures, which
/// indicate a policy-authoring bug rather than a flaky network.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint could not be reached (DNS, connection, protocol).
    #[error("Policy endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered with a non-success status.
    #[error("Policy endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// The request exceeded the configured timeout.
    #[error("Policy fetch timed out")]
    Timeout,
}

/// A source of raw policy documents.
///
/// Implementations perform exactly one fetch attempt per call. The resolver
/// owns everything above that: validation, fallback, caching, and the
/// decision to call again.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Fetch the raw policy document body.
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// HTTP policy source backed by the backend permissions endpoint.
#[derive(Clone)]
pub struct HttpPolicySource {
    /// HTTP client instance.
    client: Client,

    /// Endpoint configuration.
    config: PolicyClientConfig,
}

impl HttpPolicySource {
    /// Create a new HTTP policy source.
    ///
    /// The request timeout from `config` is applied at the client level, so
    /// every fetch is bounded without per-call plumbing.
    pub fn new(config: PolicyClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl PolicySource for HttpPolicySource {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let url = self.config.policy_url();
        debug!(%url, "Fetching policy document");

        let mut request = self.client.get(&url);
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Policy endpoint returned error status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(body.to_vec())
    }
}

/// Classify a reqwest error into the fetch taxonomy.
fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::Unreachable(err.to_string())
    }
}
