//! Configuration for the policy client.
//!
//! Provides the policy endpoint location, request timeout, and cache TTL.
//! Configuration is loaded from environment variables with sensible defaults
//! for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default path of the permissions config endpoint on the backend.
pub const DEFAULT_POLICY_PATH: &str = "/api/permissions/config";

/// Policy client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyClientConfig {
    /// Base URL of the backend serving the policy document
    /// (e.g., "https://api.muza.school").
    pub base_url: String,

    /// Path of the policy endpoint, joined onto `base_url`.
    pub policy_path: String,

    /// API key for service-to-service authentication, sent as a bearer
    /// token when present.
    pub api_key: Option<String>,

    /// Request timeout in seconds. Bounds every fetch; a fetch that exceeds
    /// it surfaces as an ordinary timeout error.
    pub timeout_secs: u64,

    /// How long a successfully fetched document is considered fresh, in
    /// seconds. After expiry the next resolution serves the stale document
    /// and refreshes in the background.
    pub cache_ttl_secs: u64,
}

impl Default for PolicyClientConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            policy_path: DEFAULT_POLICY_PATH.to_string(),
            api_key: None,
            timeout_secs: 10,
            cache_ttl_secs: 300,
        }
    }
}

impl PolicyClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MUZA_POLICY_URL`: backend base URL (default: http://localhost:8080)
    /// - `MUZA_POLICY_PATH`: policy endpoint path (default: /api/permissions/config)
    /// - `MUZA_POLICY_API_KEY`: bearer token for the policy endpoint
    /// - `MUZA_POLICY_TIMEOUT_SECS`: request timeout in seconds (default: 10)
    /// - `MUZA_POLICY_CACHE_TTL_SECS`: cache freshness window in seconds (default: 300)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: std::env::var("MUZA_POLICY_URL").unwrap_or(default.base_url),
            policy_path: std::env::var("MUZA_POLICY_PATH").unwrap_or(default.policy_path),
            api_key: std::env::var("MUZA_POLICY_API_KEY").ok(),
            timeout_secs: std::env::var("MUZA_POLICY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            cache_ttl_secs: std::env::var("MUZA_POLICY_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.cache_ttl_secs),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the cache freshness window as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Full URL of the policy endpoint.
    pub fn policy_url(&self) -> String {
        self.url(&self.policy_path)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check if API key authentication is available.
    pub fn has_auth(&self) -> bool {
        self.api_key.is_some()
    }
}
