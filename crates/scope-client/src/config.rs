//! Taxonomy API client configuration.
//!
//! Points the HTTP repository at the taxonomy service. Override via
//! environment variables or explicit construction for staging/testing.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

/// Configuration for connecting to the taxonomy service.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct TaxonomyApiConfig {
    /// Base URL of the taxonomy service.
    pub base_url: Url,
    /// Bearer token for API authentication.
    pub api_token: Zeroizing<String>,
    /// Time one repository call may take, retries included.
    pub request_budget: Duration,
}

/// Default budget per repository call. Matches the selector's default
/// fetch timeout so retries are planned inside the window it enforces.
const DEFAULT_REQUEST_BUDGET_MS: u64 = 10_000;

impl std::fmt::Debug for TaxonomyApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("request_budget", &self.request_budget)
            .finish()
    }
}

impl TaxonomyApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SCOPE_TAXONOMY_URL` (default: `http://localhost:8080`)
    /// - `SCOPE_API_TOKEN` (required)
    /// - `SCOPE_REQUEST_BUDGET_MS` (default: 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("SCOPE_API_TOKEN").map_err(|_| ConfigError::MissingToken)?;

        Ok(Self {
            base_url: env_url("SCOPE_TAXONOMY_URL", "http://localhost:8080")?,
            api_token: Zeroizing::new(api_token),
            request_budget: Duration::from_millis(
                std::env::var("SCOPE_REQUEST_BUDGET_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_BUDGET_MS),
            ),
        })
    }

    /// Cap the per-call budget at `limit`, typically the timeout the caller
    /// wraps each repository call in.
    pub fn within(mut self, limit: Duration) -> Self {
        self.request_budget = self.request_budget.min(limit);
        self
    }

    /// Create a configuration pointing to a local mock server (for testing).
    pub fn local_mock(port: u16, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(&format!("http://127.0.0.1:{port}"))
                .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?,
            api_token: Zeroizing::new(token.to_string()),
            request_budget: Duration::from_secs(5),
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SCOPE_API_TOKEN environment variable is required")]
    MissingToken,
    #[error("API token is not a valid HTTP header value")]
    InvalidToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
