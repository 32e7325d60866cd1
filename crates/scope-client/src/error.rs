//! Taxonomy repository error types.

/// Errors from taxonomy repository calls.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Taxonomy API returned a non-2xx status.
    #[error("taxonomy API {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The repository does not offer this operation.
    #[error("{operation} is not supported by this repository")]
    Unsupported { operation: &'static str },
    /// The repository cannot serve the request right now.
    #[error("taxonomy repository unavailable: {reason}")]
    Unavailable { reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
