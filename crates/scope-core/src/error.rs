//! # Error Types
//!
//! Errors raised while interpreting taxonomy and level identifiers that
//! arrive as text (CLI arguments, configuration, wire payloads).

use thiserror::Error;

/// Top-level error type for the foundational targeting types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The string does not name a known taxonomy.
    #[error("unknown taxonomy: {0:?}")]
    UnknownTaxonomy(String),

    /// The string does not name a known level.
    #[error("unknown level: {0:?}")]
    UnknownLevel(String),

    /// A node identifier was empty.
    #[error("node identifier must not be empty")]
    EmptyNodeId,
}
