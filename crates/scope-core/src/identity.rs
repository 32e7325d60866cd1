//! # Node Identifier
//!
//! Node ids are opaque strings issued by the taxonomy repository. They are
//! unique within a level of one taxonomy and stable for the whole session.

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// Identifier of a hierarchy node, scoped to its taxonomy and level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, ScopeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ScopeError::EmptyNodeId);
        }
        Ok(Self(id))
    }

    /// Access the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl std::str::FromStr for NodeId {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
