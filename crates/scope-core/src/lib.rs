//! # scope-core -- Foundational Types for Organization Targeting
//!
//! Defines the data model every targeting crate in the workspace shares:
//! the closed set of hierarchy taxonomies, the level chain each taxonomy
//! uses, the hierarchy nodes fetched from the taxonomy repository, and the
//! typed node identifier.
//!
//! ## Key Design Principles
//!
//! 1. **Closed enumerations.** `TaxonomyKind` and `Level` are exhaustive enums.
//!    Adding a taxonomy or a level forces every `match` in the workspace to
//!    handle it.
//!
//! 2. **Level chains are static.** `TaxonomyKind::levels()` is the only place
//!    that says which levels a taxonomy has and in which order. Parent/child
//!    level navigation is derived from it.
//!
//! 3. **No bare strings for identifiers.** Node ids are `NodeId`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `scope-*` crates (this is the leaf of the DAG).
//! - No I/O, no async.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod node;
pub mod taxonomy;

pub use error::ScopeError;
pub use identity::NodeId;
pub use node::HierarchyNode;
pub use taxonomy::{Level, TaxonomyKind, HIERARCHICAL_LEVELS};
