//! # Taxonomy Repository Interface
//!
//! The read-only view of the taxonomy backend the selector depends on.
//! Implementations return nodes exactly as the backend describes them;
//! parent linking and malformed-node filtering happen in the selector's
//! loader so every implementation is treated the same way.

use std::future::Future;
use std::sync::Arc;

use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};

use crate::error::RepositoryError;

/// Per-taxonomy tree/list data, fetched by parent identifier.
///
/// Implementations must be `Send + Sync` so a repository can be shared by
/// concurrently running fetches.
pub trait TaxonomyRepository: Send + Sync {
    /// List the roots of `taxonomy` at `level`.
    fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> impl Future<Output = Result<Vec<HierarchyNode>, RepositoryError>> + Send;

    /// List the nodes at `child_level` whose parent is `parent_id`.
    fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> impl Future<Output = Result<Vec<HierarchyNode>, RepositoryError>> + Send;

    /// Fetch the whole tree of `taxonomy`, pre-nested.
    ///
    /// Optional: the default reports the operation as unsupported, which
    /// makes callers fall back to [`TaxonomyRepository::list_roots`].
    fn fetch_full_tree(
        &self,
        taxonomy: TaxonomyKind,
    ) -> impl Future<Output = Result<Vec<HierarchyNode>, RepositoryError>> + Send {
        let _ = taxonomy;
        async {
            Err(RepositoryError::Unsupported {
                operation: "fetch_full_tree",
            })
        }
    }
}

impl<R: TaxonomyRepository> TaxonomyRepository for Arc<R> {
    fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> impl Future<Output = Result<Vec<HierarchyNode>, RepositoryError>> + Send {
        (**self).list_roots(taxonomy, level)
    }

    fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> impl Future<Output = Result<Vec<HierarchyNode>, RepositoryError>> + Send {
        (**self).list_children(taxonomy, parent_id, child_level)
    }

    fn fetch_full_tree(
        &self,
        taxonomy: TaxonomyKind,
    ) -> impl Future<Output = Result<Vec<HierarchyNode>, RepositoryError>> + Send {
        (**self).fetch_full_tree(taxonomy)
    }
}
