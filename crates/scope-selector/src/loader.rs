//! # Guarded loader
//!
//! Executes a [`FetchRequest`] against a [`TaxonomyRepository`]. A load
//! never fails outright: every repository error and every timeout is
//! absorbed into an empty node list plus a [`LoadError`] the selector turns
//! into its failure banner.
//!
//! Roots are loaded from the pre-nested tree endpoint when the taxonomy
//! has one and the roots sit at its first level, then from the flat roots
//! listing, then given up as empty. Children are checked against the
//! requested parent: a missing `parent_id` is filled in, a conflicting one
//! is dropped as malformed.

use std::future::Future;
use std::time::Duration;

use scope_client::{RepositoryError, TaxonomyRepository};
use scope_core::{HierarchyNode, NodeId};

use crate::cache::{FetchRequest, FetchTarget};
use crate::config::SelectorConfig;

/// Why a load came back empty.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The repository did not answer within the fetch timeout.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The result of executing a [`FetchRequest`].
#[derive(Debug)]
pub struct FetchOutcome {
    pub request: FetchRequest,
    /// Loaded nodes; empty when the load failed.
    pub nodes: Vec<HierarchyNode>,
    /// Why the load failed, if it did.
    pub error: Option<LoadError>,
}

impl FetchOutcome {
    fn loaded(request: &FetchRequest, nodes: Vec<HierarchyNode>) -> Self {
        Self {
            request: request.clone(),
            nodes,
            error: None,
        }
    }

    fn failed(request: &FetchRequest, error: LoadError) -> Self {
        Self {
            request: request.clone(),
            nodes: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Execute `request` against `repo`.
pub async fn load<R: TaxonomyRepository>(
    repo: &R,
    request: &FetchRequest,
    config: &SelectorConfig,
) -> FetchOutcome {
    let taxonomy = request.taxonomy;
    let timeout = config.fetch_timeout;
    match &request.target {
        FetchTarget::Roots { level } => {
            let try_tree = config.use_tree_endpoint
                && taxonomy.supports_tree()
                && taxonomy.first_level() == Some(*level);
            if try_tree {
                match bounded(timeout, repo.fetch_full_tree(taxonomy)).await {
                    Ok(nodes) => {
                        tracing::debug!(%taxonomy, roots = nodes.len(), "loaded tree");
                        return FetchOutcome::loaded(request, nodes);
                    }
                    Err(e) => {
                        tracing::warn!(%taxonomy, error = %e, "tree load failed, falling back to roots listing");
                    }
                }
            }
            match bounded(timeout, repo.list_roots(taxonomy, *level)).await {
                Ok(nodes) => {
                    tracing::debug!(%taxonomy, %level, roots = nodes.len(), "loaded roots");
                    FetchOutcome::loaded(request, nodes)
                }
                Err(e) => {
                    tracing::warn!(%taxonomy, %level, error = %e, "roots load failed, showing none");
                    FetchOutcome::failed(request, e)
                }
            }
        }
        FetchTarget::Children {
            parent,
            child_level,
            ..
        } => match bounded(timeout, repo.list_children(taxonomy, parent, *child_level)).await {
            Ok(nodes) => {
                let nodes = link_to_parent(parent, nodes);
                tracing::debug!(%taxonomy, %parent, level = %child_level, children = nodes.len(), "loaded children");
                FetchOutcome::loaded(request, nodes)
            }
            Err(e) => {
                tracing::warn!(%taxonomy, %parent, level = %child_level, error = %e, "children load failed, showing none");
                FetchOutcome::failed(request, e)
            }
        },
    }
}

async fn bounded<F>(timeout: Duration, fut: F) -> Result<Vec<HierarchyNode>, LoadError>
where
    F: Future<Output = Result<Vec<HierarchyNode>, RepositoryError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(LoadError::from),
        Err(_) => Err(LoadError::TimedOut(timeout)),
    }
}

fn link_to_parent(parent: &NodeId, nodes: Vec<HierarchyNode>) -> Vec<HierarchyNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| match &node.parent_id {
            Some(p) if p != parent => {
                tracing::warn!(node = %node.id, claimed = %p, expected = %parent, "dropping child with mismatched parent");
                None
            }
            Some(_) => Some(node),
            None => {
                node.parent_id = Some(parent.clone());
                Some(node)
            }
        })
        .collect()
}
