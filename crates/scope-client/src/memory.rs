//! In-memory taxonomy repository.
//!
//! Serves pre-nested fixture trees with the same contract as the HTTP
//! client. Used by tests and by the CLI's `--fixture` mode. Each taxonomy's
//! forest starts at a root level (the first level of its chain unless set
//! otherwise); roots listed at any other level come back empty.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};

use crate::error::RepositoryError;
use crate::repository::TaxonomyRepository;

#[derive(Debug, Clone)]
struct Forest {
    root_level: Level,
    roots: Vec<HierarchyNode>,
}

/// Fixture file layout: one pre-nested node list per taxonomy.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FixtureFile {
    original: Vec<HierarchyNode>,
    expatriate: Vec<HierarchyNode>,
    sector: Vec<HierarchyNode>,
}

/// A [`TaxonomyRepository`] backed by in-memory trees.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    forests: BTreeMap<TaxonomyKind, Forest>,
    outages: BTreeSet<TaxonomyKind>,
    tree_enabled: bool,
    requests: AtomicUsize,
}

impl InMemoryRepository {
    /// An empty repository with the tree endpoint enabled.
    pub fn new() -> Self {
        Self {
            tree_enabled: true,
            ..Self::default()
        }
    }

    /// Parse a fixture file: `{"original": [...], "expatriate": [...], "sector": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: FixtureFile = serde_json::from_str(json)?;
        Ok(Self::new()
            .with_tree(TaxonomyKind::Original, fixture.original)
            .with_tree(TaxonomyKind::Expatriate, fixture.expatriate)
            .with_tree(TaxonomyKind::Sector, fixture.sector))
    }

    /// Install `roots` as the forest of `taxonomy`, rooted at its first level.
    pub fn with_tree(self, taxonomy: TaxonomyKind, roots: Vec<HierarchyNode>) -> Self {
        match taxonomy.first_level() {
            Some(level) => self.with_rooted_tree(taxonomy, level, roots),
            None => self,
        }
    }

    /// Install `roots` as the forest of `taxonomy`, rooted at `root_level`.
    pub fn with_rooted_tree(
        mut self,
        taxonomy: TaxonomyKind,
        root_level: Level,
        mut roots: Vec<HierarchyNode>,
    ) -> Self {
        for root in &mut roots {
            root.link_descendants();
        }
        self.forests.insert(taxonomy, Forest { root_level, roots });
        self
    }

    /// Make every call for `taxonomy` fail as unavailable.
    pub fn with_outage(mut self, taxonomy: TaxonomyKind) -> Self {
        self.outages.insert(taxonomy);
        self
    }

    /// Disable the pre-nested tree endpoint.
    pub fn without_tree_endpoint(mut self) -> Self {
        self.tree_enabled = false;
        self
    }

    /// Number of calls served so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin(&self, taxonomy: TaxonomyKind) -> Result<Option<&Forest>, RepositoryError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.outages.contains(&taxonomy) {
            return Err(RepositoryError::Unavailable {
                reason: format!("{taxonomy} repository offline"),
            });
        }
        Ok(self.forests.get(&taxonomy))
    }

    fn roots_at(&self, taxonomy: TaxonomyKind, level: Level) -> Result<Vec<HierarchyNode>, RepositoryError> {
        let Some(forest) = self.begin(taxonomy)? else {
            return Ok(Vec::new());
        };
        if forest.root_level != level {
            return Ok(Vec::new());
        }
        Ok(forest.roots.iter().map(HierarchyNode::detached).collect())
    }

    fn children_of(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        let Some(forest) = self.begin(taxonomy)? else {
            return Ok(Vec::new());
        };
        let (Some(root_depth), Some(child_depth)) = (
            forest.root_level.depth_in(taxonomy),
            child_level.depth_in(taxonomy),
        ) else {
            return Ok(Vec::new());
        };
        let Some(parent_depth) = child_depth
            .checked_sub(1)
            .and_then(|d| d.checked_sub(root_depth))
        else {
            return Ok(Vec::new());
        };
        Ok(forest
            .roots
            .iter()
            .find_map(|root| root.descendant(parent_depth, parent_id))
            .map(|parent| parent.children().iter().map(HierarchyNode::detached).collect())
            .unwrap_or_default())
    }

    fn tree(&self, taxonomy: TaxonomyKind) -> Result<Vec<HierarchyNode>, RepositoryError> {
        if !self.tree_enabled || !taxonomy.supports_tree() {
            return Err(RepositoryError::Unsupported {
                operation: "fetch_full_tree",
            });
        }
        Ok(self
            .begin(taxonomy)?
            .map(|forest| forest.roots.clone())
            .unwrap_or_default())
    }
}

impl TaxonomyRepository for InMemoryRepository {
    async fn list_roots(
        &self,
        taxonomy: TaxonomyKind,
        level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        self.roots_at(taxonomy, level)
    }

    async fn list_children(
        &self,
        taxonomy: TaxonomyKind,
        parent_id: &NodeId,
        child_level: Level,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        self.children_of(taxonomy, parent_id, child_level)
    }

    async fn fetch_full_tree(
        &self,
        taxonomy: TaxonomyKind,
    ) -> Result<Vec<HierarchyNode>, RepositoryError> {
        self.tree(taxonomy)
    }
}
