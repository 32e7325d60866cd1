//! # Hierarchy Cache
//!
//! Holds the part of each taxonomy's tree loaded so far: the roots, and the
//! children attached to nodes as the operator drills down. Work that needs
//! data is described by a [`FetchRequest`] ticket stamped with the cache's
//! current generation. Bumping the generation (taxonomy switch, explicit
//! cancellation) makes every outstanding ticket stale.
//!
//! The cache also keeps the single load-failure banner shown to the
//! operator until a retry succeeds.

use std::collections::BTreeMap;

use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};

use crate::loader::LoadError;

/// What a fetch is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// The roots of the taxonomy at `level`.
    Roots { level: Level },
    /// The children of `parent` (selected at `parent_level`) at `child_level`.
    Children {
        parent: NodeId,
        parent_level: Level,
        child_level: Level,
    },
}

/// A fetch ticket. Issued by selector transitions, executed by
/// [`crate::load`], and handed back through [`crate::TargetSelector::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub taxonomy: TaxonomyKind,
    pub target: FetchTarget,
    /// Cache generation at issue time.
    pub generation: u64,
}

impl std::fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            FetchTarget::Roots { level } => write!(f, "{} roots at {level}", self.taxonomy),
            FetchTarget::Children {
                parent,
                child_level,
                ..
            } => write!(f, "{} {child_level} under {parent}", self.taxonomy),
        }
    }
}

/// The error banner: the last failed load and why it failed.
#[derive(Debug)]
pub struct LoadFailure {
    pub request: FetchRequest,
    pub error: LoadError,
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not load {}: {}", self.request, self.error)
    }
}

#[derive(Debug)]
struct Forest {
    level: Level,
    roots: Vec<HierarchyNode>,
}

/// Per-taxonomy loaded trees, the fetch generation, and the failure banner.
#[derive(Debug, Default)]
pub struct HierarchyCache {
    forests: BTreeMap<TaxonomyKind, Forest>,
    generation: u64,
    failure: Option<LoadFailure>,
}

impl HierarchyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fetch generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate every outstanding ticket.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Ticket for `target` at the current generation.
    pub fn request(&self, taxonomy: TaxonomyKind, target: FetchTarget) -> FetchRequest {
        FetchRequest {
            taxonomy,
            target,
            generation: self.generation,
        }
    }

    /// Whether `request` was issued at the current generation.
    pub fn is_current(&self, request: &FetchRequest) -> bool {
        request.generation == self.generation
    }

    // ── Roots ───────────────────────────────────────────────────────

    /// Whether roots for `taxonomy` have been loaded successfully.
    pub fn roots_loaded(&self, taxonomy: TaxonomyKind) -> bool {
        self.forests.contains_key(&taxonomy)
    }

    /// Loaded roots of `taxonomy`; empty when none are loaded.
    pub fn roots(&self, taxonomy: TaxonomyKind) -> &[HierarchyNode] {
        self.forests
            .get(&taxonomy)
            .map(|f| f.roots.as_slice())
            .unwrap_or_default()
    }

    /// Level the loaded roots of `taxonomy` sit at.
    pub fn root_level(&self, taxonomy: TaxonomyKind) -> Option<Level> {
        self.forests.get(&taxonomy).map(|f| f.level)
    }

    /// Replace `taxonomy`'s roots. Pre-nested subtrees are kept and their
    /// parent links filled in.
    pub fn store_roots(&mut self, taxonomy: TaxonomyKind, level: Level, mut roots: Vec<HierarchyNode>) {
        for root in &mut roots {
            root.link_descendants();
        }
        self.forests.insert(taxonomy, Forest { level, roots });
    }

    // ── Nodes ───────────────────────────────────────────────────────

    /// Find the loaded node `id` at `level` of `taxonomy`.
    pub fn find(&self, taxonomy: TaxonomyKind, level: Level, id: &NodeId) -> Option<&HierarchyNode> {
        let forest = self.forests.get(&taxonomy)?;
        let depth = relative_depth(taxonomy, forest.level, level)?;
        forest.roots.iter().find_map(|root| root.descendant(depth, id))
    }

    fn find_mut(&mut self, taxonomy: TaxonomyKind, level: Level, id: &NodeId) -> Option<&mut HierarchyNode> {
        let forest = self.forests.get_mut(&taxonomy)?;
        let depth = relative_depth(taxonomy, forest.level, level)?;
        forest
            .roots
            .iter_mut()
            .find_map(|root| root.descendant_mut(depth, id))
    }

    /// Whether the node `id` at `level` already has its children attached.
    pub fn children_loaded(&self, taxonomy: TaxonomyKind, level: Level, id: &NodeId) -> bool {
        self.find(taxonomy, level, id)
            .is_some_and(HierarchyNode::children_loaded)
    }

    /// Attach `children` to the node `parent` at `parent_level`. Returns
    /// false when that node is not in the cache.
    pub fn attach_children(
        &mut self,
        taxonomy: TaxonomyKind,
        parent_level: Level,
        parent: &NodeId,
        children: Vec<HierarchyNode>,
    ) -> bool {
        match self.find_mut(taxonomy, parent_level, parent) {
            Some(node) => {
                node.attach_children(children);
                true
            }
            None => false,
        }
    }

    // ── Failure banner ──────────────────────────────────────────────

    /// The current load failure, if any.
    pub fn failure(&self) -> Option<&LoadFailure> {
        self.failure.as_ref()
    }

    pub fn set_failure(&mut self, failure: LoadFailure) {
        self.failure = Some(failure);
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }
}

fn relative_depth(taxonomy: TaxonomyKind, root_level: Level, level: Level) -> Option<usize> {
    level
        .depth_in(taxonomy)?
        .checked_sub(root_level.depth_in(taxonomy)?)
}
