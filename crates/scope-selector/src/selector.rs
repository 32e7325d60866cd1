//! # Target Selector
//!
//! The control a host form embeds: one [`SelectionState`], one
//! [`HierarchyCache`], a repository to load from and a sink to confirm
//! into.
//!
//! Transitions are synchronous. Those that need data return a
//! [`FetchRequest`]; the host executes it with [`crate::load`] (possibly
//! concurrently with further transitions) and feeds the [`FetchOutcome`]
//! back through [`TargetSelector::apply`], which drops it if the operator
//! has moved on since the request was issued. The `*_and_load` methods do
//! both steps inline for callers that don't need the split.

use scope_client::TaxonomyRepository;
use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};
use scope_state::{
    display_label, normalize, SelectionError, SelectionLabel, SelectionState, TargetingDescriptor,
};

use crate::cache::{FetchRequest, FetchTarget, HierarchyCache, LoadFailure};
use crate::config::SelectorConfig;
use crate::loader::{load, FetchOutcome};
use crate::sink::DescriptorSink;

/// Multi-taxonomy targeting selector.
#[derive(Debug)]
pub struct TargetSelector<R, S> {
    repo: R,
    sink: S,
    config: SelectorConfig,
    state: SelectionState,
    cache: HierarchyCache,
}

impl<R: TaxonomyRepository, S: DescriptorSink> TargetSelector<R, S> {
    /// A fresh selector: `ORIGINAL` active, nothing selected, nothing loaded.
    pub fn new(repo: R, sink: S, config: SelectorConfig) -> Self {
        Self {
            repo,
            sink,
            config,
            state: SelectionState::new(),
            cache: HierarchyCache::new(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn cache(&self) -> &HierarchyCache {
        &self.cache
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn taxonomy(&self) -> TaxonomyKind {
        self.state.taxonomy()
    }

    /// The current load-failure banner.
    pub fn failure(&self) -> Option<&LoadFailure> {
        self.cache.failure()
    }

    /// Summary of the current selection.
    pub fn label(&self) -> SelectionLabel {
        display_label(&self.state)
    }

    /// Loaded roots of the active taxonomy.
    pub fn roots(&self) -> &[HierarchyNode] {
        self.cache.roots(self.state.taxonomy())
    }

    /// The nodes that can be picked at `level` right now: the roots at the
    /// root level, otherwise the loaded children of the node selected one
    /// level up.
    pub fn options(&self, level: Level) -> &[HierarchyNode] {
        let taxonomy = self.state.taxonomy();
        if self.cache.root_level(taxonomy) == Some(level) {
            return self.cache.roots(taxonomy);
        }
        let Some(parent_level) = level.parent_in(taxonomy) else {
            return &[];
        };
        let Some(parent) = self.state.slot(parent_level) else {
            return &[];
        };
        self.cache
            .find(taxonomy, parent_level, &parent.id)
            .map(HierarchyNode::children)
            .unwrap_or_default()
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Request for the active taxonomy's roots, unless they are loaded or
    /// the taxonomy has none.
    pub fn roots_request(&self) -> Option<FetchRequest> {
        let taxonomy = self.state.taxonomy();
        if self.cache.roots_loaded(taxonomy) {
            return None;
        }
        let level = self.config.root_level(taxonomy)?;
        Some(self.cache.request(taxonomy, FetchTarget::Roots { level }))
    }

    /// Switch taxonomy. Every taxonomy's slots are cleared and every
    /// outstanding fetch becomes stale.
    pub fn select_taxonomy(&mut self, kind: TaxonomyKind) -> Option<FetchRequest> {
        self.state.select_taxonomy(kind);
        self.cache.bump_generation();
        self.cache.clear_failure();
        self.roots_request()
    }

    /// Pick the loaded node `id` at `level`. Returns the children request
    /// when `level` has a deeper level whose nodes are not loaded yet.
    pub fn pick(&mut self, level: Level, id: &NodeId) -> Result<Option<FetchRequest>, SelectionError> {
        let taxonomy = self.state.taxonomy();
        if !taxonomy.has_levels() {
            return Err(SelectionError::GlobalHasNoLevels);
        }
        if !taxonomy.contains(level) {
            return Err(SelectionError::LevelNotInTaxonomy { level, taxonomy });
        }
        let node = self
            .options(level)
            .iter()
            .find(|node| &node.id == id)
            .map(HierarchyNode::detached)
            .ok_or_else(|| SelectionError::UnknownNode {
                level,
                id: id.clone(),
            })?;

        let outcome = self.state.pick(level, &node)?;
        let Some(child_level) = outcome.next_level else {
            return Ok(None);
        };
        if self.cache.children_loaded(taxonomy, level, id) {
            return Ok(None);
        }
        Ok(Some(self.cache.request(
            taxonomy,
            FetchTarget::Children {
                parent: id.clone(),
                parent_level: level,
                child_level,
            },
        )))
    }

    /// Set the level confirmation stops at. Deeper picks are kept.
    pub fn change_level_target(&mut self, level: Level) -> Result<(), SelectionError> {
        self.state.change_level_target(level)
    }

    /// Unset `level` and everything below it.
    pub fn clear_from(&mut self, level: Level) -> Result<(), SelectionError> {
        self.state.clear_from(level)
    }

    /// Normalize the selection and hand the descriptor to the sink.
    ///
    /// Nothing is emitted when the selection cannot be confirmed yet.
    pub fn confirm(&mut self) -> Result<TargetingDescriptor, SelectionError> {
        match normalize(&self.state) {
            Ok(descriptor) => {
                tracing::info!(kind = %descriptor.kind(), level = ?descriptor.level(), "targeting confirmed");
                self.sink.emit(&descriptor);
                Ok(descriptor)
            }
            Err(e) => {
                tracing::debug!(error = %e, "confirmation rejected");
                Err(e)
            }
        }
    }

    // ── Fetch results ───────────────────────────────────────────────

    /// Whether a request's result would still be used: same generation,
    /// same active taxonomy, and for children, a parent that is still the
    /// selected node at its level.
    pub fn is_live(&self, request: &FetchRequest) -> bool {
        if !self.cache.is_current(request) || request.taxonomy != self.state.taxonomy() {
            return false;
        }
        match &request.target {
            FetchTarget::Roots { .. } => true,
            FetchTarget::Children {
                parent,
                parent_level,
                ..
            } => self
                .state
                .slot(*parent_level)
                .is_some_and(|node| &node.id == parent),
        }
    }

    /// Feed a fetch result back. Returns false when it was discarded as
    /// stale.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        let FetchOutcome {
            request,
            nodes,
            error,
        } = outcome;
        if !self.is_live(&request) {
            tracing::debug!(%request, generation = request.generation, current = self.cache.generation(), "discarding stale fetch result");
            return false;
        }
        if let Some(error) = error {
            self.cache.set_failure(LoadFailure { request, error });
            return true;
        }
        match &request.target {
            FetchTarget::Roots { level } => {
                self.cache.store_roots(request.taxonomy, *level, nodes);
            }
            FetchTarget::Children {
                parent,
                parent_level,
                ..
            } => {
                if !self
                    .cache
                    .attach_children(request.taxonomy, *parent_level, parent, nodes)
                {
                    tracing::debug!(%request, "parent no longer cached, discarding children");
                    return false;
                }
            }
        }
        self.cache.clear_failure();
        true
    }

    /// Re-issue the request behind the failure banner at the current
    /// generation. Drops the banner and returns `None` if that request no
    /// longer matches the live selection.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        let failed = self.cache.failure()?.request.clone();
        let request = FetchRequest {
            generation: self.cache.generation(),
            ..failed
        };
        if !self.is_live(&request) {
            self.cache.clear_failure();
            return None;
        }
        Some(request)
    }

    /// Make every outstanding fetch stale.
    pub fn cancel_pending(&mut self) {
        let generation = self.cache.bump_generation();
        tracing::debug!(generation, "pending fetches cancelled");
    }

    // ── Inline loading ──────────────────────────────────────────────

    /// Execute `request` against this selector's repository.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        load(&self.repo, request, &self.config).await
    }

    /// Execute and apply `request`, if any. Returns whether a result was
    /// applied.
    pub async fn run(&mut self, request: Option<FetchRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        let outcome = self.fetch(&request).await;
        self.apply(outcome)
    }

    /// Load the active taxonomy's roots if they are not loaded yet.
    pub async fn open(&mut self) -> bool {
        let request = self.roots_request();
        self.run(request).await
    }

    /// [`TargetSelector::select_taxonomy`], then load its roots.
    pub async fn select_taxonomy_and_load(&mut self, kind: TaxonomyKind) -> bool {
        let request = self.select_taxonomy(kind);
        self.run(request).await
    }

    /// [`TargetSelector::pick`], then load the next level.
    pub async fn pick_and_load(&mut self, level: Level, id: &NodeId) -> Result<bool, SelectionError> {
        let request = self.pick(level, id)?;
        Ok(self.run(request).await)
    }

    /// [`TargetSelector::retry`], then load.
    pub async fn retry_and_load(&mut self) -> bool {
        let request = self.retry();
        self.run(request).await
    }
}
