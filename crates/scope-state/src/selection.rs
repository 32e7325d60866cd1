//! # Cascading Selection State Machine
//!
//! Tracks which node is chosen at each level of each taxonomy, which
//! taxonomy is active, and the level at which the operator wants to stop.
//!
//! ## Transitions
//!
//! ```text
//! select_taxonomy(kind) ──▶ active = kind, every taxonomy's slots cleared,
//!                           confirm-at marker reset
//!
//! pick(level, node)     ──▶ slots[level] = node, every deeper slot cleared
//!                           (a parentless node also clears shallower slots)
//!
//! clear_from(level)     ──▶ slots[level..] cleared
//!
//! change_level_target   ──▶ confirm-at = level, slots untouched
//! ```
//!
//! ## Slot Invariant
//!
//! The set slots of a taxonomy form one contiguous run whose shallowest
//! node is a root (has no `parent_id`), and each node's `parent_id` names
//! the node in the slot directly above it. When the repository lists roots
//! at the first level of the chain, this is exactly "if a level is set,
//! every shallower level is set".
//!
//! Switching taxonomy discards in-progress picks in every taxonomy, not
//! only the one being left.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};

// ─── Errors ──────────────────────────────────────────────────────────

/// A rejected selection transition. State is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// `GLOBAL` has no levels to pick from.
    #[error("taxonomy GLOBAL has no levels")]
    GlobalHasNoLevels,

    /// The level is not part of the active taxonomy's chain.
    #[error("level {level} is not part of taxonomy {taxonomy}")]
    LevelNotInTaxonomy {
        /// Requested level.
        level: Level,
        /// Active taxonomy.
        taxonomy: TaxonomyKind,
    },

    /// The node's parent level has nothing selected.
    #[error("cannot pick at {level} before a {parent_level} is selected")]
    ParentUnset {
        /// Requested level.
        level: Level,
        /// Level whose slot must be set first.
        parent_level: Level,
    },

    /// The node belongs under a different parent than the one selected.
    #[error("node at {level} belongs to {actual}, but {expected} is selected above it")]
    ParentMismatch {
        /// Requested level.
        level: Level,
        /// Id currently selected at the parent level.
        expected: NodeId,
        /// The node's declared parent.
        actual: NodeId,
    },

    /// Confirmation was requested before the required slot was set.
    #[error("cannot confirm {taxonomy} selection: {}", missing_description(.level))]
    PrematureConfirm {
        /// Active taxonomy.
        taxonomy: TaxonomyKind,
        /// The unset level, or `None` when nothing at all is selected.
        level: Option<Level>,
    },

    /// The node is not present in the loaded hierarchy.
    #[error("node {id} is not loaded at {level}")]
    UnknownNode {
        /// Requested level.
        level: Level,
        /// Requested node.
        id: NodeId,
    },
}

/// A persisted selection that does not describe a reachable state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("{kind} record has {actual} slots, its chain has {expected} levels")]
    SlotCount {
        kind: TaxonomyKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} slots have a gap or a broken parent link")]
    Inconsistent { kind: TaxonomyKind },

    #[error("record stored under {key} belongs to {kind}")]
    MisfiledRecord {
        key: TaxonomyKind,
        kind: TaxonomyKind,
    },

    #[error("no slot record for {0}")]
    MissingRecord(TaxonomyKind),

    #[error("confirm-at level {level} is not part of taxonomy {taxonomy}")]
    TargetOutsideTaxonomy {
        level: Level,
        taxonomy: TaxonomyKind,
    },
}

fn missing_description(level: &Option<Level>) -> String {
    match level {
        Some(level) => format!("no {} selected", level.label().to_lowercase()),
        None => "nothing selected".to_string(),
    }
}

// ─── Per-taxonomy slots ──────────────────────────────────────────────

/// The slot record for one taxonomy: for each level of its chain, either
/// unset or the chosen node.
///
/// Deserialization rejects records whose slot count does not match the
/// chain or whose slots break the slot invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTaxonomySelection")]
pub struct TaxonomySelection {
    kind: TaxonomyKind,
    slots: Vec<Option<HierarchyNode>>,
}

#[derive(Deserialize)]
struct RawTaxonomySelection {
    kind: TaxonomyKind,
    slots: Vec<Option<HierarchyNode>>,
}

impl TryFrom<RawTaxonomySelection> for TaxonomySelection {
    type Error = DraftError;

    fn try_from(raw: RawTaxonomySelection) -> Result<Self, Self::Error> {
        let expected = raw.kind.levels().len();
        if raw.slots.len() != expected {
            return Err(DraftError::SlotCount {
                kind: raw.kind,
                expected,
                actual: raw.slots.len(),
            });
        }
        let selection = Self {
            kind: raw.kind,
            slots: raw.slots,
        };
        if !selection.is_consistent() {
            return Err(DraftError::Inconsistent { kind: raw.kind });
        }
        Ok(selection)
    }
}

impl TaxonomySelection {
    /// A record with every slot unset.
    pub fn new(kind: TaxonomyKind) -> Self {
        Self {
            kind,
            slots: vec![None; kind.levels().len()],
        }
    }

    /// The taxonomy this record belongs to.
    pub fn kind(&self) -> TaxonomyKind {
        self.kind
    }

    /// The node chosen at `level`, if any.
    pub fn slot(&self, level: Level) -> Option<&HierarchyNode> {
        let depth = level.depth_in(self.kind)?;
        self.slots.get(depth)?.as_ref()
    }

    /// Whether every slot is unset.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Set slots in chain order, root-most first.
    pub fn set_slots(&self) -> impl Iterator<Item = (Level, &HierarchyNode)> + '_ {
        self.kind
            .levels()
            .iter()
            .zip(&self.slots)
            .filter_map(|(level, slot)| slot.as_ref().map(|node| (*level, node)))
    }

    /// The shallowest set slot.
    pub fn anchor(&self) -> Option<(Level, &HierarchyNode)> {
        self.set_slots().next()
    }

    /// The deepest set slot.
    pub fn deepest(&self) -> Option<(Level, &HierarchyNode)> {
        self.set_slots().last()
    }

    /// Whether the set slots satisfy the slot invariant: contiguous, rooted
    /// at a parentless node (or the chain's first level), and linked
    /// parent-to-child.
    pub fn is_consistent(&self) -> bool {
        let Some(start) = self.slots.iter().position(Option::is_some) else {
            return true;
        };
        let run_end = self.slots[start..]
            .iter()
            .position(Option::is_none)
            .map_or(self.slots.len(), |offset| start + offset);
        if self.slots[run_end..].iter().any(Option::is_some) {
            return false;
        }
        let run: Vec<&HierarchyNode> = self.slots[start..run_end].iter().flatten().collect();
        if start > 0 && !run[0].is_root() {
            return false;
        }
        run.windows(2)
            .all(|pair| pair[1].parent_id.as_ref() == Some(&pair[0].id))
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    fn clear_from_depth(&mut self, depth: usize) {
        self.slots
            .iter_mut()
            .skip(depth)
            .for_each(|slot| *slot = None);
    }
}

// ─── Transition log ──────────────────────────────────────────────────

/// Kind of state change recorded in the transition log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionAction {
    TaxonomySelected,
    Picked,
    Cleared,
    TargetChanged,
}

impl std::fmt::Display for SelectionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TaxonomySelected => "TAXONOMY_SELECTED",
            Self::Picked => "PICKED",
            Self::Cleared => "CLEARED",
            Self::TargetChanged => "TARGET_CHANGED",
        };
        f.write_str(s)
    }
}

/// Record of one applied selection transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionTransitionRecord {
    pub action: SelectionAction,
    /// Active taxonomy after the transition.
    pub taxonomy: TaxonomyKind,
    pub level: Option<Level>,
    pub node_id: Option<NodeId>,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful `pick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    /// Whether any slot changed.
    pub changed: bool,
    /// The level whose children should be loaded next, `None` at a leaf.
    pub next_level: Option<Level>,
}

// ─── Selection state ─────────────────────────────────────────────────

/// The selector's complete selection state.
///
/// Round-trips through serde so a host can persist a form draft. A restored
/// draft must carry one valid record per hierarchical taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSelectionState")]
pub struct SelectionState {
    taxonomy: TaxonomyKind,
    selections: BTreeMap<TaxonomyKind, TaxonomySelection>,
    confirm_at: Option<Level>,
    transitions: Vec<SelectionTransitionRecord>,
}

#[derive(Deserialize)]
struct RawSelectionState {
    taxonomy: TaxonomyKind,
    selections: BTreeMap<TaxonomyKind, TaxonomySelection>,
    confirm_at: Option<Level>,
    #[serde(default)]
    transitions: Vec<SelectionTransitionRecord>,
}

impl TryFrom<RawSelectionState> for SelectionState {
    type Error = DraftError;

    fn try_from(raw: RawSelectionState) -> Result<Self, Self::Error> {
        for (key, selection) in &raw.selections {
            if *key != selection.kind() || !key.has_levels() {
                return Err(DraftError::MisfiledRecord {
                    key: *key,
                    kind: selection.kind(),
                });
            }
        }
        if let Some(missing) = TaxonomyKind::all()
            .iter()
            .find(|kind| kind.has_levels() && !raw.selections.contains_key(*kind))
        {
            return Err(DraftError::MissingRecord(*missing));
        }
        if let Some(level) = raw.confirm_at {
            if !raw.taxonomy.contains(level) {
                return Err(DraftError::TargetOutsideTaxonomy {
                    level,
                    taxonomy: raw.taxonomy,
                });
            }
        }
        Ok(Self {
            taxonomy: raw.taxonomy,
            selections: raw.selections,
            confirm_at: raw.confirm_at,
            transitions: raw.transitions,
        })
    }
}

impl SelectionState {
    /// Fresh state: `ORIGINAL` active, every slot unset.
    pub fn new() -> Self {
        let selections = TaxonomyKind::all()
            .iter()
            .filter(|kind| kind.has_levels())
            .map(|kind| (*kind, TaxonomySelection::new(*kind)))
            .collect();
        Self {
            taxonomy: TaxonomyKind::Original,
            selections,
            confirm_at: None,
            transitions: Vec::new(),
        }
    }

    /// The active taxonomy.
    pub fn taxonomy(&self) -> TaxonomyKind {
        self.taxonomy
    }

    /// Slot record of `kind`. `None` for `GLOBAL`.
    pub fn selection(&self, kind: TaxonomyKind) -> Option<&TaxonomySelection> {
        self.selections.get(&kind)
    }

    /// Slot record of the active taxonomy. `None` when `GLOBAL` is active.
    pub fn active_selection(&self) -> Option<&TaxonomySelection> {
        self.selection(self.taxonomy)
    }

    /// The node chosen at `level` in the active taxonomy.
    pub fn slot(&self, level: Level) -> Option<&HierarchyNode> {
        self.active_selection()?.slot(level)
    }

    /// The explicit confirm-at marker, if set.
    pub fn confirm_at(&self) -> Option<Level> {
        self.confirm_at
    }

    /// The level `confirm()` will target: the marker if set, otherwise the
    /// deepest set level of the active taxonomy.
    pub fn effective_target(&self) -> Option<Level> {
        self.confirm_at
            .or_else(|| self.active_selection()?.deepest().map(|(level, _)| level))
    }

    /// Whether `confirm()` would succeed.
    pub fn can_confirm(&self) -> bool {
        if self.taxonomy == TaxonomyKind::Global {
            return true;
        }
        self.effective_target()
            .is_some_and(|level| self.slot(level).is_some())
    }

    /// Ordered log of applied transitions.
    pub fn transitions(&self) -> &[SelectionTransitionRecord] {
        &self.transitions
    }

    /// Switch the active taxonomy.
    ///
    /// Clears the slots of every taxonomy and the confirm-at marker, even
    /// when `kind` is already active.
    pub fn select_taxonomy(&mut self, kind: TaxonomyKind) {
        for selection in self.selections.values_mut() {
            selection.clear();
        }
        self.taxonomy = kind;
        self.confirm_at = None;
        tracing::debug!(taxonomy = %kind, "taxonomy selected, all slots cleared");
        self.record(SelectionAction::TaxonomySelected, None, None);
    }

    /// Choose `node` at `level` of the active taxonomy.
    ///
    /// A node with a `parent_id` below the first level requires its parent
    /// to be the node selected one level up. A parentless node is a root
    /// and starts a fresh chain at `level`. On success every slot deeper
    /// than `level` is cleared.
    pub fn pick(&mut self, level: Level, node: &HierarchyNode) -> Result<PickOutcome, SelectionError> {
        let taxonomy = self.taxonomy;
        let selection = self
            .selections
            .get_mut(&taxonomy)
            .ok_or(SelectionError::GlobalHasNoLevels)?;
        let depth = level
            .depth_in(taxonomy)
            .ok_or(SelectionError::LevelNotInTaxonomy { level, taxonomy })?;

        if let (Some(parent_id), Some(parent_level)) = (&node.parent_id, level.parent_in(taxonomy)) {
            match selection.slot(parent_level) {
                None => {
                    return Err(SelectionError::ParentUnset {
                        level,
                        parent_level,
                    })
                }
                Some(parent) if &parent.id != parent_id => {
                    return Err(SelectionError::ParentMismatch {
                        level,
                        expected: parent.id.clone(),
                        actual: parent_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        let before = selection.slots.clone();
        if node.is_root() {
            selection.clear();
        } else {
            selection.clear_from_depth(depth + 1);
        }
        if let Some(slot) = selection.slots.get_mut(depth) {
            *slot = Some(node.detached());
        }
        let changed = selection.slots != before;

        if changed {
            tracing::debug!(%taxonomy, %level, node = %node.id, "picked node");
            self.record(SelectionAction::Picked, Some(level), Some(node.id.clone()));
        }
        Ok(PickOutcome {
            changed,
            next_level: level.child_in(taxonomy),
        })
    }

    /// Unset `level` and every deeper level of the active taxonomy.
    pub fn clear_from(&mut self, level: Level) -> Result<(), SelectionError> {
        let taxonomy = self.taxonomy;
        let selection = self
            .selections
            .get_mut(&taxonomy)
            .ok_or(SelectionError::GlobalHasNoLevels)?;
        let depth = level
            .depth_in(taxonomy)
            .ok_or(SelectionError::LevelNotInTaxonomy { level, taxonomy })?;
        if selection
            .slots
            .get(depth..)
            .unwrap_or_default()
            .iter()
            .all(Option::is_none)
        {
            return Ok(());
        }
        selection.clear_from_depth(depth);
        self.record(SelectionAction::Cleared, Some(level), None);
        Ok(())
    }

    /// Set the level `confirm()` stops at. Deeper picks are kept so the
    /// operator can narrow back without walking the tree again.
    pub fn change_level_target(&mut self, level: Level) -> Result<(), SelectionError> {
        let taxonomy = self.taxonomy;
        if !taxonomy.has_levels() {
            return Err(SelectionError::GlobalHasNoLevels);
        }
        if !taxonomy.contains(level) {
            return Err(SelectionError::LevelNotInTaxonomy { level, taxonomy });
        }
        if self.confirm_at != Some(level) {
            self.confirm_at = Some(level);
            self.record(SelectionAction::TargetChanged, Some(level), None);
        }
        Ok(())
    }

    fn record(&mut self, action: SelectionAction, level: Option<Level>, node_id: Option<NodeId>) {
        self.transitions.push(SelectionTransitionRecord {
            action,
            taxonomy: self.taxonomy,
            level,
            node_id,
            timestamp: Utc::now(),
        });
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
