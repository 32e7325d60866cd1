//! # Selection Normalizer
//!
//! Pure functions over [`SelectionState`]: [`normalize`] produces the
//! targeting descriptor for a confirmation, and [`display_label`] produces
//! the "current selection" summary shown next to the picker.

use serde::{Deserialize, Serialize};

use scope_core::{HierarchyNode, Level, TaxonomyKind};

use crate::descriptor::{ChainLink, LevelChain, TargetingDescriptor};
use crate::selection::{SelectionError, SelectionState, TaxonomySelection};

/// Map a selection to its targeting descriptor.
///
/// `GLOBAL` always normalizes. Any other taxonomy needs a node at the
/// effective target level (the confirm-at marker, or the deepest set level
/// when no marker is set); otherwise the confirmation is premature.
pub fn normalize(state: &SelectionState) -> Result<TargetingDescriptor, SelectionError> {
    let taxonomy = state.taxonomy();
    let Some(selection) = state.active_selection() else {
        return Ok(TargetingDescriptor::Global);
    };
    let target = state
        .effective_target()
        .ok_or(SelectionError::PrematureConfirm {
            taxonomy,
            level: None,
        })?;
    let chain = chain_to(selection, target).ok_or(SelectionError::PrematureConfirm {
        taxonomy,
        level: Some(target),
    })?;

    match taxonomy {
        TaxonomyKind::Expatriate => {
            let region = chain.target;
            Ok(TargetingDescriptor::Expatriate {
                expatriate_region_id: region.id,
                expatriate_region_name: region.name,
            })
        }
        TaxonomyKind::Original => Ok(TargetingDescriptor::Original(chain.into_level_chain())),
        TaxonomyKind::Sector => Ok(TargetingDescriptor::Sector(chain.into_level_chain())),
        TaxonomyKind::Global => Ok(TargetingDescriptor::Global),
    }
}

struct Chain {
    ancestors: Vec<ChainLink>,
    target: ChainLink,
}

impl Chain {
    fn into_level_chain(self) -> LevelChain {
        LevelChain::new(self.ancestors, self.target)
    }
}

/// The unbroken run of set slots ending at `target`, anchor first.
fn chain_to(selection: &TaxonomySelection, target: Level) -> Option<Chain> {
    let target_node = selection.slot(target)?;
    let levels = selection.kind().levels();
    let depth = target.depth_in(selection.kind())?;

    let mut ancestors: Vec<ChainLink> = levels[..depth]
        .iter()
        .rev()
        .map_while(|level| selection.slot(*level).map(|node| link(*level, node)))
        .collect();
    ancestors.reverse();

    Some(Chain {
        ancestors,
        target: link(target, target_node),
    })
}

fn link(level: Level, node: &HierarchyNode) -> ChainLink {
    ChainLink {
        level,
        id: node.id.clone(),
        name: node.name.clone(),
    }
}

// ─── Display label ───────────────────────────────────────────────────

/// Which taxonomy a label describes, for picking an icon or prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelKind {
    Global,
    Expatriate,
    Geographic,
    Sector,
    /// A taxonomy with nothing selected yet.
    Unselected,
}

/// Summary of the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLabel {
    pub kind: LabelKind,
    /// Name of the deepest selected node, or a placeholder.
    pub text: String,
    /// Deepest selected level.
    pub level: Option<Level>,
    /// Names from the anchor down to the deepest node, joined with " / ".
    pub breadcrumb: String,
}

/// Summarize the deepest selected node of the active taxonomy.
pub fn display_label(state: &SelectionState) -> SelectionLabel {
    let Some(selection) = state.active_selection() else {
        return SelectionLabel {
            kind: LabelKind::Global,
            text: "Everyone".to_string(),
            level: None,
            breadcrumb: "Everyone".to_string(),
        };
    };
    let Some((level, node)) = selection.deepest() else {
        let prompt = selection
            .kind()
            .first_level()
            .map_or("Nothing selected".to_string(), |level| {
                format!("Select a {}", level.label().to_lowercase())
            });
        return SelectionLabel {
            kind: LabelKind::Unselected,
            text: prompt,
            level: None,
            breadcrumb: String::new(),
        };
    };

    let kind = match selection.kind() {
        TaxonomyKind::Expatriate => LabelKind::Expatriate,
        TaxonomyKind::Sector => LabelKind::Sector,
        TaxonomyKind::Original | TaxonomyKind::Global => LabelKind::Geographic,
    };
    let breadcrumb = selection
        .set_slots()
        .map(|(_, node)| node.name.as_str())
        .collect::<Vec<_>>()
        .join(" / ");

    SelectionLabel {
        kind,
        text: node.name.clone(),
        level: Some(level),
        breadcrumb,
    }
}
