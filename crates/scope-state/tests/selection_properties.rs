//! Property tests for the cascading selection state machine.
//!
//! Random operation sequences are applied to a fresh `SelectionState` over a
//! synthetic catalog. Node `d{depth}n{k}` is a root when `depth == 0` or
//! `k == 3`, and otherwise the child of `d{depth-1}n{k % 2}`, so sequences
//! mix valid picks, parent mismatches, and mid-chain roots.

use proptest::prelude::*;

use scope_core::{HierarchyNode, Level, NodeId, TaxonomyKind};
use scope_state::{normalize, SelectionState, TargetingDescriptor};

#[derive(Debug, Clone)]
enum Op {
    SelectTaxonomy(TaxonomyKind),
    Pick { depth: usize, k: usize },
    ChangeTarget { depth: usize },
    ClearFrom { depth: usize },
}

fn node(depth: usize, k: usize, allow_mid_roots: bool) -> HierarchyNode {
    let id = NodeId::new(format!("d{depth}n{k}")).unwrap();
    let name = format!("Node {depth}.{k}");
    if depth == 0 || (allow_mid_roots && k == 3) {
        HierarchyNode::new(id, name)
    } else {
        let parent = NodeId::new(format!("d{}n{}", depth - 1, k % 2)).unwrap();
        HierarchyNode::new(id, name).with_parent(parent)
    }
}

fn taxonomy() -> impl Strategy<Value = TaxonomyKind> {
    prop::sample::select(TaxonomyKind::all().to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => taxonomy().prop_map(Op::SelectTaxonomy),
        6 => (0usize..5, 0usize..4).prop_map(|(depth, k)| Op::Pick { depth, k }),
        1 => (0usize..5).prop_map(|depth| Op::ChangeTarget { depth }),
        1 => (0usize..5).prop_map(|depth| Op::ClearFrom { depth }),
    ]
}

fn level_at(state: &SelectionState, depth: usize) -> Option<Level> {
    state.taxonomy().levels().get(depth).copied()
}

/// Apply `op`, ignoring rejections. Returns whether it was a successful pick
/// and at which level.
fn apply(state: &mut SelectionState, op: &Op, allow_mid_roots: bool) -> Option<Level> {
    match op {
        Op::SelectTaxonomy(kind) => {
            state.select_taxonomy(*kind);
            None
        }
        Op::Pick { depth, k } => {
            let level = level_at(state, *depth)?;
            state
                .pick(level, &node(*depth, *k, allow_mid_roots))
                .ok()
                .map(|_| level)
        }
        Op::ChangeTarget { depth } => {
            if let Some(level) = level_at(state, *depth) {
                let _ = state.change_level_target(level);
            }
            None
        }
        Op::ClearFrom { depth } => {
            if let Some(level) = level_at(state, *depth) {
                let _ = state.clear_from(level);
            }
            None
        }
    }
}

fn slots_snapshot(state: &SelectionState) -> Vec<Option<NodeId>> {
    TaxonomyKind::all()
        .iter()
        .flat_map(|kind| {
            kind.levels().iter().map(move |level| {
                state
                    .selection(*kind)
                    .and_then(|s| s.slot(*level))
                    .map(|n| n.id.clone())
            })
        })
        .collect()
}

proptest! {
    /// Slots stay contiguous and parent-linked after any sequence.
    #[test]
    fn slots_stay_consistent(ops in prop::collection::vec(op(), 0..40)) {
        let mut state = SelectionState::new();
        for op in &ops {
            apply(&mut state, op, true);
            for kind in TaxonomyKind::all() {
                if let Some(selection) = state.selection(*kind) {
                    prop_assert!(selection.is_consistent(), "inconsistent after {op:?}");
                }
            }
        }
    }

    /// With roots only at the first level, a set level implies every
    /// shallower level is set.
    #[test]
    fn no_gaps_when_roots_are_top_level(ops in prop::collection::vec(op(), 0..40)) {
        let mut state = SelectionState::new();
        for op in &ops {
            apply(&mut state, op, false);
            for kind in [TaxonomyKind::Original, TaxonomyKind::Sector] {
                let Some(selection) = state.selection(kind) else { continue };
                let levels = kind.levels();
                for (depth, level) in levels.iter().enumerate() {
                    if selection.slot(*level).is_some() {
                        for shallower in &levels[..depth] {
                            prop_assert!(selection.slot(*shallower).is_some());
                        }
                    }
                }
            }
        }
    }

    /// A successful pick leaves every deeper level unset.
    #[test]
    fn pick_clears_everything_deeper(ops in prop::collection::vec(op(), 0..40)) {
        let mut state = SelectionState::new();
        for op in &ops {
            if let Some(level) = apply(&mut state, op, true) {
                let taxonomy = state.taxonomy();
                let mut deeper = level.child_in(taxonomy);
                while let Some(d) = deeper {
                    prop_assert!(state.slot(d).is_none());
                    deeper = d.child_in(taxonomy);
                }
            }
        }
    }

    /// Picking the same node twice equals picking it once.
    #[test]
    fn pick_is_idempotent(
        ops in prop::collection::vec(op(), 0..30),
        depth in 0usize..5,
        k in 0usize..4,
    ) {
        let mut state = SelectionState::new();
        for op in &ops {
            apply(&mut state, op, true);
        }
        let Some(level) = level_at(&state, depth) else { return Ok(()) };
        let target = node(depth, k, true);
        let mut once = state.clone();
        let first = once.pick(level, &target);
        let mut twice = once.clone();
        let second = twice.pick(level, &target);
        prop_assert_eq!(first.is_ok(), second.is_ok());
        prop_assert_eq!(slots_snapshot(&once), slots_snapshot(&twice));
        if first.is_ok() {
            prop_assert!(!second.unwrap().changed);
        }
    }

    /// Rejected picks never change state.
    #[test]
    fn rejected_pick_changes_nothing(
        ops in prop::collection::vec(op(), 0..30),
        depth in 0usize..5,
        k in 0usize..4,
    ) {
        let mut state = SelectionState::new();
        for op in &ops {
            apply(&mut state, op, true);
        }
        let Some(level) = level_at(&state, depth) else { return Ok(()) };
        let before = slots_snapshot(&state);
        let log_len = state.transitions().len();
        if state.pick(level, &node(depth, k, true)).is_err() {
            prop_assert_eq!(slots_snapshot(&state), before);
            prop_assert_eq!(state.transitions().len(), log_len);
        }
    }

    /// Switching taxonomy leaves every taxonomy's slots unset.
    #[test]
    fn taxonomy_switch_resets_all(
        ops in prop::collection::vec(op(), 0..40),
        next in taxonomy(),
    ) {
        let mut state = SelectionState::new();
        for op in &ops {
            apply(&mut state, op, true);
        }
        state.select_taxonomy(next);
        prop_assert!(slots_snapshot(&state).iter().all(Option::is_none));
        prop_assert_eq!(state.confirm_at(), None);
    }

    /// Whenever confirmation is allowed, the descriptor matches the set slots
    /// from the anchor to the target level.
    #[test]
    fn normalize_is_total_on_confirmable_states(ops in prop::collection::vec(op(), 0..40)) {
        let mut state = SelectionState::new();
        for op in &ops {
            apply(&mut state, op, true);
        }
        if !state.can_confirm() {
            prop_assert!(normalize(&state).is_err());
            return Ok(());
        }
        let descriptor = normalize(&state).unwrap();
        prop_assert_eq!(descriptor.kind(), state.taxonomy());
        prop_assert_eq!(normalize(&state).unwrap(), descriptor.clone());

        match &descriptor {
            TargetingDescriptor::Global => {}
            TargetingDescriptor::Expatriate { expatriate_region_id, .. } => {
                let slot = state.slot(Level::ExpatriateRegion).unwrap();
                prop_assert_eq!(&slot.id, expatriate_region_id);
            }
            TargetingDescriptor::Original(chain) | TargetingDescriptor::Sector(chain) => {
                let target = state.effective_target().unwrap();
                prop_assert_eq!(chain.level(), target);
                let selection = state.active_selection().unwrap();
                let anchor_depth = selection.anchor().unwrap().0.depth_in(state.taxonomy()).unwrap();
                let target_depth = target.depth_in(state.taxonomy()).unwrap();
                let expected: Vec<NodeId> = state.taxonomy().levels()[anchor_depth..=target_depth]
                    .iter()
                    .map(|level| selection.slot(*level).unwrap().id.clone())
                    .collect();
                let actual: Vec<NodeId> = chain.links().map(|l| l.id.clone()).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
