//! # scope-state -- Cascading Selection and Normalization
//!
//! Implements the targeting selector's logic with no I/O:
//!
//! - **Selection** (`selection.rs`): one slot record per taxonomy, the
//!   active taxonomy, and the confirm-at marker. Transitions are
//!   `select_taxonomy`, `pick`, `clear_from`, and `change_level_target`.
//!   Every successful `pick` clears the slots below it, so the set slots of
//!   a taxonomy always form one unbroken run down from a root.
//!
//! - **Descriptor** (`descriptor.rs`): `TargetingDescriptor`, the tagged
//!   union every consumer receives. The hierarchical variant carries the
//!   whole chain from the anchor to the confirmed level.
//!
//! - **Normalize** (`normalize.rs`): the pure mapping from a selection to a
//!   descriptor, and the display label for the current selection.
//!
//! Transitions are synchronous and run to completion. Data loading is the
//! caller's job; `pick` reports which child level should be fetched next.

pub mod descriptor;
pub mod normalize;
pub mod selection;

pub use descriptor::{ChainLink, LevelChain, TargetingDescriptor};
pub use normalize::{display_label, normalize, LabelKind, SelectionLabel};
pub use selection::{
    DraftError, PickOutcome, SelectionAction, SelectionError, SelectionState,
    SelectionTransitionRecord, TaxonomySelection,
};
