//! # scope-selector -- Multi-taxonomy targeting selector
//!
//! Lets an operator pick the part of an organization a piece of content is
//! scoped to, across several independent hierarchies (`ORIGINAL`,
//! `EXPATRIATE`, `SECTOR`) or the `GLOBAL` sentinel, and hands a single
//! normalized [`TargetingDescriptor`] to whichever feature asked.
//!
//! ## Architecture
//!
//! ```text
//! TargetSelector
//!   ├── SelectionState   (scope-state: cascading slots, normalizer)
//!   ├── HierarchyCache   (loaded roots and children, fetch generation, failure banner)
//!   ├── load()           (repository calls with timeout and fallback)
//!   └── DescriptorSink   (receives confirmed descriptors)
//! ```
//!
//! Fetches are tickets: a transition that needs data returns a
//! [`FetchRequest`], the host runs [`load`] whenever it likes, and
//! [`TargetSelector::apply`] drops results whose request no longer matches
//! the live selection. A failed load never propagates; it leaves the level
//! empty and raises the [`LoadFailure`] banner until a retry succeeds.

pub mod cache;
pub mod config;
pub mod loader;
pub mod selector;
pub mod sink;

pub use cache::{FetchRequest, FetchTarget, HierarchyCache, LoadFailure};
pub use config::SelectorConfig;
pub use loader::{load, FetchOutcome, LoadError};
pub use selector::TargetSelector;
pub use sink::{CollectingSink, DescriptorSink};

pub use scope_state::{SelectionError, SelectionLabel, TargetingDescriptor};
