//! Selector configuration.
//!
//! Controls how the selector loads hierarchy data: the per-fetch timeout,
//! whether the pre-nested tree endpoint is tried first, and which level
//! each taxonomy's roots live at.

use std::collections::BTreeMap;
use std::time::Duration;

use scope_core::{Level, TaxonomyKind};

/// Default per-fetch timeout.
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Loading behaviour of a [`crate::TargetSelector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Upper bound on any single repository call. Expiry is treated as a
    /// failed load.
    pub fetch_timeout: Duration,
    /// Try the pre-nested tree endpoint before the flat roots listing.
    pub use_tree_endpoint: bool,
    root_levels: BTreeMap<TaxonomyKind, Level>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            use_tree_endpoint: true,
            root_levels: BTreeMap::new(),
        }
    }
}

impl SelectorConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SCOPE_FETCH_TIMEOUT_MS` (default: 10000)
    /// - `SCOPE_USE_TREE` (default: true; `0` or `false` disables)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let fetch_timeout = std::env::var("SCOPE_FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.fetch_timeout);
        let use_tree_endpoint = std::env::var("SCOPE_USE_TREE")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.use_tree_endpoint);
        Self {
            fetch_timeout,
            use_tree_endpoint,
            ..defaults
        }
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Enable or disable the tree endpoint.
    pub fn with_tree_endpoint(mut self, enabled: bool) -> Self {
        self.use_tree_endpoint = enabled;
        self
    }

    /// Load `taxonomy`'s roots at `level` instead of its first level.
    ///
    /// Levels outside the taxonomy's chain are ignored.
    pub fn with_root_level(mut self, taxonomy: TaxonomyKind, level: Level) -> Self {
        if taxonomy.contains(level) {
            self.root_levels.insert(taxonomy, level);
        }
        self
    }

    /// The level `taxonomy`'s roots are listed at. `None` for `GLOBAL`.
    pub fn root_level(&self, taxonomy: TaxonomyKind) -> Option<Level> {
        self.root_levels
            .get(&taxonomy)
            .copied()
            .or_else(|| taxonomy.first_level())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
