//! # Taxonomies and Level Chains
//!
//! Defines the four targeting taxonomies and the named levels they are built
//! from. A taxonomy's level chain is ordered root-first:
//!
//! | Taxonomy | Chain |
//! |----------|-------|
//! | `ORIGINAL` | nationalLevel → region → locality → adminUnit → district |
//! | `SECTOR` | nationalLevel → region → locality → adminUnit → district |
//! | `EXPATRIATE` | expatriateRegion |
//! | `GLOBAL` | (none, terminal by itself) |
//!
//! `ORIGINAL` and `SECTOR` share a chain shape but never share entities: a
//! sector region and a geographic region with the same id are unrelated.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ScopeError;

/// The five-level chain shared by `ORIGINAL` and `SECTOR`.
pub const HIERARCHICAL_LEVELS: &[Level] = &[
    Level::NationalLevel,
    Level::Region,
    Level::Locality,
    Level::AdminUnit,
    Level::District,
];

const EXPATRIATE_LEVELS: &[Level] = &[Level::ExpatriateRegion];

/// An independent hierarchy a piece of content can be targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomyKind {
    /// Geographic origin hierarchy.
    Original,
    /// Expatriate communities, a single flat level.
    Expatriate,
    /// Sector hierarchy, shaped like `Original` with its own entities.
    Sector,
    /// Applies to everyone. Has no levels and no entities.
    Global,
}

impl TaxonomyKind {
    /// All taxonomies, in display order.
    pub fn all() -> &'static [TaxonomyKind] {
        &[Self::Original, Self::Expatriate, Self::Sector, Self::Global]
    }

    /// The taxonomy's level chain, root level first. Empty for `Global`.
    pub fn levels(&self) -> &'static [Level] {
        match self {
            Self::Original | Self::Sector => HIERARCHICAL_LEVELS,
            Self::Expatriate => EXPATRIATE_LEVELS,
            Self::Global => &[],
        }
    }

    /// Whether the taxonomy has any entities to select.
    pub fn has_levels(&self) -> bool {
        !self.levels().is_empty()
    }

    /// Whether the taxonomy supports a pre-nested tree fetch.
    pub fn supports_tree(&self) -> bool {
        matches!(self, Self::Original | Self::Sector)
    }

    /// The shallowest level of the chain.
    pub fn first_level(&self) -> Option<Level> {
        self.levels().first().copied()
    }

    /// The deepest level of the chain.
    pub fn leaf_level(&self) -> Option<Level> {
        self.levels().last().copied()
    }

    /// Whether `level` belongs to this taxonomy's chain.
    pub fn contains(&self, level: Level) -> bool {
        self.levels().contains(&level)
    }

    /// SCREAMING_CASE tag, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "ORIGINAL",
            Self::Expatriate => "EXPATRIATE",
            Self::Sector => "SECTOR",
            Self::Global => "GLOBAL",
        }
    }

    /// Lowercase segment used in taxonomy repository URLs.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Expatriate => "expatriate",
            Self::Sector => "sector",
            Self::Global => "global",
        }
    }
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyKind {
    type Err = ScopeError;

    /// Case-insensitive parse of the taxonomy tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScopeError::UnknownTaxonomy(s.to_string()))
    }
}

/// A named depth within a taxonomy's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Top of the five-level chain.
    NationalLevel,
    Region,
    Locality,
    AdminUnit,
    /// Leaf of the five-level chain.
    District,
    /// The only level of the expatriate taxonomy.
    ExpatriateRegion,
}

impl Level {
    /// All levels.
    pub fn all() -> &'static [Level] {
        &[
            Self::NationalLevel,
            Self::Region,
            Self::Locality,
            Self::AdminUnit,
            Self::District,
            Self::ExpatriateRegion,
        ]
    }

    /// camelCase name, matching the serde representation. Also the prefix of
    /// the `<level>Id` / `<level>Name` keys in targeting payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NationalLevel => "nationalLevel",
            Self::Region => "region",
            Self::Locality => "locality",
            Self::AdminUnit => "adminUnit",
            Self::District => "district",
            Self::ExpatriateRegion => "expatriateRegion",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NationalLevel => "National level",
            Self::Region => "Region",
            Self::Locality => "Locality",
            Self::AdminUnit => "Administrative unit",
            Self::District => "District",
            Self::ExpatriateRegion => "Expatriate region",
        }
    }

    /// Position of this level in `kind`'s chain (0 = root level).
    pub fn depth_in(&self, kind: TaxonomyKind) -> Option<usize> {
        kind.levels().iter().position(|l| l == self)
    }

    /// The level immediately above this one in `kind`'s chain.
    pub fn parent_in(&self, kind: TaxonomyKind) -> Option<Level> {
        let depth = self.depth_in(kind)?;
        depth.checked_sub(1).map(|d| kind.levels()[d])
    }

    /// The level immediately below this one in `kind`'s chain.
    pub fn child_in(&self, kind: TaxonomyKind) -> Option<Level> {
        let depth = self.depth_in(kind)?;
        kind.levels().get(depth + 1).copied()
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ScopeError;

    /// Case-insensitive parse of the camelCase level name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScopeError::UnknownLevel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_and_sector_share_chain_shape() {
        assert_eq!(TaxonomyKind::Original.levels(), TaxonomyKind::Sector.levels());
        assert_eq!(TaxonomyKind::Original.levels().len(), 5);
        assert_eq!(
            TaxonomyKind::Original.first_level(),
            Some(Level::NationalLevel)
        );
        assert_eq!(TaxonomyKind::Sector.leaf_level(), Some(Level::District));
    }

    #[test]
    fn expatriate_has_single_level_and_global_none() {
        assert_eq!(
            TaxonomyKind::Expatriate.levels(),
            &[Level::ExpatriateRegion]
        );
        assert!(TaxonomyKind::Global.levels().is_empty());
        assert!(!TaxonomyKind::Global.has_levels());
        assert_eq!(TaxonomyKind::Global.first_level(), None);
    }

    #[test]
    fn only_five_level_taxonomies_support_tree_fetch() {
        assert!(TaxonomyKind::Original.supports_tree());
        assert!(TaxonomyKind::Sector.supports_tree());
        assert!(!TaxonomyKind::Expatriate.supports_tree());
        assert!(!TaxonomyKind::Global.supports_tree());
    }

    #[test]
    fn parent_and_child_navigation() {
        let kind = TaxonomyKind::Original;
        assert_eq!(Level::NationalLevel.parent_in(kind), None);
        assert_eq!(Level::Region.parent_in(kind), Some(Level::NationalLevel));
        assert_eq!(Level::Locality.child_in(kind), Some(Level::AdminUnit));
        assert_eq!(Level::District.child_in(kind), None);
        assert_eq!(Level::AdminUnit.depth_in(kind), Some(3));
    }

    #[test]
    fn levels_outside_chain_have_no_position() {
        assert_eq!(Level::Region.depth_in(TaxonomyKind::Expatriate), None);
        assert_eq!(Level::ExpatriateRegion.depth_in(TaxonomyKind::Sector), None);
        assert_eq!(Level::Region.child_in(TaxonomyKind::Global), None);
        assert!(!TaxonomyKind::Original.contains(Level::ExpatriateRegion));
    }

    #[test]
    fn serde_matches_as_str() {
        for kind in TaxonomyKind::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        for level in Level::all() {
            let json = serde_json::to_string(level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("original".parse::<TaxonomyKind>(), Ok(TaxonomyKind::Original));
        assert_eq!("GLOBAL".parse::<TaxonomyKind>(), Ok(TaxonomyKind::Global));
        assert_eq!("adminunit".parse::<Level>(), Ok(Level::AdminUnit));
        assert_eq!("expatriateRegion".parse::<Level>(), Ok(Level::ExpatriateRegion));
    }

    #[test]
    fn parsing_rejects_unknown_names() {
        assert_eq!(
            "country".parse::<TaxonomyKind>(),
            Err(ScopeError::UnknownTaxonomy("country".into()))
        );
        assert!("province".parse::<Level>().is_err());
        assert!("".parse::<Level>().is_err());
    }
}
