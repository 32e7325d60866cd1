//! # Targeting Descriptor
//!
//! The single value every content-scoping consumer receives once an
//! operator confirms a selection. It is a tagged union over the taxonomy:
//!
//! ```text
//! {"kind":"GLOBAL"}
//! {"kind":"EXPATRIATE","expatriateRegionId":"E1","expatriateRegionName":"Gulf"}
//! {"kind":"ORIGINAL","level":"locality",
//!  "regionId":"R1","regionName":"Region One",
//!  "localityId":"L1","localityName":"Locality One"}
//! ```
//!
//! The hierarchical variants carry every level from the chain's anchor down
//! to the confirmed level, because consumers match scope against ancestors
//! as well as the leaf. `LevelChain` can only be built by the normalizer,
//! so a descriptor mixing taxonomies cannot be expressed.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use scope_core::{Level, NodeId, TaxonomyKind};

/// One selected level in a descriptor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub level: Level,
    pub id: NodeId,
    pub name: String,
}

/// Root-to-target chain of a five-level taxonomy selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChain {
    ancestors: Vec<ChainLink>,
    target: ChainLink,
}

impl LevelChain {
    /// `ancestors` must be contiguous, anchor first, ending directly above
    /// `target`.
    pub(crate) fn new(ancestors: Vec<ChainLink>, target: ChainLink) -> Self {
        Self { ancestors, target }
    }

    /// The confirmed (deepest) level.
    pub fn level(&self) -> Level {
        self.target.level
    }

    /// The confirmed node.
    pub fn target(&self) -> &ChainLink {
        &self.target
    }

    /// Every selected level, anchor first, ending with the target.
    pub fn links(&self) -> impl Iterator<Item = &ChainLink> + '_ {
        self.ancestors.iter().chain(std::iter::once(&self.target))
    }

    /// Number of levels in the chain.
    pub fn len(&self) -> usize {
        self.ancestors.len() + 1
    }

    /// The link at `level`, if the chain includes it.
    pub fn link(&self, level: Level) -> Option<&ChainLink> {
        self.links().find(|link| link.level == level)
    }
}

impl Serialize for LevelChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + 2 * self.len()))?;
        map.serialize_entry("level", &self.level())?;
        for link in self.links() {
            map.serialize_entry(&format!("{}Id", link.level.as_str()), &link.id)?;
            map.serialize_entry(&format!("{}Name", link.level.as_str()), &link.name)?;
        }
        map.end()
    }
}

/// Normalized output of a confirmed selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetingDescriptor {
    /// Applies to everyone.
    Global,
    #[serde(rename_all = "camelCase")]
    Expatriate {
        expatriate_region_id: NodeId,
        expatriate_region_name: String,
    },
    Original(LevelChain),
    Sector(LevelChain),
}

impl TargetingDescriptor {
    /// The taxonomy this descriptor targets.
    pub fn kind(&self) -> TaxonomyKind {
        match self {
            Self::Global => TaxonomyKind::Global,
            Self::Expatriate { .. } => TaxonomyKind::Expatriate,
            Self::Original(_) => TaxonomyKind::Original,
            Self::Sector(_) => TaxonomyKind::Sector,
        }
    }

    /// The confirmed level. `None` for `GLOBAL`.
    pub fn level(&self) -> Option<Level> {
        match self {
            Self::Global => None,
            Self::Expatriate { .. } => Some(Level::ExpatriateRegion),
            Self::Original(chain) | Self::Sector(chain) => Some(chain.level()),
        }
    }

    /// The hierarchical chain, for `ORIGINAL` and `SECTOR`.
    pub fn chain(&self) -> Option<&LevelChain> {
        match self {
            Self::Original(chain) | Self::Sector(chain) => Some(chain),
            Self::Global | Self::Expatriate { .. } => None,
        }
    }

    /// Whether content with this descriptor is scoped to `id` at `level`,
    /// either as the target itself or as one of its ancestors.
    pub fn includes(&self, level: Level, id: &NodeId) -> bool {
        match self {
            Self::Global => false,
            Self::Expatriate {
                expatriate_region_id,
                ..
            } => level == Level::ExpatriateRegion && expatriate_region_id == id,
            Self::Original(chain) | Self::Sector(chain) => {
                chain.link(level).is_some_and(|link| &link.id == id)
            }
        }
    }
}
