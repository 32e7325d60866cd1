//! # Hierarchy Nodes
//!
//! A node is one entity of a taxonomy at one level: a region, a district,
//! an expatriate region. Nodes arrive from the taxonomy repository and are
//! never modified afterwards except to attach children fetched later.

use serde::{Deserialize, Serialize};

use crate::identity::NodeId;

/// One entity in a taxonomy tree.
///
/// Wire format is camelCase JSON. `children` is absent until the node's
/// children have been fetched; an empty list means "fetched, none exist".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Absent for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<HierarchyNode>>,
}

impl HierarchyNode {
    /// Create a root node with no children loaded.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            code: None,
            parent_id: None,
            children: None,
        }
    }

    /// Set the parent identifier.
    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the short code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this node has no parent in its taxonomy.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether children have been fetched for this node.
    pub fn children_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Loaded children, or an empty slice when none have been fetched.
    pub fn children(&self) -> &[HierarchyNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// A copy of this node without its subtree. Selection slots hold
    /// detached nodes so a slot never pins a cached subtree.
    pub fn detached(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            code: self.code.clone(),
            parent_id: self.parent_id.clone(),
            children: None,
        }
    }

    /// Attach fetched children, filling in any missing `parent_id`.
    pub fn attach_children(&mut self, mut children: Vec<HierarchyNode>) {
        for child in &mut children {
            if child.parent_id.is_none() {
                child.parent_id = Some(self.id.clone());
            }
        }
        self.children = Some(children);
    }

    /// Fill in missing `parent_id` throughout a pre-nested subtree.
    pub fn link_descendants(&mut self) {
        let id = self.id.clone();
        if let Some(children) = self.children.as_mut() {
            for child in children {
                if child.parent_id.is_none() {
                    child.parent_id = Some(id.clone());
                }
                child.link_descendants();
            }
        }
    }

    /// Find the descendant `depth` levels below this node with the given id.
    /// Depth 0 is this node itself.
    pub fn descendant_mut(&mut self, depth: usize, id: &NodeId) -> Option<&mut HierarchyNode> {
        if depth == 0 {
            return (&self.id == id).then_some(self);
        }
        self.children
            .as_mut()?
            .iter_mut()
            .find_map(|child| child.descendant_mut(depth - 1, id))
    }

    /// Shared-reference variant of [`HierarchyNode::descendant_mut`].
    pub fn descendant(&self, depth: usize, id: &NodeId) -> Option<&HierarchyNode> {
        if depth == 0 {
            return (&self.id == id).then_some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.descendant(depth - 1, id))
    }
}
