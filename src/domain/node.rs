//! Tree Node Entity
//!
//! A category in one hierarchy: a rooted, ordered, materialized-path tree.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, StructuralViolation};

/// Node identifier, assigned by the repository on insert
pub type NodeId = i64;

/// Tenant partition. `None` for global hierarchies.
pub type ScopeId = i64;

/// Separator between ids in a materialized path
pub const PATH_SEPARATOR: char = '/';

/// A category node with its materialized position in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Unique identifier (0 until persisted)
    pub id: NodeId,
    /// Tenant partition (None = global hierarchy)
    pub scope_id: Option<ScopeId>,
    /// Direct ancestor (None = root level)
    pub parent_id: Option<NodeId>,
    /// Ancestor ids joined by "/", ending with the node's own id
    pub path: String,
    /// Number of segments in `path`
    pub depth: u32,
    /// Dense 1-based rank among siblings
    pub priority: i32,
    /// Soft lifecycle flag
    pub is_active: bool,
    pub name: String,
    pub code: String,
    /// Free-form attributes owned by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl TreeNode {
    /// Create an unpersisted, active node with no computed position
    pub fn new(
        scope_id: Option<ScopeId>,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            scope_id,
            parent_id: None,
            path: String::new(),
            depth: 0,
            priority: 0,
            is_active: true,
            name: name.into(),
            code: code.into(),
            extra: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Check if this is a root node (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// All ids on the path, root first, ending with this node's id
    pub fn path_ids(&self) -> DomainResult<Vec<NodeId>> {
        let malformed = || -> DomainError {
            StructuralViolation::MalformedPath {
                node_id: self.id,
                path: self.path.clone(),
            }
            .into()
        };

        let ids = self
            .path
            .split(PATH_SEPARATOR)
            .map(|segment| segment.parse::<NodeId>().map_err(|_| malformed()))
            .collect::<DomainResult<Vec<_>>>()?;

        if ids.last() != Some(&self.id) {
            return Err(malformed());
        }
        Ok(ids)
    }

    /// Ancestor ids, root first, excluding this node
    pub fn ancestor_ids(&self) -> DomainResult<Vec<NodeId>> {
        let mut ids = self.path_ids()?;
        ids.pop();
        Ok(ids)
    }
}

/// Normalize the "0 means root" convention used by API callers
pub fn normalize_parent(parent_id: Option<NodeId>) -> Option<NodeId> {
    parent_id.filter(|id| *id != 0)
}

/// Request to create a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    pub scope_id: Option<ScopeId>,
    /// None or 0 creates a root
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub code: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

fn default_active() -> bool {
    true
}

impl NewNode {
    pub fn new(
        scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            scope_id,
            parent_id,
            name: name.into(),
            code: code.into(),
            is_active: true,
            extra: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

}

/// A node with its (active) children populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreeNode {
    #[serde(flatten)]
    pub node: TreeNode,
    pub children: Vec<SubtreeNode>,
}

impl SubtreeNode {
    pub fn leaf(node: TreeNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(current.children.iter());
        }
        count
    }
}
