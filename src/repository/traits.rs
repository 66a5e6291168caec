//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces the tree engine reads and writes through.
//! Implementations can use SQLite, in-memory, etc. A repository instance is
//! one unit of work: the caller decides when its writes are committed.

use crate::domain::{DomainResult, NodeId, ScopeId, TreeNode};

/// Node storage for one hierarchy
///
/// All lookups are scoped: a node belonging to another scope is reported as
/// absent.
pub trait NodeRepository {
    /// Find node by ID
    fn get_by_id(&self, scope_id: Option<ScopeId>, id: NodeId) -> DomainResult<Option<TreeNode>>;

    /// Children of a parent (None = roots), ordered by priority then id
    fn get_children(
        &self,
        scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
    ) -> DomainResult<Vec<TreeNode>>;

    /// Children of a parent except `excluding_id`, ordered by priority then id
    fn get_siblings(
        &self,
        scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
        excluding_id: NodeId,
    ) -> DomainResult<Vec<TreeNode>> {
        let mut siblings = self.get_children(scope_id, parent_id)?;
        siblings.retain(|node| node.id != excluding_id);
        Ok(siblings)
    }

    /// Find the node carrying `code` in a scope
    fn find_by_code(&self, scope_id: Option<ScopeId>, code: &str) -> DomainResult<Option<TreeNode>>;

    /// Persist a new node and return it with its assigned id
    fn insert(&mut self, node: &TreeNode) -> DomainResult<TreeNode>;

    /// Overwrite an existing node. Stores that keep timestamps refresh
    /// `node.updated_at` to the value written.
    fn save(&mut self, node: &mut TreeNode) -> DomainResult<()>;

    /// Lock the child set of a parent before its priorities are rewritten
    fn lock_children(
        &mut self,
        _scope_id: Option<ScopeId>,
        _parent_id: Option<NodeId>,
    ) -> DomainResult<()> {
        Ok(())
    }

    /// Lock a node and everything under it before a structural change
    fn lock_subtree(&mut self, _scope_id: Option<ScopeId>, _root_id: NodeId) -> DomainResult<()> {
        Ok(())
    }
}

/// External records (products, attributes...) attached to a node
pub trait AssociationCheck: Send + Sync {
    /// Whether deactivating `node` would orphan associated records
    fn has_associations(&self, node: &TreeNode) -> DomainResult<bool>;
}

/// Association check for hierarchies without attached records
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssociations;

impl AssociationCheck for NoAssociations {
    fn has_associations(&self, _node: &TreeNode) -> DomainResult<bool> {
        Ok(false)
    }
}

impl<F> AssociationCheck for F
where
    F: Fn(&TreeNode) -> DomainResult<bool> + Send + Sync,
{
    fn has_associations(&self, node: &TreeNode) -> DomainResult<bool> {
        self(node)
    }
}
