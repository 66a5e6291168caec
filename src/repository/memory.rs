//! In-Memory Node Repository
//!
//! Keeps one hierarchy in a `BTreeMap`. Used for snapshots held by callers
//! and by the engine tests.

use std::collections::BTreeMap;

use crate::domain::{DomainError, DomainResult, NodeId, ScopeId, TreeNode};
use super::traits::NodeRepository;

/// A lock request recorded by [`MemoryNodeRepository`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    Children(Option<NodeId>),
    Subtree(NodeId),
}

#[derive(Debug, Clone)]
pub struct MemoryNodeRepository {
    nodes: BTreeMap<NodeId, TreeNode>,
    next_id: NodeId,
    locks: Vec<LockTarget>,
}

impl MemoryNodeRepository {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            locks: Vec::new(),
        }
    }

    /// Every stored node, ordered by id
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    /// Lock requests seen so far, in order
    pub fn locks(&self) -> &[LockTarget] {
        &self.locks
    }
}

impl Default for MemoryNodeRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn in_scope(node: &TreeNode, scope_id: Option<ScopeId>) -> bool {
    node.scope_id == scope_id
}

impl NodeRepository for MemoryNodeRepository {
    fn get_by_id(&self, scope_id: Option<ScopeId>, id: NodeId) -> DomainResult<Option<TreeNode>> {
        Ok(self
            .nodes
            .get(&id)
            .filter(|node| in_scope(node, scope_id))
            .cloned())
    }

    fn get_children(
        &self,
        scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
    ) -> DomainResult<Vec<TreeNode>> {
        let mut children: Vec<TreeNode> = self
            .nodes
            .values()
            .filter(|node| in_scope(node, scope_id) && node.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by_key(|node| (node.priority, node.id));
        Ok(children)
    }

    fn find_by_code(
        &self,
        scope_id: Option<ScopeId>,
        code: &str,
    ) -> DomainResult<Option<TreeNode>> {
        Ok(self
            .nodes
            .values()
            .find(|node| in_scope(node, scope_id) && node.code == code)
            .cloned())
    }

    fn insert(&mut self, node: &TreeNode) -> DomainResult<TreeNode> {
        let mut created = node.clone();
        created.id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(created.id, created.clone());
        Ok(created)
    }

    fn save(&mut self, node: &mut TreeNode) -> DomainResult<()> {
        match self.nodes.get_mut(&node.id) {
            Some(stored) => {
                *stored = node.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound(format!("Node {} not found", node.id))),
        }
    }

    fn lock_children(
        &mut self,
        _scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
    ) -> DomainResult<()> {
        self.locks.push(LockTarget::Children(parent_id));
        Ok(())
    }

    fn lock_subtree(&mut self, _scope_id: Option<ScopeId>, root_id: NodeId) -> DomainResult<()> {
        self.locks.push(LockTarget::Subtree(root_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut repo = MemoryNodeRepository::new();
        let a = repo.insert(&TreeNode::new(Some(1), "A", "a")).unwrap();
        let b = repo.insert(&TreeNode::new(Some(1), "B", "b")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[test]
    fn test_lookups_are_scoped() {
        let mut repo = MemoryNodeRepository::new();
        let a = repo.insert(&TreeNode::new(Some(1), "A", "a")).unwrap();
        assert!(repo.get_by_id(Some(1), a.id).unwrap().is_some());
        assert!(repo.get_by_id(Some(2), a.id).unwrap().is_none());
        assert!(repo.find_by_code(Some(2), "a").unwrap().is_none());
        assert!(repo.get_children(Some(2), None).unwrap().is_empty());
    }

    #[test]
    fn test_children_ordered_by_priority() {
        let mut repo = MemoryNodeRepository::new();
        for (name, priority) in [("x", 2), ("y", 1), ("z", 3)] {
            let mut node = TreeNode::new(None, name, name);
            node.priority = priority;
            repo.insert(&node).unwrap();
        }
        let names: Vec<_> = repo
            .get_children(None, None)
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["y", "x", "z"]);

        let siblings = repo.get_siblings(None, None, 2).unwrap();
        assert_eq!(siblings.len(), 2);
    }

    #[test]
    fn test_save_unknown_node_fails() {
        let mut repo = MemoryNodeRepository::new();
        let mut ghost = TreeNode::new(None, "ghost", "g");
        ghost.id = 42;
        assert!(matches!(repo.save(&mut ghost), Err(DomainError::NotFound(_))));
    }
}
