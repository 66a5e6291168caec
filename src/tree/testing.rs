//! Fixtures shared by the engine tests

use crate::domain::{HierarchyPolicy, NewNode, NodeId, ScopeId, TreeNode};
use crate::repository::{MemoryNodeRepository, NoAssociations, NodeRepository};
use super::mutator::TreeMutator;

pub const SCOPE: Option<ScopeId> = Some(1);

/// Insert a node with a correct path, depth and priority, bypassing the engine
pub fn seed(repo: &mut MemoryNodeRepository, parent: Option<&TreeNode>, name: &str) -> TreeNode {
    let parent_id = parent.map(|p| p.id);
    let siblings = repo.get_children(SCOPE, parent_id).unwrap();

    let mut node = TreeNode::new(SCOPE, name, name.to_lowercase());
    node.parent_id = parent_id;
    node.priority = siblings.len() as i32 + 1;

    let mut created = repo.insert(&node).unwrap();
    created.path = match parent {
        Some(p) => format!("{}/{}", p.path, created.id),
        None => created.id.to_string(),
    };
    created.depth = parent.map_or(0, |p| p.depth) + 1;
    repo.save(&mut created).unwrap();
    created
}

/// Seed a straight line of `len` nodes under `parent`, returning them top-down
pub fn seed_chain(
    repo: &mut MemoryNodeRepository,
    parent: Option<&TreeNode>,
    prefix: &str,
    len: usize,
) -> Vec<TreeNode> {
    let mut chain: Vec<TreeNode> = Vec::with_capacity(len);
    for i in 0..len {
        let node = seed(repo, chain.last().or(parent), &format!("{}{}", prefix, i));
        chain.push(node);
    }
    chain
}

pub fn get(repo: &MemoryNodeRepository, id: NodeId) -> TreeNode {
    repo.get_by_id(SCOPE, id).unwrap().unwrap()
}

pub fn set_inactive(repo: &mut MemoryNodeRepository, id: NodeId) {
    let mut node = get(repo, id);
    node.is_active = false;
    repo.save(&mut node).unwrap();
}

/// Priorities of a parent's children, in child order
pub fn priorities(repo: &MemoryNodeRepository, parent_id: Option<NodeId>) -> Vec<(NodeId, i32)> {
    repo.get_children(SCOPE, parent_id)
        .unwrap()
        .into_iter()
        .map(|n| (n.id, n.priority))
        .collect()
}

pub fn create(
    policy: &HierarchyPolicy,
    repo: &mut MemoryNodeRepository,
    parent_id: Option<NodeId>,
    name: &str,
) -> TreeNode {
    TreeMutator::new(policy, &NoAssociations)
        .create_node(repo, NewNode::new(SCOPE, parent_id, name, name.to_lowercase()))
        .unwrap()
}
