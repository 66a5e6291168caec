//! Read-side tree queries

use std::collections::HashSet;

use crate::domain::{
    DomainError, DomainResult, NodeId, ScopeId, StructuralViolation, SubtreeNode, TreeNode,
};
use crate::repository::NodeRepository;

/// Nested view of `node_id` and its active descendants.
///
/// The requested node is returned even when inactive; below it, inactive
/// children are left out together with everything under them.
pub fn get_subtree(
    repo: &dyn NodeRepository,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
) -> DomainResult<SubtreeNode> {
    let root = repo
        .get_by_id(scope_id, node_id)?
        .ok_or_else(|| DomainError::NotFound(format!("Node {} not found", node_id)))?;

    // Breadth-first into a flat list of (node, parent index).
    let mut flat: Vec<(TreeNode, Option<usize>)> = vec![(root, None)];
    let mut visited = HashSet::from([node_id]);
    let mut cursor = 0;
    while cursor < flat.len() {
        let (scope, id) = (flat[cursor].0.scope_id, flat[cursor].0.id);
        for child in repo.get_children(scope, Some(id))? {
            if !child.is_active {
                continue;
            }
            if !visited.insert(child.id) {
                return Err(StructuralViolation::Cycle {
                    node_id: child.id,
                    parent_id: id,
                }
                .into());
            }
            flat.push((child, Some(cursor)));
        }
        cursor += 1;
    }

    // Children always sit after their parent, so folding from the back
    // finishes every subtree before it is attached.
    let mut built: Vec<Option<SubtreeNode>> = Vec::with_capacity(flat.len());
    let mut parents = Vec::with_capacity(flat.len());
    for (node, parent) in flat {
        built.push(Some(SubtreeNode::leaf(node)));
        parents.push(parent);
    }
    for index in (1..built.len()).rev() {
        let parent = parents[index].ok_or_else(|| {
            DomainError::Internal(format!("Subtree entry {} has no parent", index))
        })?;
        if let Some(subtree) = built[index].take() {
            if let Some(Some(parent)) = built.get_mut(parent) {
                parent.children.push(subtree);
            }
        }
    }

    let mut root = built
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| DomainError::Internal("Subtree root missing".to_string()))?;
    restore_order(&mut root);
    Ok(root)
}

// Children were attached last-first.
fn restore_order(root: &mut SubtreeNode) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        node.children.reverse();
        stack.extend(node.children.iter_mut());
    }
}

/// Ancestors of `node_id`, root first. Empty for a root node.
pub fn get_ancestors(
    repo: &dyn NodeRepository,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
) -> DomainResult<Vec<TreeNode>> {
    let node = repo
        .get_by_id(scope_id, node_id)?
        .ok_or_else(|| DomainError::NotFound(format!("Node {} not found", node_id)))?;

    node.ancestor_ids()?
        .into_iter()
        .map(|id| {
            repo.get_by_id(scope_id, id)?
                .ok_or_else(|| DomainError::NotFound(format!("Ancestor {} not found", id)))
        })
        .collect()
}
