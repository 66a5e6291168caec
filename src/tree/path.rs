//! Path Calculator
//!
//! Computes materialized paths and depths. `propagate` is the only writer of
//! `path` and `depth` once a node exists.

use std::collections::HashSet;

use log::debug;

use crate::domain::{DomainResult, NodeId, StructuralViolation, TreeNode, PATH_SEPARATOR};
use crate::repository::NodeRepository;

pub struct PathCalculator;

impl PathCalculator {
    /// Path and depth of node `id` placed under `parent` (None = root)
    pub fn path_and_depth(parent: Option<&TreeNode>, id: NodeId) -> (String, u32) {
        match parent {
            Some(parent) => (Self::extend_path(&parent.path, id), parent.depth + 1),
            None => (id.to_string(), 1),
        }
    }

    fn extend_path(parent_path: &str, id: NodeId) -> String {
        format!("{}{}{}", parent_path, PATH_SEPARATOR, id)
    }

    /// Depth in edges of the deepest descendant under `node` (0 for a leaf)
    pub fn max_relative_depth(repo: &dyn NodeRepository, node: &TreeNode) -> DomainResult<u32> {
        let mut deepest = 0;
        let mut visited = HashSet::from([node.id]);
        let mut stack = vec![(node.id, 0u32)];

        while let Some((id, edges)) = stack.pop() {
            deepest = deepest.max(edges);
            for child in repo.get_children(node.scope_id, Some(id))? {
                if !visited.insert(child.id) {
                    return Err(StructuralViolation::Cycle {
                        node_id: child.id,
                        parent_id: id,
                    }
                    .into());
                }
                stack.push((child.id, edges + 1));
            }
        }

        Ok(deepest)
    }

    /// Recompute `node`'s path/depth from `parent`, then every descendant's,
    /// parents before children. Returns the rewritten nodes in visit order.
    pub fn propagate(
        repo: &mut dyn NodeRepository,
        node: &mut TreeNode,
        parent: Option<&TreeNode>,
    ) -> DomainResult<Vec<TreeNode>> {
        let (path, depth) = Self::path_and_depth(parent, node.id);
        node.path = path;
        node.depth = depth;
        repo.save(node)?;

        let mut touched = vec![node.clone()];
        let mut visited = HashSet::from([node.id]);

        // (child, parent path, parent depth)
        let mut stack: Vec<(TreeNode, String, u32)> = repo
            .get_children(node.scope_id, Some(node.id))?
            .into_iter()
            .rev()
            .map(|child| (child, node.path.clone(), node.depth))
            .collect();

        while let Some((mut child, parent_path, parent_depth)) = stack.pop() {
            if !visited.insert(child.id) {
                return Err(StructuralViolation::Cycle {
                    node_id: child.id,
                    parent_id: child.parent_id.unwrap_or_default(),
                }
                .into());
            }

            child.path = Self::extend_path(&parent_path, child.id);
            child.depth = parent_depth + 1;
            repo.save(&mut child)?;
            debug!("node {} moved to path {}", child.id, child.path);

            for grandchild in repo.get_children(child.scope_id, Some(child.id))?.into_iter().rev() {
                stack.push((grandchild, child.path.clone(), child.depth));
            }
            touched.push(child);
        }

        Ok(touched)
    }
}
