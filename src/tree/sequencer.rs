//! Sibling Sequencer
//!
//! Keeps the priorities of one parent's children dense: 1..k, no gaps or
//! duplicates.

use log::debug;

use crate::domain::{DomainResult, NodeId, StructuralViolation, TreeNode};
use crate::repository::NodeRepository;

pub struct SiblingSequencer;

impl SiblingSequencer {
    /// Assign `priority = index + 1` in list order and persist the nodes whose
    /// priority changed. Returns the changed nodes.
    pub fn resequence(
        repo: &mut dyn NodeRepository,
        nodes: &mut [TreeNode],
    ) -> DomainResult<Vec<TreeNode>> {
        let mut changed = Vec::new();
        for (index, node) in nodes.iter_mut().enumerate() {
            let priority = index as i32 + 1;
            if node.priority != priority {
                debug!("node {} priority {} -> {}", node.id, node.priority, priority);
                node.priority = priority;
                repo.save(node)?;
                changed.push(node.clone());
            }
        }
        Ok(changed)
    }

    /// Place `node` right after `anchor_id` in `siblings` (which must not
    /// contain `node`), or first when there is no anchor.
    pub fn insert_after(
        mut siblings: Vec<TreeNode>,
        anchor_id: Option<NodeId>,
        node: TreeNode,
    ) -> DomainResult<Vec<TreeNode>> {
        let index = match anchor_id {
            Some(anchor_id) => {
                let position = siblings
                    .iter()
                    .position(|sibling| sibling.id == anchor_id)
                    .ok_or(StructuralViolation::AnchorNotFound {
                        anchor_id,
                        parent_id: node.parent_id,
                    })?;
                position + 1
            }
            None => 0,
        };
        siblings.insert(index, node);
        Ok(siblings)
    }

    /// Priority for a node appended after `siblings`
    pub fn append_last(siblings: &[TreeNode]) -> i32 {
        siblings
            .iter()
            .map(|sibling| sibling.priority)
            .max()
            .map_or(1, |max| max + 1)
    }
}
