//! Deactivation Strategies
//!
//! A hierarchy opts into one of two cascade behaviors through
//! [`CascadePolicy`]; both are implemented behind [`CascadeStrategy`] so new
//! hierarchy kinds pick a behavior instead of a code path.

use std::collections::HashSet;

use log::debug;

use crate::domain::{CascadePolicy, DomainResult, LifecycleViolation, StructuralViolation, TreeNode};
use crate::repository::{AssociationCheck, NodeRepository};

pub trait CascadeStrategy {
    /// Reject the deactivation of `node` if the policy forbids it
    fn check_deactivation_allowed(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
    ) -> DomainResult<()>;

    /// Deactivate `node` and whatever the policy cascades to.
    /// Returns `node` first, then every descendant whose state was written.
    fn deactivate(
        &self,
        repo: &mut dyn NodeRepository,
        node: TreeNode,
    ) -> DomainResult<Vec<TreeNode>>;
}

/// Strategy implementing `policy`
pub fn cascade_strategy<'a>(
    policy: CascadePolicy,
    associations: &'a dyn AssociationCheck,
) -> Box<dyn CascadeStrategy + 'a> {
    match policy {
        CascadePolicy::Manual => Box::new(ManualCascade { associations }),
        CascadePolicy::Automatic => Box::new(AutomaticCascade),
    }
}

/// Children must be deactivated first, bottom-up
pub struct ManualCascade<'a> {
    associations: &'a dyn AssociationCheck,
}

impl<'a> ManualCascade<'a> {
    pub fn new(associations: &'a dyn AssociationCheck) -> Self {
        Self { associations }
    }
}

impl CascadeStrategy for ManualCascade<'_> {
    fn check_deactivation_allowed(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
    ) -> DomainResult<()> {
        // Only direct children are inspected.
        let active_children: Vec<_> = repo
            .get_children(node.scope_id, Some(node.id))?
            .into_iter()
            .filter(|child| child.is_active)
            .map(|child| child.id)
            .collect();

        if !active_children.is_empty() {
            return Err(LifecycleViolation::ActiveChildren {
                node_id: node.id,
                child_ids: active_children,
            }
            .into());
        }

        if self.associations.has_associations(node)? {
            return Err(LifecycleViolation::HasAssociations { node_id: node.id }.into());
        }
        Ok(())
    }

    fn deactivate(
        &self,
        repo: &mut dyn NodeRepository,
        mut node: TreeNode,
    ) -> DomainResult<Vec<TreeNode>> {
        repo.lock_children(node.scope_id, Some(node.id))?;
        if node.is_active {
            node.is_active = false;
            repo.save(&mut node)?;
        }
        Ok(vec![node])
    }
}

/// The whole subtree goes down with its root
pub struct AutomaticCascade;

impl CascadeStrategy for AutomaticCascade {
    fn check_deactivation_allowed(
        &self,
        _repo: &dyn NodeRepository,
        _node: &TreeNode,
    ) -> DomainResult<()> {
        Ok(())
    }

    fn deactivate(
        &self,
        repo: &mut dyn NodeRepository,
        node: TreeNode,
    ) -> DomainResult<Vec<TreeNode>> {
        repo.lock_subtree(node.scope_id, node.id)?;

        let root_id = node.id;
        let mut touched = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![node];

        while let Some(mut current) = stack.pop() {
            if !visited.insert(current.id) {
                return Err(StructuralViolation::Cycle {
                    node_id: current.id,
                    parent_id: current.parent_id.unwrap_or_default(),
                }
                .into());
            }

            // Inactive descendants are walked too: their own children may
            // still be active.
            if current.is_active || current.id == root_id {
                if current.is_active {
                    current.is_active = false;
                    repo.save(&mut current)?;
                    debug!("node {} deactivated by cascade from {}", current.id, root_id);
                }
                touched.push(current.clone());
            }

            let children = repo.get_children(current.scope_id, Some(current.id))?;
            stack.extend(children.into_iter().rev());
        }

        Ok(touched)
    }
}
