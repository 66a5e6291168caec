//! Tree Validator
//!
//! Checks a requested change against the current tree before anything is
//! written. Every check is read-only.

use log::warn;

use crate::domain::{
    DomainError, DomainResult, HierarchyPolicy, LifecycleViolation, NodeId, ScopeId,
    StructuralViolation, TreeNode, UniquenessViolation,
};
use crate::repository::NodeRepository;
use super::cascade::CascadeStrategy;
use super::path::PathCalculator;

pub struct TreeValidator<'a> {
    policy: &'a HierarchyPolicy,
}

impl<'a> TreeValidator<'a> {
    pub fn new(policy: &'a HierarchyPolicy) -> Self {
        Self { policy }
    }

    /// Reject placing `node` under itself or under one of its descendants
    pub fn check_no_cycle(
        &self,
        node: &TreeNode,
        new_parent: Option<&TreeNode>,
    ) -> DomainResult<()> {
        let Some(parent) = new_parent else {
            return Ok(());
        };

        if parent.id == node.id || parent.ancestor_ids()?.contains(&node.id) {
            warn!("rejected move of {} under {}: cycle", node.id, parent.id);
            return Err(StructuralViolation::Cycle {
                node_id: node.id,
                parent_id: parent.id,
            }
            .into());
        }
        Ok(())
    }

    /// Reject a move whose deepest descendant would land below the bound
    pub fn check_depth_bound(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
        new_parent: Option<&TreeNode>,
    ) -> DomainResult<()> {
        if self.policy.max_depth.is_none() {
            return Ok(());
        }

        let landing = new_parent.map_or(0, |parent| parent.depth) + 1;
        let deepest = landing + PathCalculator::max_relative_depth(repo, node)?;
        self.check_landing_depth(node.id, deepest)
    }

    /// Reject a node that would sit at `depth` (node_id is 0 for new nodes)
    pub fn check_landing_depth(&self, node_id: NodeId, depth: u32) -> DomainResult<()> {
        match self.policy.max_depth {
            Some(max_depth) if !self.policy.allows_depth(depth) => {
                warn!("rejected node {}: depth {} exceeds {}", node_id, depth, max_depth);
                Err(StructuralViolation::DepthExceeded {
                    node_id,
                    depth,
                    max_depth,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    /// Reject activating `node` while an ancestor is inactive
    pub fn check_activation_allowed(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
    ) -> DomainResult<()> {
        self.check_ancestors_active(repo, node.scope_id, node.id, &node.ancestor_ids()?)
    }

    /// Every node in `ancestor_ids` must exist and be active
    pub fn check_ancestors_active(
        &self,
        repo: &dyn NodeRepository,
        scope_id: Option<ScopeId>,
        node_id: NodeId,
        ancestor_ids: &[NodeId],
    ) -> DomainResult<()> {
        for &ancestor_id in ancestor_ids {
            let ancestor = repo.get_by_id(scope_id, ancestor_id)?.ok_or_else(|| {
                DomainError::NotFound(format!("Ancestor {} not found", ancestor_id))
            })?;
            if !ancestor.is_active {
                warn!("rejected activation of {}: ancestor {} inactive", node_id, ancestor_id);
                return Err(LifecycleViolation::InactiveAncestor {
                    node_id,
                    ancestor_id,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Delegates to the hierarchy's cascade strategy
    pub fn check_deactivation_allowed(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
        strategy: &dyn CascadeStrategy,
    ) -> DomainResult<()> {
        strategy.check_deactivation_allowed(repo, node).inspect_err(|e| {
            warn!("rejected deactivation of {}: {}", node.id, e);
        })
    }

    /// `name` must be free among the active children of `parent_id` and
    /// `code` free in the node's scope. `node.id` is 0 for a node not yet
    /// created; an inactive node never conflicts on name.
    pub fn check_name_code_uniqueness(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
        name: &str,
        code: &str,
        parent_id: Option<NodeId>,
    ) -> DomainResult<()> {
        self.check_name_unique(repo, node, name, parent_id)?;

        if let Some(holder) = repo.find_by_code(node.scope_id, code)? {
            if holder.id != node.id {
                warn!("rejected code {:?}: held by {}", code, holder.id);
                return Err(UniquenessViolation::DuplicateCode {
                    code: code.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn check_name_unique(
        &self,
        repo: &dyn NodeRepository,
        node: &TreeNode,
        name: &str,
        parent_id: Option<NodeId>,
    ) -> DomainResult<()> {
        if !node.is_active {
            return Ok(());
        }

        let taken = repo
            .get_siblings(node.scope_id, parent_id, node.id)?
            .iter()
            .any(|sibling| sibling.is_active && sibling.name == name);

        if taken {
            warn!("rejected name {:?} under {:?}: already used", name, parent_id);
            return Err(UniquenessViolation::DuplicateName {
                name: name.to_string(),
                parent_id,
            }
            .into());
        }
        Ok(())
    }
}
