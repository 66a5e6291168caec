//! Tree Mutator
//!
//! Applies validated structural and lifecycle changes. Each operation runs
//! against one repository unit of work; the caller commits it.

use std::collections::HashMap;

use log::info;

use crate::domain::{
    normalize_parent, CascadePolicy, DomainError, DomainResult, HierarchyPolicy, NewNode, NodeId,
    ScopeId, TreeNode,
};
use crate::repository::{AssociationCheck, NodeRepository};
use super::cascade::cascade_strategy;
use super::path::PathCalculator;
use super::sequencer::SiblingSequencer;
use super::validator::TreeValidator;

pub struct TreeMutator<'a> {
    policy: &'a HierarchyPolicy,
    associations: &'a dyn AssociationCheck,
}

impl<'a> TreeMutator<'a> {
    pub fn new(policy: &'a HierarchyPolicy, associations: &'a dyn AssociationCheck) -> Self {
        Self {
            policy,
            associations,
        }
    }

    fn validator(&self) -> TreeValidator<'a> {
        TreeValidator::new(self.policy)
    }

    /// Create a node as the last child of its parent
    pub fn create_node(
        &self,
        repo: &mut dyn NodeRepository,
        request: NewNode,
    ) -> DomainResult<TreeNode> {
        self.policy.check_scope(request.scope_id)?;
        let scope_id = request.scope_id;
        let name = require_text("name", &request.name)?;
        let code = require_text("code", &request.code)?;
        let parent_id = normalize_parent(request.parent_id);
        let parent = load_parent(repo, scope_id, parent_id)?;
        let validator = self.validator();

        let (_, depth) = PathCalculator::path_and_depth(parent.as_ref(), 0);
        validator.check_landing_depth(0, depth)?;

        let mut node = TreeNode::new(scope_id, name.clone(), code.clone());
        node.parent_id = parent_id;
        node.is_active = request.is_active;
        node.extra = request.extra;

        validator.check_name_code_uniqueness(repo, &node, &name, &code, parent_id)?;
        if let (true, Some(parent)) = (node.is_active, parent.as_ref()) {
            validator.check_ancestors_active(repo, scope_id, node.id, &parent.path_ids()?)?;
        }

        repo.lock_children(scope_id, parent_id)?;
        let siblings = repo.get_children(scope_id, parent_id)?;
        node.priority = SiblingSequencer::append_last(&siblings);

        // The path needs the id, which only exists after the first write.
        let mut created = repo.insert(&node)?;
        let (path, depth) = PathCalculator::path_and_depth(parent.as_ref(), created.id);
        created.path = path;
        created.depth = depth;
        repo.save(&mut created)?;

        info!(
            "created node {} ({:?}) at {} priority {}",
            created.id, created.code, created.path, created.priority
        );
        Ok(created)
    }

    /// Move `node_id` under `new_parent_id` (None or 0 = root), right after
    /// `left_sibling_id` or first among its new siblings.
    /// Returns every node whose parent, priority, path or depth changed.
    pub fn move_node(
        &self,
        repo: &mut dyn NodeRepository,
        scope_id: Option<ScopeId>,
        node_id: NodeId,
        new_parent_id: Option<NodeId>,
        left_sibling_id: Option<NodeId>,
    ) -> DomainResult<Vec<TreeNode>> {
        self.policy.check_scope(scope_id)?;
        let new_parent_id = normalize_parent(new_parent_id);
        let mut node = load_node(repo, scope_id, node_id)?;
        let new_parent = load_parent(repo, scope_id, new_parent_id)?;
        let validator = self.validator();

        validator.check_no_cycle(&node, new_parent.as_ref())?;
        validator.check_depth_bound(repo, &node, new_parent.as_ref())?;

        let old_parent_id = node.parent_id;
        let reparenting = old_parent_id != new_parent_id;
        if reparenting {
            validator.check_name_unique(repo, &node, &node.name, new_parent_id)?;
            if let (true, Some(parent)) = (node.is_active, new_parent.as_ref()) {
                validator.check_ancestors_active(repo, scope_id, node.id, &parent.path_ids()?)?;
            }
        }

        if let Some(anchor_id) = left_sibling_id {
            if repo.get_by_id(scope_id, anchor_id)?.is_none() {
                return Err(DomainError::NotFound(format!("Anchor {} not found", anchor_id)));
            }
        }

        repo.lock_subtree(scope_id, node.id)?;
        repo.lock_children(scope_id, new_parent_id)?;
        if reparenting {
            repo.lock_children(scope_id, old_parent_id)?;
        }

        let mut touched = Touched::default();

        node.parent_id = new_parent_id;
        let targets = repo.get_siblings(scope_id, new_parent_id, node.id)?;
        let mut ordered = SiblingSequencer::insert_after(targets, left_sibling_id, node)?;
        touched.extend(SiblingSequencer::resequence(repo, &mut ordered)?);

        let mut node = ordered
            .into_iter()
            .find(|n| n.id == node_id)
            .ok_or_else(|| DomainError::Internal(format!("Node {} lost during reorder", node_id)))?;

        if reparenting {
            let mut old_siblings = repo.get_siblings(scope_id, old_parent_id, node.id)?;
            touched.extend(SiblingSequencer::resequence(repo, &mut old_siblings)?);
            touched.extend(PathCalculator::propagate(repo, &mut node, new_parent.as_ref())?);
        }

        let touched = touched.into_vec();
        info!(
            "moved node {} from {:?} to {:?} at priority {} ({} nodes touched)",
            node.id,
            old_parent_id,
            new_parent_id,
            node.priority,
            touched.len()
        );
        Ok(touched)
    }

    /// Change name and/or code. No structural effect.
    pub fn rename_node(
        &self,
        repo: &mut dyn NodeRepository,
        scope_id: Option<ScopeId>,
        node_id: NodeId,
        name: Option<&str>,
        code: Option<&str>,
    ) -> DomainResult<TreeNode> {
        self.policy.check_scope(scope_id)?;
        let mut node = load_node(repo, scope_id, node_id)?;

        let name = match name {
            Some(name) => require_text("name", name)?,
            None => node.name.clone(),
        };
        let code = match code {
            Some(code) => require_text("code", code)?,
            None => node.code.clone(),
        };
        if name == node.name && code == node.code {
            return Ok(node);
        }

        self.validator()
            .check_name_code_uniqueness(repo, &node, &name, &code, node.parent_id)?;

        node.name = name;
        node.code = code;
        repo.save(&mut node)?;
        info!("renamed node {} to {:?} ({:?})", node.id, node.name, node.code);
        Ok(node)
    }

    /// Activate, or deactivate under `cascade`. Returns the node first, then
    /// every descendant whose state was written.
    pub fn set_active(
        &self,
        repo: &mut dyn NodeRepository,
        scope_id: Option<ScopeId>,
        node_id: NodeId,
        active: bool,
        cascade: CascadePolicy,
    ) -> DomainResult<Vec<TreeNode>> {
        self.policy.check_scope(scope_id)?;
        let mut node = load_node(repo, scope_id, node_id)?;
        let validator = self.validator();

        if active {
            if node.is_active {
                return Ok(vec![node]);
            }
            validator.check_activation_allowed(repo, &node)?;
            node.is_active = true;
            validator.check_name_unique(repo, &node, &node.name, node.parent_id)?;
            repo.save(&mut node)?;
            info!("activated node {}", node.id);
            return Ok(vec![node]);
        }

        let strategy = cascade_strategy(cascade, self.associations);
        validator.check_deactivation_allowed(repo, &node, strategy.as_ref())?;
        let touched = strategy.deactivate(repo, node)?;
        info!(
            "deactivated node {} ({} cascade, {} nodes touched)",
            node_id,
            cascade.as_str(),
            touched.len()
        );
        Ok(touched)
    }
}

fn require_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

fn load_node(
    repo: &dyn NodeRepository,
    scope_id: Option<ScopeId>,
    id: NodeId,
) -> DomainResult<TreeNode> {
    repo.get_by_id(scope_id, id)?
        .ok_or_else(|| DomainError::NotFound(format!("Node {} not found", id)))
}

fn load_parent(
    repo: &dyn NodeRepository,
    scope_id: Option<ScopeId>,
    parent_id: Option<NodeId>,
) -> DomainResult<Option<TreeNode>> {
    match parent_id {
        Some(id) => repo
            .get_by_id(scope_id, id)?
            .map(Some)
            .ok_or_else(|| DomainError::NotFound(format!("Parent {} not found", id))),
        None => Ok(None),
    }
}

/// Nodes written by one operation, first-touch order, latest state wins
#[derive(Default)]
struct Touched {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, TreeNode>,
}

impl Touched {
    fn extend(&mut self, nodes: impl IntoIterator<Item = TreeNode>) {
        for node in nodes {
            if self.nodes.insert(node.id, node.clone()).is_none() {
                self.order.push(node.id);
            }
        }
    }

    fn into_vec(mut self) -> Vec<TreeNode> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.remove(id))
            .collect()
    }
}
