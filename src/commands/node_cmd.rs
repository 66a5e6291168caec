//! Tree Node Commands
//!
//! Every write resolves the hierarchy's policy, locks the shared connection,
//! opens an immediate transaction and commits only if the engine succeeds.
//! Reads go straight to the connection.

use rusqlite::TransactionBehavior;

use crate::domain::{
    normalize_parent, CascadePolicy, DomainResult, NewNode, NodeId, ScopeId, SubtreeNode, TreeNode,
};
use crate::repository::{NodeRepository, SqliteNodeRepository};
use crate::tree::{self, TreeMutator};
use crate::AppState;

async fn write_tree<T>(
    state: &AppState,
    hierarchy: &str,
    op: impl FnOnce(&TreeMutator<'_>, &mut dyn NodeRepository) -> DomainResult<T>,
) -> DomainResult<T> {
    let policy = state.config.policy(hierarchy)?;
    let mutator = TreeMutator::new(policy, state.associations.as_ref());

    let conn = state.db_state.connection();
    let mut conn = conn.lock().await;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Dropping `tx` on error rolls everything back.
    let value = {
        let mut repo = SqliteNodeRepository::new(&tx, hierarchy);
        op(&mutator, &mut repo)?
    };
    tx.commit()?;
    Ok(value)
}

async fn read_tree<T>(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    op: impl FnOnce(&dyn NodeRepository) -> DomainResult<T>,
) -> DomainResult<T> {
    state.config.policy(hierarchy)?.check_scope(scope_id)?;

    let conn = state.db_state.connection();
    let conn = conn.lock().await;
    let repo = SqliteNodeRepository::new(&conn, hierarchy);
    op(&repo)
}

/// Create a node as the last child of `request.parent_id`
pub async fn create_node(
    state: &AppState,
    hierarchy: &str,
    request: NewNode,
) -> DomainResult<TreeNode> {
    write_tree(state, hierarchy, |mutator, repo| mutator.create_node(repo, request)).await
}

/// Move a node (and its subtree) after `left_sibling_id`, or first when None
pub async fn move_node(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
    new_parent_id: Option<NodeId>,
    left_sibling_id: Option<NodeId>,
) -> DomainResult<Vec<TreeNode>> {
    write_tree(state, hierarchy, |mutator, repo| {
        mutator.move_node(repo, scope_id, node_id, new_parent_id, left_sibling_id)
    })
    .await
}

pub async fn rename_node(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
    name: Option<String>,
    code: Option<String>,
) -> DomainResult<TreeNode> {
    write_tree(state, hierarchy, |mutator, repo| {
        mutator.rename_node(repo, scope_id, node_id, name.as_deref(), code.as_deref())
    })
    .await
}

/// Activate or deactivate a node. `cascade` defaults to the hierarchy's.
pub async fn set_active(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
    active: bool,
    cascade: Option<CascadePolicy>,
) -> DomainResult<Vec<TreeNode>> {
    let cascade = match cascade {
        Some(cascade) => cascade,
        None => state.config.policy(hierarchy)?.cascade,
    };
    write_tree(state, hierarchy, |mutator, repo| {
        mutator.set_active(repo, scope_id, node_id, active, cascade)
    })
    .await
}

/// Nested view of a node and its active descendants
pub async fn get_subtree(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
) -> DomainResult<SubtreeNode> {
    read_tree(state, hierarchy, scope_id, |repo| tree::get_subtree(repo, scope_id, node_id)).await
}

pub async fn get_node(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
) -> DomainResult<Option<TreeNode>> {
    read_tree(state, hierarchy, scope_id, |repo| repo.get_by_id(scope_id, node_id)).await
}

/// Children of a parent (None or 0 = roots), in priority order
pub async fn get_children(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    parent_id: Option<NodeId>,
) -> DomainResult<Vec<TreeNode>> {
    read_tree(state, hierarchy, scope_id, |repo| {
        repo.get_children(scope_id, normalize_parent(parent_id))
    })
    .await
}

/// Breadcrumb of a node, root first
pub async fn get_ancestors(
    state: &AppState,
    hierarchy: &str,
    scope_id: Option<ScopeId>,
    node_id: NodeId,
) -> DomainResult<Vec<TreeNode>> {
    read_tree(state, hierarchy, scope_id, |repo| tree::get_ancestors(repo, scope_id, node_id)).await
}
