//! SQLite Node Repository
//!
//! `NodeRepository` over one hierarchy of the `tree_nodes` table. The
//! repository borrows a connection, normally an open `Transaction`, so every
//! write of one mutation commits or rolls back together.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{DomainError, DomainResult, NodeId, ScopeId, TreeNode};
use super::traits::NodeRepository;

const NODE_COLUMNS: &str = "id, scope_id, parent_id, path, depth, priority, is_active, name, code, extra, created_at, updated_at";

pub struct SqliteNodeRepository<'conn> {
    conn: &'conn Connection,
    hierarchy: String,
}

impl<'conn> SqliteNodeRepository<'conn> {
    pub fn new(conn: &'conn Connection, hierarchy: impl Into<String>) -> Self {
        Self {
            conn,
            hierarchy: hierarchy.into(),
        }
    }

    /// Locks are only meaningful inside a transaction; an immediate
    /// transaction already holds the database write lock.
    fn ensure_transaction(&self) -> DomainResult<()> {
        if self.conn.is_autocommit() {
            return Err(DomainError::Internal(
                "structural changes require an open transaction".to_string(),
            ));
        }
        Ok(())
    }
}

impl NodeRepository for SqliteNodeRepository<'_> {
    fn get_by_id(&self, scope_id: Option<ScopeId>, id: NodeId) -> DomainResult<Option<TreeNode>> {
        let node = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM tree_nodes WHERE hierarchy = ?1 AND scope_id IS ?2 AND id = ?3",
                    NODE_COLUMNS
                ),
                params![self.hierarchy, scope_id, id],
                row_to_node,
            )
            .optional()?;
        Ok(node)
    }

    fn get_children(
        &self,
        scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
    ) -> DomainResult<Vec<TreeNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tree_nodes
             WHERE hierarchy = ?1 AND scope_id IS ?2 AND parent_id IS ?3
             ORDER BY priority, id",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map(params![self.hierarchy, scope_id, parent_id], row_to_node)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    fn get_siblings(
        &self,
        scope_id: Option<ScopeId>,
        parent_id: Option<NodeId>,
        excluding_id: NodeId,
    ) -> DomainResult<Vec<TreeNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tree_nodes
             WHERE hierarchy = ?1 AND scope_id IS ?2 AND parent_id IS ?3 AND id != ?4
             ORDER BY priority, id",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map(
                params![self.hierarchy, scope_id, parent_id, excluding_id],
                row_to_node,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    fn find_by_code(
        &self,
        scope_id: Option<ScopeId>,
        code: &str,
    ) -> DomainResult<Option<TreeNode>> {
        let node = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM tree_nodes WHERE hierarchy = ?1 AND scope_id IS ?2 AND code = ?3 LIMIT 1",
                    NODE_COLUMNS
                ),
                params![self.hierarchy, scope_id, code],
                row_to_node,
            )
            .optional()?;
        Ok(node)
    }

    fn insert(&mut self, node: &TreeNode) -> DomainResult<TreeNode> {
        let now = chrono::Utc::now().timestamp_millis();
        let extra = encode_extra(node)?;

        self.conn.execute(
            "INSERT INTO tree_nodes
                (hierarchy, scope_id, parent_id, path, depth, priority, is_active, name, code, extra, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                self.hierarchy,
                node.scope_id,
                node.parent_id,
                node.path,
                node.depth,
                node.priority,
                node.is_active,
                node.name,
                node.code,
                extra,
                now,
            ],
        )?;

        let mut created = node.clone();
        created.id = self.conn.last_insert_rowid();
        created.created_at = Some(now);
        created.updated_at = Some(now);
        Ok(created)
    }

    fn save(&mut self, node: &mut TreeNode) -> DomainResult<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let extra = encode_extra(node)?;

        let changed = self.conn.execute(
            "UPDATE tree_nodes
             SET parent_id = ?1, path = ?2, depth = ?3, priority = ?4, is_active = ?5,
                 name = ?6, code = ?7, extra = ?8, updated_at = ?9
             WHERE id = ?10 AND hierarchy = ?11 AND scope_id IS ?12",
            params![
                node.parent_id,
                node.path,
                node.depth,
                node.priority,
                node.is_active,
                node.name,
                node.code,
                extra,
                now,
                node.id,
                self.hierarchy,
                node.scope_id,
            ],
        )?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("Node {} not found", node.id)));
        }
        node.updated_at = Some(now);
        Ok(())
    }

    fn lock_children(
        &mut self,
        _scope_id: Option<ScopeId>,
        _parent_id: Option<NodeId>,
    ) -> DomainResult<()> {
        self.ensure_transaction()
    }

    fn lock_subtree(&mut self, _scope_id: Option<ScopeId>, _root_id: NodeId) -> DomainResult<()> {
        self.ensure_transaction()
    }
}

fn encode_extra(node: &TreeNode) -> DomainResult<Option<String>> {
    node.extra
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(DomainError::from)
}

/// Convert a database row to TreeNode
fn row_to_node(row: &Row<'_>) -> rusqlite::Result<TreeNode> {
    let extra = match row.get::<_, Option<String>>(9)? {
        Some(text) => Some(
            serde_json::from_str(&text)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e))
                })?,
        ),
        None => None,
    };

    Ok(TreeNode {
        id: row.get(0)?,
        scope_id: row.get(1)?,
        parent_id: row.get(2)?,
        path: row.get(3)?,
        depth: row.get(4)?,
        priority: row.get(5)?,
        is_active: row.get(6)?,
        name: row.get(7)?,
        code: row.get(8)?,
        extra,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
