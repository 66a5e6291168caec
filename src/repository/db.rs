//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations for the `tree_nodes` table.

use log::info;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared connection, one writer at a time
#[derive(Clone)]
pub struct DbState {
    conn: Arc<Mutex<Connection>>,
}

impl DbState {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

/// Open the database at `db_path` (":memory:" allowed) and migrate it
pub fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path).map_err(|e| {
        DomainError::Internal(format!("Failed to open {}: {}", db_path.display(), e))
    })?;

    run_migrations(&conn)?;
    info!("tree database ready at {}", db_path.display());

    Ok(DbState::new(conn))
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
pub fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tree_nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hierarchy TEXT NOT NULL,
            scope_id INTEGER,
            parent_id INTEGER,
            path TEXT NOT NULL DEFAULT '',
            depth INTEGER NOT NULL DEFAULT 0,
            priority INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            name TEXT NOT NULL,
            code TEXT NOT NULL
        )",
        (),
    )?;

    // Columns added after the first schema
    if !column_exists(conn, "tree_nodes", "extra")? {
        conn.execute("ALTER TABLE tree_nodes ADD COLUMN extra TEXT", ())
            .map_err(|e| DomainError::Internal(format!("Failed to add extra: {}", e)))?;
    }

    if !column_exists(conn, "tree_nodes", "created_at")? {
        conn.execute("ALTER TABLE tree_nodes ADD COLUMN created_at INTEGER", ())
            .map_err(|e| DomainError::Internal(format!("Failed to add created_at: {}", e)))?;
    }

    if !column_exists(conn, "tree_nodes", "updated_at")? {
        conn.execute("ALTER TABLE tree_nodes ADD COLUMN updated_at INTEGER", ())
            .map_err(|e| DomainError::Internal(format!("Failed to add updated_at: {}", e)))?;
    }

    // Indexes for parent-child and code lookups
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tree_nodes_parent ON tree_nodes(hierarchy, scope_id, parent_id)",
        (),
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tree_nodes_code ON tree_nodes(hierarchy, scope_id, code)",
        (),
    )?;

    Ok(())
}
