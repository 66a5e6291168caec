//! Repository Layer
//!
//! Data access abstractions and implementations.

mod db;
mod memory;
mod sqlite;
mod traits;


pub use db::{init_db, run_migrations, DbState};
pub use memory::{LockTarget, MemoryNodeRepository};
pub use sqlite::SqliteNodeRepository;
pub use traits::{AssociationCheck, NoAssociations, NodeRepository};
