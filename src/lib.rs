//! Catalog Tree Engine
//!
//! Layered architecture:
//! - domain: Tree node entity, hierarchy policies and error taxonomy
//! - tree: Structural and lifecycle operations over a repository
//! - repository: Data access abstractions and implementations
//! - commands: Transactional entry points over the shared database

use std::sync::Arc;

use log::info;

pub mod commands;
pub mod config;
pub mod domain;
pub mod logging;
pub mod repository;
pub mod tree;

use config::EngineConfig;
use domain::DomainResult;
use repository::{init_db, AssociationCheck, DbState, NoAssociations};

/// Application state shared across commands
#[derive(Clone)]
pub struct AppState {
    pub db_state: DbState,
    pub config: EngineConfig,
    /// Whether a node still has attached entities (products, listings, ...)
    pub associations: Arc<dyn AssociationCheck>,
}

impl AppState {
    pub fn new(db_state: DbState, config: EngineConfig) -> Self {
        Self {
            db_state,
            config,
            associations: Arc::new(NoAssociations),
        }
    }

    /// Initialize logging, open the configured database and migrate it
    pub fn open(config: EngineConfig) -> DomainResult<Self> {
        logging::init(&config.log_filter);
        let db_state = init_db(&config.database_path)?;
        info!(
            "serving hierarchies: {}",
            config.hierarchies.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(Self::new(db_state, config))
    }

    pub fn with_associations(mut self, associations: impl AssociationCheck + 'static) -> Self {
        self.associations = Arc::new(associations);
        self
    }
}
