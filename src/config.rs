//! Engine Configuration
//!
//! JSON document naming the database and the hierarchies served. Fields left
//! out of a document keep their defaults; hierarchies listed in it are added
//! to, or replace, the built-in ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, HierarchyPolicy};

pub const DEFAULT_DATABASE_PATH: &str = "catalog_tree.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub log_filter: String,
    pub hierarchies: BTreeMap<String, HierarchyPolicy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let hierarchies = BTreeMap::from([
            ("category".to_string(), HierarchyPolicy::category()),
            ("master_category".to_string(), HierarchyPolicy::master_category()),
            ("sale_category".to_string(), HierarchyPolicy::sale_category()),
        ]);
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            hierarchies,
        }
    }
}

/// Shape of a config document before it is merged over the defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialConfig {
    database_path: Option<PathBuf>,
    log_filter: Option<String>,
    hierarchies: BTreeMap<String, HierarchyPolicy>,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> DomainResult<Self> {
        let partial: PartialConfig = serde_json::from_str(json)
            .map_err(|e| DomainError::InvalidInput(format!("Invalid config: {}", e)))?;

        let mut config = Self::default();
        if let Some(path) = partial.database_path {
            config.database_path = path;
        }
        if let Some(filter) = partial.log_filter {
            config.log_filter = filter;
        }
        config.hierarchies.extend(partial.hierarchies);
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> DomainResult<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Internal(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Policy registered for `hierarchy`
    pub fn policy(&self, hierarchy: &str) -> DomainResult<&HierarchyPolicy> {
        self.hierarchies
            .get(hierarchy)
            .ok_or_else(|| DomainError::NotFound(format!("Hierarchy {} not configured", hierarchy)))
    }
}
