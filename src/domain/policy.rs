//! Hierarchy Policies
//!
//! One engine serves every category hierarchy; what differs between them is
//! captured here and selected by the caller.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult};
use super::node::ScopeId;

/// Rule applied when a node is deactivated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CascadePolicy {
    /// Rejected while any direct child is active or the node has associations
    #[default]
    Manual,
    /// Always accepted, deactivates the whole subtree
    Automatic,
}

impl CascadePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadePolicy::Manual => "manual",
            CascadePolicy::Automatic => "automatic",
        }
    }
}

/// Per-hierarchy configuration of the tree engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyPolicy {
    /// Deepest allowed node depth (None = unbounded)
    #[serde(default)]
    pub max_depth: Option<u32>,
    /// Default deactivation behavior
    #[serde(default)]
    pub cascade: CascadePolicy,
    /// Whether nodes belong to a tenant scope
    #[serde(default)]
    pub scoped: bool,
}

impl HierarchyPolicy {
    /// Tenant-scoped seller category tree
    pub fn category() -> Self {
        Self {
            max_depth: Some(6),
            cascade: CascadePolicy::Manual,
            scoped: true,
        }
    }

    /// Global master category tree
    pub fn master_category() -> Self {
        Self {
            max_depth: None,
            cascade: CascadePolicy::Automatic,
            scoped: false,
        }
    }

    /// Global sale category tree
    pub fn sale_category() -> Self {
        Self::master_category()
    }

    /// Check the request's scope against the hierarchy kind
    pub fn check_scope(&self, scope_id: Option<ScopeId>) -> DomainResult<()> {
        match (self.scoped, scope_id) {
            (true, None) => Err(DomainError::InvalidInput(
                "scope_id is required for a scoped hierarchy".to_string(),
            )),
            (false, Some(scope)) => Err(DomainError::InvalidInput(format!(
                "scope_id {} given for a global hierarchy",
                scope
            ))),
            _ => Ok(()),
        }
    }

    /// Whether a node at `depth` fits under the bound
    pub fn allows_depth(&self, depth: u32) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }
}
