//! Domain Layer - Errors
//!
//! All engine failures are reported through [`DomainError`], which is
//! serializable so callers can forward it to their own clients unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum DomainError {
    #[error("structural violation: {0}")]
    Structural(StructuralViolation),

    #[error("uniqueness violation: {0}")]
    Uniqueness(UniquenessViolation),

    #[error("lifecycle violation: {0}")]
    Lifecycle(LifecycleViolation),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The requested change would break the shape of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum StructuralViolation {
    #[error("node {node_id} cannot be placed under {parent_id}: it would become its own ancestor")]
    Cycle { node_id: i64, parent_id: i64 },

    #[error("node {node_id} would reach depth {depth}, maximum is {max_depth}")]
    DepthExceeded {
        node_id: i64,
        depth: u32,
        max_depth: u32,
    },

    #[error("anchor {anchor_id} is not a child of {parent_id:?}")]
    AnchorNotFound {
        anchor_id: i64,
        parent_id: Option<i64>,
    },

    #[error("node {node_id} has malformed path {path:?}")]
    MalformedPath { node_id: i64, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum UniquenessViolation {
    #[error("an active sibling under {parent_id:?} is already named {name:?}")]
    DuplicateName {
        name: String,
        parent_id: Option<i64>,
    },

    #[error("code {code:?} is already used in this scope")]
    DuplicateCode { code: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum LifecycleViolation {
    #[error("node {node_id} cannot be active while ancestor {ancestor_id} is inactive")]
    InactiveAncestor { node_id: i64, ancestor_id: i64 },

    #[error("node {node_id} still has active children {child_ids:?}")]
    ActiveChildren { node_id: i64, child_ids: Vec<i64> },

    #[error("node {node_id} still has external associations")]
    HasAssociations { node_id: i64 },
}

impl From<StructuralViolation> for DomainError {
    fn from(violation: StructuralViolation) -> Self {
        DomainError::Structural(violation)
    }
}

impl From<UniquenessViolation> for DomainError {
    fn from(violation: UniquenessViolation) -> Self {
        DomainError::Uniqueness(violation)
    }
}

impl From<LifecycleViolation> for DomainError {
    fn from(violation: LifecycleViolation) -> Self {
        DomainError::Lifecycle(violation)
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}
