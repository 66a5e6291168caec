//! Domain Layer
//!
//! Contains the tree node entity, hierarchy policies and the error taxonomy.
//! This layer performs no I/O.

mod entity;
mod node;
mod policy;

pub use entity::{
    DomainError, DomainResult, LifecycleViolation, StructuralViolation,
    UniquenessViolation,
};
pub use node::{normalize_parent, NewNode, NodeId, ScopeId, SubtreeNode, TreeNode, PATH_SEPARATOR};
pub use policy::{CascadePolicy, HierarchyPolicy};
