//! Tree Engine
//!
//! Structural and lifecycle operations over a [`NodeRepository`]:
//! - path: materialized path and depth computation
//! - sequencer: dense sibling priorities
//! - validator: read-only checks run before any write
//! - cascade: deactivation strategies
//! - mutator: create, move, rename, activate/deactivate
//! - query: subtree and ancestor reads
//!
//! The engine is synchronous and owns no connection; the caller supplies the
//! repository and decides when its unit of work commits.
//!
//! [`NodeRepository`]: crate::repository::NodeRepository

mod cascade;
mod mutator;
mod path;
mod query;
mod sequencer;
mod validator;

#[cfg(test)]
mod testing;

pub use cascade::{cascade_strategy, AutomaticCascade, CascadeStrategy, ManualCascade};
pub use mutator::TreeMutator;
pub use path::PathCalculator;
pub use query::{get_ancestors, get_subtree};
pub use sequencer::SiblingSequencer;
pub use validator::TreeValidator;
