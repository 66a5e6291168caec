//! Commands Layer
//!
//! Request-scoped entry points: each call runs in its own transaction.

mod node_cmd;

#[cfg(test)]
mod tests;

pub use node_cmd::*;
