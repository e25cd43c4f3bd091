//! Scene error types

use thiserror::Error;

use super::entity::EntityId;
use crate::foundation::collections::NodeHandle;

/// Errors raised by structural edits and matrix inversion
///
/// Every variant is reported before any state is mutated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    /// Reparenting would make a node its own ancestor
    #[error("invalid hierarchy: {parent:?} is {node:?} or one of its descendants")]
    InvalidHierarchy {
        /// Node being reparented
        node: NodeHandle,
        /// Rejected parent
        parent: NodeHandle,
    },

    /// A required matrix is singular (e.g. zero scale on some axis)
    #[error("degenerate transform on node {node:?}: matrix is not invertible")]
    DegenerateTransform {
        /// Node whose matrix could not be inverted
        node: NodeHandle,
    },

    /// The handle does not refer to a live node
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeHandle),
}

/// Errors raised by [`SceneManager`](super::SceneManager) operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The entity does not exist (never spawned or already despawned)
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// A hierarchy edit was rejected
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),
}
