//! Scene management system
//!
//! Owns the transform hierarchy and the entity registry that sit between
//! gameplay code and the renderer.
//!
//! ## Architecture
//!
//! ```text
//! SceneEntity (what)
//!      ↓ NodeHandle
//! TransformHierarchy (where)
//!      ↓ world bounds snapshot
//! BoundingVolumeTree (spatial queries)
//! ```
//!
//! The Scene Manager:
//! - Spawns and despawns entities together with their transform nodes
//! - Propagates dirty transforms once per frame
//! - Rebuilds the spatial index on demand and answers region/frustum queries

mod entity;
mod error;
mod hierarchy;
mod scene_manager;
mod transform_node;

#[cfg(test)]
mod tests;

pub use entity::{Capabilities, EntityId, EntityKind, SceneEntity};
pub use error::{HierarchyError, SceneError};
pub use hierarchy::{DestroyPolicy, TransformHierarchy};
pub use scene_manager::SceneManager;
pub use transform_node::TransformNode;
