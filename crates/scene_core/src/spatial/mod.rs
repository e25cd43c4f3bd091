//! Spatial partitioning data structures
//!
//! Bounding volumes and the bounding volume tree used for region and
//! frustum queries over renderable bounds.

mod aabb;
mod bounding_tree;
mod frustum;

pub use aabb::{SplitAxis, AABB};
pub use bounding_tree::{AABBNode, BoundingVolumeTree, Query, SharedBoundingTree, WithBounds};
pub use frustum::{Frustum, Plane};
