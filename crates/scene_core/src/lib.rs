//! # Scene Core
//!
//! The transform hierarchy and bounding-volume spatial index that sit
//! beneath the renderer.
//!
//! ## Features
//!
//! - **Transform Hierarchy**: Arena-backed parent/child transforms with cached,
//!   double-buffered world matrices and cycle-safe reparenting
//! - **Bounding Volume Tree**: Axis-split AABB tree rebuilt from snapshots and
//!   queried lazily by region or frustum
//! - **Scene Manager**: Entity registry that bridges the hierarchy and the
//!   spatial index for culling collaborators
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scene = SceneManager::new(SceneConfig::default());
//!
//!     let sun = scene.spawn("sun", EntityKind::Light, Transform::identity());
//!     let planet = scene.spawn_child(
//!         "planet",
//!         EntityKind::Generic,
//!         Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
//!         sun,
//!     )?;
//!     scene.set_bounds(planet, AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))?;
//!
//!     scene.update_transforms();
//!     scene.rebuild_bounds();
//!
//!     let region = AABB::new(Vec3::new(5.0, -5.0, -5.0), Vec3::new(15.0, 5.0, 5.0));
//!     let visible = scene.query_region(&region);
//!     assert_eq!(visible, vec![planet]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod scene;
pub mod spatial;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        config::{
            BoundingTreeConfig, Config, ConfigError, HierarchyConfig, LoggingConfig, SceneConfig,
        },
        foundation::{
            collections::{IdAllocator, NodeHandle},
            math::{Mat4, Quat, Transform, Vec3},
        },
        scene::{
            Capabilities, DestroyPolicy, EntityId, EntityKind, HierarchyError, SceneEntity,
            SceneError, SceneManager, TransformHierarchy, TransformNode,
        },
        spatial::{BoundingVolumeTree, Frustum, Plane, SharedBoundingTree, SplitAxis, AABB},
    };
}
