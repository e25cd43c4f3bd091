//! Scene entities
//!
//! An entity is a tagged record, not a trait object: its [`EntityKind`] and
//! [`Capabilities`] tell collaborators what it is, and it points at exactly
//! one transform node.

use bitflags::bitflags;

use crate::foundation::collections::NodeHandle;
use crate::spatial::AABB;

/// Entity identifier handed out by the scene's allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    pub(super) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw entity ID
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// What an entity is, for collaborators that dispatch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Viewpoint for rendering
    Camera,
    /// Light emitter
    Light,
    /// Anything else (meshes, empties, groups)
    Generic,
}

impl EntityKind {
    /// Capabilities an entity of this kind starts with
    pub const fn default_capabilities(self) -> Capabilities {
        match self {
            Self::Camera => Capabilities::VIEWPOINT,
            Self::Light => Capabilities::LIGHT_EMITTER,
            Self::Generic => Capabilities::empty(),
        }
    }
}

bitflags! {
    /// Optional roles an entity can play
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Has bounds and is submitted for drawing
        const RENDERABLE = 1 << 0;
        /// Emits light
        const LIGHT_EMITTER = 1 << 1;
        /// Selected as a shadow caster
        const SHADOW_CASTER = 1 << 2;
        /// Provides a view (cameras)
        const VIEWPOINT = 1 << 3;
    }
}

/// Entity record owned by the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    /// Identifier
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Kind tag
    pub kind: EntityKind,
    /// Capability flags
    pub capabilities: Capabilities,
    /// Transform node in the scene hierarchy
    pub transform: NodeHandle,
    /// Bounds in the entity's local space, if it has any
    pub local_bounds: Option<AABB>,
}

impl SceneEntity {
    /// Whether the entity contributes to the bounding volume tree
    pub fn is_spatial(&self) -> bool {
        self.local_bounds.is_some()
            && self
                .capabilities
                .intersects(Capabilities::RENDERABLE | Capabilities::LIGHT_EMITTER)
    }
}
