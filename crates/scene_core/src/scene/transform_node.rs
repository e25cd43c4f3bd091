//! Transform node
//!
//! A single node of the transform hierarchy: local TRS state, the cached
//! world matrix, the previous frame's world matrix, and the dirty flag.
//! Tree links are handles into the owning [`TransformHierarchy`] arena; only
//! the hierarchy can change them.
//!
//! [`TransformHierarchy`]: super::TransformHierarchy

use super::error::HierarchyError;
use crate::foundation::collections::NodeHandle;
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};

/// Basis column length below which an axis counts as collapsed
///
/// Compared per axis rather than against the determinant, which shrinks with
/// the cube of scale and would reject small but invertible transforms.
pub const MIN_AXIS_LENGTH: f32 = f32::EPSILON;

/// Scene-graph transform node
///
/// State machine: `Clean -> (local edit | parent changed) -> Dirty -> update -> Clean`.
#[derive(Debug, Clone)]
pub struct TransformNode {
    handle: NodeHandle,
    local: Transform,
    world_matrix: Mat4,
    previous_world_matrix: Mat4,
    dirty: bool,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl TransformNode {
    pub(super) fn new(handle: NodeHandle, local: Transform) -> Self {
        let mut local = local;
        local.rotation = Quat::new_normalize(local.rotation.into_inner());
        Self {
            handle,
            local,
            world_matrix: Mat4::identity(),
            previous_world_matrix: Mat4::identity(),
            dirty: true,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Handle of this node in its hierarchy
    pub const fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Parent handle, if any
    pub const fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Children in attachment order
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Local position relative to the parent
    pub const fn local_position(&self) -> Vec3 {
        self.local.position
    }

    /// Local rotation relative to the parent
    pub const fn local_rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Local scale relative to the parent
    pub const fn local_scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Local transform as a value
    pub const fn local_transform(&self) -> Transform {
        self.local
    }

    /// Whether the cached world matrix is stale
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set local position and mark dirty
    pub fn set_local_position(&mut self, position: Vec3) {
        self.local.position = position;
        self.dirty = true;
    }

    /// Set local rotation and mark dirty
    ///
    /// The quaternion is renormalized on write so accumulated drift from
    /// repeated composition never reaches the matrix.
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.local.rotation = Quat::new_normalize(rotation.into_inner());
        self.dirty = true;
    }

    /// Set local rotation from Euler angles (radians) and mark dirty
    pub fn set_local_euler(&mut self, roll: f32, pitch: f32, yaw: f32) {
        self.set_local_rotation(Quat::from_euler_angles(roll, pitch, yaw));
    }

    /// Set local scale and mark dirty
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.local.scale = scale;
        self.dirty = true;
    }

    /// Replace the whole local transform and mark dirty
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local.position = transform.position;
        self.local.scale = transform.scale;
        self.set_local_rotation(transform.rotation);
    }

    /// Local matrix (scale, then rotation, then translation)
    pub fn local_matrix(&self) -> Mat4 {
        self.local.to_matrix()
    }

    /// Cached world matrix as of the last [`update`](Self::update)
    pub const fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// World matrix from the traversal before the last one
    pub const fn previous_world_matrix(&self) -> &Mat4 {
        &self.previous_world_matrix
    }

    /// Inverse of the cached world matrix
    pub fn inverse(&self) -> Result<Mat4, HierarchyError> {
        invert(&self.world_matrix, self.handle)
    }

    /// Recompute the cached world matrix
    ///
    /// `parent_world` must already be up to date for this traversal and
    /// `parent_changed` must be `true` when the parent recomputed in it.
    /// The previous world matrix is rolled forward on every call. Returns
    /// whether the world matrix was recomputed.
    pub fn update(&mut self, parent_world: Option<&Mat4>, parent_changed: bool) -> bool {
        self.previous_world_matrix = self.world_matrix;

        if !self.dirty && !parent_changed {
            return false;
        }

        let local = self.local_matrix();
        self.world_matrix = match parent_world {
            Some(parent) => parent * local,
            None => local,
        };
        self.dirty = false;
        true
    }

    pub(super) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(super) fn set_parent_link(&mut self, parent: Option<NodeHandle>) {
        self.parent = parent;
    }

    pub(super) fn push_child(&mut self, child: NodeHandle) {
        self.children.push(child);
    }

    pub(super) fn remove_child(&mut self, child: NodeHandle) {
        self.children.retain(|c| *c != child);
    }
}

/// Invert `matrix`, reporting singular matrices against `node`
pub(super) fn invert(matrix: &Mat4, node: NodeHandle) -> Result<Mat4, HierarchyError> {
    let basis = matrix.fixed_view::<3, 3>(0, 0);
    let shortest_axis = basis
        .column_iter()
        .map(|column| column.norm())
        .fold(f32::INFINITY, f32::min);
    if shortest_axis < MIN_AXIS_LENGTH {
        return Err(HierarchyError::DegenerateTransform { node });
    }
    matrix
        .try_inverse()
        .ok_or(HierarchyError::DegenerateTransform { node })
}
