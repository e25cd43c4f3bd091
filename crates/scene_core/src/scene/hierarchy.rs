//! Transform hierarchy
//!
//! Arena of [`TransformNode`]s keyed by [`NodeHandle`]. Parent links are
//! non-owning handles, children are owned by the arena and listed in
//! attachment order on their parent. Cycles are rejected before any link is
//! written, so the parent graph is a forest at all times.
//!
//! The once-per-frame [`update`](TransformHierarchy::update) walks the forest
//! pre-order with an explicit stack, so a node is always recomputed after
//! its parent and deep chains cannot overflow the call stack.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::error::HierarchyError;
use super::transform_node::{invert, TransformNode};
use crate::foundation::collections::{NodeHandle, NodeMap};
use crate::foundation::math::{Mat4, Point3, Quat, Transform, Vec3};

/// What happens to a node's children when the node is destroyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyPolicy {
    /// The whole subtree is destroyed with the node
    #[default]
    DestroySubtree,
    /// Children move to the node's parent (or become roots), keeping their world pose
    ReparentToGrandparent,
}

/// Arena-backed transform forest
#[derive(Debug, Clone, Default)]
pub struct TransformHierarchy {
    nodes: NodeMap<TransformNode>,
    roots: Vec<NodeHandle>,
}

impl TransformHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `handle` refers to a live node
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Create a root node with the given local transform
    pub fn create_node(&mut self, local: Transform) -> NodeHandle {
        let handle = self
            .nodes
            .insert_with_key(|handle| TransformNode::new(handle, local));
        self.roots.push(handle);
        handle
    }

    /// Create a node whose `local` transform is already relative to `parent`
    pub fn create_child(
        &mut self,
        local: Transform,
        parent: NodeHandle,
    ) -> Result<NodeHandle, HierarchyError> {
        self.get(parent)?;
        let handle = self.nodes.insert_with_key(|handle| {
            let mut node = TransformNode::new(handle, local);
            node.set_parent_link(Some(parent));
            node
        });
        self.get_mut(parent)?.push_child(handle);
        Ok(handle)
    }

    /// Borrow a node
    pub fn node(&self, handle: NodeHandle) -> Option<&TransformNode> {
        self.nodes.get(handle)
    }

    /// Mutably borrow a node for local edits
    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut TransformNode> {
        self.nodes.get_mut(handle)
    }

    /// Parent of `handle`, if any
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(TransformNode::parent)
    }

    /// Children of `handle` in attachment order (empty for unknown handles)
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        match self.nodes.get(handle) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    /// Root nodes in creation/attachment order
    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    /// Whether `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.parent(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.parent(handle);
        }
        false
    }

    /// Number of ancestors of `handle` (roots are depth 0)
    pub fn depth_of(&self, handle: NodeHandle) -> Option<usize> {
        self.get(handle).ok()?;
        let mut depth = 0;
        let mut current = self.parent(handle);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        Some(depth)
    }

    /// Set the local position of `handle`
    pub fn set_local_position(
        &mut self,
        handle: NodeHandle,
        position: Vec3,
    ) -> Result<(), HierarchyError> {
        self.get_mut(handle)?.set_local_position(position);
        Ok(())
    }

    /// Set the local rotation of `handle` (normalized on write)
    pub fn set_local_rotation(
        &mut self,
        handle: NodeHandle,
        rotation: Quat,
    ) -> Result<(), HierarchyError> {
        self.get_mut(handle)?.set_local_rotation(rotation);
        Ok(())
    }

    /// Set the local scale of `handle`
    pub fn set_local_scale(
        &mut self,
        handle: NodeHandle,
        scale: Vec3,
    ) -> Result<(), HierarchyError> {
        self.get_mut(handle)?.set_local_scale(scale);
        Ok(())
    }

    /// World position computed from local state and the parent chain
    ///
    /// Does not depend on the cached matrices, so it is valid between updates.
    pub fn world_position(&self, handle: NodeHandle) -> Result<Vec3, HierarchyError> {
        let node = self.get(handle)?;
        let local = Point3::from(node.local_position());
        match node.parent() {
            Some(parent) => Ok(self.compose_world(parent)?.transform_point(&local).coords),
            None => Ok(local.coords),
        }
    }

    /// World rotation: local rotations composed down from the root
    pub fn world_rotation(&self, handle: NodeHandle) -> Result<Quat, HierarchyError> {
        let node = self.get(handle)?;
        let mut rotation = node.local_rotation();
        let mut current = node.parent();
        while let Some(parent) = current {
            let parent_node = self.get(parent)?;
            rotation = parent_node.local_rotation() * rotation;
            current = parent_node.parent();
        }
        Ok(rotation)
    }

    /// World scale: local scales multiplied component-wise down from the root
    ///
    /// Shear from non-uniform parent scale combined with rotation is not
    /// represented.
    pub fn world_scale(&self, handle: NodeHandle) -> Result<Vec3, HierarchyError> {
        let node = self.get(handle)?;
        let mut scale = node.local_scale();
        let mut current = node.parent();
        while let Some(parent) = current {
            let parent_node = self.get(parent)?;
            scale = scale.component_mul(&parent_node.local_scale());
            current = parent_node.parent();
        }
        Ok(scale)
    }

    /// World position, rotation and scale as one value
    pub fn world_transform(&self, handle: NodeHandle) -> Result<Transform, HierarchyError> {
        Ok(Transform::new(
            self.world_position(handle)?,
            self.world_rotation(handle)?,
            self.world_scale(handle)?,
        ))
    }

    /// Cached world matrix as of the last [`update`](Self::update)
    pub fn world_matrix(&self, handle: NodeHandle) -> Result<&Mat4, HierarchyError> {
        Ok(self.get(handle)?.world_matrix())
    }

    /// Cached world matrix from the traversal before the last one
    pub fn previous_world_matrix(&self, handle: NodeHandle) -> Result<&Mat4, HierarchyError> {
        Ok(self.get(handle)?.previous_world_matrix())
    }

    /// Inverse of the cached world matrix
    pub fn inverse_world_matrix(&self, handle: NodeHandle) -> Result<Mat4, HierarchyError> {
        self.get(handle)?.inverse()
    }

    /// Reparent `handle` under `new_parent` (or make it a root) keeping its world pose
    ///
    /// Fails with [`HierarchyError::InvalidHierarchy`] when `new_parent` is the
    /// node itself or one of its descendants, and with
    /// [`HierarchyError::DegenerateTransform`] when the new parent's world
    /// matrix cannot be inverted. On failure nothing is changed.
    pub fn set_parent(
        &mut self,
        handle: NodeHandle,
        new_parent: Option<NodeHandle>,
    ) -> Result<(), HierarchyError> {
        let old_parent = self.get(handle)?.parent();

        if let Some(parent) = new_parent {
            self.get(parent)?;
            if parent == handle || self.is_ancestor(handle, parent) {
                warn!("Rejected reparent of {handle:?} under {parent:?}: would create a cycle");
                return Err(HierarchyError::InvalidHierarchy {
                    node: handle,
                    parent,
                });
            }
        }

        if old_parent == new_parent {
            return Ok(());
        }

        let world = self.world_transform(handle)?;
        let local = match new_parent {
            Some(parent) => self.relative_to(parent, &world)?,
            None => world,
        };

        self.detach(handle);
        self.attach(handle, new_parent);
        let node = self.get_mut(handle)?;
        node.set_local_transform(local);
        node.mark_dirty();

        debug!("Reparented {handle:?}: {old_parent:?} -> {new_parent:?}");
        Ok(())
    }

    /// Destroy `handle` according to `policy`
    ///
    /// Returns every handle removed from the arena, `handle` first.
    pub fn destroy(
        &mut self,
        handle: NodeHandle,
        policy: DestroyPolicy,
    ) -> Result<Vec<NodeHandle>, HierarchyError> {
        let node = self.get(handle)?;
        let grandparent = node.parent();
        let children = node.children().to_vec();

        let removed = match policy {
            DestroyPolicy::DestroySubtree => self.subtree(handle),
            DestroyPolicy::ReparentToGrandparent => {
                if let (Some(grandparent), false) = (grandparent, children.is_empty()) {
                    // Check up front so no child is moved when a later one would fail.
                    invert(&self.compose_world(grandparent)?, grandparent)?;
                }
                for child in children {
                    self.set_parent(child, grandparent)?;
                }
                vec![handle]
            }
        };

        self.detach(handle);
        for removed_handle in &removed {
            self.nodes.remove(*removed_handle);
        }

        debug!("Destroyed {handle:?} ({policy:?}), {} node(s) removed", removed.len());
        Ok(removed)
    }

    /// Recompute world matrices for the whole forest
    ///
    /// Every node rolls its previous world matrix forward; nodes that are
    /// dirty or whose parent recomputed in this pass rebuild their world
    /// matrix. Returns how many nodes were recomputed.
    pub fn update(&mut self) -> usize {
        let mut stack: Vec<(NodeHandle, Option<Mat4>, bool)> =
            self.roots.iter().rev().map(|root| (*root, None, false)).collect();
        let mut recomputed = 0;

        while let Some((handle, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };

            let changed = node.update(parent_world.as_ref(), parent_changed);
            if changed {
                recomputed += 1;
                trace!("Recomputed world matrix for {handle:?}");
            }

            let world = *node.world_matrix();
            stack.extend(
                node.children()
                    .iter()
                    .rev()
                    .map(|child| (*child, Some(world), changed)),
            );
        }

        recomputed
    }

    /// Handles of `handle` and all its descendants in pre-order
    pub fn subtree(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.walk_from(&[handle], &mut out);
        out
    }

    /// Every node in pre-order, roots in order
    pub fn iter_depth_first(&self) -> Vec<NodeHandle> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.walk_from(&self.roots, &mut out);
        out
    }

    fn walk_from(&self, starts: &[NodeHandle], out: &mut Vec<NodeHandle>) {
        let mut stack: Vec<NodeHandle> = starts.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            if let Some(node) = self.nodes.get(handle) {
                out.push(handle);
                stack.extend(node.children().iter().rev().copied());
            }
        }
    }

    /// World matrix of `handle` composed from local matrices, ignoring caches
    fn compose_world(&self, handle: NodeHandle) -> Result<Mat4, HierarchyError> {
        let node = self.get(handle)?;
        let mut matrix = node.local_matrix();
        let mut current = node.parent();
        while let Some(parent) = current {
            let parent_node = self.get(parent)?;
            matrix = parent_node.local_matrix() * matrix;
            current = parent_node.parent();
        }
        Ok(matrix)
    }

    /// Express a world pose as a local transform under `parent`
    fn relative_to(
        &self,
        parent: NodeHandle,
        world: &Transform,
    ) -> Result<Transform, HierarchyError> {
        let parent_inverse = invert(&self.compose_world(parent)?, parent)?;
        let parent_rotation = self.world_rotation(parent)?;
        let parent_scale = self.world_scale(parent)?;

        let position = parent_inverse
            .transform_point(&Point3::from(world.position))
            .coords;
        let rotation = parent_rotation.inverse() * world.rotation;
        let scale = world.scale.component_div(&parent_scale);

        Ok(Transform::new(position, rotation, scale))
    }

    fn detach(&mut self, handle: NodeHandle) {
        match self.parent(handle) {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.remove_child(handle);
                }
            }
            None => self.roots.retain(|root| *root != handle),
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.set_parent_link(None);
        }
    }

    fn attach(&mut self, handle: NodeHandle, parent: Option<NodeHandle>) {
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent_node) => parent_node.push_child(handle),
            None => self.roots.push(handle),
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.set_parent_link(parent);
        }
    }

    fn get(&self, handle: NodeHandle) -> Result<&TransformNode, HierarchyError> {
        self.nodes
            .get(handle)
            .ok_or(HierarchyError::NodeNotFound(handle))
    }

    fn get_mut(&mut self, handle: NodeHandle) -> Result<&mut TransformNode, HierarchyError> {
        self.nodes
            .get_mut(handle)
            .ok_or(HierarchyError::NodeNotFound(handle))
    }
}
