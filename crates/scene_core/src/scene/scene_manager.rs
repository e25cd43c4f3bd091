//! Scene manager
//!
//! Bridges the entity layer, the transform hierarchy and the bounding volume
//! tree. Once per frame the owner calls [`SceneManager::update_transforms`];
//! whenever the renderable set changes materially it calls
//! [`SceneManager::rebuild_bounds`], which swaps in a freshly built tree.
//! Culling collaborators query the current tree without mutating it.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use super::entity::{Capabilities, EntityId, EntityKind, SceneEntity};
use super::error::{HierarchyError, SceneError};
use super::hierarchy::TransformHierarchy;
use crate::config::SceneConfig;
use crate::foundation::collections::{IdAllocator, NodeHandle};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::spatial::{BoundingVolumeTree, Frustum, SharedBoundingTree, AABB};

/// Entity registry plus the transform hierarchy and spatial index it drives
#[derive(Debug)]
pub struct SceneManager {
    config: SceneConfig,
    hierarchy: TransformHierarchy,
    entities: HashMap<EntityId, SceneEntity>,
    by_node: HashMap<NodeHandle, EntityId>,
    ids: IdAllocator,
    bounds_tree: SharedBoundingTree<EntityId>,
}

impl SceneManager {
    /// Create an empty scene with its own identifier allocator
    pub fn new(config: SceneConfig) -> Self {
        Self::with_allocator(config, IdAllocator::new())
    }

    /// Create an empty scene that draws entity identifiers from `ids`
    pub fn with_allocator(config: SceneConfig, ids: IdAllocator) -> Self {
        info!(
            "Scene manager created (tree max depth {}, destroy policy {:?})",
            config.bounding_tree.max_depth, config.hierarchy.destroy_policy
        );
        let bounds_tree = Arc::new(BoundingVolumeTree::empty(config.bounding_tree.max_depth));
        Self {
            config,
            hierarchy: TransformHierarchy::new(),
            entities: HashMap::new(),
            by_node: HashMap::new(),
            ids,
            bounds_tree,
        }
    }

    /// Active configuration
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Spawn a root entity
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        kind: EntityKind,
        local: Transform,
    ) -> EntityId {
        let node = self.hierarchy.create_node(local);
        self.register(name.into(), kind, node)
    }

    /// Spawn an entity whose `local` transform is relative to `parent`
    pub fn spawn_child(
        &mut self,
        name: impl Into<String>,
        kind: EntityKind,
        local: Transform,
        parent: EntityId,
    ) -> Result<EntityId, SceneError> {
        let parent_node = self.entity_ref(parent)?.transform;
        let node = self.hierarchy.create_child(local, parent_node)?;
        Ok(self.register(name.into(), kind, node))
    }

    /// Attach local-space bounds to an entity
    ///
    /// Non-camera entities become [`Capabilities::RENDERABLE`].
    pub fn set_bounds(&mut self, id: EntityId, local_bounds: AABB) -> Result<(), SceneError> {
        let entity = self.entity_mut(id)?;
        entity.local_bounds = Some(local_bounds);
        if entity.kind != EntityKind::Camera {
            entity.capabilities |= Capabilities::RENDERABLE;
        }
        Ok(())
    }

    /// Replace an entity's capability flags
    pub fn set_capabilities(
        &mut self,
        id: EntityId,
        capabilities: Capabilities,
    ) -> Result<(), SceneError> {
        self.entity_mut(id)?.capabilities = capabilities;
        Ok(())
    }

    /// Reparent `child` under `parent` (or to the root), keeping its world pose
    pub fn set_parent(
        &mut self,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<(), SceneError> {
        let child_node = self.entity_ref(child)?.transform;
        let parent_node = parent
            .map(|p| self.entity_ref(p).map(|e| e.transform))
            .transpose()?;
        self.hierarchy.set_parent(child_node, parent_node)?;
        Ok(())
    }

    /// Despawn an entity using the configured destroy policy
    ///
    /// Returns every entity removed, `id` first.
    pub fn despawn(&mut self, id: EntityId) -> Result<Vec<EntityId>, SceneError> {
        let node = self.entity_ref(id)?.transform;
        let removed_nodes = self
            .hierarchy
            .destroy(node, self.config.hierarchy.destroy_policy)?;

        let removed: Vec<EntityId> = removed_nodes
            .iter()
            .filter_map(|handle| self.by_node.remove(handle))
            .collect();
        for entity in &removed {
            self.entities.remove(entity);
        }

        debug!("Despawned {id:?}: {} entity(ies) removed", removed.len());
        Ok(removed)
    }

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&id)
    }

    /// Entity bound to a transform node
    pub fn entity_for_node(&self, node: NodeHandle) -> Option<EntityId> {
        self.by_node.get(&node).copied()
    }

    /// All entities of `kind`, ordered by identifier
    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.kind == kind)
            .map(|entity| entity.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// The transform hierarchy
    pub const fn transforms(&self) -> &TransformHierarchy {
        &self.hierarchy
    }

    /// Set an entity's local position
    pub fn set_local_position(&mut self, id: EntityId, position: Vec3) -> Result<(), SceneError> {
        let node = self.entity_ref(id)?.transform;
        self.hierarchy.set_local_position(node, position)?;
        Ok(())
    }

    /// Set an entity's local rotation (normalized on write)
    pub fn set_local_rotation(&mut self, id: EntityId, rotation: Quat) -> Result<(), SceneError> {
        let node = self.entity_ref(id)?.transform;
        self.hierarchy.set_local_rotation(node, rotation)?;
        Ok(())
    }

    /// Set an entity's local scale
    pub fn set_local_scale(&mut self, id: EntityId, scale: Vec3) -> Result<(), SceneError> {
        let node = self.entity_ref(id)?.transform;
        self.hierarchy.set_local_scale(node, scale)?;
        Ok(())
    }

    /// Replace an entity's whole local transform
    pub fn set_local_transform(
        &mut self,
        id: EntityId,
        local: Transform,
    ) -> Result<(), SceneError> {
        let node = self.entity_ref(id)?.transform;
        self.hierarchy
            .node_mut(node)
            .ok_or(HierarchyError::NodeNotFound(node))?
            .set_local_transform(local);
        Ok(())
    }

    /// Recompute stale world matrices; returns how many were recomputed
    pub fn update_transforms(&mut self) -> usize {
        self.hierarchy.update()
    }

    /// Rebuild the bounding volume tree from current world-space bounds
    ///
    /// World bounds come from the cached world matrices, so call
    /// [`update_transforms`](Self::update_transforms) first. The new tree
    /// replaces the old one; handles returned earlier keep the old tree.
    pub fn rebuild_bounds(&mut self) -> SharedBoundingTree<EntityId> {
        let mut leaves: Vec<(AABB, EntityId)> = self
            .entities
            .values()
            .filter(|entity| entity.is_spatial())
            .filter_map(|entity| {
                let local = entity.local_bounds?;
                match self.hierarchy.world_matrix(entity.transform) {
                    Ok(world) => Some((local.transformed(world), entity.id)),
                    Err(err) => {
                        warn!("Skipping {:?} in bounds rebuild: {err}", entity.id);
                        None
                    }
                }
            })
            .collect();
        leaves.sort_unstable_by_key(|(_, id)| *id);

        let tree = Arc::new(BoundingVolumeTree::build(leaves, &self.config.bounding_tree));
        self.bounds_tree = Arc::clone(&tree);
        tree
    }

    /// Current bounding volume tree
    pub fn bounds_tree(&self) -> SharedBoundingTree<EntityId> {
        Arc::clone(&self.bounds_tree)
    }

    /// Entities whose world bounds intersect `region`, ordered by identifier
    pub fn query_region(&self, region: &AABB) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.bounds_tree.query(region).copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Entities whose world bounds intersect `frustum`, ordered by identifier
    pub fn query_visible(&self, frustum: &Frustum) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.bounds_tree.query_frustum(frustum).copied().collect();
        ids.sort_unstable();
        ids
    }

    fn register(&mut self, name: String, kind: EntityKind, node: NodeHandle) -> EntityId {
        let id = EntityId::new(self.ids.allocate());
        self.entities.insert(
            id,
            SceneEntity {
                id,
                name,
                kind,
                capabilities: kind.default_capabilities(),
                transform: node,
                local_bounds: None,
            },
        );
        self.by_node.insert(node, id);
        id
    }

    fn entity_ref(&self, id: EntityId) -> Result<&SceneEntity, SceneError> {
        self.entities.get(&id).ok_or(SceneError::EntityNotFound(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut SceneEntity, SceneError> {
        self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))
    }
}
