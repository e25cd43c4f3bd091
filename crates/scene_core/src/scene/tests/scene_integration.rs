//! Scene manager driving the hierarchy and the bounding volume tree together

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{BoundingTreeConfig, SceneConfig};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::scene::{DestroyPolicy, EntityId, EntityKind, SceneError, SceneManager};
use crate::spatial::{Frustum, AABB};

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AABB {
        AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5))
    }

    fn spawn_box(scene: &mut SceneManager, name: &str, position: Vec3) -> EntityId {
        let id = scene.spawn(name, EntityKind::Generic, Transform::from_position(position));
        scene.set_bounds(id, unit_box()).unwrap();
        id
    }

    #[test]
    fn test_region_query_inside_outside_straddling() {
        let mut scene = SceneManager::new(SceneConfig::default());
        let inside = spawn_box(&mut scene, "inside", Vec3::new(2.0, 2.0, 2.0));
        let straddling = spawn_box(&mut scene, "straddling", Vec3::new(5.0, 2.0, 2.0));
        let _outside = spawn_box(&mut scene, "outside", Vec3::new(20.0, 2.0, 2.0));

        scene.update_transforms();
        scene.rebuild_bounds();

        let region = AABB::new(Vec3::zeros(), Vec3::repeat(5.0));
        assert_eq!(scene.query_region(&region), vec![inside, straddling]);
    }

    #[test]
    fn test_moving_parent_moves_children_after_rebuild() {
        let mut scene = SceneManager::new(SceneConfig::default());
        let sun = scene.spawn("sun", EntityKind::Generic, Transform::identity());
        let orbit = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        let planet = scene
            .spawn_child("planet", EntityKind::Generic, orbit, sun)
            .unwrap();
        scene.set_bounds(planet, unit_box()).unwrap();

        scene.update_transforms();
        scene.rebuild_bounds();
        let near_start = AABB::from_center_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::repeat(1.0));
        assert_eq!(scene.query_region(&near_start), vec![planet]);

        scene.set_local_position(sun, Vec3::new(0.0, 0.0, 100.0)).unwrap();

        // Stale until both the transforms and the tree are refreshed
        assert_eq!(scene.query_region(&near_start), vec![planet]);
        scene.update_transforms();
        scene.rebuild_bounds();

        let near_moved = AABB::from_center_extents(Vec3::new(10.0, 0.0, 100.0), Vec3::repeat(1.0));
        assert!(scene.query_region(&near_start).is_empty());
        assert_eq!(scene.query_region(&near_moved), vec![planet]);
    }

    #[test]
    fn test_query_visible_culls_by_frustum() {
        let mut scene = SceneManager::new(SceneConfig::default());
        let visible = spawn_box(&mut scene, "visible", Vec3::new(0.0, 0.0, 0.5));
        let _behind = spawn_box(&mut scene, "behind", Vec3::new(0.0, 0.0, -5.0));
        let _beside = spawn_box(&mut scene, "beside", Vec3::new(8.0, 0.0, 0.5));

        scene.update_transforms();
        scene.rebuild_bounds();

        let frustum = Frustum::from_matrix(&Mat4::identity());
        assert_eq!(scene.query_visible(&frustum), vec![visible]);
    }

    #[test]
    fn test_despawn_uses_configured_policy() {
        let mut subtree_config = SceneConfig::default();
        subtree_config.hierarchy.destroy_policy = DestroyPolicy::DestroySubtree;
        let mut scene = SceneManager::new(subtree_config);
        let parent = spawn_box(&mut scene, "parent", Vec3::zeros());
        let child = scene
            .spawn_child("child", EntityKind::Generic, Transform::identity(), parent)
            .unwrap();

        assert_eq!(scene.despawn(parent).unwrap(), vec![parent, child]);
        assert!(scene.entity(child).is_none());
        assert!(scene.transforms().is_empty());

        let mut reparent_config = SceneConfig::default();
        reparent_config.hierarchy.destroy_policy = DestroyPolicy::ReparentToGrandparent;
        let mut scene = SceneManager::new(reparent_config);
        let parent = spawn_box(&mut scene, "parent", Vec3::new(3.0, 0.0, 0.0));
        let offset = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let child = scene
            .spawn_child("child", EntityKind::Generic, offset, parent)
            .unwrap();
        scene.set_bounds(child, unit_box()).unwrap();

        assert_eq!(scene.despawn(parent).unwrap(), vec![parent]);
        let child_node = scene.entity(child).unwrap().transform;
        assert_eq!(scene.transforms().parent(child_node), None);

        scene.update_transforms();
        scene.rebuild_bounds();
        let around_child = AABB::from_center_extents(Vec3::new(4.0, 0.0, 0.0), Vec3::repeat(0.1));
        assert_eq!(scene.query_region(&around_child), vec![child]);
    }

    #[test]
    fn test_scene_reparent_rejects_cycles() {
        let mut scene = SceneManager::new(SceneConfig::default());
        let a = scene.spawn("a", EntityKind::Generic, Transform::identity());
        let b = scene
            .spawn_child("b", EntityKind::Generic, Transform::identity(), a)
            .unwrap();

        assert!(matches!(scene.set_parent(a, Some(b)), Err(SceneError::Hierarchy(_))));
        assert!(scene.set_parent(b, None).is_ok());
        assert!(scene.set_parent(a, Some(b)).is_ok());
    }

    #[test]
    fn test_rebuild_respects_configured_depth() {
        let config = SceneConfig {
            bounding_tree: BoundingTreeConfig::default().with_max_depth(2),
            ..SceneConfig::default()
        };
        let mut scene = SceneManager::new(config);
        let mut rng = StdRng::seed_from_u64(7);
        let mut ids = Vec::new();
        for i in 0..100 {
            let position = Vec3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
            );
            ids.push(spawn_box(&mut scene, &format!("box{i}"), position));
        }

        scene.update_transforms();
        let tree = scene.rebuild_bounds();

        assert_eq!(tree.len(), 100);
        assert!(tree.depth() <= 2);
        let everything = AABB::new(Vec3::repeat(-100.0), Vec3::repeat(100.0));
        assert_eq!(scene.query_region(&everything), ids);
    }
}
