//! Transform Hierarchy Demo
//!
//! Headless walk-through of the scene core:
//! - Builds a small orbital system (sun, planets, a moon, a camera)
//! - Spins the orbits for a few frames and logs world positions
//! - Moves the moon to another planet without disturbing its world pose
//! - Rebuilds the bounding volume tree and runs region and frustum queries
//!
//! Usage: `hierarchy_demo [config.toml|config.ron]`

use log::info;
use scene_core::foundation::logging;
use scene_core::foundation::math::Point3;
use scene_core::prelude::*;
use std::f32::consts::PI;

// Frames simulated before the reparent
const FRAME_COUNT: usize = 8;
const FRAME_DT: f32 = 1.0 / 60.0;

// Orbit angular speeds (radians per second)
const PLANET_ORBIT_SPEED: f32 = PI / 2.0;
const MOON_ORBIT_SPEED: f32 = 2.0 * PI;

// Camera projection
const CAMERA_FOV_Y: f32 = PI / 3.0;
const CAMERA_ASPECT: f32 = 16.0 / 9.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 200.0;

/// Handles to everything the demo moves or queries
struct OrbitalSystem {
    sun: EntityId,
    inner_planet: EntityId,
    outer_planet: EntityId,
    moon: EntityId,
    camera: EntityId,
}

fn build_system(scene: &mut SceneManager) -> Result<OrbitalSystem, SceneError> {
    let sun = scene.spawn("sun", EntityKind::Light, Transform::identity().with_uniform_scale(3.0));
    scene.set_bounds(sun, AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))?;

    let inner_planet = scene.spawn_child(
        "inner_planet",
        EntityKind::Generic,
        Transform::from_position(Vec3::new(4.0, 0.0, 0.0)).with_uniform_scale(0.25),
        sun,
    )?;
    scene.set_bounds(inner_planet, AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))?;

    let outer_planet = scene.spawn_child(
        "outer_planet",
        EntityKind::Generic,
        Transform::from_position(Vec3::new(0.0, 0.0, -9.0)).with_uniform_scale(0.5),
        sun,
    )?;
    scene.set_bounds(outer_planet, AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))?;

    let moon = scene.spawn_child(
        "moon",
        EntityKind::Generic,
        Transform::from_position(Vec3::new(3.0, 0.0, 0.0)).with_uniform_scale(0.3),
        inner_planet,
    )?;
    scene.set_bounds(moon, AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0)))?;

    let camera_local = Transform::from_position(Vec3::new(0.0, 20.0, 40.0));
    let camera = scene.spawn("camera", EntityKind::Camera, camera_local);

    Ok(OrbitalSystem {
        sun,
        inner_planet,
        outer_planet,
        moon,
        camera,
    })
}

/// Right-handed perspective with a `[0, 1]` depth range
fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    Mat4::new(
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, far / (near - far), near * far / (near - far),
        0.0, 0.0, -1.0, 0.0,
    )
}

fn node_of(scene: &SceneManager, id: EntityId) -> Result<NodeHandle, SceneError> {
    scene
        .entity(id)
        .map(|entity| entity.transform)
        .ok_or(SceneError::EntityNotFound(id))
}

fn log_world_position(scene: &SceneManager, name: &str, id: EntityId) -> Result<(), SceneError> {
    let position = scene.transforms().world_position(node_of(scene, id)?)?;
    info!("  {name:<13} world = ({:>7.3}, {:>7.3}, {:>7.3})", position.x, position.y, position.z);
    Ok(())
}

fn advance_orbits(
    scene: &mut SceneManager,
    system: &OrbitalSystem,
    elapsed: f32,
) -> Result<(), SceneError> {
    let up = Vec3::y_axis();
    scene.set_local_rotation(
        system.sun,
        Quat::from_axis_angle(&up, elapsed * PLANET_ORBIT_SPEED),
    )?;
    scene.set_local_rotation(
        system.inner_planet,
        Quat::from_axis_angle(&up, elapsed * MOON_ORBIT_SPEED),
    )?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = SceneConfig::load_from_file(&path)?;
            config.validate()?;
            config
        }
        None => SceneConfig::default(),
    };
    logging::init_with_level(config.logging.level_filter()?);

    info!("=== Transform Hierarchy Demo ===");
    info!("Bounding tree max depth: {}", config.bounding_tree.max_depth);
    info!("Destroy policy: {:?}", config.hierarchy.destroy_policy);

    let mut scene = SceneManager::new(config);
    let system = build_system(&mut scene)?;

    for frame in 0..FRAME_COUNT {
        #[allow(clippy::cast_precision_loss)]
        let elapsed = (frame + 1) as f32 * FRAME_DT * 10.0;
        advance_orbits(&mut scene, &system, elapsed)?;
        let recomputed = scene.update_transforms();
        info!("Frame {frame}: {recomputed} world matrices recomputed");
    }

    info!("World positions before reparent:");
    log_world_position(&scene, "inner_planet", system.inner_planet)?;
    log_world_position(&scene, "outer_planet", system.outer_planet)?;
    log_world_position(&scene, "moon", system.moon)?;

    // Hand the moon over to the outer planet; its world pose must not jump
    scene.set_parent(system.moon, Some(system.outer_planet))?;
    scene.update_transforms();
    info!("World positions after moving the moon to outer_planet:");
    log_world_position(&scene, "moon", system.moon)?;

    // A cycle is refused and leaves the hierarchy untouched
    if let Err(err) = scene.set_parent(system.sun, Some(system.moon)) {
        info!("Refused reparent: {err}");
    }

    let tree = scene.rebuild_bounds();
    info!(
        "Bounding tree: {} payload(s), {} node(s), depth {}",
        tree.len(),
        tree.nodes().len(),
        tree.depth()
    );

    let around_sun = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(5.0));
    info!("Entities within 5 units of the sun: {:?}", scene.query_region(&around_sun));

    let camera_position = scene.transforms().world_position(node_of(&scene, system.camera)?)?;
    let view = Mat4::look_at_rh(&Point3::from(camera_position), &Point3::origin(), &Vec3::y());
    let projection = perspective(CAMERA_FOV_Y, CAMERA_ASPECT, CAMERA_NEAR, CAMERA_FAR);
    let frustum = Frustum::from_matrix(&(projection * view));
    info!("Entities visible from the camera: {:?}", scene.query_visible(&frustum));

    let removed = scene.despawn(system.inner_planet)?;
    info!("Despawned inner_planet, removed {removed:?}");
    info!("{} entities remain", scene.entity_count());

    Ok(())
}
