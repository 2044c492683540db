//! Entity factories
//!
//! Each factory creates the visual, adds it to the scene, and attaches the
//! full component set for one kind of game object.

use glam::Vec3;
use rampart_ecs::{EcsError, Entity, World};
use rampart_physics::Aabb;
use serde::{Deserialize, Serialize};

use crate::components::{
    Collector, Collider, Enemy, Explosive, Gravity, Mesh, Projectile, Turret, Vehicle, Velocity,
};
use crate::scene::{Color, Scene};

const ENEMY_SPEED: f32 = 1.5;
const PROJECTILE_SPEED: f32 = 20.0;
const PROJECTILE_SIZE: f32 = 0.2;
const VEHICLE_SIZE: f32 = 0.9;
const ONBOARD_TURRET_HEIGHT: f32 = 0.5;

/// Things the player can place on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceableItem {
    Mine,
    Turret,
    TurretVehicle,
    Collector,
}

impl PlaceableItem {
    pub fn spawn(
        self,
        world: &mut World,
        scene: &mut dyn Scene,
        position: Vec3,
    ) -> Result<Entity, EcsError> {
        match self {
            PlaceableItem::Mine => spawn_mine(world, scene, position),
            PlaceableItem::Turret => spawn_turret(world, scene, position, true),
            PlaceableItem::TurretVehicle => spawn_turret_vehicle(world, scene, position),
            PlaceableItem::Collector => spawn_collector(world, scene, position),
        }
    }
}

fn spawn_box(
    world: &mut World,
    scene: &mut dyn Scene,
    color: Color,
    size: f32,
    position: Vec3,
) -> Result<Entity, EcsError> {
    let handle = scene.create_box(color, size);
    scene.add(handle);
    let entity = world.spawn();
    world.attach(entity, Mesh::new(handle, position))?;
    Ok(entity)
}

fn cube(size: f32) -> Aabb {
    Aabb::from_center_size(Vec3::ZERO, Vec3::splat(size))
}

/// Walks towards the goal and blows up whatever it touches.
pub fn spawn_enemy(
    world: &mut World,
    scene: &mut dyn Scene,
    position: Vec3,
) -> Result<Entity, EcsError> {
    let entity = spawn_box(world, scene, Color::Green, 1.0, position)?;
    world.attach(entity, Enemy)?;
    world.attach(entity, Velocity(Vec3::new(0.0, 0.0, ENEMY_SPEED)))?;
    world.attach(entity, Collider::new(cube(1.0)))?;
    world.attach(entity, Explosive { destructible: false })?;
    Ok(entity)
}

pub fn spawn_mine(
    world: &mut World,
    scene: &mut dyn Scene,
    position: Vec3,
) -> Result<Entity, EcsError> {
    let entity = spawn_box(world, scene, Color::Red, 1.0, position)?;
    world.attach(entity, Collider::new(cube(1.0)).with_filter::<Enemy>())?;
    world.attach(entity, Explosive::default())?;
    Ok(entity)
}

/// A shell fired down the lane, falling under gravity.
pub fn spawn_projectile(
    world: &mut World,
    scene: &mut dyn Scene,
    position: Vec3,
) -> Result<Entity, EcsError> {
    let entity = spawn_box(world, scene, Color::Red, PROJECTILE_SIZE, position)?;
    world.attach(entity, Projectile)?;
    world.attach(
        entity,
        Collider::new(cube(PROJECTILE_SIZE)).with_filter::<Enemy>(),
    )?;
    world.attach(entity, Explosive::default())?;
    world.attach(entity, Gravity::default())?;
    world.attach(entity, Velocity(Vec3::new(0.0, 0.0, -PROJECTILE_SPEED)))?;
    Ok(entity)
}

/// Stationary turret. Without a collider it cannot be hit, which is how it
/// rides on a vehicle.
pub fn spawn_turret(
    world: &mut World,
    scene: &mut dyn Scene,
    position: Vec3,
    with_collider: bool,
) -> Result<Entity, EcsError> {
    let entity = spawn_box(world, scene, Color::Blue, 1.0, position)?;
    world.attach(entity, Turret::default())?;
    if with_collider {
        world.attach(entity, Collider::new(cube(1.0)).with_filter::<Enemy>())?;
    }
    Ok(entity)
}

/// A vehicle with a turret mounted on top. The vehicle's collider covers the
/// turret as well, and removing the vehicle removes the turret.
pub fn spawn_turret_vehicle(
    world: &mut World,
    scene: &mut dyn Scene,
    position: Vec3,
) -> Result<Entity, EcsError> {
    let vehicle = spawn_box(world, scene, Color::Yellow, VEHICLE_SIZE, position)?;
    let mount = Vec3::new(0.0, ONBOARD_TURRET_HEIGHT, 0.0);
    let turret = spawn_turret(world, scene, mount, false)?;

    let vehicle_handle = world.get::<Mesh>(vehicle)?.handle;
    let turret_mesh = world.get_mut::<Mesh>(turret)?;
    turret_mesh.parent = Some(vehicle);
    let turret_handle = turret_mesh.handle;
    scene.attach(vehicle_handle, turret_handle);
    world.attach(turret, Turret::with_rate(1.0))?;

    let covered = cube(VEHICLE_SIZE).union(&Aabb::from_center_size(mount, Vec3::ONE));
    world.attach(vehicle, Collider::new(covered).with_filter::<Enemy>())?;
    world.attach(vehicle, Vehicle::new(turret))?;
    Ok(vehicle)
}

pub fn spawn_collector(
    world: &mut World,
    scene: &mut dyn Scene,
    position: Vec3,
) -> Result<Entity, EcsError> {
    let entity = spawn_box(world, scene, Color::Orange, 1.0, position)?;
    world.attach(entity, Collector::default())?;
    world.attach(entity, Collider::new(cube(1.0)).with_filter::<Enemy>())?;
    Ok(entity)
}
