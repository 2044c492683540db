use glam::Vec3;
use rampart_ecs::{EcsError, Entity, EntityId, Query, Read, System, World, Write};
use tracing::{trace, warn};

use super::frame_delta;
use crate::components::{Mesh, Turret, Vehicle};
use crate::factory::spawn_projectile;
use crate::scene::{world_transform, SharedScene};

/// Vehicles turn around once they reach this distance from the centre lane.
const VEHICLE_BOUND: f32 = 2.0;

/// Counts down each turret with a visual and fires a projectile from its
/// world position.
pub struct TurretSystem {
    scene: SharedScene,
}

impl TurretSystem {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }
}

impl System for TurretSystem {
    type Context = Query<(EntityId, Write<Turret>, Read<Mesh>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, turrets: &Self::Context, world: &mut World) {
        let Some(dt) = frame_delta(world) else {
            return;
        };
        let mut firing: Vec<Entity> = Vec::new();
        for (entity, turret, _) in turrets.iter_mut(world) {
            turret.time_until_fire -= dt;
            if turret.time_until_fire <= 0.0 {
                turret.time_until_fire = turret.reload_time();
                firing.push(entity);
            }
        }

        for turret in firing {
            let Some(transform) = world_transform(world, turret) else {
                continue;
            };
            let muzzle = transform.transform_point3(Vec3::ZERO);
            let mut scene = self.scene.lock();
            match spawn_projectile(world, &mut *scene, muzzle) {
                Ok(projectile) => trace!("{} fired {} from {}", turret, projectile, muzzle),
                Err(e) => warn!("Turret {} failed to fire: {}", turret, e),
            }
        }
    }
}

/// Drives vehicles sideways, bouncing between the outer lanes. A vehicle at
/// or past a bound is put back on it and turned around before it moves.
pub struct VehicleSystem;

impl System for VehicleSystem {
    type Context = Query<(Write<Vehicle>, Write<Mesh>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, vehicles: &Self::Context, world: &mut World) {
        let Some(dt) = frame_delta(world) else {
            return;
        };
        for (vehicle, mesh) in vehicles.iter_mut(world) {
            if mesh.position.x.abs() >= VEHICLE_BOUND {
                mesh.position.x = VEHICLE_BOUND.copysign(mesh.position.x);
                vehicle.speed = -vehicle.speed;
            }
            mesh.position.x += vehicle.speed * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Projectile, Velocity};
    use crate::factory::{spawn_turret, spawn_turret_vehicle};
    use crate::systems::testing::{self, RecordingScene};

    fn projectiles(world: &World) -> Vec<(Vec3, Vec3)> {
        world
            .create_query::<(Read<Projectile>, Read<Mesh>, Read<Velocity>)>()
            .unwrap()
            .iter(world)
            .map(|(_, mesh, velocity)| (mesh.position, velocity.0))
            .collect()
    }

    #[test]
    fn turret_fires_when_countdown_expires() {
        let mut world = testing::world(0.25);
        let scene = testing::shared(RecordingScene::default());
        let turret = spawn_turret(&mut world, &mut *scene.lock(), Vec3::new(1.0, 0.0, 2.0), true).unwrap();
        world.get_mut::<Turret>(turret).unwrap().time_until_fire = 0.2;

        let mut system = TurretSystem::new(scene);
        let ctx = system.setup(&mut world).unwrap();
        system.update(&ctx, &mut world);
        assert_eq!(
            projectiles(&world),
            vec![(Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -20.0))]
        );
        assert_eq!(world.get::<Turret>(turret).unwrap().time_until_fire, 2.0);

        system.update(&ctx, &mut world);
        assert_eq!(projectiles(&world).len(), 1);
    }

    #[test]
    fn onboard_turret_fires_from_mount() {
        let mut world = testing::world(0.25);
        let scene = testing::shared(RecordingScene::default());
        let vehicle = spawn_turret_vehicle(&mut world, &mut *scene.lock(), Vec3::new(-1.0, 0.0, 3.0)).unwrap();
        let onboard = world.get::<Vehicle>(vehicle).unwrap().onboard;
        world.get_mut::<Turret>(onboard).unwrap().time_until_fire = 0.0;

        let mut system = TurretSystem::new(scene);
        let ctx = system.setup(&mut world).unwrap();
        system.update(&ctx, &mut world);
        assert_eq!(projectiles(&world)[0].0, Vec3::new(-1.0, 0.5, 3.0));
        assert_eq!(world.get::<Turret>(onboard).unwrap().time_until_fire, 1.0);
    }

    #[test]
    fn turret_without_visual_is_idle() {
        let mut world = testing::world(0.25);
        let scene = testing::shared(RecordingScene::default());
        let bare = world.spawn();
        world.attach(bare, Turret { firing_rate: 1.0, time_until_fire: 0.1 }).unwrap();

        let mut system = TurretSystem::new(scene);
        let ctx = system.setup(&mut world).unwrap();
        system.update(&ctx, &mut world);
        assert!(projectiles(&world).is_empty());
        assert_eq!(world.get::<Turret>(bare).unwrap().time_until_fire, 0.1);
    }

    fn vehicle_x(world: &World, vehicle: Entity) -> f32 {
        world.get::<Mesh>(vehicle).unwrap().position.x
    }

    #[test]
    fn vehicle_bounces_at_bounds() {
        let mut world = testing::world(0.25);
        let scene = testing::shared(RecordingScene::default());
        let vehicle = spawn_turret_vehicle(&mut world, &mut *scene.lock(), Vec3::new(1.9, 0.0, 0.0)).unwrap();

        let mut system = VehicleSystem;
        let ctx = system.setup(&mut world).unwrap();
        system.update(&ctx, &mut world);
        assert_eq!(world.get::<Vehicle>(vehicle).unwrap().speed, 1.0);
        assert!((vehicle_x(&world, vehicle) - 2.15).abs() < 1e-6);

        // Past the bound: clamped back to it, turned, then moved.
        system.update(&ctx, &mut world);
        assert_eq!(world.get::<Vehicle>(vehicle).unwrap().speed, -1.0);
        assert!((vehicle_x(&world, vehicle) - 1.75).abs() < 1e-6);

        system.update(&ctx, &mut world);
        assert!((vehicle_x(&world, vehicle) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn vehicle_on_left_bound_heads_right() {
        let mut world = testing::world(0.25);
        let scene = testing::shared(RecordingScene::default());
        let vehicle = spawn_turret_vehicle(&mut world, &mut *scene.lock(), Vec3::new(-2.0, 0.0, 0.0)).unwrap();
        world.get_mut::<Vehicle>(vehicle).unwrap().speed = -1.0;

        let mut system = VehicleSystem;
        let ctx = system.setup(&mut world).unwrap();
        system.update(&ctx, &mut world);
        assert_eq!(world.get::<Vehicle>(vehicle).unwrap().speed, 1.0);
        assert!((vehicle_x(&world, vehicle) + 1.75).abs() < 1e-6);

        for _ in 0..40 {
            system.update(&ctx, &mut world);
            assert!(vehicle_x(&world, vehicle).abs() <= VEHICLE_BOUND + 0.25);
        }
    }
}
