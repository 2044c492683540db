use rampart_ecs::{EcsError, Query, Read, System, World, Write};

use super::frame_delta;
use crate::components::{Gravity, Mesh, Velocity};

/// Accelerates falling entities: `v.y += force * dt`.
pub struct GravitySystem;

impl System for GravitySystem {
    type Context = Query<(Read<Gravity>, Write<Velocity>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, falling: &Self::Context, world: &mut World) {
        let Some(dt) = frame_delta(world) else {
            return;
        };
        for (gravity, velocity) in falling.iter_mut(world) {
            velocity.0.y += gravity.force * dt;
        }
    }
}

/// Moves meshes by their velocity: `pos += v * dt`.
pub struct VelocitySystem;

impl System for VelocitySystem {
    type Context = Query<(Read<Velocity>, Write<Mesh>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, moving: &Self::Context, world: &mut World) {
        let Some(dt) = frame_delta(world) else {
            return;
        };
        for (velocity, mesh) in moving.iter_mut(world) {
            mesh.position += velocity.0 * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshHandle;
    use crate::systems::testing;
    use glam::Vec3;

    fn run<S: System>(mut system: S, world: &mut World) {
        let ctx = system.setup(world).unwrap();
        system.update(&ctx, world);
    }

    #[test]
    fn gravity_accelerates_downwards() {
        let mut world = testing::world(0.1);
        let e = world.spawn();
        world.attach(e, Velocity(Vec3::new(0.0, 0.0, -20.0))).unwrap();
        world.attach(e, Gravity::default()).unwrap();
        let still = world.spawn();
        world.attach(still, Velocity(Vec3::ZERO)).unwrap();

        run(GravitySystem, &mut world);
        let v = world.get::<Velocity>(e).unwrap().0;
        assert!((v.y + 0.98).abs() < 1e-6);
        assert_eq!(v.z, -20.0);
        assert_eq!(world.get::<Velocity>(still).unwrap().0, Vec3::ZERO);
    }

    #[test]
    fn velocity_moves_mesh() {
        let mut world = testing::world(0.2);
        let e = world.spawn();
        world.attach(e, Velocity(Vec3::new(0.0, 0.0, 1.5))).unwrap();
        world.attach(e, Mesh::new(MeshHandle(1), Vec3::new(1.0, 0.0, 0.0))).unwrap();

        run(VelocitySystem, &mut world);
        let pos = world.get::<Mesh>(e).unwrap().position;
        assert!((pos - Vec3::new(1.0, 0.0, 0.3)).length() < 1e-6);
    }

    #[test]
    fn missing_clock_skips_update() {
        let mut world = testing::world(0.2);
        world.remove_resource::<rampart_core::GameTime>();
        let e = world.spawn();
        world.attach(e, Velocity(Vec3::X)).unwrap();
        world.attach(e, Mesh::new(MeshHandle(1), Vec3::ZERO)).unwrap();

        run(VelocitySystem, &mut world);
        assert_eq!(world.get::<Mesh>(e).unwrap().position, Vec3::ZERO);
    }
}
