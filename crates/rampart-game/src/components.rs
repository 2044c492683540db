//! Gameplay components and their registration

use glam::{Mat4, Vec3};
use rampart_ecs::{Component, ComponentKind, EcsError, Entity, StorageKind, World};
use rampart_physics::Aabb;

use crate::scene::MeshHandle;

/// Linear velocity in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec3);

/// Constant vertical acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub force: f32,
}

impl Default for Gravity {
    fn default() -> Self {
        Self { force: -9.8 }
    }
}

/// Link to the entity's visual plus the position the core owns for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    pub handle: MeshHandle,
    /// Position relative to the parent, or to the world without one.
    pub position: Vec3,
    pub parent: Option<Entity>,
}

impl Mesh {
    pub fn new(handle: MeshHandle, position: Vec3) -> Self {
        Self {
            handle,
            position,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

/// Collision volume and the result of the latest collision pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Volume in mesh space.
    pub local: Aabb,
    /// Only collide with entities carrying this component.
    pub filter: Option<ComponentKind>,
    /// Partner found by the latest pass; reset every frame.
    pub collided: Option<Entity>,
    /// `local` moved into world space by the latest pass.
    pub world_box: Aabb,
}

impl Collider {
    pub fn new(local: Aabb) -> Self {
        Self {
            local,
            filter: None,
            collided: None,
            world_box: Aabb::EMPTY,
        }
    }

    pub fn with_filter<T: Component>(mut self) -> Self {
        self.filter = Some(ComponentKind::of::<T>());
        self
    }
}

/// Marks itself and its collision partner for removal on contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosive {
    /// Whether the explosive itself is destroyed by a collision.
    pub destructible: bool,
}

impl Default for Explosive {
    fn default() -> Self {
        Self { destructible: true }
    }
}

/// The entity is destroyed by the lifecycle systems at the end of this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToRemove;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Enemy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Projectile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turret {
    /// Shots per second.
    pub firing_rate: f32,
    pub time_until_fire: f32,
}

impl Turret {
    pub fn with_rate(firing_rate: f32) -> Self {
        Self {
            firing_rate,
            time_until_fire: 1.0 / firing_rate,
        }
    }

    pub fn reload_time(&self) -> f32 {
        1.0 / self.firing_rate
    }
}

impl Default for Turret {
    fn default() -> Self {
        Self::with_rate(0.5)
    }
}

/// Moves sideways carrying an onboard entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub speed: f32,
    pub onboard: Entity,
}

impl Vehicle {
    pub fn new(onboard: Entity) -> Self {
        Self {
            speed: 1.0,
            onboard,
        }
    }
}

/// Generates power every second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collector {
    pub rate: f32,
}

impl Default for Collector {
    fn default() -> Self {
        Self { rate: 20.0 }
    }
}

/// Register every gameplay component with its storage strategy.
pub fn register_all(world: &mut World) -> Result<(), EcsError> {
    world.register::<Velocity>(StorageKind::Dense)?;
    world.register::<Mesh>(StorageKind::Dense)?;
    world.register::<Collider>(StorageKind::Dense)?;
    world.register::<Explosive>(StorageKind::Dense)?;
    world.register::<Enemy>(StorageKind::Dense)?;
    world.register::<Gravity>(StorageKind::Sparse)?;
    world.register::<ToRemove>(StorageKind::Sparse)?;
    world.register::<Projectile>(StorageKind::Sparse)?;
    world.register::<Turret>(StorageKind::Sparse)?;
    world.register::<Vehicle>(StorageKind::Sparse)?;
    world.register::<Collector>(StorageKind::Sparse)?;
    Ok(())
}
