//! Deferred destruction
//!
//! Systems never destroy entities while iterating. They attach [`ToRemove`];
//! the onboard remover spreads the mark to mounted entities and the mesh
//! remover releases visuals and destroys everything marked.

use rampart_ecs::{EcsError, Entity, EntityId, Query, Read, System, World};
use tracing::{debug, trace, warn};

use crate::components::{Collider, Explosive, Mesh, ToRemove, Vehicle};
use crate::scene::SharedScene;

/// Height below which explosives are considered to have hit the floor.
const FLOOR_Y: f32 = -0.5;

/// Mark `entity` for removal at the end of this frame. Marking twice is the
/// same as marking once; dead entities are skipped.
pub fn mark_for_removal(world: &mut World, entity: Entity) {
    if !world.is_alive(entity) {
        trace!("Not marking {}: already destroyed", entity);
        return;
    }
    if let Err(e) = world.attach(entity, ToRemove) {
        warn!("Could not mark {} for removal: {}", entity, e);
    }
}

/// Blows up explosives that hit something or fell through the floor.
///
/// A collided explosive marks its partner; it marks itself only if it is
/// destructible.
pub struct ExplosiveSystem;

impl System for ExplosiveSystem {
    type Context = Query<(EntityId, Read<Explosive>, Read<Collider>, Read<Mesh>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, explosives: &Self::Context, world: &mut World) {
        let mut doomed = Vec::new();
        for (entity, explosive, collider, mesh) in explosives.iter(world) {
            let fell = mesh.position.y <= FLOOR_Y;
            if fell || (collider.collided.is_some() && explosive.destructible) {
                doomed.push(entity);
            }
            if let Some(partner) = collider.collided {
                doomed.push(partner);
            }
        }
        for entity in doomed {
            mark_for_removal(world, entity);
        }
    }
}

/// Spreads removal from a vehicle to the entity it carries.
pub struct OnboardRemoverSystem;

impl System for OnboardRemoverSystem {
    type Context = Query<(Read<Vehicle>, Read<ToRemove>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, vehicles: &Self::Context, world: &mut World) {
        let onboard: Vec<Entity> = vehicles
            .iter(world)
            .map(|(vehicle, _)| vehicle.onboard)
            .collect();
        for entity in onboard {
            mark_for_removal(world, entity);
        }
    }
}

/// Releases the visual of every marked entity, then destroys it.
pub struct MeshRemoverSystem {
    scene: SharedScene,
}

impl MeshRemoverSystem {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }
}

impl System for MeshRemoverSystem {
    type Context = Query<(EntityId, Read<ToRemove>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, marked: &Self::Context, world: &mut World) {
        if marked.is_empty(world) {
            return;
        }
        let doomed: Vec<Entity> = marked.iter(world).map(|(entity, _)| entity).collect();
        let mut scene = self.scene.lock();
        for entity in &doomed {
            if let Ok(mesh) = world.get::<Mesh>(*entity) {
                scene.remove(mesh.handle);
            }
            world.despawn(*entity);
        }
        debug!("Removed {} entities", doomed.len());
    }
}
