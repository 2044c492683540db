//! Collision detection between colliders
//!
//! Every frame the system refreshes each collider's world box, clears its
//! previous result, and tests candidate pairs. A filter on the outer collider
//! of a pair restricts which partners it is tested against; a hit is written
//! to both sides regardless of the inner collider's filter. An entity touching
//! several partners keeps the one tested last.

use rampart_ecs::{ComponentKind, EcsError, Entity, EntityId, Query, Read, System, World};
use rampart_physics::{Aabb, AabbUpdater, BroadPhase, PairwiseBroadPhase, VolumeUpdater};
use tracing::{trace, warn};

use crate::components::{Collider, Mesh};
use crate::scene::world_transform;

pub struct CollisionSystem {
    updater: Box<dyn VolumeUpdater>,
    broad_phase: Box<dyn BroadPhase>,
    entities: Vec<Entity>,
    volumes: Vec<Aabb>,
    filters: Vec<Option<ComponentKind>>,
    partners: Vec<Option<Entity>>,
    pairs: Vec<(usize, usize)>,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::with_parts(Box::new(AabbUpdater), Box::new(PairwiseBroadPhase))
    }

    pub fn with_parts(updater: Box<dyn VolumeUpdater>, broad_phase: Box<dyn BroadPhase>) -> Self {
        Self {
            updater,
            broad_phase,
            entities: Vec::new(),
            volumes: Vec::new(),
            filters: Vec::new(),
            partners: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Recompute world boxes and clear last frame's results.
    fn refresh(&mut self, colliders: &Query<(EntityId, Read<Collider>, Read<Mesh>)>, world: &mut World) {
        self.entities.clear();
        self.entities
            .extend(colliders.iter(world).map(|(entity, _, _)| entity));

        self.volumes.clear();
        self.filters.clear();
        for &entity in &self.entities {
            let transform = world_transform(world, entity).unwrap_or_default();
            let collider = match world.get_mut::<Collider>(entity) {
                Ok(collider) => collider,
                Err(e) => {
                    warn!("Skipping collider refresh: {}", e);
                    self.volumes.push(Aabb::EMPTY);
                    self.filters.push(None);
                    continue;
                }
            };
            let local = collider.local;
            self.updater
                .update_volume(&mut collider.world_box, &local, &transform);
            collider.collided = None;
            self.volumes.push(collider.world_box);
            self.filters.push(collider.filter);
        }
    }

    fn detect(&mut self, world: &World) {
        self.partners.clear();
        self.partners.resize(self.entities.len(), None);
        self.broad_phase
            .candidate_pairs(&self.volumes, &mut self.pairs);

        for &(i, j) in &self.pairs {
            let (outer, inner) = (self.entities[i], self.entities[j]);
            if let Some(filter) = self.filters[i] {
                if !world.has_kind(inner, filter) {
                    continue;
                }
            }
            if self.updater.intersects(&self.volumes[i], &self.volumes[j]) {
                trace!("Collision {} <-> {}", outer, inner);
                self.partners[i] = Some(inner);
                self.partners[j] = Some(outer);
            }
        }
    }

    fn record(&self, world: &mut World) {
        for (&entity, &partner) in self.entities.iter().zip(&self.partners) {
            if partner.is_none() {
                continue;
            }
            if let Ok(collider) = world.get_mut::<Collider>(entity) {
                collider.collided = partner;
            }
        }
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CollisionSystem {
    type Context = Query<(EntityId, Read<Collider>, Read<Mesh>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, colliders: &Self::Context, world: &mut World) {
        if colliders.is_empty(world) {
            return;
        }
        self.refresh(colliders, world);
        self.detect(world);
        self.record(world);
    }
}
