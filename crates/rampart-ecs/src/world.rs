use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::component::{Component, ComponentKind, ComponentStorage, Storage, StorageKind};
use crate::entity::{Entity, EntityRegistry};
use crate::error::EcsError;
use crate::query::{Query, StorageMap, WorldQuery};
use crate::resource::Resources;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(0);

/// Distinguishes worlds so a query is never iterated against a foreign one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorldId(u64);

/// The central ECS container. Owns all entities, component storages, and resources.
///
/// Component types must be registered with a storage strategy before any entity
/// can carry them.
pub struct World {
    id: WorldId,
    pub(crate) entities: EntityRegistry,
    pub(crate) storages: StorageMap,
    resources: Resources,
    pending_despawn: Vec<Entity>,
}

impl World {
    pub fn new() -> Self {
        Self {
            id: WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed)),
            entities: EntityRegistry::new(),
            storages: HashMap::new(),
            resources: Resources::new(),
            pending_despawn: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> WorldId {
        self.id
    }

    // ---- Registration ----

    /// Bind component type `T` to a storage strategy. Fails if `T` is already registered.
    pub fn register<T: Component>(&mut self, strategy: StorageKind) -> Result<(), EcsError> {
        let kind = ComponentKind::of::<T>();
        if self.storages.contains_key(&kind.id()) {
            return Err(EcsError::AlreadyRegistered(kind.name()));
        }
        self.storages
            .insert(kind.id(), Box::new(Storage::<T>::new(strategy)));
        debug!("Registered component {} ({:?})", kind.name(), strategy);
        Ok(())
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.storages.contains_key(&TypeId::of::<T>())
    }

    /// The strategy `T` was registered with.
    pub fn storage_kind<T: Component>(&self) -> Option<StorageKind> {
        self.storages
            .get(&TypeId::of::<T>())
            .map(|storage| storage.strategy())
    }

    /// Resolve a query description into a reusable handle.
    pub fn create_query<Q: WorldQuery>(&self) -> Result<Query<Q>, EcsError> {
        Query::new(self)
    }

    // ---- Entity management ----

    /// Create a new entity with no components.
    pub fn spawn(&mut self) -> Entity {
        self.entities.create()
    }

    /// Destroy an entity, removing its components from every storage.
    /// Returns `false` if it was already destroyed.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.destroy(entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove(entity.index);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All alive entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Ask for `entity` to be destroyed at the next [`World::flush_despawns`].
    pub fn queue_despawn(&mut self, entity: Entity) {
        self.pending_despawn.push(entity);
    }

    /// Number of despawns waiting for the next flush.
    pub fn pending_despawns(&self) -> usize {
        self.pending_despawn.len()
    }

    /// Destroy everything queued with [`World::queue_despawn`]. Entities queued
    /// more than once, or already destroyed, are skipped. Returns how many died.
    pub fn flush_despawns(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_despawn);
        pending
            .into_iter()
            .filter(|&entity| self.despawn(entity))
            .count()
    }

    // ---- Component management ----

    fn storage<T: Component>(&self) -> Result<&Storage<T>, EcsError> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<Storage<T>>())
            .ok_or(EcsError::NotRegistered(type_name::<T>()))
    }

    fn storage_mut<T: Component>(&mut self) -> Result<&mut Storage<T>, EcsError> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<T>>())
            .ok_or(EcsError::NotRegistered(type_name::<T>()))
    }

    fn check_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(entity))
        }
    }

    /// Attach a component, replacing any existing component of the same type.
    pub fn attach<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.storage_mut::<T>()?.insert(entity.index, component);
        Ok(())
    }

    /// Detach a component, returning it. A no-op for dead entities and entities
    /// that never had one.
    pub fn detach<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>().ok()?.take(entity.index)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.check_alive(entity)?;
        self.storage::<T>()?
            .get(entity.index)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: type_name::<T>(),
            })
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.check_alive(entity)?;
        self.storage_mut::<T>()?
            .get_mut(entity.index)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: type_name::<T>(),
            })
    }

    /// Check whether an entity has a component of the given type.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_kind(entity, ComponentKind::of::<T>())
    }

    /// Like [`World::has`] with a runtime component token.
    pub fn has_kind(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.entities.is_alive(entity)
            && self
                .storages
                .get(&kind.id())
                .is_some_and(|storage| storage.has(entity.index))
    }

    // ---- Resources ----

    /// Insert a singleton resource, returning the one it replaced.
    pub fn insert_resource<T: 'static + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.resources.insert(value)
    }

    pub fn resource<T: 'static + Send + Sync>(&self) -> Result<&T, EcsError> {
        self.resources.get::<T>()
    }

    pub fn resource_mut<T: 'static + Send + Sync>(&mut self) -> Result<&mut T, EcsError> {
        self.resources.get_mut::<T>()
    }

    /// Fetch a resource, creating it from `Default` if needed.
    pub fn resource_or_default<T: 'static + Send + Sync + Default>(&mut self) -> &mut T {
        self.resources.get_or_default::<T>()
    }

    pub fn remove_resource<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
