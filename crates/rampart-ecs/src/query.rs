#![allow(private_interfaces)]

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::component::{Component, ComponentKind, ComponentStorage, Storage};
use crate::entity::{Entity, EntityRegistry};
use crate::error::EcsError;
use crate::world::{World, WorldId};

pub(crate) type StorageMap = HashMap<TypeId, Box<dyn ComponentStorage>>;

/// One element of a query description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(ComponentKind),
    Write(ComponentKind),
    EntityId,
}

impl Access {
    /// The component type touched, if any.
    pub fn kind(&self) -> Option<ComponentKind> {
        match self {
            Access::Read(kind) | Access::Write(kind) => Some(*kind),
            Access::EntityId => None,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Access::Write(_))
    }
}

/// Shared access to component `T`. Yields `&T`.
pub struct Read<T>(PhantomData<fn() -> T>);

/// Exclusive access to component `T`. Yields `&mut T`.
pub struct Write<T>(PhantomData<fn() -> T>);

/// Yields the [`Entity`] the rest of the tuple belongs to.
pub struct EntityId;

/// Trait implemented by query parameters (`Read<T>`, `Write<T>`, `EntityId`) and
/// tuples of them.
///
/// # Safety
/// Implementors must report every component they touch through `access`, with
/// `Access::Write` for anything `fetch` hands out mutably.
pub unsafe trait WorldQuery {
    type Item<'w>;

    /// Resolved storage pointers, looked up once per iteration.
    type Fetch: Copy;

    fn access(out: &mut Vec<Access>);

    /// Resolve the storages this parameter reads.
    ///
    /// # Safety
    /// `storages` must be valid for the whole iteration. If `Self` is not
    /// [`ReadOnlyWorldQuery`] it must come from an exclusive borrow.
    unsafe fn init_fetch(storages: NonNull<StorageMap>) -> Option<Self::Fetch>;

    /// Fetch the item for one entity, or `None` if it lacks a component.
    ///
    /// # Safety
    /// The caller must not fetch the same entity twice while an earlier item
    /// for it is still alive.
    unsafe fn fetch<'w>(fetch: Self::Fetch, entity: Entity) -> Option<Self::Item<'w>>;
}

/// Queries that never hand out `&mut`. These can be iterated from `&World`.
///
/// # Safety
/// Only implement for parameters whose `fetch` produces shared references.
pub unsafe trait ReadOnlyWorldQuery: WorldQuery {}

// --- Read<T> ---

unsafe impl<T: Component> WorldQuery for Read<T> {
    type Item<'w> = &'w T;
    type Fetch = NonNull<Storage<T>>;

    fn access(out: &mut Vec<Access>) {
        out.push(Access::Read(ComponentKind::of::<T>()));
    }

    unsafe fn init_fetch(storages: NonNull<StorageMap>) -> Option<Self::Fetch> {
        let storage = storages.as_ref().get(&TypeId::of::<T>())?;
        let typed = storage.as_any().downcast_ref::<Storage<T>>()?;
        Some(NonNull::from(typed))
    }

    unsafe fn fetch<'w>(fetch: Self::Fetch, entity: Entity) -> Option<Self::Item<'w>> {
        fetch.as_ref().get(entity.index)
    }
}

unsafe impl<T: Component> ReadOnlyWorldQuery for Read<T> {}

// --- Write<T> ---

unsafe impl<T: Component> WorldQuery for Write<T> {
    type Item<'w> = &'w mut T;
    type Fetch = NonNull<Storage<T>>;

    fn access(out: &mut Vec<Access>) {
        out.push(Access::Write(ComponentKind::of::<T>()));
    }

    unsafe fn init_fetch(mut storages: NonNull<StorageMap>) -> Option<Self::Fetch> {
        let storage = storages.as_mut().get_mut(&TypeId::of::<T>())?;
        let typed = storage.as_any_mut().downcast_mut::<Storage<T>>()?;
        Some(NonNull::from(typed))
    }

    unsafe fn fetch<'w>(mut fetch: Self::Fetch, entity: Entity) -> Option<Self::Item<'w>> {
        // Reborrows the whole storage for each item. Items handed out earlier
        // point at other slots, since the candidate snapshot never repeats one.
        fetch.as_mut().get_mut(entity.index)
    }
}

// --- EntityId ---

unsafe impl WorldQuery for EntityId {
    type Item<'w> = Entity;
    type Fetch = ();

    fn access(out: &mut Vec<Access>) {
        out.push(Access::EntityId);
    }

    unsafe fn init_fetch(_storages: NonNull<StorageMap>) -> Option<Self::Fetch> {
        Some(())
    }

    unsafe fn fetch<'w>(_fetch: Self::Fetch, entity: Entity) -> Option<Self::Item<'w>> {
        Some(entity)
    }
}

unsafe impl ReadOnlyWorldQuery for EntityId {}

// --- Tuple implementations ---

macro_rules! impl_world_query_tuple {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        unsafe impl<$($name: WorldQuery),+> WorldQuery for ($($name,)+) {
            type Item<'w> = ($($name::Item<'w>,)+);
            type Fetch = ($($name::Fetch,)+);

            fn access(out: &mut Vec<Access>) {
                $($name::access(out);)+
            }

            unsafe fn init_fetch(storages: NonNull<StorageMap>) -> Option<Self::Fetch> {
                Some(($($name::init_fetch(storages)?,)+))
            }

            unsafe fn fetch<'w>(fetch: Self::Fetch, entity: Entity) -> Option<Self::Item<'w>> {
                let ($($name,)+) = fetch;
                Some(($($name::fetch($name, entity)?,)+))
            }
        }

        unsafe impl<$($name: ReadOnlyWorldQuery),+> ReadOnlyWorldQuery for ($($name,)+) {}
    };
}

impl_world_query_tuple!(A);
impl_world_query_tuple!(A, B);
impl_world_query_tuple!(A, B, C);
impl_world_query_tuple!(A, B, C, D);
impl_world_query_tuple!(A, B, C, D, E);
impl_world_query_tuple!(A, B, C, D, E, F);

/// A validated, reusable query description bound to one world.
///
/// Created once (usually in a system's `setup`) with [`World::create_query`] and
/// iterated every frame. Queries containing a [`Write`] can only be iterated from
/// `&mut World`; read-only queries also iterate from `&World`.
pub struct Query<Q: WorldQuery> {
    world: WorldId,
    access: Vec<Access>,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: WorldQuery> Query<Q> {
    pub(crate) fn new(world: &World) -> Result<Self, EcsError> {
        let mut access = Vec::new();
        Q::access(&mut access);

        for (i, element) in access.iter().enumerate() {
            let Some(kind) = element.kind() else {
                continue;
            };
            if !world.storages.contains_key(&kind.id()) {
                return Err(EcsError::NotRegistered(kind.name()));
            }
            let clash = access[..i]
                .iter()
                .any(|earlier| earlier.kind() == Some(kind) && (element.is_write() || earlier.is_write()));
            if clash {
                return Err(EcsError::ConflictingAccess(kind.name()));
            }
        }

        Ok(Self {
            world: world.id(),
            access,
            _marker: PhantomData,
        })
    }

    /// The access list in declaration order.
    pub fn access(&self) -> &[Access] {
        &self.access
    }

    /// Iterate the live join from a shared borrow.
    pub fn iter<'w>(&self, world: &'w World) -> QueryIter<'w, Q>
    where
        Q: ReadOnlyWorldQuery,
    {
        self.check_world(world);
        let candidates = self.candidates(world);
        // Safety: read-only parameters never write through the pointer.
        let fetch = unsafe { Q::init_fetch(NonNull::from(&world.storages)) };
        QueryIter::new(fetch, &world.entities, candidates)
    }

    /// Iterate the live join with write access.
    pub fn iter_mut<'w>(&self, world: &'w mut World) -> QueryIter<'w, Q> {
        self.check_world(world);
        let candidates = self.candidates(world);
        // Safety: `world` is exclusively borrowed for 'w and `new` rejected any
        // component appearing twice with a write among its accesses.
        let fetch = unsafe { Q::init_fetch(NonNull::from(&mut world.storages)) };
        QueryIter::new(fetch, &world.entities, candidates)
    }

    /// Whether the join is currently empty. Does not fetch any component.
    pub fn is_empty(&self, world: &World) -> bool {
        !self.candidates(world).into_iter().any(|index| self.matches(world, index))
    }

    /// Number of entities the join would yield.
    pub fn count(&self, world: &World) -> usize {
        self.candidates(world)
            .into_iter()
            .filter(|&index| self.matches(world, index))
            .count()
    }

    /// Whether `entity` satisfies every requirement of this query.
    pub fn contains(&self, world: &World, entity: Entity) -> bool {
        world.is_alive(entity) && self.matches(world, entity.index)
    }

    fn matches(&self, world: &World, index: u32) -> bool {
        world.entities.entity_at(index).is_some()
            && self.required().all(|kind| {
                world
                    .storages
                    .get(&kind.id())
                    .is_some_and(|storage| storage.has(index))
            })
    }

    fn required(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.access.iter().filter_map(Access::kind)
    }

    /// Snapshot the entity slots to visit: those of the smallest required storage
    /// (first listed wins ties), or every live entity for an id-only query.
    fn candidates(&self, world: &World) -> Vec<u32> {
        let mut primary: Option<&dyn ComponentStorage> = None;
        for kind in self.required() {
            let Some(storage) = world.storages.get(&kind.id()) else {
                return Vec::new();
            };
            if primary.map_or(true, |best| storage.len() < best.len()) {
                primary = Some(&**storage);
            }
        }
        match primary {
            Some(storage) => storage.indices(),
            None => world.entities.iter().map(|entity| entity.index).collect(),
        }
    }

    fn check_world(&self, world: &World) {
        assert_eq!(
            self.world,
            world.id(),
            "query used with a world it was not created for"
        );
    }
}

impl<Q: WorldQuery> fmt::Debug for Query<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("access", &self.access).finish()
    }
}

/// Iterator returned by [`Query::iter`] and [`Query::iter_mut`].
///
/// The set of candidate entities is fixed when the iterator is created; values are
/// read as each tuple is produced.
pub struct QueryIter<'w, Q: WorldQuery> {
    fetch: Option<Q::Fetch>,
    entities: &'w EntityRegistry,
    candidates: std::vec::IntoIter<u32>,
}

impl<'w, Q: WorldQuery> QueryIter<'w, Q> {
    fn new(fetch: Option<Q::Fetch>, entities: &'w EntityRegistry, candidates: Vec<u32>) -> Self {
        Self {
            fetch,
            entities,
            candidates: candidates.into_iter(),
        }
    }
}

impl<'w, Q: WorldQuery> Iterator for QueryIter<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        let fetch = self.fetch?;
        for index in self.candidates.by_ref() {
            let Some(entity) = self.entities.entity_at(index) else {
                continue;
            };
            // Safety: every slot appears once in the snapshot, so no entity is
            // fetched twice during this iteration.
            if let Some(item) = unsafe { Q::fetch(fetch, entity) } {
                return Some(item);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}
