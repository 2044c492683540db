use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Marker trait for types that can be stored as ECS components.
pub trait Component: 'static + Send + Sync {}

/// Blanket implementation: any `'static + Send + Sync` type is a valid component.
impl<T: 'static + Send + Sync> Component for T {}

/// Runtime token naming a component type. Used as the storage key and as the
/// collision filter carried by colliders.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.name)
    }
}

/// Backing strategy chosen when a component type is registered.
///
/// The choice only trades memory for lookup cost; both strategies behave the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Array indexed by entity slot. Use for components most entities carry.
    Dense,
    /// Hashed sparse set. Memory proportional to the number of carriers.
    #[default]
    Sparse,
}

/// Type-erased component storage interface.
pub(crate) trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn strategy(&self) -> StorageKind;
    /// Drop the component stored for `index`. Returns `true` if one was present.
    fn remove(&mut self, index: u32) -> bool;
    fn has(&self, index: u32) -> bool;
    fn len(&self) -> usize;
    /// Snapshot of the entity slots carrying this component, in iteration order.
    fn indices(&self) -> Vec<u32>;
}

/// Dense storage: one optional slot per entity index.
pub struct SparseArray<T> {
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T> SparseArray<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let idx = index as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        let previous = self.slots[idx].replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    pub fn take(&mut self, index: u32) -> Option<T> {
        let taken = self.slots.get_mut(index as usize)?.take();
        if taken.is_some() {
            self.len -= 1;
        }
        taken
    }

    pub fn indices(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| idx as u32)
            .collect()
    }
}

/// Sparse-set storage: a hashed index into packed component values.
pub struct SparseSet<T> {
    /// Maps entity index → dense index.
    sparse: HashMap<u32, usize>,
    /// Packed component values.
    dense: Vec<T>,
    /// Entity indices corresponding to each dense slot.
    entities: Vec<u32>,
}

impl<T> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: HashMap::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        if let Some(&dense_idx) = self.sparse.get(&index) {
            return Some(std::mem::replace(&mut self.dense[dense_idx], value));
        }
        self.sparse.insert(index, self.dense.len());
        self.dense.push(value);
        self.entities.push(index);
        None
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.sparse.get(&index).map(|&dense_idx| &self.dense[dense_idx])
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let dense_idx = *self.sparse.get(&index)?;
        self.dense.get_mut(dense_idx)
    }

    pub fn take(&mut self, index: u32) -> Option<T> {
        let dense_idx = self.sparse.remove(&index)?;
        // Swap-remove: the last element moves into the freed slot.
        let value = self.dense.swap_remove(dense_idx);
        self.entities.swap_remove(dense_idx);
        if let Some(&moved) = self.entities.get(dense_idx) {
            self.sparse.insert(moved, dense_idx);
        }
        Some(value)
    }

    pub fn indices(&self) -> Vec<u32> {
        self.entities.clone()
    }
}

/// Storage for one component type, backed by the strategy it was registered with.
pub enum Storage<T> {
    Dense(SparseArray<T>),
    Sparse(SparseSet<T>),
}

impl<T: Component> Storage<T> {
    pub fn new(strategy: StorageKind) -> Self {
        match strategy {
            StorageKind::Dense => Storage::Dense(SparseArray::new()),
            StorageKind::Sparse => Storage::Sparse(SparseSet::new()),
        }
    }

    /// Insert or replace, returning the replaced value.
    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        match self {
            Storage::Dense(s) => s.insert(index, value),
            Storage::Sparse(s) => s.insert(index, value),
        }
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        match self {
            Storage::Dense(s) => s.get(index),
            Storage::Sparse(s) => s.get(index),
        }
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        match self {
            Storage::Dense(s) => s.get_mut(index),
            Storage::Sparse(s) => s.get_mut(index),
        }
    }

    pub fn take(&mut self, index: u32) -> Option<T> {
        match self {
            Storage::Dense(s) => s.take(index),
            Storage::Sparse(s) => s.take(index),
        }
    }
}

impl<T: Component> ComponentStorage for Storage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn strategy(&self) -> StorageKind {
        match self {
            Storage::Dense(_) => StorageKind::Dense,
            Storage::Sparse(_) => StorageKind::Sparse,
        }
    }

    fn remove(&mut self, index: u32) -> bool {
        self.take(index).is_some()
    }

    fn has(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    fn len(&self) -> usize {
        match self {
            Storage::Dense(s) => s.len,
            Storage::Sparse(s) => s.dense.len(),
        }
    }

    fn indices(&self) -> Vec<u32> {
        match self {
            Storage::Dense(s) => s.indices(),
            Storage::Sparse(s) => s.indices(),
        }
    }
}
