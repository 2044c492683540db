use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use crate::error::EcsError;

/// Type-map holding one value per type: the frame clock, wave state, and other
/// per-world singletons systems share.
#[derive(Default)]
pub struct Resources {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the value it replaced.
    pub fn insert<T: 'static + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast().ok())
            .map(|old| *old)
    }

    pub fn get<T: 'static + Send + Sync>(&self) -> Result<&T, EcsError> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
            .ok_or(EcsError::MissingResource(type_name::<T>()))
    }

    pub fn get_mut<T: 'static + Send + Sync>(&mut self) -> Result<&mut T, EcsError> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.downcast_mut())
            .ok_or(EcsError::MissingResource(type_name::<T>()))
    }

    /// Fetch a resource, inserting `T::default()` first if it is absent.
    pub fn get_or_default<T: 'static + Send + Sync + Default>(&mut self) -> &mut T {
        let slot = self
            .map
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match slot.downcast_mut() {
            Some(value) => value,
            None => unreachable!("resource map keyed by TypeId holds a foreign type"),
        }
    }

    pub fn remove<T: 'static + Send + Sync>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast().ok())
            .map(|b| *b)
    }

    pub fn contains<T: 'static + Send + Sync>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}
