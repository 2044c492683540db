//! Rampart ECS - Entity Component System
//!
//! A small single-threaded ECS driving the Rampart simulation.
//! Uses generational indices for entities, per-type storages with a dense
//! (sparse-array) or sparse (hashed sparse-set) strategy, capability-typed
//! queries and an ordered system scheduler.

mod component;
mod entity;
mod error;
mod query;
mod resource;
mod system;
mod world;

pub use component::{Component, ComponentKind, StorageKind};
pub use entity::Entity;
pub use error::EcsError;
pub use query::{Access, EntityId, Query, QueryIter, Read, ReadOnlyWorldQuery, Write, WorldQuery};
pub use resource::Resources;
pub use system::{Scheduler, System};
pub use world::World;
