//! Rampart Game - tower-defense rules on top of the ECS
//!
//! Provides the gameplay components, the collision system, entity factories,
//! the per-frame systems, and [`Simulation`], which wires them together in
//! their fixed order.

pub mod collision;
pub mod components;
pub mod config;
pub mod driver;
pub mod factory;
pub mod scene;
pub mod simulation;
pub mod systems;

pub use collision::CollisionSystem;
pub use components::{
    Collector, Collider, Enemy, Explosive, Gravity, Mesh, Projectile, ToRemove, Turret, Vehicle,
    Velocity,
};
pub use config::SimulationConfig;
pub use driver::{GameDriver, SharedDriver, Wave};
pub use factory::PlaceableItem;
pub use scene::{world_transform, Color, MeshHandle, Scene, SharedScene};
pub use simulation::{GameStatus, Simulation};
pub use systems::{PlacementQueue, PlacementRequest, Pointer, WaveState};
