//! Per-frame gameplay systems
//!
//! [`crate::Simulation`] registers them in this order: gravity, velocity,
//! collision, explosive, onboard remover, mesh remover, resource, placement,
//! turret, vehicle, enemy wave, game over.

mod combat;
mod economy;
mod lifecycle;
mod physics;
mod waves;

pub use combat::{TurretSystem, VehicleSystem};
pub use economy::{
    PlacementQueue, PlacementRequest, PlacementSystem, Placeholder, Pointer, ResourceSystem,
};
pub use lifecycle::{mark_for_removal, ExplosiveSystem, MeshRemoverSystem, OnboardRemoverSystem};
pub use physics::{GravitySystem, VelocitySystem};
pub use waves::{EnemyWaveSystem, GameOverSystem, WaveState, GOAL_CENTER, GOAL_SIZE};

use rampart_core::GameTime;
use rampart_ecs::World;
use tracing::warn;

/// Seconds covered by the current frame, or `None` without a clock.
pub(crate) fn frame_delta(world: &World) -> Option<f32> {
    match world.resource::<GameTime>() {
        Ok(time) => Some(time.delta()),
        Err(e) => {
            warn!("Skipping timed system: {}", e);
            None
        }
    }
}

/// Total simulated seconds, zero without a clock.
pub(crate) fn elapsed(world: &World) -> f64 {
    world
        .resource::<GameTime>()
        .map(GameTime::elapsed)
        .unwrap_or(0.0)
}
