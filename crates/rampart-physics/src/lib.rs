//! Rampart Physics - collision volumes and pair search
//!
//! Provides axis-aligned boxes, the updater that moves a local box into world
//! space, and the broad phase that proposes pairs for narrow-phase testing.

mod aabb;
mod broad_phase;
mod volume;

pub use aabb::Aabb;
pub use broad_phase::{BroadPhase, PairwiseBroadPhase, SweepAxisBroadPhase};
pub use volume::{AabbUpdater, VolumeUpdater};
