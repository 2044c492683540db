//! Game/economy collaborator
//!
//! Owns the power balance, the wave schedule, and the win/lose surface. The
//! simulation only reports into it and asks it which wave is current.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One wave of enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    pub number: u32,
    pub enemies: u32,
}

pub trait GameDriver: Send {
    /// Add `delta` to the power balance. Negative values are spending.
    fn update_power(&mut self, delta: f32);

    /// Whether the player currently has something to place.
    fn placement_enabled(&self) -> bool;

    /// Publish whether the hovered cell would accept a placement.
    fn set_placement_valid(&mut self, valid: bool);

    /// Whether the pointer can hover (false on touch screens).
    fn supports_hover(&self) -> bool {
        true
    }

    /// The wave running at `elapsed` seconds, or `None` once the schedule is exhausted.
    fn current_wave(&self, elapsed: f64) -> Option<Wave>;

    fn set_info(&mut self, text: &str);

    /// End the session. No further frames are run afterwards.
    fn stop(&mut self);
}

/// Driver shared between the systems that report into it.
pub type SharedDriver = Arc<Mutex<dyn GameDriver>>;
