//! Scene and driver used when running without a window

use std::collections::HashSet;

use rampart_game::{Color, GameDriver, MeshHandle, Scene, Wave};
use tracing::{debug, info};

use crate::settings::{Settings, WaveSettings};

/// Hands out handles and tracks which visuals are shown.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next: u64,
    live: HashSet<MeshHandle>,
    created: u64,
}

impl HeadlessScene {
    /// Number of visuals currently shown.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn created(&self) -> u64 {
        self.created
    }
}

impl Scene for HeadlessScene {
    fn create_box(&mut self, color: Color, size: f32) -> MeshHandle {
        self.next += 1;
        self.created += 1;
        debug!("Created {:?} box #{} (size {})", color, self.next, size);
        MeshHandle(self.next)
    }

    fn add(&mut self, handle: MeshHandle) {
        self.live.insert(handle);
    }

    fn remove(&mut self, handle: MeshHandle) {
        self.live.remove(&handle);
    }

    fn attach(&mut self, _parent: MeshHandle, _child: MeshHandle) {}
}

/// Driver following a fixed wave schedule and keeping the power balance.
#[derive(Debug)]
pub struct ScriptedDriver {
    power: f32,
    waves: Vec<WaveSettings>,
    placement_valid: bool,
    info: Option<String>,
    stopped: bool,
}

impl ScriptedDriver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            power: settings.economy.starting_power,
            waves: settings.waves.clone(),
            placement_valid: false,
            info: None,
            stopped: false,
        }
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }
}

impl GameDriver for ScriptedDriver {
    fn update_power(&mut self, delta: f32) {
        self.power += delta;
    }

    /// Placement needs a positive balance.
    fn placement_enabled(&self) -> bool {
        self.power > 0.0
    }

    fn set_placement_valid(&mut self, valid: bool) {
        if valid != self.placement_valid {
            debug!("Placement {}", if valid { "valid" } else { "invalid" });
        }
        self.placement_valid = valid;
    }

    fn supports_hover(&self) -> bool {
        false
    }

    fn current_wave(&self, elapsed: f64) -> Option<Wave> {
        let mut end = 0.0;
        for (number, wave) in self.waves.iter().enumerate() {
            end += wave.duration;
            if elapsed < end {
                return Some(Wave {
                    number: number as u32,
                    enemies: wave.enemies,
                });
            }
        }
        None
    }

    fn set_info(&mut self, text: &str) {
        info!("Info: {}", text);
        self.info = Some(text.to_string());
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
