//! Frame clock for the Rampart simulation
//!
//! One external driver advances the clock once per rendered frame. Systems only read it.

use serde::{Deserialize, Serialize};

/// Configuration for the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// How many simulated seconds pass per real second
    pub time_scale: f32,
    /// Maximum delta accepted for a single frame. Longer frames (a stalled
    /// window, a debugger break) are clamped so projectiles don't tunnel.
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: 0.25,
        }
    }
}

/// Frame clock tracking
#[derive(Debug, Clone, Default)]
pub struct GameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Simulated seconds since the first frame
    pub total_time: f64,
    /// Delta for this frame (clamped and scaled)
    pub delta_time: f32,
    /// Frame counter
    pub frame_count: u64,
    /// Whether the clock is frozen
    pub paused: bool,
}

impl GameTime {
    /// Create a clock with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance the clock by the raw delta measured since the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        self.frame_count += 1;

        if self.paused {
            self.delta_time = 0.0;
            return;
        }

        let clamped = raw_delta.clamp(0.0, self.config.max_delta_time);
        self.delta_time = clamped * self.config.time_scale;
        self.total_time += self.delta_time as f64;
    }

    /// Seconds since the last frame
    pub fn delta(&self) -> f32 {
        self.delta_time
    }

    /// Total simulated seconds
    pub fn elapsed(&self) -> f64 {
        self.total_time
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accumulates() {
        let mut time = GameTime::default();
        time.update(0.1);
        time.update(0.1);

        assert_eq!(time.frame_count, 2);
        assert!((time.delta() - 0.1).abs() < 1e-6);
        assert!((time.elapsed() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut time = GameTime::default();
        time.update(3.0);
        assert_eq!(time.delta(), 0.25);

        time.update(-1.0);
        assert_eq!(time.delta(), 0.0);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut time = GameTime::default();
        time.update(0.016);
        time.pause();
        time.update(0.016);

        assert_eq!(time.delta(), 0.0);
        assert_eq!(time.frame_count, 2);
        assert!((time.elapsed() - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_time_scale() {
        let mut time = GameTime::default();
        time.set_time_scale(2.0);
        time.update(0.1);
        assert!((time.delta() - 0.2).abs() < 1e-6);

        time.set_time_scale(-4.0);
        assert_eq!(time.config.time_scale, 0.0);
    }
}
