use rampart_core::TimeConfig;
use serde::{Deserialize, Serialize};

/// Options fixed when a [`crate::Simulation`] is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fill the board with turret vehicles and never end the game.
    pub perf_mode: bool,
    /// Seed for enemy lane choice. Random when absent.
    pub wave_seed: Option<u64>,
    pub time: TimeConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: SimulationConfig = toml::from_str("perf_mode = true").unwrap();
        assert!(config.perf_mode);
        assert_eq!(config.wave_seed, None);
        assert_eq!(config.time.time_scale, 1.0);
    }
}
