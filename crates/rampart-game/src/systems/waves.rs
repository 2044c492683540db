//! Enemy waves and the win/lose check

use std::collections::HashMap;

use glam::Vec3;
use rampart_ecs::{EcsError, Query, Read, System, World};
use rampart_physics::Aabb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use super::elapsed;
use crate::components::{Collider, Enemy};
use crate::driver::{SharedDriver, Wave};
use crate::factory::spawn_enemy;
use crate::scene::SharedScene;
use crate::simulation::GameStatus;

/// Lanes run from `-LANE_REACH` to `LANE_REACH` on x.
const LANE_REACH: i32 = 2;
const SPAWN_Z: f32 = -5.0;
/// Gap between enemies stacked on the same lane.
const ENEMY_SPACING: f32 = 2.0;

/// Enemies reaching this box end the game.
pub const GOAL_CENTER: Vec3 = Vec3::new(0.0, 0.0, 6.0);
pub const GOAL_SIZE: Vec3 = Vec3::new(5.0, 1.0, 1.0);

/// The wave the driver last reported.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveState {
    pub current: Option<Wave>,
}

/// Spawns a wave's enemies whenever the driver moves to a new wave.
///
/// The wave current at registration is remembered but not spawned.
pub struct EnemyWaveSystem {
    scene: SharedScene,
    driver: SharedDriver,
    rng: StdRng,
    current: Option<Wave>,
}

impl EnemyWaveSystem {
    /// `seed` makes lane choice reproducible; `None` seeds from the OS.
    pub fn new(scene: SharedScene, driver: SharedDriver, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            scene,
            driver,
            rng,
            current: None,
        }
    }

    fn spawn_wave(&mut self, world: &mut World, wave: Wave) {
        let mut rearmost: HashMap<i32, f32> = HashMap::new();
        let mut scene = self.scene.lock();
        for _ in 0..wave.enemies {
            let lane = self.rng.gen_range(-LANE_REACH..=LANE_REACH);
            let z = rearmost
                .get(&lane)
                .map_or(SPAWN_Z, |&behind| behind - ENEMY_SPACING);
            rearmost.insert(lane, z);
            if let Err(e) = spawn_enemy(world, &mut *scene, Vec3::new(lane as f32, 0.0, z)) {
                warn!("Failed to spawn enemy for wave {}: {}", wave.number, e);
            }
        }
    }
}

impl System for EnemyWaveSystem {
    type Context = ();

    fn setup(&mut self, world: &mut World) -> Result<(), EcsError> {
        self.current = self.driver.lock().current_wave(elapsed(world));
        world.insert_resource(WaveState {
            current: self.current,
        });
        Ok(())
    }

    fn update(&mut self, _ctx: &(), world: &mut World) {
        let wave = self.driver.lock().current_wave(elapsed(world));
        if wave == self.current {
            return;
        }
        self.current = wave;
        world.resource_or_default::<WaveState>().current = wave;
        if let Some(wave) = wave {
            info!("Wave {} started: {} enemies", wave.number, wave.enemies);
            self.spawn_wave(world, wave);
        }
    }
}

/// Ends the game: lost when an enemy reaches the goal, won when the waves are
/// over and no enemy is left.
pub struct GameOverSystem {
    driver: SharedDriver,
    goal: Aabb,
}

impl GameOverSystem {
    pub fn new(driver: SharedDriver) -> Self {
        Self {
            driver,
            goal: Aabb::from_center_size(GOAL_CENTER, GOAL_SIZE),
        }
    }

    fn finish(&self, world: &mut World, status: GameStatus, text: &str) {
        info!("{}", text);
        *world.resource_or_default::<GameStatus>() = status;
        let mut driver = self.driver.lock();
        driver.set_info(text);
        driver.stop();
    }
}

impl System for GameOverSystem {
    type Context = Query<(Read<Enemy>, Read<Collider>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, enemies: &Self::Context, world: &mut World) {
        if *world.resource_or_default::<GameStatus>() != GameStatus::Running {
            return;
        }
        let breached = enemies
            .iter(world)
            .any(|(_, collider)| collider.world_box.intersects(&self.goal));
        if breached {
            self.finish(world, GameStatus::Lost, "Game Over");
            return;
        }
        let waves_over = world
            .resource::<WaveState>()
            .map_or(true, |state| state.current.is_none());
        if waves_over && enemies.is_empty(world) {
            self.finish(world, GameStatus::Won, "You Win!");
        }
    }
}
