//! The assembled simulation: one world, its systems, and the frame loop.

use glam::Vec3;
use rampart_core::GameTime;
use rampart_ecs::{EcsError, Scheduler, World};
use tracing::{debug, info};

use crate::collision::CollisionSystem;
use crate::components::register_all;
use crate::config::SimulationConfig;
use crate::driver::SharedDriver;
use crate::factory::{spawn_turret_vehicle, PlaceableItem};
use crate::scene::SharedScene;
use crate::systems::{
    EnemyWaveSystem, ExplosiveSystem, GameOverSystem, GravitySystem, MeshRemoverSystem,
    OnboardRemoverSystem, PlacementQueue, PlacementSystem, Pointer, ResourceSystem, TurretSystem,
    VehicleSystem, VelocitySystem,
};

/// Whether frames are still being simulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameStatus {
    #[default]
    Running,
    Won,
    Lost,
}

const PERF_GRID_COLUMNS: i32 = 5;
const PERF_GRID_ROWS: i32 = 4;

pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    scene: SharedScene,
}

impl Simulation {
    /// Build the world and register every system in frame order.
    ///
    /// Fails only on registration errors, which are programming mistakes.
    pub fn new(
        config: &SimulationConfig,
        scene: SharedScene,
        driver: SharedDriver,
    ) -> Result<Self, EcsError> {
        let mut world = World::new();
        register_all(&mut world)?;
        world.insert_resource(GameTime::new(config.time.clone()));
        world.insert_resource(GameStatus::Running);
        world.insert_resource(Pointer::default());
        world.insert_resource(PlacementQueue::default());

        let mut scheduler = Scheduler::new();
        scheduler.register(&mut world, GravitySystem)?;
        scheduler.register(&mut world, VelocitySystem)?;
        scheduler.register(&mut world, CollisionSystem::new())?;
        scheduler.register(&mut world, ExplosiveSystem)?;
        scheduler.register(&mut world, OnboardRemoverSystem)?;
        scheduler.register(&mut world, MeshRemoverSystem::new(scene.clone()))?;
        scheduler.register(&mut world, ResourceSystem::new(driver.clone()))?;
        scheduler.register(
            &mut world,
            PlacementSystem::new(scene.clone(), driver.clone()),
        )?;
        scheduler.register(&mut world, TurretSystem::new(scene.clone()))?;
        scheduler.register(&mut world, VehicleSystem)?;
        scheduler.register(
            &mut world,
            EnemyWaveSystem::new(scene.clone(), driver.clone(), config.wave_seed),
        )?;
        if !config.perf_mode {
            scheduler.register(&mut world, GameOverSystem::new(driver))?;
        }

        let mut simulation = Self {
            world,
            scheduler,
            scene,
        };
        if config.perf_mode {
            simulation.fill_perf_grid()?;
        }
        info!(
            "Simulation ready with {} systems{}",
            simulation.scheduler.len(),
            if config.perf_mode { " (perf mode)" } else { "" }
        );
        Ok(simulation)
    }

    fn fill_perf_grid(&mut self) -> Result<(), EcsError> {
        let mut scene = self.scene.lock();
        for i in 0..PERF_GRID_COLUMNS {
            for j in 0..PERF_GRID_ROWS {
                let at = Vec3::new((i - 2) as f32, 0.0, (j + 2) as f32);
                spawn_turret_vehicle(&mut self.world, &mut *scene, at)?;
            }
        }
        debug!("Spawned {} perf vehicles", PERF_GRID_COLUMNS * PERF_GRID_ROWS);
        Ok(())
    }

    /// Advance the clock by `raw_delta` seconds and run one tick.
    ///
    /// Once the game is decided no further ticks run.
    pub fn frame(&mut self, raw_delta: f32) -> GameStatus {
        let status = self.status();
        if status != GameStatus::Running {
            return status;
        }
        self.world.resource_or_default::<GameTime>().update(raw_delta);
        self.scheduler.tick(&mut self.world);
        self.status()
    }

    pub fn status(&self) -> GameStatus {
        self.world
            .resource::<GameStatus>()
            .copied()
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.status() == GameStatus::Running
    }

    /// Move the pointer. `None` means it misses the ground.
    pub fn set_pointer(&mut self, at: Option<Vec3>) {
        self.world.resource_or_default::<Pointer>().0 = at;
    }

    /// Queue a purchase to be placed at the pointer on the next frame.
    pub fn request_placement(&mut self, item: PlaceableItem, cost: f32) {
        self.world
            .resource_or_default::<PlacementQueue>()
            .push(item, cost);
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn elapsed(&self) -> f64 {
        self.world
            .resource::<GameTime>()
            .map(GameTime::elapsed)
            .unwrap_or(0.0)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Collider, Enemy, Gravity, Mesh, Projectile, ToRemove, Turret, Vehicle, Velocity};
    use crate::driver::Wave;
    use crate::factory::{spawn_enemy, spawn_mine, spawn_turret};
    use crate::systems::testing::{self, RecordingDriver, RecordingScene};
    use parking_lot::Mutex;
    use rampart_ecs::{EntityId, Read};
    use std::sync::Arc;

    struct Harness {
        scene: Arc<Mutex<RecordingScene>>,
        driver: Arc<Mutex<RecordingDriver>>,
        sim: Simulation,
    }

    fn harness(config: SimulationConfig, driver: RecordingDriver) -> Harness {
        let scene = testing::shared(RecordingScene::default());
        let driver = testing::shared(driver);
        let sim = Simulation::new(&config, scene.clone(), driver.clone()).unwrap();
        Harness { scene, driver, sim }
    }

    fn seeded() -> SimulationConfig {
        SimulationConfig {
            wave_seed: Some(3),
            ..Default::default()
        }
    }

    fn count<T: rampart_ecs::Component>(world: &World) -> usize {
        world.create_query::<(Read<T>,)>().unwrap().count(world)
    }

    /// Physics, collision and turret only, so the turret survives long
    /// enough to fire.
    fn combat_schedule(world: &mut World, scene: &Arc<Mutex<RecordingScene>>) -> Scheduler {
        let mut scheduler = Scheduler::new();
        scheduler.register(world, GravitySystem).unwrap();
        scheduler.register(world, VelocitySystem).unwrap();
        scheduler.register(world, CollisionSystem::new()).unwrap();
        scheduler
            .register(world, TurretSystem::new(scene.clone()))
            .unwrap();
        scheduler
    }

    #[test]
    fn turret_overlapping_enemy_fires_one_projectile() {
        let mut world = testing::world(0.0);
        let scene = testing::shared(RecordingScene::default());
        let (turret, enemy) = {
            let mut s = scene.lock();
            let turret = spawn_turret(&mut world, &mut *s, Vec3::new(0.0, 0.0, 2.0), true).unwrap();
            let enemy = spawn_enemy(&mut world, &mut *s, Vec3::new(0.0, 0.0, 1.5)).unwrap();
            (turret, enemy)
        };
        world.get_mut::<Turret>(turret).unwrap().time_until_fire = 0.1;

        let mut scheduler = combat_schedule(&mut world, &scene);
        world.resource_mut::<GameTime>().unwrap().update(0.1);
        scheduler.tick(&mut world);

        let shots: Vec<_> = world
            .create_query::<(EntityId, Read<Projectile>, Read<Velocity>)>()
            .unwrap()
            .iter(&world)
            .map(|(e, _, v)| (e, v.0))
            .collect();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].1, Vec3::new(0.0, 0.0, -20.0));
        assert!(world.has::<Gravity>(shots[0].0));

        assert_eq!(world.get::<Collider>(turret).unwrap().collided, Some(enemy));
        assert_eq!(world.get::<Collider>(enemy).unwrap().collided, Some(turret));
    }

    #[test]
    fn enemy_destroys_turret_in_full_pipeline() {
        let mut h = harness(seeded(), RecordingDriver::default());
        let (turret, enemy) = {
            let mut s = h.scene.lock();
            let world = h.sim.world_mut();
            let turret = spawn_turret(world, &mut *s, Vec3::new(0.0, 0.0, 2.0), true).unwrap();
            let enemy = spawn_enemy(world, &mut *s, Vec3::new(0.0, 0.0, 1.5)).unwrap();
            (turret, enemy)
        };

        h.sim.frame(0.1);
        assert!(!h.sim.world().is_alive(turret));
        assert!(h.sim.world().is_alive(enemy));
        assert_eq!(count::<Projectile>(h.sim.world()), 0);
    }

    #[test]
    fn collided_mine_and_partner_are_removed() {
        let mut h = harness(seeded(), RecordingDriver::default());
        let (mine, enemy) = {
            let mut s = h.scene.lock();
            let world = h.sim.world_mut();
            let mine = spawn_mine(world, &mut *s, Vec3::new(1.0, 0.0, 0.0)).unwrap();
            let enemy = spawn_enemy(world, &mut *s, Vec3::new(1.0, 0.0, -0.5)).unwrap();
            (mine, enemy)
        };

        h.sim.frame(0.1);
        assert!(!h.sim.world().is_alive(mine));
        assert!(!h.sim.world().is_alive(enemy));
        assert_eq!(count::<ToRemove>(h.sim.world()), 0);
        assert!(h.scene.lock().shown.is_empty());
    }

    #[test]
    fn marked_vehicle_takes_onboard_turret() {
        let mut h = harness(seeded(), RecordingDriver::default());
        let vehicle = {
            let mut s = h.scene.lock();
            spawn_turret_vehicle(h.sim.world_mut(), &mut *s, Vec3::ZERO).unwrap()
        };
        let onboard = h.sim.world().get::<Vehicle>(vehicle).unwrap().onboard;
        h.sim.world_mut().attach(vehicle, ToRemove).unwrap();

        h.sim.frame(0.1);
        assert!(!h.sim.world().is_alive(vehicle));
        assert!(!h.sim.world().is_alive(onboard));
        assert_eq!(h.sim.world().entity_count(), 0);
    }

    #[test]
    fn waves_spawn_and_enemies_advance() {
        let driver = RecordingDriver {
            waves: vec![
                (0.0, Some(Wave { number: 0, enemies: 0 })),
                (0.05, Some(Wave { number: 1, enemies: 3 })),
            ],
            ..Default::default()
        };
        let mut h = harness(seeded(), driver);

        h.sim.frame(0.1);
        assert_eq!(count::<Enemy>(h.sim.world()), 3);
        let before = positions(h.sim.world());
        h.sim.frame(0.2);
        // Enemies spawned side by side on neighbouring lanes blow each other up.
        for (enemy, after) in positions(h.sim.world()) {
            let start = before
                .iter()
                .find(|(e, _)| *e == enemy)
                .map(|(_, at)| *at)
                .unwrap();
            assert!((after.z - start.z - 1.5 * 0.2).abs() < 1e-4);
            assert_eq!(after.x, start.x);
        }
    }

    fn positions(world: &World) -> Vec<(rampart_ecs::Entity, Vec3)> {
        world
            .create_query::<(EntityId, Read<Enemy>, Read<Mesh>)>()
            .unwrap()
            .iter(world)
            .map(|(entity, _, mesh)| (entity, mesh.position))
            .collect()
    }

    #[test]
    fn enemies_on_neighbouring_lanes_destroy_each_other() {
        let mut h = harness(seeded(), RecordingDriver::default());
        let (left, right, apart) = {
            let mut s = h.scene.lock();
            let world = h.sim.world_mut();
            let left = spawn_enemy(world, &mut *s, Vec3::new(-1.0, 0.0, -5.0)).unwrap();
            let right = spawn_enemy(world, &mut *s, Vec3::new(0.0, 0.0, -5.0)).unwrap();
            let apart = spawn_enemy(world, &mut *s, Vec3::new(2.0, 0.0, -5.0)).unwrap();
            (left, right, apart)
        };

        h.sim.frame(0.1);
        assert!(!h.sim.world().is_alive(left));
        assert!(!h.sim.world().is_alive(right));
        assert!(h.sim.world().is_alive(apart));
    }

    #[test]
    fn enemy_reaching_goal_stops_simulation() {
        let mut h = harness(seeded(), RecordingDriver::default());
        {
            let mut s = h.scene.lock();
            spawn_enemy(h.sim.world_mut(), &mut *s, Vec3::new(0.0, 0.0, 5.0)).unwrap();
        }

        assert_eq!(h.sim.frame(0.1), GameStatus::Lost);
        assert!(h.driver.lock().stopped);
        assert_eq!(h.driver.lock().info, vec!["Game Over".to_string()]);

        let ticks = h.sim.ticks();
        assert_eq!(h.sim.frame(0.1), GameStatus::Lost);
        assert_eq!(h.sim.ticks(), ticks);
    }

    #[test]
    fn exhausted_waves_win() {
        let driver = RecordingDriver {
            waves: vec![
                (0.0, Some(Wave { number: 1, enemies: 0 })),
                (0.15, None),
            ],
            ..Default::default()
        };
        let mut h = harness(seeded(), driver);
        assert_eq!(h.sim.frame(0.1), GameStatus::Running);
        assert_eq!(h.sim.frame(0.1), GameStatus::Won);
        assert_eq!(h.driver.lock().info, vec!["You Win!".to_string()]);
    }

    #[test]
    fn placement_request_goes_through_frame() {
        let mut h = harness(seeded(), RecordingDriver::default());
        h.sim.set_pointer(Some(Vec3::new(-1.4, 0.0, 0.6)));
        h.sim.request_placement(PlaceableItem::Collector, 25.0);
        h.sim.frame(0.1);

        assert_eq!(count::<crate::components::Collector>(h.sim.world()), 1);
        assert_eq!(h.driver.lock().power, -25.0);
        assert_eq!(h.driver.lock().placement_valid, Some(true));

        h.sim.frame(0.1);
        assert_eq!(h.driver.lock().placement_valid, Some(false));
        assert!((h.driver.lock().power - (-25.0 + 20.0 * 0.1)).abs() < 1e-4);
    }

    #[test]
    fn perf_mode_fills_grid_and_never_ends() {
        let config = SimulationConfig {
            perf_mode: true,
            ..seeded()
        };
        let driver = RecordingDriver {
            waves: vec![(0.0, None)],
            ..Default::default()
        };
        let mut h = harness(config, driver);
        assert_eq!(count::<Vehicle>(h.sim.world()), 20);
        assert_eq!(count::<Turret>(h.sim.world()), 20);

        let mut fired = false;
        for _ in 0..10 {
            assert_eq!(h.sim.frame(0.25), GameStatus::Running);
            fired |= count::<Projectile>(h.sim.world()) > 0;
        }
        assert!(fired);
        assert!(!h.driver.lock().stopped);
    }
}
