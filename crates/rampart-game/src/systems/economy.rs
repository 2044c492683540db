//! Power generation and item placement

use std::collections::VecDeque;

use glam::Vec3;
use rampart_ecs::{EcsError, EntityId, Query, Read, System, World};
use tracing::{debug, info, warn};

use super::frame_delta;
use crate::components::{Collector, Mesh, Projectile};
use crate::driver::SharedDriver;
use crate::factory::PlaceableItem;
use crate::scene::{world_transform, SharedScene};

/// Where the pointer meets the ground, if it does.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer(pub Option<Vec3>);

/// One purchase waiting to be placed at the pointer cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub item: PlaceableItem,
    pub cost: f32,
}

/// Purchases queued by input handling, consumed by [`PlacementSystem`].
#[derive(Debug, Default)]
pub struct PlacementQueue(pub VecDeque<PlacementRequest>);

impl PlacementQueue {
    pub fn push(&mut self, item: PlaceableItem, cost: f32) {
        self.0.push_back(PlacementRequest { item, cost });
    }
}

/// The hovered cell as last evaluated by [`PlacementSystem`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placeholder {
    /// Only set when the driver supports hovering.
    pub cell: Option<Vec3>,
    pub valid: bool,
}

/// Adds `rate * dt` power per collector every frame.
pub struct ResourceSystem {
    driver: SharedDriver,
}

impl ResourceSystem {
    pub fn new(driver: SharedDriver) -> Self {
        Self { driver }
    }
}

impl System for ResourceSystem {
    type Context = Query<(Read<Collector>,)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.create_query()
    }

    fn update(&mut self, collectors: &Self::Context, world: &mut World) {
        if collectors.is_empty(world) {
            return;
        }
        let Some(dt) = frame_delta(world) else {
            return;
        };
        let generated: f32 = collectors
            .iter(world)
            .map(|(collector,)| collector.rate * dt)
            .sum();
        self.driver.lock().update_power(generated);
    }
}

/// Evaluates the cell under the pointer and places queued purchases there.
///
/// A cell is the pointer position rounded to whole units on x and z. It is
/// invalid when the driver disables placement, when the pointer misses the
/// ground, or when any mesh other than a projectile already sits on it.
pub struct PlacementSystem {
    scene: SharedScene,
    driver: SharedDriver,
}

impl PlacementSystem {
    pub fn new(scene: SharedScene, driver: SharedDriver) -> Self {
        Self { scene, driver }
    }

    fn occupied(meshes: &Query<(EntityId, Read<Mesh>)>, world: &World, cell: Vec3) -> bool {
        meshes
            .iter(world)
            .filter(|(entity, _)| !world.has::<Projectile>(*entity))
            .filter_map(|(entity, _)| world_transform(world, entity))
            .map(|transform| transform.transform_point3(Vec3::ZERO))
            .any(|at| at.x.round() == cell.x && at.z.round() == cell.z)
    }
}

impl System for PlacementSystem {
    type Context = Query<(EntityId, Read<Mesh>)>;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError> {
        world.resource_or_default::<Pointer>();
        world.resource_or_default::<PlacementQueue>();
        world.resource_or_default::<Placeholder>();
        world.create_query()
    }

    fn update(&mut self, meshes: &Self::Context, world: &mut World) {
        let cell = world
            .resource::<Pointer>()
            .ok()
            .and_then(|pointer| pointer.0)
            .map(|at| Vec3::new(at.x.round(), 0.0, at.z.round()));

        let (enabled, hover) = {
            let driver = self.driver.lock();
            (driver.placement_enabled(), driver.supports_hover())
        };
        let mut valid = match cell {
            Some(cell) => enabled && !Self::occupied(meshes, world, cell),
            None => false,
        };
        self.driver.lock().set_placement_valid(valid);
        *world.resource_or_default::<Placeholder>() = Placeholder {
            cell: if hover { cell } else { None },
            valid,
        };

        let requests = std::mem::take(&mut world.resource_or_default::<PlacementQueue>().0);
        for request in requests {
            let Some(cell) = cell.filter(|_| valid) else {
                debug!("Rejected placement of {:?}: cell unavailable", request.item);
                continue;
            };
            let placed = {
                let mut scene = self.scene.lock();
                request.item.spawn(world, &mut *scene, cell)
            };
            match placed {
                Ok(entity) => {
                    self.driver.lock().update_power(-request.cost);
                    info!("Placed {:?} at {} as {}", request.item, cell, entity);
                    // The cell is taken now.
                    valid = false;
                }
                Err(e) => warn!("Failed to place {:?}: {}", request.item, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Turret, Vehicle};
    use crate::factory::{spawn_enemy, spawn_projectile};
    use crate::systems::testing::{self, RecordingDriver, RecordingScene};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Fixture {
        world: World,
        scene: Arc<Mutex<RecordingScene>>,
        driver: Arc<Mutex<RecordingDriver>>,
        system: PlacementSystem,
        ctx: Query<(EntityId, Read<Mesh>)>,
    }

    fn fixture() -> Fixture {
        let mut world = testing::world(0.1);
        let scene = testing::shared(RecordingScene::default());
        let driver = testing::shared(RecordingDriver::default());
        let mut system = PlacementSystem::new(scene.clone(), driver.clone());
        let ctx = system.setup(&mut world).unwrap();
        Fixture {
            world,
            scene,
            driver,
            system,
            ctx,
        }
    }

    impl Fixture {
        fn frame(&mut self) {
            self.system.update(&self.ctx, &mut self.world);
        }

        fn point_at(&mut self, at: Option<Vec3>) {
            self.world.resource_mut::<Pointer>().unwrap().0 = at;
        }

        fn buy(&mut self, item: PlaceableItem, cost: f32) {
            self.world
                .resource_mut::<PlacementQueue>()
                .unwrap()
                .push(item, cost);
        }
    }

    #[test]
    fn collectors_generate_power() {
        let mut world = testing::world(0.25);
        let driver = testing::shared(RecordingDriver::default());
        let mut system = ResourceSystem::new(driver.clone());
        let ctx = system.setup(&mut world).unwrap();

        system.update(&ctx, &mut world);
        assert_eq!(driver.lock().power_updates, 0);

        for _ in 0..2 {
            let e = world.spawn();
            world.attach(e, Collector::default()).unwrap();
        }
        system.update(&ctx, &mut world);
        assert_eq!(driver.lock().power, 10.0);
    }

    #[test]
    fn placement_charges_and_spawns_at_cell() {
        let mut f = fixture();
        f.point_at(Some(Vec3::new(1.2, 0.0, 2.7)));
        f.buy(PlaceableItem::TurretVehicle, 50.0);
        f.frame();

        assert_eq!(f.driver.lock().power, -50.0);
        let vehicles = f.world.create_query::<(EntityId, Read<Vehicle>, Read<Mesh>)>().unwrap();
        let placed: Vec<Vec3> = vehicles.iter(&f.world).map(|(_, _, m)| m.position).collect();
        assert_eq!(placed, vec![Vec3::new(1.0, 0.0, 3.0)]);
        assert_eq!(f.scene.lock().shown.len(), 2);
    }

    #[test]
    fn occupied_cell_rejects_placement() {
        let mut f = fixture();
        spawn_enemy(&mut f.world, &mut *f.scene.lock(), Vec3::new(0.4, 0.0, 0.0)).unwrap();
        f.point_at(Some(Vec3::ZERO));
        f.buy(PlaceableItem::Mine, 10.0);
        f.frame();

        assert_eq!(f.driver.lock().placement_valid, Some(false));
        assert_eq!(f.driver.lock().power, 0.0);
        assert_eq!(f.world.entity_count(), 1);
        assert!(f.world.resource::<PlacementQueue>().unwrap().0.is_empty());
    }

    #[test]
    fn projectiles_do_not_occupy_cells() {
        let mut f = fixture();
        spawn_projectile(&mut f.world, &mut *f.scene.lock(), Vec3::ZERO).unwrap();
        f.point_at(Some(Vec3::ZERO));
        f.frame();
        assert_eq!(f.driver.lock().placement_valid, Some(true));
        assert_eq!(
            *f.world.resource::<Placeholder>().unwrap(),
            Placeholder {
                cell: Some(Vec3::ZERO),
                valid: true
            }
        );
    }

    #[test]
    fn missed_ground_or_disabled_driver_is_invalid() {
        let mut f = fixture();
        f.point_at(None);
        f.frame();
        assert_eq!(f.driver.lock().placement_valid, Some(false));

        f.point_at(Some(Vec3::new(3.0, 0.0, 3.0)));
        f.driver.lock().placement_enabled = false;
        f.buy(PlaceableItem::Collector, 5.0);
        f.frame();
        assert_eq!(f.driver.lock().placement_valid, Some(false));
        assert_eq!(f.world.entity_count(), 0);
    }

    #[test]
    fn second_request_in_same_frame_is_rejected() {
        let mut f = fixture();
        f.point_at(Some(Vec3::new(-2.0, 0.0, 1.0)));
        f.buy(PlaceableItem::Turret, 30.0);
        f.buy(PlaceableItem::Turret, 30.0);
        f.frame();

        let turrets = f.world.create_query::<(Read<Turret>,)>().unwrap();
        assert_eq!(turrets.count(&f.world), 1);
        assert_eq!(f.driver.lock().power, -30.0);
    }

    #[test]
    fn no_hover_hides_placeholder() {
        let mut f = fixture();
        f.driver.lock().hover = false;
        f.point_at(Some(Vec3::ONE));
        f.frame();
        let placeholder = *f.world.resource::<Placeholder>().unwrap();
        assert_eq!(placeholder.cell, None);
        assert!(placeholder.valid);
    }
}
