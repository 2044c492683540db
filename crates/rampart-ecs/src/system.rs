use std::any::type_name;

use tracing::{debug, trace};

use crate::error::EcsError;
use crate::world::World;

/// A unit of per-frame logic.
///
/// `setup` runs once, when the system is registered, and returns the queries the
/// system iterates every frame. `update` runs once per tick with that context.
pub trait System: Send {
    /// Queries (or anything else) resolved once at registration.
    type Context: Send;

    fn setup(&mut self, world: &mut World) -> Result<Self::Context, EcsError>;

    fn update(&mut self, ctx: &Self::Context, world: &mut World);

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Blanket implementation so closures can be used as systems.
impl<F: FnMut(&mut World) + Send> System for F {
    type Context = ();

    fn setup(&mut self, _world: &mut World) -> Result<(), EcsError> {
        Ok(())
    }

    fn update(&mut self, _ctx: &(), world: &mut World) {
        (self)(world);
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// A system together with the context its `setup` returned.
trait BoundSystem: Send {
    fn name(&self) -> &'static str;
    fn run(&mut self, world: &mut World);
}

struct Bound<S: System> {
    system: S,
    ctx: S::Context,
}

impl<S: System> BoundSystem for Bound<S> {
    fn name(&self) -> &'static str {
        self.system.name()
    }

    fn run(&mut self, world: &mut World) {
        self.system.update(&self.ctx, world);
    }
}

/// An ordered list of systems run every frame.
///
/// Systems run in registration order; nothing is reordered or skipped. After the
/// last system, despawns queued with [`World::queue_despawn`] are applied.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn BoundSystem>>,
    ticks: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the system's `setup` against `world` and append it to the schedule.
    ///
    /// A failing `setup` (usually a query over an unregistered component) leaves
    /// the schedule unchanged.
    pub fn register<S: System + 'static>(
        &mut self,
        world: &mut World,
        mut system: S,
    ) -> Result<(), EcsError> {
        let ctx = system.setup(world)?;
        debug!(
            "Registered system #{}: {}",
            self.systems.len(),
            system.name()
        );
        self.systems.push(Box::new(Bound { system, ctx }));
        Ok(())
    }

    /// Run one frame: every system in order, then the despawn queue.
    pub fn tick(&mut self, world: &mut World) {
        for system in &mut self.systems {
            trace!("Running {}", system.name());
            system.run(world);
        }
        let despawned = world.flush_despawns();
        if despawned > 0 {
            trace!("Finalized {} queued despawns", despawned);
        }
        self.ticks += 1;
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// System names in execution order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Number of systems in the schedule.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
