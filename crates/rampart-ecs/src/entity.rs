use std::collections::VecDeque;
use std::fmt;

/// A generational entity handle. Compact u32 slot index plus the generation the
/// slot had when this handle was issued.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Create an entity from raw parts (mainly for testing).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this entity (incremented each time the slot is freed).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Issues entity handles and recycles freed slots.
///
/// Freed slots are reused oldest-first, so an identifier that was just destroyed
/// is the last one handed out again. A recycled slot always carries a new
/// generation; handles to its previous occupant stay dead.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    free: VecDeque<u32>,
    alive: usize,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle with zero components.
    pub fn create(&mut self) -> Entity {
        self.alive += 1;
        if let Some(index) = self.free.pop_front() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            return Entity {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            alive: true,
        });
        Entity {
            index,
            generation: 0,
        }
    }

    /// Retire a handle. Returns `false` (and does nothing) if it was already dead.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slots.get_mut(entity.index as usize) else {
            return false;
        };
        if !slot.alive || slot.generation != entity.generation {
            return false;
        }
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push_back(entity.index);
        self.alive -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    /// The live handle currently occupying `index`, if any.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        let slot = self.slots.get(index as usize)?;
        slot.alive.then_some(Entity {
            index,
            generation: slot.generation,
        })
    }

    /// All live handles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        (0..self.slots.len() as u32).filter_map(|index| self.entity_at(index))
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive
    }
}
