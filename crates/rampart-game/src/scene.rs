//! Visual representation collaborator
//!
//! The simulation never interprets appearance. It asks the scene for boxes,
//! parents them, and releases them; positions stay on the [`Mesh`] component.

use std::sync::Arc;

use glam::Mat4;
use parking_lot::Mutex;
use rampart_ecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::Mesh;

/// Opaque handle to a visual owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u64);

/// Colour tag for a box. The scene decides what each one looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Green,
    Red,
    Blue,
    Yellow,
    Orange,
}

/// Creates and releases visuals for entities.
pub trait Scene: Send {
    /// Create a cube of edge `size`. It is not shown until [`Scene::add`].
    fn create_box(&mut self, color: Color, size: f32) -> MeshHandle;

    fn add(&mut self, handle: MeshHandle);

    /// Release a visual. Removing an unknown handle is a no-op.
    fn remove(&mut self, handle: MeshHandle);

    /// Make `child` follow `parent`.
    fn attach(&mut self, parent: MeshHandle, child: MeshHandle);
}

/// Scene shared between the systems that create and release visuals.
pub type SharedScene = Arc<Mutex<dyn Scene>>;

/// Parent chains deeper than this are treated as cycles and cut off.
const MAX_PARENT_DEPTH: usize = 16;

/// World transform of `entity`'s mesh, composed through its parent chain.
///
/// Returns `None` if the entity has no mesh. A parent that is gone or has no
/// mesh ends the chain.
pub fn world_transform(world: &World, entity: Entity) -> Option<Mat4> {
    let mesh = world.get::<Mesh>(entity).ok()?;
    let mut transform = mesh.local_transform();
    let mut parent = mesh.parent;
    for _ in 0..MAX_PARENT_DEPTH {
        let Some(next) = parent else {
            break;
        };
        let Ok(parent_mesh) = world.get::<Mesh>(next) else {
            break;
        };
        transform = parent_mesh.local_transform() * transform;
        parent = parent_mesh.parent;
    }
    Some(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rampart_ecs::StorageKind;

    #[test]
    fn child_inherits_parent_translation() {
        let mut world = World::new();
        world.register::<Mesh>(StorageKind::Dense).unwrap();
        let parent = world.spawn();
        let child = world.spawn();
        world
            .attach(parent, Mesh::new(MeshHandle(1), Vec3::new(2.0, 0.0, 1.0)))
            .unwrap();
        world
            .attach(
                child,
                Mesh::new(MeshHandle(2), Vec3::new(0.0, 0.5, 0.0)).with_parent(parent),
            )
            .unwrap();

        let at = world_transform(&world, child).unwrap().transform_point3(Vec3::ZERO);
        assert_eq!(at, Vec3::new(2.0, 0.5, 1.0));
    }

    #[test]
    fn despawned_parent_ends_chain() {
        let mut world = World::new();
        world.register::<Mesh>(StorageKind::Dense).unwrap();
        let parent = world.spawn();
        let child = world.spawn();
        world
            .attach(parent, Mesh::new(MeshHandle(1), Vec3::X))
            .unwrap();
        world
            .attach(child, Mesh::new(MeshHandle(2), Vec3::Y).with_parent(parent))
            .unwrap();
        world.despawn(parent);

        let at = world_transform(&world, child).unwrap().transform_point3(Vec3::ZERO);
        assert_eq!(at, Vec3::Y);
        assert!(world_transform(&world, parent).is_none());
    }
}
