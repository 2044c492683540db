use glam::Mat4;

use crate::aabb::Aabb;

/// Recomputes world-space collision volumes and tests them for overlap.
///
/// The collision system only talks to volumes through this trait, so a
/// different volume shape can be swapped in without touching it.
pub trait VolumeUpdater: Send + Sync {
    /// Write the world-space volume of `local` placed by `world_transform` into `out`.
    fn update_volume(&self, out: &mut Aabb, local: &Aabb, world_transform: &Mat4);

    fn intersects(&self, a: &Aabb, b: &Aabb) -> bool;
}

/// Axis-aligned boxes: the world volume encloses the transformed local box.
#[derive(Debug, Clone, Copy, Default)]
pub struct AabbUpdater;

impl VolumeUpdater for AabbUpdater {
    fn update_volume(&self, out: &mut Aabb, local: &Aabb, world_transform: &Mat4) {
        *out = local.transformed(world_transform);
    }

    fn intersects(&self, a: &Aabb, b: &Aabb) -> bool {
        a.intersects(b)
    }
}
