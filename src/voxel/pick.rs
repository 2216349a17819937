//! Ray picking against placed cubes

use crate::core::types::Vec3;
use crate::math::Ray;
use crate::render::VoxelRenderer;
use super::store::VoxelStore;

/// Result of a primary pointer hit-test
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerHit {
    /// Grid position of the hit cube
    pub position: Vec3,
    /// Outward axis-aligned unit normal of the hit face
    pub normal: Vec3,
    /// Distance along the ray
    pub distance: f32,
}

/// Nearest cube hit by `ray`, using each voxel's authoritative extent.
pub fn pick<R: VoxelRenderer>(store: &VoxelStore<R>, ray: &Ray) -> Option<PointerHit> {
    let grid = store.grid();
    let mut nearest: Option<PointerHit> = None;

    for voxel in store.iter() {
        let bounds = grid.cube_bounds(voxel.position(), voxel.scale());
        let Some((t_near, _, normal)) = ray.entry_face(&bounds) else {
            continue;
        };
        if nearest.is_none_or(|hit| t_near < hit.distance) {
            nearest = Some(PointerHit {
                position: voxel.position(),
                normal,
                distance: t_near,
            });
        }
    }

    nearest
}
