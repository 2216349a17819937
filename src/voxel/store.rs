//! Voxel store: cell key to voxel, in insertion order.

use std::collections::HashMap;

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::render::VoxelRenderer;
use super::grid::{CellKey, GridSpec};
use super::voxel::{Color, Voxel, VoxelRecord};

/// A live voxel and its index in the insertion order
#[derive(Debug)]
struct Slot {
    order: usize,
    voxel: Voxel,
}

/// Owns every placed voxel and its renderer representation.
///
/// `create` and `remove` never fail: creating on an occupied cell or
/// removing an empty one is a no-op reported through the return value.
pub struct VoxelStore<R: VoxelRenderer> {
    grid: GridSpec,
    voxels: HashMap<CellKey, Slot>,
    /// Insertion order; removed keys leave a tombstone until compaction
    order: Vec<Option<CellKey>>,
    renderer: R,
    /// Uniform scale while pixel-view is on
    pixel_view: Option<f32>,
}

impl<R: VoxelRenderer> VoxelStore<R> {
    /// Create an empty store
    pub fn new(grid: GridSpec, renderer: R) -> Self {
        Self {
            grid,
            voxels: HashMap::new(),
            order: Vec::new(),
            renderer,
            pixel_view: None,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn contains(&self, position: Vec3) -> bool {
        self.get(position).is_some()
    }

    pub fn get(&self, position: Vec3) -> Option<&Voxel> {
        let key = self.grid.cell_key(position)?;
        self.voxels.get(&key).map(|slot| &slot.voxel)
    }

    /// Voxels in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Voxel> {
        self.order
            .iter()
            .flatten()
            .filter_map(|key| self.voxels.get(key))
            .map(|slot| &slot.voxel)
    }

    /// Place a voxel at the cell nearest `position`.
    ///
    /// Returns false (and changes nothing) if the cell is occupied or the
    /// position lies outside the lattice.
    pub fn create(&mut self, position: Vec3, color: Color, scale: Vec3) -> bool {
        let Some(key) = self.grid.cell_key(position) else {
            log::warn!("create: {} is outside the grid", position);
            return false;
        };
        if self.voxels.contains_key(&key) {
            return false;
        }

        let mut voxel = Voxel::new(self.grid.cell_position(key), color, scale);
        if let Some(pixel_scale) = self.pixel_view {
            voxel.enter_pixel_view(pixel_scale);
        }
        voxel.handle = Some(self.renderer.spawn(&voxel));

        log::debug!("create {:?} {}", key, color);
        self.voxels.insert(key, Slot { order: self.order.len(), voxel });
        self.order.push(Some(key));
        true
    }

    /// Create from a flattened record
    pub fn create_record(&mut self, record: &VoxelRecord) -> bool {
        self.create(record.position, record.color, record.scale)
    }

    /// Remove the voxel at `position`, releasing its renderer handle before
    /// returning. Returns false if the cell was empty.
    pub fn remove(&mut self, position: Vec3) -> bool {
        let Some(key) = self.grid.cell_key(position) else {
            return false;
        };
        let Some(slot) = self.voxels.remove(&key) else {
            return false;
        };

        self.order[slot.order] = None;
        self.dispose(slot.voxel);
        log::debug!("remove {:?}", key);

        if self.order.len() > 2 * self.voxels.len() + 16 {
            self.compact();
        }
        true
    }

    /// Drop tombstones and reindex the survivors
    fn compact(&mut self) {
        self.order.retain(Option::is_some);
        for (index, key) in self.order.iter().flatten().enumerate() {
            if let Some(slot) = self.voxels.get_mut(key) {
                slot.order = index;
            }
        }
    }

    /// Remove every voxel, releasing each renderer handle
    pub fn clear(&mut self) {
        for key in std::mem::take(&mut self.order).into_iter().flatten() {
            if let Some(slot) = self.voxels.remove(&key) {
                self.dispose(slot.voxel);
            }
        }
        debug_assert!(self.voxels.is_empty());
    }

    fn dispose(&mut self, mut voxel: Voxel) {
        if let Some(handle) = voxel.handle.take() {
            self.renderer.release(handle);
        }
    }

    /// Plain-data copy of every voxel, in insertion order
    pub fn snapshot_all(&self) -> Vec<VoxelRecord> {
        self.iter().map(Voxel::record).collect()
    }

    /// Bounds enclosing every voxel's cube, if any
    pub fn bounds(&self) -> Option<Aabb> {
        let mut voxels = self.iter();
        let first = voxels.next()?;
        let mut bounds = self.grid.cube_bounds(first.position, first.scale);
        for voxel in voxels {
            let cube = self.grid.cube_bounds(voxel.position, voxel.scale);
            bounds.expand(cube.min);
            bounds.expand(cube.max);
        }
        Some(bounds)
    }

    pub fn is_pixel_view(&self) -> bool {
        self.pixel_view.is_some()
    }

    /// Switch the display-only pixel-view transform on or off.
    ///
    /// Editable content (positions, colors, scales) is untouched. Voxels
    /// created while it is on are displayed in pixel-view as well.
    pub fn set_pixel_view(&mut self, pixel_scale: Option<f32>) {
        self.pixel_view = pixel_scale;
        for key in self.order.iter().flatten() {
            let Some(Slot { voxel, .. }) = self.voxels.get_mut(key) else {
                continue;
            };
            match pixel_scale {
                Some(scale) => voxel.enter_pixel_view(scale),
                None => voxel.exit_pixel_view(),
            }
            if let Some(handle) = &voxel.handle {
                self.renderer.update(handle, &voxel.display);
            }
        }
    }
}

impl<R: VoxelRenderer> Drop for VoxelStore<R> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{InstanceRenderer, NullRenderer};

    const RED: Color = Color::from_hex(0xff0000);
    const BLUE: Color = Color::from_hex(0x0000ff);

    fn store() -> VoxelStore<NullRenderer> {
        VoxelStore::new(GridSpec::default(), NullRenderer::new())
    }

    #[test]
    fn test_create_twice_keeps_first() {
        let mut store = store();
        assert!(store.create(Vec3::new(1.0, 2.0, 3.0), RED, Vec3::ONE));
        assert!(!store.create(Vec3::new(1.0, 2.0, 3.0), BLUE, Vec3::splat(2.0)));

        assert_eq!(store.len(), 1);
        let voxel = store.get(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(voxel.color(), RED);
        assert_eq!(voxel.scale(), Vec3::ONE);
        assert_eq!(store.renderer().live_count(), 1);
    }

    #[test]
    fn test_create_snaps_to_grid() {
        let mut store = store();
        store.create(Vec3::new(0.9, -0.2, 2.1), RED, Vec3::ONE);
        let voxel = store.iter().next().unwrap();
        assert_eq!(voxel.position(), Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(voxel.original_position(), voxel.position());
    }

    #[test]
    fn test_remove_releases_handle() {
        let mut store = store();
        store.create(Vec3::ZERO, RED, Vec3::ONE);
        store.create(Vec3::X, RED, Vec3::ONE);

        assert!(store.remove(Vec3::ZERO));
        assert_eq!(store.renderer().live_count(), 1);
        assert!(!store.remove(Vec3::ZERO));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_releases_all() {
        let mut store = VoxelStore::new(GridSpec::default(), InstanceRenderer::new());
        for x in 0..5 {
            store.create(Vec3::new(x as f32, 0.0, 0.0), RED, Vec3::ONE);
        }
        assert_eq!(store.renderer().live_count(), 5);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.renderer().live_count(), 0);
        assert!(store.renderer().instances().iter().all(|i| !i.is_visible()));
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut store = store();
        store.create(Vec3::new(3.0, 0.0, 0.0), RED, Vec3::ONE);
        store.create(Vec3::new(-1.0, 0.0, 0.0), BLUE, Vec3::ONE);
        store.create(Vec3::new(1.0, 0.0, 0.0), RED, Vec3::ONE);
        store.remove(Vec3::new(-1.0, 0.0, 0.0));
        store.create(Vec3::new(-1.0, 0.0, 0.0), BLUE, Vec3::ONE);

        let xs: Vec<f32> = store.snapshot_all().iter().map(|r| r.position.x).collect();
        assert_eq!(xs, vec![3.0, 1.0, -1.0]);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut store = store();
        store.create(Vec3::ZERO, RED, Vec3::ONE);
        let snapshot = store.snapshot_all();

        store.clear();
        store.create(Vec3::X, BLUE, Vec3::ONE);
        assert_eq!(snapshot, vec![VoxelRecord::unit(Vec3::ZERO, RED)]);
    }

    #[test]
    fn test_pixel_view_round_trip() {
        let mut store = VoxelStore::new(GridSpec::default(), InstanceRenderer::new());
        store.create(Vec3::ZERO, RED, Vec3::new(1.0, 2.0, 3.0));
        store.create(Vec3::new(0.0, 4.0, 0.0), BLUE, Vec3::new(0.5, 0.5, 0.5));
        let before: Vec<_> = store.iter().map(|v| v.display()).collect();
        let records = store.snapshot_all();

        store.set_pixel_view(Some(0.2));
        assert!(store.is_pixel_view());
        for voxel in store.iter() {
            assert_eq!(voxel.display().scale, Vec3::splat(0.2));
            assert_eq!(voxel.display().position, voxel.original_position());
        }
        assert_eq!(store.renderer().instances()[0].scale, [0.2, 0.2, 0.2]);
        assert_eq!(store.snapshot_all(), records);

        store.set_pixel_view(None);
        let after: Vec<_> = store.iter().map(|v| v.display()).collect();
        assert_eq!(before, after);
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.scale.to_array().map(f32::to_bits), b.scale.to_array().map(f32::to_bits));
            assert_eq!(a.position.to_array().map(f32::to_bits), b.position.to_array().map(f32::to_bits));
        }
        assert_eq!(store.renderer().instances()[0].scale, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_create_during_pixel_view() {
        let mut store = store();
        store.set_pixel_view(Some(0.2));
        store.create(Vec3::ZERO, RED, Vec3::ONE);
        assert_eq!(store.get(Vec3::ZERO).unwrap().display().scale, Vec3::splat(0.2));

        store.set_pixel_view(None);
        assert_eq!(store.get(Vec3::ZERO).unwrap().display().scale, Vec3::ONE);
    }

    #[test]
    fn test_bounds() {
        let mut store = store();
        assert!(store.bounds().is_none());
        store.create(Vec3::ZERO, RED, Vec3::ONE);
        store.create(Vec3::new(2.0, 0.0, 0.0), RED, Vec3::ONE);
        let bounds = store.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-0.5));
        assert_eq!(bounds.max, Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_out_of_range_create_is_rejected() {
        let mut store = store();
        assert!(!store.create(Vec3::new(3e9, 0.0, 0.0), RED, Vec3::ONE));
        assert!(!store.contains(Vec3::new(3e9, 0.0, 0.0)));
        assert!(!store.remove(Vec3::new(3e9, 0.0, 0.0)));
        assert!(store.is_empty());
        assert_eq!(store.renderer().live_count(), 0);
    }

    #[test]
    fn test_many_removals_keep_order() {
        let mut store = store();
        for x in 0..200 {
            store.create(Vec3::new(x as f32, 0.0, 0.0), RED, Vec3::ONE);
        }
        // Remove every voxel except multiples of 7; compaction runs along the way
        for x in (0..200).filter(|x| x % 7 != 0) {
            assert!(store.remove(Vec3::new(x as f32, 0.0, 0.0)));
        }
        store.create(Vec3::new(-1.0, 0.0, 0.0), BLUE, Vec3::ONE);
        assert!(store.remove(Vec3::new(14.0, 0.0, 0.0)));

        let xs: Vec<i32> = store.iter().map(|v| v.position().x as i32).collect();
        let mut expected: Vec<i32> = (0..200).filter(|x| x % 7 == 0 && *x != 14).collect();
        expected.push(-1);
        assert_eq!(xs, expected);
        assert_eq!(store.len(), expected.len());
        assert!(store.order.len() <= 2 * store.len() + 16);
    }
}
