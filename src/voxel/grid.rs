//! Grid addressing: world positions to lattice cells and back

use crate::core::types::{IVec3, Vec3};
use crate::math::Aabb;

/// Lattice positions closer than this (in cells) count as aligned
const ALIGN_EPSILON: f32 = 1e-4;

/// Largest addressable cell index on any axis.
///
/// Within this range `cell_key(cell_position(k)) == k` holds for any voxel
/// size, since f32 keeps the lattice position within a quarter cell.
pub const MAX_CELL: i32 = 1 << 21;

/// Identifies one grid cell. Two grid-aligned positions share a key
/// iff they are coordinate-wise equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellKey {
    /// Create a new cell key
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Whether every component lies within `-MAX_CELL..=MAX_CELL`
    pub fn in_range(self) -> bool {
        [self.x, self.y, self.z].iter().all(|c| c.unsigned_abs() <= MAX_CELL as u32)
    }

    /// Key offset by a whole number of cells, or None if the result leaves
    /// the addressable lattice
    pub fn offset(self, delta: IVec3) -> Option<Self> {
        let key = Self::new(
            self.x.checked_add(delta.x)?,
            self.y.checked_add(delta.y)?,
            self.z.checked_add(delta.z)?,
        );
        key.in_range().then_some(key)
    }
}

impl From<IVec3> for CellKey {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Uniform cubic lattice with a fixed voxel edge length
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    voxel_size: f32,
}

impl GridSpec {
    /// Create a grid; `voxel_size` must be positive and finite
    pub fn new(voxel_size: f32) -> Self {
        debug_assert!(voxel_size.is_finite() && voxel_size > 0.0);
        Self { voxel_size }
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Whether one world coordinate rounds to an addressable cell index
    pub fn axis_in_range(&self, coordinate: f32) -> bool {
        let cell = (coordinate / self.voxel_size).round();
        cell.is_finite() && cell.abs() <= MAX_CELL as f32
    }

    /// Nearest cell to a world position, or None outside the lattice
    pub fn cell_key(&self, position: Vec3) -> Option<CellKey> {
        if !position.to_array().into_iter().all(|c| self.axis_in_range(c)) {
            return None;
        }
        Some((position / self.voxel_size).round().as_ivec3().into())
    }

    /// World position of a cell
    pub fn cell_position(&self, key: CellKey) -> Vec3 {
        key.as_ivec3().as_vec3() * self.voxel_size
    }

    /// Nearest lattice position
    pub fn snap(&self, position: Vec3) -> Option<Vec3> {
        self.cell_key(position).map(|key| self.cell_position(key))
    }

    /// Whether a position lies on the lattice (within float tolerance)
    pub fn is_aligned(&self, position: Vec3) -> bool {
        let cells = position / self.voxel_size;
        (cells - cells.round()).abs().max_element() < ALIGN_EPSILON
    }

    /// Position of the cell sharing the face with outward normal `face_normal`.
    ///
    /// The normal is expected to be one of the six axis-aligned unit vectors;
    /// its components are rounded to whole cells. None if either cell is
    /// outside the lattice.
    pub fn neighbor_cell(&self, position: Vec3, face_normal: Vec3) -> Option<Vec3> {
        let step = face_normal.round().clamp(Vec3::NEG_ONE, Vec3::ONE).as_ivec3();
        let key = self.cell_key(position)?.offset(step)?;
        Some(self.cell_position(key))
    }

    /// Bounds of a cube centered on `position` with per-axis `scale`
    pub fn cube_bounds(&self, position: Vec3, scale: Vec3) -> Aabb {
        Aabb::from_center_half_extent(position, scale * self.voxel_size * 0.5)
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::new(1.0)
    }
}
