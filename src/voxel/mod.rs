//! Voxel data structures and operations

pub mod voxel;
pub mod grid;
pub mod store;
pub mod pick;
pub mod edit;

pub use voxel::{Color, DisplayTransform, Voxel, VoxelRecord};
pub use grid::{CellKey, GridSpec};
pub use store::VoxelStore;
pub use pick::{pick, PointerHit};
