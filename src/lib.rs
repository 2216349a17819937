//! Voxedit - core of an interactive voxel-grid editor

pub mod core;
pub mod math;
pub mod voxel;
pub mod render;
pub mod editor;
