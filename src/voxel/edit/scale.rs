//! Scale transform: tile every voxel into a block of whole cells.

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::voxel::grid::GridSpec;
use crate::voxel::voxel::VoxelRecord;

/// Most voxels a single scale may produce
pub const MAX_SCALED_VOXELS: usize = 1 << 24;

/// Positive per-axis replication counts, each at most `i32::MAX`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleFactors {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl ScaleFactors {
    /// Validate integer multipliers; all must be positive
    pub fn new(x: i64, y: i64, z: i64) -> Result<Self> {
        let axis = |name: &str, value: i64| -> Result<u32> {
            i32::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .map(i32::unsigned_abs)
                .ok_or_else(|| Error::InvalidScale(format!("{} must be a positive integer, got {}", name, value)))
        };
        Ok(Self {
            x: axis("x", x)?,
            y: axis("y", y)?,
            z: axis("z", z)?,
        })
    }

    /// Parse prompt input; non-numeric text is rejected like non-positive values
    pub fn parse(x: &str, y: &str, z: &str) -> Result<Self> {
        let number = |name: &str, text: &str| -> Result<i64> {
            text.trim()
                .parse::<i64>()
                .map_err(|_| Error::InvalidScale(format!("{} is not an integer: {:?}", name, text)))
        };
        Self::new(number("x", x)?, number("y", y)?, number("z", z)?)
    }

    /// Layers along y actually produced
    pub fn y_layers(&self, replicate_y: bool) -> u32 {
        if replicate_y { self.y } else { 1 }
    }

    /// Voxels produced from `voxels` inputs, or None on overflow
    pub fn output_len(&self, voxels: usize, replicate_y: bool) -> Option<usize> {
        [self.x, self.y_layers(replicate_y), self.z]
            .into_iter()
            .try_fold(voxels, |n, factor| n.checked_mul(usize::try_from(factor).ok()?))
    }
}

/// Expand each record into `x * y_layers * z` unit voxels offset by whole
/// cells from the original, keeping its color.
///
/// Per-voxel scale is reset to (1, 1, 1). Output order is record-major,
/// then x, y, z. Overlapping outputs are left for the store to dedupe.
///
/// Fails without producing anything if the output would exceed
/// [`MAX_SCALED_VOXELS`] or reach past the grid's addressable cells.
pub fn tile(records: &[VoxelRecord], grid: &GridSpec, factors: ScaleFactors, replicate_y: bool) -> Result<Vec<VoxelRecord>> {
    let total = factors
        .output_len(records.len(), replicate_y)
        .filter(|n| *n <= MAX_SCALED_VOXELS)
        .ok_or_else(|| {
            Error::InvalidScale(format!(
                "{} voxels scaled by {}x{}x{} exceeds the limit of {}",
                records.len(), factors.x, factors.y_layers(replicate_y), factors.z, MAX_SCALED_VOXELS
            ))
        })?;

    let cells = |n: u32| -> Result<i32> {
        i32::try_from(n).map_err(|_| Error::InvalidScale(format!("factor {} is too large", n)))
    };
    let extent = IVec3::new(
        cells(factors.x)? - 1,
        cells(factors.y_layers(replicate_y))? - 1,
        cells(factors.z)? - 1,
    );

    let mut out = Vec::with_capacity(total);
    for (index, record) in records.iter().enumerate() {
        let base = grid
            .cell_key(record.position)
            .filter(|base| base.offset(extent).is_some())
            .ok_or_else(|| {
                Error::InvalidScale(format!("voxel {} at {} would grow past the grid edge", index, record.position))
            })?;

        // The far corner is in range, so every offset below is too
        for i in 0..=extent.x {
            for j in 0..=extent.y {
                for k in 0..=extent.z {
                    if let Some(key) = base.offset(IVec3::new(i, j, k)) {
                        out.push(VoxelRecord::unit(grid.cell_position(key), record.color));
                    }
                }
            }
        }
    }
    Ok(out)
}
