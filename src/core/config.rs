//! Editor configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::voxel::Color;

/// Session-wide editor settings.
///
/// Stored as JSON. Missing fields fall back to [`EditorConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Edge length of one grid cell in world units.
    pub voxel_size: f32,
    /// Color of the seed voxel and the initial active color.
    pub default_color: Color,
    /// Uniform display scale applied to every voxel while pixel-view is on.
    pub pixel_view_scale: f32,
    /// Voxels created per batch-load step.
    pub load_batch_size: usize,
    /// Delay between batch-load steps in milliseconds (shell cadence).
    pub load_interval_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            voxel_size: 1.0,
            default_color: Color::from_hex(0x00ffff),
            pixel_view_scale: 0.2,
            load_batch_size: 1,
            load_interval_ms: 16,
        }
    }
}

impl EditorConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the grid and batch loader cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        if !(self.pixel_view_scale.is_finite() && self.pixel_view_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pixel_view_scale must be positive, got {}",
                self.pixel_view_scale
            )));
        }
        if self.load_batch_size == 0 {
            return Err(Error::InvalidConfig("load_batch_size must be at least 1".into()));
        }
        Ok(())
    }
}
