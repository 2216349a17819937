//! Voxel data types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::render::RenderHandle;

/// 24-bit RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

impl Color {
    /// Create from a packed 0xRRGGBB value; bits above 24 are dropped
    pub const fn from_hex(rgb: u32) -> Self {
        Self(rgb & 0x00ff_ffff)
    }

    /// Create from RGB888 components
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Packed 0xRRGGBB value
    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Get RGB888 components
    pub const fn to_rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    /// Normalized linear components for GPU upload
    pub fn to_f32_array(self) -> [f32; 3] {
        let (r, g, b) = self.to_rgb();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }

    /// Parse exactly six hex digits (no prefix)
    pub fn from_hex_digits(digits: &str) -> Option<Self> {
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self)
    }
}

/// Formats as lowercase `#rrggbb`
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Parses `#RRGGBB` in either case
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('#')
            .and_then(Self::from_hex_digits)
            .ok_or_else(|| format!("expected #RRGGBB, got {:?}", s))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Flattened, plain-data copy of one voxel's editable attributes.
///
/// History entries and save codes are built from these; they never
/// reference live store entries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelRecord {
    pub position: Vec3,
    pub color: Color,
    pub scale: Vec3,
}

impl VoxelRecord {
    pub fn new(position: Vec3, color: Color, scale: Vec3) -> Self {
        Self { position, color, scale }
    }

    /// Record with the default unit scale
    pub fn unit(position: Vec3, color: Color) -> Self {
        Self::new(position, color, Vec3::ONE)
    }
}

/// What the renderer currently shows for a voxel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    pub position: Vec3,
    pub scale: Vec3,
}

/// A placed cube owned by the voxel store
#[derive(Debug)]
pub struct Voxel {
    /// Grid-aligned position
    pub(crate) position: Vec3,
    /// Position at creation, used to regroup voxels in pixel-view
    pub(crate) original_position: Vec3,
    pub(crate) color: Color,
    pub(crate) scale: Vec3,
    pub(crate) display: DisplayTransform,
    /// Display transform saved while pixel-view is on
    pub(crate) cached_display: Option<DisplayTransform>,
    pub(crate) handle: Option<RenderHandle>,
}

impl Voxel {
    pub(crate) fn new(position: Vec3, color: Color, scale: Vec3) -> Self {
        Self {
            position,
            original_position: position,
            color,
            scale,
            display: DisplayTransform { position, scale },
            cached_display: None,
            handle: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn original_position(&self) -> Vec3 {
        self.original_position
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn display(&self) -> DisplayTransform {
        self.display
    }

    /// Flatten into a plain record
    pub fn record(&self) -> VoxelRecord {
        VoxelRecord::new(self.position, self.color, self.scale)
    }

    /// Shrink onto the creation position, caching the current transform.
    /// No-op if already applied.
    pub(crate) fn enter_pixel_view(&mut self, pixel_scale: f32) {
        if self.cached_display.is_some() {
            return;
        }
        self.cached_display = Some(self.display);
        self.display = DisplayTransform {
            position: self.original_position,
            scale: Vec3::splat(pixel_scale),
        };
    }

    /// Restore the cached transform. No-op if pixel-view is not applied.
    pub(crate) fn exit_pixel_view(&mut self) {
        if let Some(cached) = self.cached_display.take() {
            self.display = cached;
        }
    }
}
