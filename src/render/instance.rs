//! CPU-side instance buffer for cube rendering

use bytemuck::{Pod, Zeroable};

use super::{RenderHandle, VoxelRenderer};
use crate::voxel::voxel::{DisplayTransform, Voxel};

/// Set in [`VoxelInstance::flags`] for slots holding a live voxel
pub const INSTANCE_VISIBLE: u32 = 1 << 0;

/// Per-cube instance data for the GPU (48 bytes, vec3 fields padded to 16)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VoxelInstance {
    /// Cube center in world space (12 bytes, offset 0)
    pub position: [f32; 3],
    pub _pos_pad: f32,
    /// Per-axis scale relative to the voxel edge (12 bytes, offset 16)
    pub scale: [f32; 3],
    pub _scale_pad: f32,
    /// Linear RGB color (12 bytes, offset 32)
    pub color: [f32; 3],
    /// Visibility flags (4 bytes, offset 44)
    pub flags: u32,
}

impl VoxelInstance {
    fn from_voxel(voxel: &Voxel) -> Self {
        let display = voxel.display();
        Self {
            position: display.position.to_array(),
            _pos_pad: 0.0,
            scale: display.scale.to_array(),
            _scale_pad: 0.0,
            color: voxel.color().to_f32_array(),
            flags: INSTANCE_VISIBLE,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flags & INSTANCE_VISIBLE != 0
    }
}

/// Renderer that maintains a packed instance array with slot reuse.
///
/// Released slots are zeroed (invisible) and recycled by later spawns, so
/// the buffer never grows past the peak voxel count.
#[derive(Debug, Default)]
pub struct InstanceRenderer {
    instances: Vec<VoxelInstance>,
    free_slots: Vec<u32>,
    /// Set on any change since the last [`InstanceRenderer::take_dirty`]
    dirty: bool,
}

impl InstanceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All slots, including released (invisible) ones
    pub fn instances(&self) -> &[VoxelInstance] {
        &self.instances
    }

    /// Raw bytes for a GPU buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn instance(&self, handle: &RenderHandle) -> Option<&VoxelInstance> {
        self.instances.get(handle.slot() as usize)
    }

    /// Slots holding a live voxel
    pub fn live_count(&self) -> usize {
        self.instances.len() - self.free_slots.len()
    }

    /// Return whether the buffer changed and reset the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl VoxelRenderer for InstanceRenderer {
    fn spawn(&mut self, voxel: &Voxel) -> RenderHandle {
        let instance = VoxelInstance::from_voxel(voxel);
        self.dirty = true;

        if let Some(slot) = self.free_slots.pop() {
            self.instances[slot as usize] = instance;
            RenderHandle::new(slot)
        } else {
            self.instances.push(instance);
            RenderHandle::new(self.instances.len() as u32 - 1)
        }
    }

    fn update(&mut self, handle: &RenderHandle, transform: &DisplayTransform) {
        if let Some(instance) = self.instances.get_mut(handle.slot() as usize) {
            instance.position = transform.position.to_array();
            instance.scale = transform.scale.to_array();
            self.dirty = true;
        }
    }

    fn release(&mut self, handle: RenderHandle) {
        let slot = handle.slot();
        if let Some(instance) = self.instances.get_mut(slot as usize) {
            *instance = VoxelInstance::zeroed();
            self.free_slots.push(slot);
            self.dirty = true;
        }
    }
}
