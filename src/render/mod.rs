//! Renderer seam for placed voxels.
//!
//! The store signals a [`VoxelRenderer`] whenever a voxel appears, changes
//! its display transform, or disappears. Rendering itself lives outside
//! this crate; [`InstanceRenderer`] keeps a GPU-ready instance buffer and
//! [`NullRenderer`] discards everything.

pub mod instance;

pub use instance::{InstanceRenderer, VoxelInstance};

use crate::voxel::voxel::{DisplayTransform, Voxel};

/// Opaque token for one voxel's retained graphics resources.
///
/// Not `Clone`: the only way to get rid of a handle is to give it back
/// through [`VoxelRenderer::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct RenderHandle(u32);

impl RenderHandle {
    pub fn new(slot: u32) -> Self {
        Self(slot)
    }

    pub fn slot(&self) -> u32 {
        self.0
    }
}

/// Receives visual add/update/dispose signals from the voxel store
pub trait VoxelRenderer {
    /// Create the visual representation of a new voxel
    fn spawn(&mut self, voxel: &Voxel) -> RenderHandle;

    /// Move or rescale an existing representation
    fn update(&mut self, handle: &RenderHandle, transform: &DisplayTransform);

    /// Dispose the representation and everything it retains
    fn release(&mut self, handle: RenderHandle);
}

/// Renderer that keeps nothing but a live-handle count
#[derive(Debug, Default)]
pub struct NullRenderer {
    next_slot: u32,
    live: usize,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles spawned and not yet released
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl VoxelRenderer for NullRenderer {
    fn spawn(&mut self, _voxel: &Voxel) -> RenderHandle {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.wrapping_add(1);
        self.live += 1;
        RenderHandle::new(slot)
    }

    fn update(&mut self, _handle: &RenderHandle, _transform: &DisplayTransform) {}

    fn release(&mut self, _handle: RenderHandle) {
        self.live = self.live.saturating_sub(1);
    }
}
