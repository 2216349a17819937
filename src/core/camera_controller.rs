//! Orbit camera controller for the pan/orbit mode

use crate::core::camera::Camera;
use crate::core::types::Vec3;

/// Closest the camera may get to its target
const MIN_DISTANCE: f32 = 1.0;

/// Pitch limit just short of straight up/down
const MAX_PITCH: f32 = 1.55;

/// Orbits a camera around a target point
#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Point the camera orbits and looks at
    pub target: Vec3,
    /// Distance from target to camera
    pub distance: f32,
    /// Mouse sensitivity
    pub sensitivity: f32,
    /// Rotation around Y axis in radians
    yaw: f32,
    /// Elevation above the XZ plane in radians
    pitch: f32,
}

impl OrbitController {
    /// Create new controller
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance: distance.max(MIN_DISTANCE),
            sensitivity: 1.0,
            yaw: 0.0,
            pitch: 0.5,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Rotate around the target by a pointer drag delta (pixels)
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity * 0.005;
        self.pitch = (self.pitch + dy * self.sensitivity * 0.005).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move toward (negative) or away from (positive) the target
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance + delta).max(MIN_DISTANCE);
    }

    /// Translate the target in the camera's screen plane
    pub fn pan(&mut self, camera: &Camera, dx: f32, dy: f32) {
        let scale = self.distance * 0.002 * self.sensitivity;
        self.target += (-camera.right() * dx + camera.up() * dy) * scale;
    }

    /// Camera position for the current orbit state
    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    /// Write the orbit pose into the camera
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.look_at(self.target, Vec3::Y);
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 10.0)
    }
}
