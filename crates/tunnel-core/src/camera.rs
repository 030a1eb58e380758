//! Camera advance driver and the render camera derived from it.

use crate::constants::{
    CAMERA_FOVY_DEGREES, CAMERA_START_DEPTH, CAMERA_ZFAR, CAMERA_ZNEAR, REFERENCE_FRAME_RATE,
};
use glam::{Mat4, Vec3};
use std::time::Duration;

/// How `camera_advance_speed` is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AdvanceMode {
    /// Fixed distance per tick regardless of elapsed time.
    #[default]
    PerFrame,
    /// Distance scaled by elapsed time so that the same speed value looks
    /// the same as `PerFrame` at the reference frame rate.
    PerSecond,
}

/// Sole writer of the reference camera depth.
///
/// The camera travels toward negative depth; both instance pools test their
/// instances against [`CameraDriver::depth`] after each advance. Depth is kept
/// in `f64` so a constant step stays exact however far the camera has gone.
#[derive(Clone, Debug)]
pub struct CameraDriver {
    depth: f64,
    mode: AdvanceMode,
    travelled: f64,
}

impl Default for CameraDriver {
    fn default() -> Self {
        Self::new(CAMERA_START_DEPTH, AdvanceMode::default())
    }
}

impl CameraDriver {
    pub fn new(start_depth: f64, mode: AdvanceMode) -> Self {
        Self {
            depth: start_depth,
            mode,
            travelled: 0.0,
        }
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Teleport the camera; used by test harnesses and resets.
    pub fn set_depth(&mut self, depth: f64) {
        if depth.is_finite() {
            self.depth = depth;
        }
    }

    pub fn mode(&self) -> AdvanceMode {
        self.mode
    }

    /// Total distance covered since construction.
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    /// Advance one tick and return the new depth.
    pub fn advance(&mut self, dt: Duration, speed: f32) -> f64 {
        let speed = f64::from(speed);
        let step = match self.mode {
            AdvanceMode::PerFrame => speed,
            AdvanceMode::PerSecond => speed * dt.as_secs_f64() * f64::from(REFERENCE_FRAME_RATE),
        };
        if step.is_finite() {
            self.depth -= step;
            self.travelled += step;
        }
        self.depth
    }
}

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Camera on the depth axis looking down -Z.
    pub fn looking_down_tunnel(depth: f32, aspect: f32) -> Self {
        let eye = Vec3::new(0.0, 0.0, depth);
        Self {
            eye,
            target: eye - Vec3::Z,
            up: Vec3::Y,
            aspect: if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 },
            fovy_radians: CAMERA_FOVY_DEGREES.to_radians(),
            znear: CAMERA_ZNEAR,
            zfar: CAMERA_ZFAR,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
