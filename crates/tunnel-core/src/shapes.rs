//! Inner shape field: a spiral of small shapes orbiting inside the ring track.
//!
//! The field holds `depth_segments * shapes_per_ring` instances laid out as
//! depth slices, each slice a ring of evenly spaced slots twisted by the
//! spiral offset. Instances orbit independently; when one falls behind the
//! camera it is moved one field length down the tunnel and its phase and
//! angular speed are re-drawn so the motion never settles into a visible
//! repeating pattern.

use crate::color::Color;
use crate::constants::*;
use crate::params::{ParameterSet, ShapeKind};
use crate::rings::wrap_behind;
use glam::Vec2;
use rand::prelude::*;
use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeInstance {
    /// Flat index, `depth_slice * shapes_per_ring + ring_slot`.
    pub slot: usize,
    pub depth_slice: usize,
    pub ring_slot: usize,
    pub base_angle: f32,
    pub spiral_offset: f32,
    pub phase: f32,
    pub angular_speed: f32,
    pub radius: f32,
    pub depth: f64,
    /// Orbit position in the XY plane, refreshed every tick.
    pub position: Vec2,
    /// Cosmetic tumble about X and Y.
    pub self_rotation: Vec2,
    pub color: Color,
}

impl ShapeInstance {
    pub fn orbit_angle(&self, elapsed_sec: f64) -> f32 {
        let a = self.base_angle as f64
            + self.spiral_offset as f64
            + self.phase as f64
            + elapsed_sec * self.angular_speed as f64;
        a.rem_euclid(std::f64::consts::TAU) as f32
    }
}

/// Angular speed drawn at creation: deeper slices start faster.
pub fn creation_speed(depth_slice: usize, depth_segments: usize, jitter: f32, scale: f32) -> f32 {
    let depth_fraction = depth_slice as f32 / depth_segments.max(1) as f32;
    (SPEED_BASE + depth_fraction * SPEED_DEPTH_SPAN) * jitter * scale
}

/// Per-tick self-rotation increments for a slot.
pub fn self_rotation_rate(slot: usize) -> Vec2 {
    Vec2::new(
        SELF_ROTATION_BASE + (slot % 3) as f32 * SELF_ROTATION_STEP,
        SELF_ROTATION_BASE + (slot % 4) as f32 * SELF_ROTATION_STEP,
    )
}

#[derive(Clone, Debug)]
pub struct ShapeField {
    shapes: Vec<ShapeInstance>,
    kind: ShapeKind,
    depth_segments: usize,
    shapes_per_ring: usize,
    depth_spacing: f64,
    rng: StdRng,
    recycled_total: u64,
}

impl ShapeField {
    /// Build a fresh field; all random draws come from `rng`, which the field
    /// keeps for recycle-time re-randomisation.
    pub fn build(params: &ParameterSet, mut rng: StdRng) -> Self {
        let depth_segments = params.depth_segments.max(1) as usize;
        let shapes_per_ring = params.shapes_per_ring.max(1) as usize;
        let depth_spacing = params.inner_depth_spacing as f64;
        let radius = params.inner_radius;

        let mut shapes = Vec::with_capacity(depth_segments * shapes_per_ring);
        for z in 0..depth_segments {
            for i in 0..shapes_per_ring {
                let base_angle = (i as f32 / shapes_per_ring as f32) * TAU;
                let spiral_offset = z as f32 * params.spiral_rotation_per_segment;
                let phase = rng.gen_range(0.0..TAU);
                let jitter = rng.gen_range(SPEED_JITTER_MIN..SPEED_JITTER_MAX);
                let angular_speed =
                    creation_speed(z, depth_segments, jitter, params.angular_speed_scale);
                let angle = base_angle + spiral_offset + phase;
                let self_rotation = Vec2::new(
                    rng.gen_range(0.0..SELF_ROTATION_INIT_MAX),
                    rng.gen_range(0.0..SELF_ROTATION_INIT_MAX),
                );
                let color = Color::from_hsv(rng.gen::<f32>(), SHAPE_SATURATION, SHAPE_VALUE);
                shapes.push(ShapeInstance {
                    slot: z * shapes_per_ring + i,
                    depth_slice: z,
                    ring_slot: i,
                    base_angle,
                    spiral_offset,
                    phase,
                    angular_speed,
                    radius,
                    depth: -(z as f64) * depth_spacing,
                    position: Vec2::new(angle.cos() * radius, angle.sin() * radius),
                    self_rotation,
                    color,
                });
            }
        }

        Self {
            shapes,
            kind: params.shape_kind,
            depth_segments,
            shapes_per_ring,
            depth_spacing,
            rng,
            recycled_total: 0,
        }
    }

    pub fn shapes(&self) -> &[ShapeInstance] {
        &self.shapes
    }

    /// Mutable access for harnesses that need to place shapes directly.
    pub fn shapes_mut(&mut self) -> &mut [ShapeInstance] {
        &mut self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn depth_segments(&self) -> usize {
        self.depth_segments
    }

    pub fn shapes_per_ring(&self) -> usize {
        self.shapes_per_ring
    }

    pub fn track_length(&self) -> f64 {
        self.depth_segments as f64 * self.depth_spacing
    }

    /// Recycles performed since the field was built.
    pub fn recycled_total(&self) -> u64 {
        self.recycled_total
    }

    /// Advance orbits and tumbles, then recycle instances the camera has passed.
    /// Returns how many instances were recycled this tick.
    pub fn tick(&mut self, camera_depth: f64, elapsed_sec: f64) -> usize {
        let total = self.track_length();
        let threshold = camera_depth + SHAPE_RECYCLE_MARGIN;
        let mut recycled = 0;

        for shape in &mut self.shapes {
            let angle = shape.orbit_angle(elapsed_sec);
            shape.position = Vec2::new(angle.cos() * shape.radius, angle.sin() * shape.radius);
            shape.self_rotation += self_rotation_rate(shape.slot);

            if total > 0.0 && total.is_finite() && shape.depth > threshold {
                wrap_behind(&mut shape.depth, threshold, total);
                shape.phase = self.rng.gen_range(0.0..TAU);
                shape.angular_speed = self.rng.gen_range(RECYCLE_SPEED_MIN..RECYCLE_SPEED_MAX);
                recycled += 1;
            }
        }
        self.recycled_total += recycled as u64;
        if recycled > 0 {
            log::trace!("[shapes] recycled {recycled} at camera depth {camera_depth:.2}");
        }
        recycled
    }
}
