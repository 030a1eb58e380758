// Shared tuning constants used by the core engine and the native front-end.

use std::f32::consts::PI;

// Default palette (neon fuchsia -> cyan over a deep violet background)
pub const DEFAULT_COLOR_1: &str = "#ff00ff";
pub const DEFAULT_COLOR_2: &str = "#00ffe1";
pub const DEFAULT_BACKGROUND: &str = "#0b0014";
pub const DEFAULT_GLOW_COLOR: &str = "#ff66ff";

// Outer ring track
pub const DEFAULT_RING_COUNT: u32 = 50;
pub const DEFAULT_RING_SPACING: f32 = 2.0;
pub const DEFAULT_RING_ROTATION_SPEED: f32 = 0.01; // radians per tick
pub const DEFAULT_RING_SHININESS: f32 = 100.0;
pub const DEFAULT_CAMERA_ADVANCE_SPEED: f32 = 0.05; // depth units per tick

// Inner shape field
pub const DEFAULT_SHAPES_PER_RING: u32 = 12;
pub const DEFAULT_DEPTH_SEGMENTS: u32 = 50;
pub const DEFAULT_INNER_RADIUS: f32 = 5.0;
pub const DEFAULT_INNER_DEPTH_SPACING: f32 = 1.5;
pub const DEFAULT_SPIRAL_ROTATION: f32 = 0.3; // radians per depth slice
pub const DEFAULT_ANGULAR_SPEED_SCALE: f32 = 1.0;

// Glow (uniform emissive on the shape field)
pub const DEFAULT_GLOW_INTENSITY: f32 = 6.0;
pub const DEFAULT_GLOW_SIZE: f32 = 3.2;

// Fog
pub const DEFAULT_FOG_NEAR: f32 = 1.0;
pub const DEFAULT_FOG_FAR: f32 = 50.0;

// Structural limits; keep the pools bounded whatever the panel sends
pub const MAX_RING_COUNT: u32 = 1024;
pub const MAX_SHAPES_PER_RING: u32 = 256;
pub const MAX_DEPTH_SEGMENTS: u32 = 1024;
pub const MIN_SPACING: f32 = 0.01;
pub const MIN_RADIUS: f32 = 0.01;
pub const MIN_FOG_GAP: f32 = 0.1;

// Camera
pub const CAMERA_START_DEPTH: f64 = 5.0;
pub const CAMERA_FOVY_DEGREES: f32 = 75.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 1000.0;
pub const REFERENCE_FRAME_RATE: f32 = 60.0; // ticks per second assumed by per-tick speeds

// Shape recycling
pub const SHAPE_RECYCLE_MARGIN: f64 = 5.0; // depth units past the camera before a shape wraps
pub const RECYCLE_SPEED_MIN: f32 = 0.6;
pub const RECYCLE_SPEED_MAX: f32 = 1.6;

// Creation-time angular speed: (BASE + depth_fraction * SPAN) * U[JITTER_MIN, JITTER_MAX) * scale
pub const SPEED_BASE: f32 = 0.6;
pub const SPEED_DEPTH_SPAN: f32 = 0.8;
pub const SPEED_JITTER_MIN: f32 = 0.8;
pub const SPEED_JITTER_MAX: f32 = 1.6;

// Cosmetic self-rotation per tick: BASE + (slot % 3 | slot % 4) * STEP
pub const SELF_ROTATION_BASE: f32 = 0.01;
pub const SELF_ROTATION_STEP: f32 = 0.002;
pub const SELF_ROTATION_INIT_MAX: f32 = PI;

// Materials
pub const SHAPE_SHININESS: f32 = 50.0;
pub const SHAPE_SATURATION: f32 = 0.85;
pub const SHAPE_VALUE: f32 = 0.95;

// Geometry (world units)
pub const RING_MAJOR_RADIUS: f32 = 8.0;
pub const RING_TUBE_RADIUS: f32 = 0.3;
pub const RING_RADIAL_SEGMENTS: u32 = 16;
pub const RING_TUBULAR_SEGMENTS: u32 = 32;
pub const CUBE_SIZE: f32 = 0.8;
pub const SPHERE_RADIUS: f32 = 0.5;
pub const SPHERE_SEGMENTS: u32 = 16;
pub const TETRAHEDRON_RADIUS: f32 = 0.6;

// Lighting
pub const AMBIENT_INTENSITY: f32 = 0.5;
pub const HEADLIGHT_INTENSITY: f32 = 1.0;
pub const HEADLIGHT_OFFSET: f32 = 5.0; // behind the eye along +Z
