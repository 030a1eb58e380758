//! The parameter snapshot consumed by the engine each tick.
//!
//! A [`ParameterSet`] is a plain value: the tweak panel produces a new one for
//! every edit and the engine decides, via [`ParameterSet::rebuild_scope`],
//! whether the change can be applied on the next tick or requires a pool
//! rebuild.

use crate::color::{hex_or_black, Color};
use crate::constants::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ShapeKind {
    #[default]
    Cube,
    Sphere,
    Tetrahedron,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Cube, ShapeKind::Sphere, ShapeKind::Tetrahedron];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Cube => "cube",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Tetrahedron => "tetrahedron",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ShapeKind::Cube => ShapeKind::Sphere,
            ShapeKind::Sphere => ShapeKind::Tetrahedron,
            ShapeKind::Tetrahedron => ShapeKind::Cube,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shape kind {0:?} (expected cube, sphere or tetrahedron)")]
pub struct UnknownShapeKind(pub String);

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" | "box" => Ok(ShapeKind::Cube),
            "sphere" => Ok(ShapeKind::Sphere),
            "tetrahedron" | "tetra" => Ok(ShapeKind::Tetrahedron),
            _ => Err(UnknownShapeKind(s.to_string())),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform emissive glow applied to every shape when enabled.
#[derive(Clone, Debug, PartialEq)]
pub struct GlowParams {
    pub enabled: bool,
    pub color: Color,
    pub intensity: f32,
    pub size: f32,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            enabled: false,
            color: hex_or_black(DEFAULT_GLOW_COLOR),
            intensity: DEFAULT_GLOW_INTENSITY,
            size: DEFAULT_GLOW_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSet {
    pub color1: Color,
    pub color2: Color,
    pub background: Color,

    pub ring_count: u32,
    pub ring_spacing: f32,
    pub ring_rotation_speed: f32,
    pub ring_shininess: f32,
    pub camera_advance_speed: f32,

    pub shapes_per_ring: u32,
    pub depth_segments: u32,
    pub inner_radius: f32,
    pub inner_depth_spacing: f32,
    pub spiral_rotation_per_segment: f32,
    pub angular_speed_scale: f32,
    pub shape_kind: ShapeKind,
    pub wireframe: bool,

    pub glow: GlowParams,

    pub fog_near: f32,
    pub fog_far: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            color1: hex_or_black(DEFAULT_COLOR_1),
            color2: hex_or_black(DEFAULT_COLOR_2),
            background: hex_or_black(DEFAULT_BACKGROUND),
            ring_count: DEFAULT_RING_COUNT,
            ring_spacing: DEFAULT_RING_SPACING,
            ring_rotation_speed: DEFAULT_RING_ROTATION_SPEED,
            ring_shininess: DEFAULT_RING_SHININESS,
            camera_advance_speed: DEFAULT_CAMERA_ADVANCE_SPEED,
            shapes_per_ring: DEFAULT_SHAPES_PER_RING,
            depth_segments: DEFAULT_DEPTH_SEGMENTS,
            inner_radius: DEFAULT_INNER_RADIUS,
            inner_depth_spacing: DEFAULT_INNER_DEPTH_SPACING,
            spiral_rotation_per_segment: DEFAULT_SPIRAL_ROTATION,
            angular_speed_scale: DEFAULT_ANGULAR_SPEED_SCALE,
            shape_kind: ShapeKind::Cube,
            wireframe: false,
            glow: GlowParams::default(),
            fog_near: DEFAULT_FOG_NEAR,
            fog_far: DEFAULT_FOG_FAR,
        }
    }
}

/// Which pools must be rebuilt for a parameter change to take effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RebuildScope {
    pub rings: bool,
    pub shapes: bool,
}

impl RebuildScope {
    pub const NONE: RebuildScope = RebuildScope { rings: false, shapes: false };
    pub const ALL: RebuildScope = RebuildScope { rings: true, shapes: true };

    pub fn is_empty(&self) -> bool {
        !self.rings && !self.shapes
    }
}

fn finite_or(value: f32, fallback: f32, name: &str) -> f32 {
    if value.is_finite() {
        value
    } else {
        log::warn!("[params] {name} is not finite; using {fallback}");
        fallback
    }
}

fn at_least(value: f32, min: f32, name: &str) -> f32 {
    if value < min {
        log::warn!("[params] {name}={value} below minimum; clamped to {min}");
        min
    } else {
        value
    }
}

fn count_in(value: u32, max: u32, name: &str) -> u32 {
    let clamped = value.clamp(1, max);
    if clamped != value {
        log::warn!("[params] {name}={value} out of range; clamped to {clamped}");
    }
    clamped
}

fn color_or(value: Color, fallback: Color, name: &str) -> Color {
    if value.is_finite() {
        value
    } else {
        log::warn!("[params] {name} is not finite; using {fallback}");
        fallback
    }
}

impl ParameterSet {
    /// Total length of the ring track along the depth axis.
    pub fn ring_track_length(&self) -> f32 {
        self.ring_count as f32 * self.ring_spacing
    }

    /// Total length of the shape field along the depth axis.
    pub fn shape_track_length(&self) -> f32 {
        self.depth_segments as f32 * self.inner_depth_spacing
    }

    pub fn shape_instance_count(&self) -> usize {
        self.depth_segments as usize * self.shapes_per_ring as usize
    }

    /// Copy of `self` with every field forced into its valid range.
    ///
    /// Counts are clamped to `[1, MAX]`, spacings and radius to a small
    /// positive minimum, non-finite floats fall back to the defaults and the
    /// fog range is kept strictly increasing.
    pub fn sanitized(&self) -> ParameterSet {
        let d = ParameterSet::default();
        let mut p = self.clone();

        p.color1 = color_or(p.color1, d.color1, "color1");
        p.color2 = color_or(p.color2, d.color2, "color2");
        p.background = color_or(p.background, d.background, "background");
        p.glow.color = color_or(p.glow.color, d.glow.color, "glow_color");

        p.ring_count = count_in(p.ring_count, MAX_RING_COUNT, "ring_count");
        p.shapes_per_ring = count_in(p.shapes_per_ring, MAX_SHAPES_PER_RING, "shapes_per_ring");
        p.depth_segments = count_in(p.depth_segments, MAX_DEPTH_SEGMENTS, "depth_segments");

        p.ring_spacing = at_least(
            finite_or(p.ring_spacing, d.ring_spacing, "ring_spacing"),
            MIN_SPACING,
            "ring_spacing",
        );
        p.inner_depth_spacing = at_least(
            finite_or(p.inner_depth_spacing, d.inner_depth_spacing, "inner_depth_spacing"),
            MIN_SPACING,
            "inner_depth_spacing",
        );
        p.inner_radius = at_least(
            finite_or(p.inner_radius, d.inner_radius, "inner_radius"),
            MIN_RADIUS,
            "inner_radius",
        );

        p.ring_rotation_speed =
            finite_or(p.ring_rotation_speed, d.ring_rotation_speed, "ring_rotation_speed");
        p.ring_shininess = finite_or(p.ring_shininess, d.ring_shininess, "ring_shininess").max(0.0);
        p.camera_advance_speed =
            finite_or(p.camera_advance_speed, d.camera_advance_speed, "camera_advance_speed");
        p.spiral_rotation_per_segment = finite_or(
            p.spiral_rotation_per_segment,
            d.spiral_rotation_per_segment,
            "spiral_rotation_per_segment",
        );
        p.angular_speed_scale =
            finite_or(p.angular_speed_scale, d.angular_speed_scale, "angular_speed_scale");
        p.glow.intensity = finite_or(p.glow.intensity, d.glow.intensity, "glow_intensity").max(0.0);
        p.glow.size = finite_or(p.glow.size, d.glow.size, "glow_size").max(0.0);

        p.fog_near = finite_or(p.fog_near, d.fog_near, "fog_near").max(0.0);
        p.fog_far = finite_or(p.fog_far, d.fog_far, "fog_far");
        if p.fog_far < p.fog_near + MIN_FOG_GAP {
            log::warn!(
                "[params] fog_far={} not beyond fog_near={}; pushed out",
                p.fog_far,
                p.fog_near
            );
            p.fog_far = p.fog_near + MIN_FOG_GAP;
        }
        p
    }

    /// Classify the change from `self` to `next`.
    pub fn rebuild_scope(&self, next: &ParameterSet) -> RebuildScope {
        let rings = self.ring_count != next.ring_count || self.ring_spacing != next.ring_spacing;
        let shapes = self.shape_kind != next.shape_kind
            || self.depth_segments != next.depth_segments
            || self.shapes_per_ring != next.shapes_per_ring
            || self.inner_radius != next.inner_radius
            || self.inner_depth_spacing != next.inner_depth_spacing
            || self.spiral_rotation_per_segment != next.spiral_rotation_per_segment
            || self.angular_speed_scale != next.angular_speed_scale;
        RebuildScope { rings, shapes }
    }
}
