//! Tweak panel model: a pure producer of parameter edits.
//!
//! The panel never touches engine state. It reads the current
//! [`ParameterSet`], turns a user gesture into a [`ParamEdit`], and the caller
//! applies the edit to obtain the next snapshot for
//! [`TunnelEngine::apply_params`](crate::engine::TunnelEngine::apply_params).

use crate::color::{hex_or_black, Color};
use crate::params::{ParameterSet, ShapeKind};
use std::fmt;
use thiserror::Error;

/// Every field the panel can edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Color1,
    Color2,
    RingCount,
    RingSpacing,
    RingRotationSpeed,
    CameraSpeed,
    RingShininess,
    Shape,
    Wireframe,
    ShapesPerRing,
    DepthSegments,
    InnerRadius,
    InnerDepthSpacing,
    SpiralRotation,
    AngularSpeedScale,
    GlowEnabled,
    GlowColor,
    GlowIntensity,
    GlowSize,
    Background,
    FogNear,
    FogFar,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueKind {
    Number { min: f32, max: f32, step: f32 },
    Color,
    Shape,
    Flag,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Color(Color),
    Shape(ShapeKind),
    Flag(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v:.3}"),
            ParamValue::Color(c) => write!(f, "{c}"),
            ParamValue::Shape(s) => write!(f, "{s}"),
            ParamValue::Flag(b) => write!(f, "{}", if *b { "on" } else { "off" }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("{param:?} does not accept {value:?}")]
    WrongKind { param: Param, value: ParamValue },
}

/// Colors offered when cycling a color parameter.
pub const PALETTE: [&str; 10] = [
    "#ff00ff", "#00ffe1", "#ff0066", "#00ffff", "#ff66ff", "#ff66cc", "#00aaff", "#ffffff",
    "#0b0014", "#000000",
];

impl Param {
    /// Panel order: outer rings, inner shapes, environment.
    pub const ALL: [Param; 22] = [
        Param::Color1,
        Param::Color2,
        Param::RingCount,
        Param::RingSpacing,
        Param::RingRotationSpeed,
        Param::CameraSpeed,
        Param::RingShininess,
        Param::Shape,
        Param::Wireframe,
        Param::ShapesPerRing,
        Param::DepthSegments,
        Param::InnerRadius,
        Param::InnerDepthSpacing,
        Param::SpiralRotation,
        Param::AngularSpeedScale,
        Param::GlowEnabled,
        Param::GlowColor,
        Param::GlowIntensity,
        Param::GlowSize,
        Param::Background,
        Param::FogNear,
        Param::FogFar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Param::Color1 => "Color 1",
            Param::Color2 => "Color 2",
            Param::RingCount => "Ring Count",
            Param::RingSpacing => "Spacing",
            Param::RingRotationSpeed => "Ring Rot Speed",
            Param::CameraSpeed => "Camera Speed",
            Param::RingShininess => "Shininess",
            Param::Shape => "Shape",
            Param::Wireframe => "Wireframe",
            Param::ShapesPerRing => "Per Ring",
            Param::DepthSegments => "Z Segments",
            Param::InnerRadius => "Radius",
            Param::InnerDepthSpacing => "Z Spacing",
            Param::SpiralRotation => "Spiral Rot",
            Param::AngularSpeedScale => "Speed Scale",
            Param::GlowEnabled => "Glow Enabled",
            Param::GlowColor => "Glow Color",
            Param::GlowIntensity => "Glow Intensity",
            Param::GlowSize => "Glow Size",
            Param::Background => "BG Color",
            Param::FogNear => "Fog Near",
            Param::FogFar => "Fog Far",
        }
    }

    pub fn kind(self) -> ValueKind {
        let num = |min, max, step| ValueKind::Number { min, max, step };
        match self {
            Param::Color1 | Param::Color2 | Param::GlowColor | Param::Background => ValueKind::Color,
            Param::Shape => ValueKind::Shape,
            Param::Wireframe | Param::GlowEnabled => ValueKind::Flag,
            Param::RingCount => num(10.0, 200.0, 1.0),
            Param::RingSpacing => num(0.5, 5.0, 0.1),
            Param::RingRotationSpeed => num(0.0, 0.2, 0.001),
            Param::CameraSpeed => num(0.0, 1.0, 0.01),
            Param::RingShininess => num(0.0, 200.0, 1.0),
            Param::ShapesPerRing => num(4.0, 24.0, 1.0),
            Param::DepthSegments => num(10.0, 200.0, 1.0),
            Param::InnerRadius => num(1.0, 10.0, 0.1),
            Param::InnerDepthSpacing => num(0.2, 3.0, 0.1),
            Param::SpiralRotation => num(0.0, 1.0, 0.01),
            Param::AngularSpeedScale => num(0.0, 3.0, 0.01),
            Param::GlowIntensity => num(6.0, 12.0, 0.1),
            Param::GlowSize => num(3.2, 8.0, 0.05),
            Param::FogNear => num(0.1, 20.0, 0.1),
            Param::FogFar => num(10.0, 200.0, 1.0),
        }
    }

    /// Whether editing this field forces a pool rebuild.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Param::RingCount
                | Param::RingSpacing
                | Param::Shape
                | Param::ShapesPerRing
                | Param::DepthSegments
                | Param::InnerRadius
                | Param::InnerDepthSpacing
                | Param::SpiralRotation
                | Param::AngularSpeedScale
        )
    }

    pub fn value(self, p: &ParameterSet) -> ParamValue {
        use ParamValue as V;
        match self {
            Param::Color1 => V::Color(p.color1),
            Param::Color2 => V::Color(p.color2),
            Param::RingCount => V::Number(p.ring_count as f32),
            Param::RingSpacing => V::Number(p.ring_spacing),
            Param::RingRotationSpeed => V::Number(p.ring_rotation_speed),
            Param::CameraSpeed => V::Number(p.camera_advance_speed),
            Param::RingShininess => V::Number(p.ring_shininess),
            Param::Shape => V::Shape(p.shape_kind),
            Param::Wireframe => V::Flag(p.wireframe),
            Param::ShapesPerRing => V::Number(p.shapes_per_ring as f32),
            Param::DepthSegments => V::Number(p.depth_segments as f32),
            Param::InnerRadius => V::Number(p.inner_radius),
            Param::InnerDepthSpacing => V::Number(p.inner_depth_spacing),
            Param::SpiralRotation => V::Number(p.spiral_rotation_per_segment),
            Param::AngularSpeedScale => V::Number(p.angular_speed_scale),
            Param::GlowEnabled => V::Flag(p.glow.enabled),
            Param::GlowColor => V::Color(p.glow.color),
            Param::GlowIntensity => V::Number(p.glow.intensity),
            Param::GlowSize => V::Number(p.glow.size),
            Param::Background => V::Color(p.background),
            Param::FogNear => V::Number(p.fog_near),
            Param::FogFar => V::Number(p.fog_far),
        }
    }
}

/// A single-field change produced by the panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamEdit {
    pub param: Param,
    pub value: ParamValue,
}

fn count_from(v: f32) -> u32 {
    if v.is_finite() {
        v.round().max(0.0) as u32
    } else {
        0
    }
}

impl ParamEdit {
    pub fn new(param: Param, value: ParamValue) -> Self {
        Self { param, value }
    }

    /// Produce the snapshot that results from this edit. The result is not
    /// sanitized; the engine does that when it consumes it.
    pub fn apply(&self, current: &ParameterSet) -> Result<ParameterSet, EditError> {
        let mut p = current.clone();
        let wrong = || EditError::WrongKind {
            param: self.param,
            value: self.value,
        };
        match (self.param, self.value) {
            (Param::Color1, ParamValue::Color(c)) => p.color1 = c,
            (Param::Color2, ParamValue::Color(c)) => p.color2 = c,
            (Param::GlowColor, ParamValue::Color(c)) => p.glow.color = c,
            (Param::Background, ParamValue::Color(c)) => p.background = c,
            (Param::Shape, ParamValue::Shape(s)) => p.shape_kind = s,
            (Param::Wireframe, ParamValue::Flag(b)) => p.wireframe = b,
            (Param::GlowEnabled, ParamValue::Flag(b)) => p.glow.enabled = b,
            (Param::RingCount, ParamValue::Number(v)) => p.ring_count = count_from(v),
            (Param::ShapesPerRing, ParamValue::Number(v)) => p.shapes_per_ring = count_from(v),
            (Param::DepthSegments, ParamValue::Number(v)) => p.depth_segments = count_from(v),
            (Param::RingSpacing, ParamValue::Number(v)) => p.ring_spacing = v,
            (Param::RingRotationSpeed, ParamValue::Number(v)) => p.ring_rotation_speed = v,
            (Param::CameraSpeed, ParamValue::Number(v)) => p.camera_advance_speed = v,
            (Param::RingShininess, ParamValue::Number(v)) => p.ring_shininess = v,
            (Param::InnerRadius, ParamValue::Number(v)) => p.inner_radius = v,
            (Param::InnerDepthSpacing, ParamValue::Number(v)) => p.inner_depth_spacing = v,
            (Param::SpiralRotation, ParamValue::Number(v)) => p.spiral_rotation_per_segment = v,
            (Param::AngularSpeedScale, ParamValue::Number(v)) => p.angular_speed_scale = v,
            (Param::GlowIntensity, ParamValue::Number(v)) => p.glow.intensity = v,
            (Param::GlowSize, ParamValue::Number(v)) => p.glow.size = v,
            (Param::FogNear, ParamValue::Number(v)) => p.fog_near = v,
            (Param::FogFar, ParamValue::Number(v)) => p.fog_far = v,
            _ => return Err(wrong()),
        }
        Ok(p)
    }
}

fn next_palette_color(current: Color, steps: i32) -> Color {
    let hex = current.to_hex();
    let len = PALETTE.len() as i32;
    let idx = PALETTE.iter().position(|c| *c == hex).map(|i| i as i32);
    let next = match idx {
        Some(i) => (i + steps).rem_euclid(len),
        None => 0,
    };
    hex_or_black(PALETTE[next as usize])
}

/// Selection cursor over [`Param::ALL`].
#[derive(Clone, Debug, Default)]
pub struct TweakPanel {
    selected: usize,
}

impl TweakPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Param {
        Param::ALL[self.selected % Param::ALL.len()]
    }

    pub fn select(&mut self, param: Param) {
        if let Some(i) = Param::ALL.iter().position(|p| *p == param) {
            self.selected = i;
        }
    }

    pub fn select_next(&mut self) -> Param {
        self.selected = (self.selected + 1) % Param::ALL.len();
        self.selected()
    }

    pub fn select_prev(&mut self) -> Param {
        self.selected = (self.selected + Param::ALL.len() - 1) % Param::ALL.len();
        self.selected()
    }

    /// Move the selected field by `steps` increments. Numbers step within
    /// their range, colors walk the palette, shapes cycle, flags toggle.
    pub fn nudge(&self, current: &ParameterSet, steps: i32) -> ParamEdit {
        nudge(self.selected(), current, steps)
    }

    /// `"Ring Count: 50.000"` for the selected field.
    pub fn describe(&self, current: &ParameterSet) -> String {
        let p = self.selected();
        format!("{}: {}", p.label(), p.value(current))
    }
}

/// Edit that moves `param` by `steps` increments from its current value.
pub fn nudge(param: Param, current: &ParameterSet, steps: i32) -> ParamEdit {
    let value = match (param.kind(), param.value(current)) {
        (ValueKind::Number { min, max, step }, ParamValue::Number(v)) => {
            let target = ((v + steps as f32 * step) / step).round() * step;
            ParamValue::Number(target.clamp(min, max))
        }
        (_, ParamValue::Color(c)) => ParamValue::Color(next_palette_color(c, steps)),
        (_, ParamValue::Shape(s)) => {
            let mut s = s;
            for _ in 0..steps.rem_euclid(ShapeKind::ALL.len() as i32) {
                s = s.next();
            }
            ParamValue::Shape(s)
        }
        (_, ParamValue::Flag(b)) => ParamValue::Flag(if steps % 2 == 0 { b } else { !b }),
        (_, other) => other,
    };
    ParamEdit::new(param, value)
}

/// Edit that flips a boolean field; `None` for non-flag fields.
pub fn toggle(param: Param, current: &ParameterSet) -> Option<ParamEdit> {
    match param.value(current) {
        ParamValue::Flag(b) => Some(ParamEdit::new(param, ParamValue::Flag(!b))),
        _ => None,
    }
}
