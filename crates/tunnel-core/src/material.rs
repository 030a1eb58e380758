//! Per-instance material assignment.
//!
//! Ring colors are recomputed every tick by the track itself; this module
//! decides the remaining material inputs. Shapes keep the random hue they were
//! created with, and when glow is enabled every shape receives the same
//! emissive color and intensity from the glow parameters.

use crate::color::Color;
use crate::constants::SHAPE_SHININESS;
use crate::params::{GlowParams, ParameterSet};
use crate::rings::RingInstance;
use crate::shapes::ShapeInstance;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Emissive {
    pub color: Color,
    pub intensity: f32,
}

impl Emissive {
    pub const NONE: Emissive = Emissive {
        color: Color::BLACK,
        intensity: 0.0,
    };

    pub fn to_array(self) -> [f32; 4] {
        [self.color.r, self.color.g, self.color.b, self.intensity]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub base: Color,
    pub emissive: Emissive,
    pub shininess: f32,
}

/// Emissive shared by every shape; `NONE` while glow is disabled.
pub fn shape_emissive(glow: &GlowParams) -> Emissive {
    if glow.enabled {
        Emissive {
            color: glow.color,
            intensity: glow.intensity,
        }
    } else {
        Emissive::NONE
    }
}

pub fn ring_material(ring: &RingInstance, params: &ParameterSet) -> Material {
    Material {
        base: ring.color,
        emissive: Emissive::NONE,
        shininess: params.ring_shininess,
    }
}

pub fn shape_material(shape: &ShapeInstance, emissive: Emissive) -> Material {
    Material {
        base: shape.color,
        emissive,
        shininess: SHAPE_SHININESS,
    }
}
