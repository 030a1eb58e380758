//! Per-frame renderer input built from the engine state.
//!
//! The buffers are owned by [`FrameOutput`] and refilled in place each frame so
//! the renderer can upload them with `bytemuck::cast_slice` without further
//! conversion.
//!
//! Everything is emitted relative to the camera: the eye sits at the origin
//! and each instance is placed at its `f64` depth minus the camera depth, so
//! only small offsets are ever narrowed to `f32`.

use crate::camera::Camera;
use crate::constants::{AMBIENT_INTENSITY, HEADLIGHT_INTENSITY, HEADLIGHT_OFFSET};
use crate::engine::TunnelEngine;
use crate::material::{ring_material, shape_emissive, shape_material, Material};
use glam::{Mat4, Quat, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    /// rgb base color, shininess in `w`.
    pub color: [f32; 4],
    /// rgb emissive color, intensity in `w`.
    pub emissive: [f32; 4],
}

impl InstanceRaw {
    pub fn new(model: Mat4, material: Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: material.base.to_vec4(material.shininess).to_array(),
            emissive: material.emissive.to_array(),
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz eye position, w unused.
    pub eye: [f32; 4],
    /// xyz light position, w intensity.
    pub light: [f32; 4],
    /// rgb fog/background color, w ambient intensity.
    pub fog_color: [f32; 4],
    /// x fog near, y fog far, z glow size, w unused.
    pub fog_glow: [f32; 4],
}

#[derive(Debug, Default)]
pub struct FrameOutput {
    pub rings: Vec<InstanceRaw>,
    pub shapes: Vec<InstanceRaw>,
    pub scene: SceneUniforms,
    pub wireframe: bool,
}

impl FrameOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refill all buffers from `engine`. Window aspect only affects the
    /// projection, never the pools.
    pub fn update(&mut self, engine: &TunnelEngine, aspect: f32) {
        let params = engine.params();
        let camera_depth = engine.camera().depth();
        let relative = |depth: f64| (depth - camera_depth) as f32;

        self.rings.clear();
        self.rings.extend(engine.rings().rings().iter().map(|ring| {
            let model = Mat4::from_rotation_translation(
                Quat::from_rotation_z(ring.rotation),
                Vec3::new(0.0, 0.0, relative(ring.depth)),
            );
            InstanceRaw::new(model, ring_material(ring, params))
        }));

        let emissive = shape_emissive(&params.glow);
        self.shapes.clear();
        self.shapes.extend(engine.shapes().shapes().iter().map(|shape| {
            let rotation = Quat::from_euler(
                glam::EulerRot::XYZ,
                shape.self_rotation.x,
                shape.self_rotation.y,
                0.0,
            );
            let translation = shape.position.extend(relative(shape.depth));
            let model = Mat4::from_rotation_translation(rotation, translation);
            InstanceRaw::new(model, shape_material(shape, emissive))
        }));

        let camera = Camera::looking_down_tunnel(0.0, aspect);
        let light = camera.eye + Vec3::Z * HEADLIGHT_OFFSET;
        self.scene = SceneUniforms {
            view_proj: camera.view_proj().to_cols_array_2d(),
            eye: camera.eye.extend(1.0).to_array(),
            light: light.extend(HEADLIGHT_INTENSITY).to_array(),
            fog_color: params.background.to_vec4(AMBIENT_INTENSITY).to_array(),
            fog_glow: [params.fog_near, params.fog_far, params.glow.size, 0.0],
        };
        self.wireframe = params.wireframe;
    }
}
