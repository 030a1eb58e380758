use crate::capture::{align_to, bgra_to_rgba, copy_tight_rows, CaptureError, CapturedFrame};
use std::sync::mpsc;
use tunnel_core::{FrameOutput, InstanceRaw, MeshData, SceneUniforms, ShapeKind, Vertex};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Readback buffers that may be mapping at once; a capture request finding
/// them all busy is skipped rather than waited on.
const READBACK_SLOTS: usize = 2;

const VERTEX_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
const INSTANCE_ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4, // model columns
    6 => Float32x4, // color + shininess
    7 => Float32x4  // emissive + intensity
];

/// Triangle and edge index buffers for one mesh.
struct GpuMesh {
    vertices: wgpu::Buffer,
    triangles: wgpu::Buffer,
    index_count: u32,
    edges: wgpu::Buffer,
    edge_index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let edges = mesh.edge_indices();
        Self {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_vb")),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            triangles: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_ib")),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: mesh.indices.len() as u32,
            edges: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_edges")),
                contents: bytemuck::cast_slice(&edges),
                usage: wgpu::BufferUsages::INDEX,
            }),
            edge_index_count: edges.len() as u32,
        }
    }
}

/// Instance buffer that grows to the largest pool it has seen.
struct InstanceBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: usize,
    len: u32,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            label,
            buffer: Self::allocate(device, label, capacity),
            capacity,
            len: 0,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (std::mem::size_of::<InstanceRaw>() * capacity) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[InstanceRaw]) {
        if data.len() > self.capacity {
            self.capacity = data.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
            log::info!("[gpu] {} grown to {} instances", self.label, self.capacity);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len() as u32;
    }
}

type MapResult = Result<(), wgpu::BufferAsyncError>;

/// One copy target for a captured frame. The frame is copied in on the
/// render pass, mapped asynchronously, and collected on a later frame.
struct Readback {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    mapping: Option<mpsc::Receiver<MapResult>>,
    /// Request order, so frames collected together stay in sequence.
    sequence: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotPick {
    Reuse(usize),
    Allocate,
    Busy,
}

/// Choose a readback slot for a new capture: the first idle one, else a new
/// one while under `limit`.
fn pick_slot(busy: impl IntoIterator<Item = bool>, limit: usize) -> SlotPick {
    let mut count = 0;
    for (i, busy) in busy.into_iter().enumerate() {
        if !busy {
            return SlotPick::Reuse(i);
        }
        count += 1;
    }
    if count < limit {
        SlotPick::Allocate
    } else {
        SlotPick::Busy
    }
}

impl Readback {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let unpadded_bytes_per_row = width * 4;
        let padded_bytes_per_row =
            align_to(unpadded_bytes_per_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            width,
            height,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
            mapping: None,
            sequence: 0,
        }
    }

    fn is_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    /// Request the map; the copy into `buffer` must already be submitted.
    fn begin_map(&mut self, sequence: u64) {
        let (sender, receiver) = mpsc::channel();
        self.buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
        self.mapping = Some(receiver);
        self.sequence = sequence;
    }

    /// The captured frame once its map has completed, `None` while pending.
    fn take_mapped(&mut self, bgra: bool) -> Result<Option<CapturedFrame>, CaptureError> {
        let Some(receiver) = &self.mapping else {
            return Ok(None);
        };
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => {
                self.mapping = None;
                return Err(CaptureError::Map("map callback dropped".into()));
            }
        };
        self.mapping = None;
        result.map_err(|e| CaptureError::Map(e.to_string()))?;

        let slice = self.buffer.slice(..);
        let mapped = slice.get_mapped_range();
        let tight = copy_tight_rows(
            &mapped,
            self.unpadded_bytes_per_row,
            self.padded_bytes_per_row,
            self.height,
        );
        drop(mapped);
        self.buffer.unmap();

        let mut pixels = tight?;
        if bgra {
            bgra_to_rgba(&mut pixels);
        }
        CapturedFrame::new(self.width, self.height, pixels).map(Some)
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn make_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    fs_entry: &str,
) -> wgpu::RenderPipeline {
    let buffers = [
        // slot 0: mesh vertices
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRS,
        },
        // slot 1: per-instance transform and material
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRS,
        },
    ];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fs_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

pub struct GpuState<'w> {
    pub window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    solid_pipeline: wgpu::RenderPipeline,
    wire_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    ring_mesh: GpuMesh,
    shape_mesh: GpuMesh,
    shape_kind: ShapeKind,
    ring_instances: InstanceBuffer,
    shape_instances: InstanceBuffer,
    readbacks: Vec<Readback>,
    readback_sequence: u64,
    readback_supported: bool,
}

impl<'w> GpuState<'w> {
    pub async fn new(
        window: &'w winit::window::Window,
        initial: &FrameOutput,
        shape_kind: ShapeKind,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // hex colors are authored for a non-sRGB target
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let readback_supported = surface_caps.usages.contains(wgpu::TextureUsages::COPY_SRC)
            && matches!(
                format.remove_srgb_suffix(),
                wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Rgba8Unorm
            );
        let usage = if readback_supported {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        log::info!(
            "[gpu] adapter={} format={format:?} readback={readback_supported}",
            adapter.get_info().name
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tunnel"),
            source: wgpu::ShaderSource::Wgsl(tunnel_core::TUNNEL_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tunnel_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let solid_pipeline = make_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::TriangleList,
            "fs_main",
        );
        let wire_pipeline = make_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::LineList,
            "fs_wire",
        );

        let ring_mesh = GpuMesh::upload(&device, "ring", &MeshData::ring());
        let shape_mesh = GpuMesh::upload(&device, shape_kind.name(), &MeshData::for_shape(shape_kind));
        let ring_instances = InstanceBuffer::new(&device, "ring_instances", initial.rings.len());
        let shape_instances = InstanceBuffer::new(&device, "shape_instances", initial.shapes.len());
        let depth_view = create_depth_view(&device, config.width, config.height);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            solid_pipeline,
            wire_pipeline,
            uniform_buffer,
            bind_group,
            depth_view,
            ring_mesh,
            shape_mesh,
            shape_kind,
            ring_instances,
            shape_instances,
            readbacks: Vec::new(),
            readback_sequence: 0,
            readback_supported,
        })
    }

    pub fn readback_supported(&self) -> bool {
        self.readback_supported
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
        if self.readbacks.iter().any(Readback::is_mapping) {
            log::debug!("[capture] resize discarded in-flight readbacks");
        }
        self.readbacks.clear();
    }

    /// Swap the shape mesh when the engine switched kinds.
    pub fn set_shape_kind(&mut self, kind: ShapeKind) {
        if kind == self.shape_kind {
            return;
        }
        self.shape_mesh = GpuMesh::upload(&self.device, kind.name(), &MeshData::for_shape(kind));
        self.shape_kind = kind;
        log::info!("[gpu] shape mesh switched to {kind}");
    }

    /// Draw `frame`. With `capture` set and readback supported, the presented
    /// image is also copied into a free readback slot; the pixels come back
    /// from a later [`GpuState::poll_readbacks`]. Returns whether a copy was
    /// queued.
    pub fn render(&mut self, frame: &FrameOutput, capture: bool) -> Result<bool, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&frame.scene));
        self.ring_instances
            .write(&self.device, &self.queue, &frame.rings);
        self.shape_instances
            .write(&self.device, &self.queue, &frame.shapes);

        let [r, g, b, _] = frame.scene.fog_color;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tunnel_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_bind_group(0, &self.bind_group, &[]);

            // rings are always solid; wireframe only applies to the shape field
            rpass.set_pipeline(&self.solid_pipeline);
            draw_mesh(&mut rpass, &self.ring_mesh, &self.ring_instances, false);
            if frame.wireframe {
                rpass.set_pipeline(&self.wire_pipeline);
            }
            draw_mesh(&mut rpass, &self.shape_mesh, &self.shape_instances, frame.wireframe);
        }

        let (width, height) = (self.config.width, self.config.height);
        let slot = if capture && self.readback_supported {
            match pick_slot(self.readbacks.iter().map(Readback::is_mapping), READBACK_SLOTS) {
                SlotPick::Reuse(i) => Some(i),
                SlotPick::Allocate => {
                    self.readbacks.push(Readback::new(&self.device, width, height));
                    Some(self.readbacks.len() - 1)
                }
                SlotPick::Busy => {
                    log::debug!("[capture] all readback slots busy; frame skipped");
                    None
                }
            }
        } else {
            None
        };
        if let Some(rb) = slot.and_then(|i| self.readbacks.get(i)) {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture: &surface_texture.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &rb.buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(rb.padded_bytes_per_row),
                        rows_per_image: Some(rb.height),
                    },
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        self.queue.submit(Some(encoder.finish()));
        surface_texture.present();

        let sequence = self.readback_sequence;
        match slot.and_then(|i| self.readbacks.get_mut(i)) {
            Some(rb) => {
                rb.begin_map(sequence);
                self.readback_sequence += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Collect readbacks whose map has completed, oldest first. Without
    /// `wait` this only polls the device and never blocks; `wait` is for
    /// stopping a capture, where the last frames in flight must be kept.
    pub fn poll_readbacks(&mut self, wait: bool) -> Vec<CapturedFrame> {
        if !self.readbacks.iter().any(Readback::is_mapping) {
            return Vec::new();
        }
        let maintain = if wait {
            wgpu::Maintain::Wait
        } else {
            wgpu::Maintain::Poll
        };
        let _ = self.device.poll(maintain);

        let bgra = self.config.format.remove_srgb_suffix() == wgpu::TextureFormat::Bgra8Unorm;
        let mut ready = Vec::new();
        for rb in &mut self.readbacks {
            let sequence = rb.sequence;
            match rb.take_mapped(bgra) {
                Ok(Some(frame)) => ready.push((sequence, frame)),
                Ok(None) => {}
                Err(err) => log::warn!("[capture] readback failed: {err}"),
            }
        }
        ready.sort_by_key(|(sequence, _)| *sequence);
        ready.into_iter().map(|(_, frame)| frame).collect()
    }
}

fn draw_mesh(
    rpass: &mut wgpu::RenderPass<'_>,
    mesh: &GpuMesh,
    instances: &InstanceBuffer,
    edges: bool,
) {
    if instances.len == 0 {
        return;
    }
    rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
    rpass.set_vertex_buffer(1, instances.buffer.slice(..));
    if edges {
        rpass.set_index_buffer(mesh.edges.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..mesh.edge_index_count, 0, 0..instances.len);
    } else {
        rpass.set_index_buffer(mesh.triangles.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..mesh.index_count, 0, 0..instances.len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_slots_are_reused_first() {
        assert_eq!(pick_slot([true, false], 2), SlotPick::Reuse(1));
        assert_eq!(pick_slot([false, true], 2), SlotPick::Reuse(0));
    }

    #[test]
    fn new_slots_are_allocated_up_to_the_limit() {
        assert_eq!(pick_slot(Vec::<bool>::new(), 2), SlotPick::Allocate);
        assert_eq!(pick_slot([true], 2), SlotPick::Allocate);
    }

    #[test]
    fn busy_slots_skip_the_capture_instead_of_waiting() {
        assert_eq!(pick_slot([true, true], READBACK_SLOTS), SlotPick::Busy);
    }
}
