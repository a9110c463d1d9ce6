use std::collections::HashMap;

use wgpu::*;

use crate::model::{Camera, Lighting, Shape};
use crate::utils::{self, Mesh, MeshBuffer, Vertex};
use super::batch::{InstanceRaw, MeshKind, SceneBatches};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Near-black night sky behind the grid.
const CLEAR_COLOR: Color = Color { r: 0.0, g: 0.0, b: 0.02, a: 1.0 };

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            eye: camera.eye.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub ambient: [f32; 4],
    /// xyz position, w range.
    pub point_position: [f32; 4],
    /// rgb colour, w intensity.
    pub point_color: [f32; 4],
}

impl From<&Lighting> for LightingUniform {
    fn from(light: &Lighting) -> Self {
        let [r, g, b] = light.point_color;
        let [ar, ag, ab] = light.ambient;
        Self {
            ambient: [ar, ag, ab, 1.0],
            point_position: light.point_position.extend(light.point_range).to_array(),
            point_color: [r, g, b, light.point_intensity],
        }
    }
}

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub struct PipelineResources {
    pub line_pipeline: wgpu::RenderPipeline,
    pub fill_pipeline: wgpu::RenderPipeline,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

/// Line pipeline for the grid and wireframes, fill pipeline for flat-shaded
/// bodies. Wireframes are drawn from edge index buffers, so no
/// `POLYGON_MODE_LINE` feature is needed on WebGPU.
pub fn create_scene_pipelines(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> PipelineResources {
    let shader_src = include_str!("shaders/scene.wgsl");
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(shader_src.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let make = |label: &str, topology: wgpu::PrimitiveTopology, fs_entry: &str| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VERTEX_LAYOUT, InstanceRaw::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fs_entry),
                targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
            cache: None,
        })
    };

    PipelineResources {
        line_pipeline: make("line_pipeline", wgpu::PrimitiveTopology::LineList, "fs_line"),
        fill_pipeline: make("fill_pipeline", wgpu::PrimitiveTopology::TriangleList, "fs_flat"),
    }
}

/// GPU copies of every mesh the scene draws, as edges and as triangles.
pub struct SceneMeshes {
    lines: HashMap<MeshKind, MeshBuffer>,
    fills: HashMap<MeshKind, MeshBuffer>,
}

impl SceneMeshes {
    pub fn new(device: &Device, grid_size: f32, grid_divisions: u32) -> Self {
        let mut solids: Vec<(MeshKind, Mesh)> = Shape::ALL
            .iter()
            .map(|&shape| (MeshKind::from(shape), utils::shape_mesh(shape)))
            .collect();
        solids.push((MeshKind::Gem, utils::create_octahedron_mesh()));

        let mut lines = HashMap::new();
        let mut fills = HashMap::new();
        lines.insert(MeshKind::Grid, utils::create_grid_mesh(grid_size, grid_divisions).upload(device));
        for (kind, mesh) in solids {
            lines.insert(kind, mesh.wire_edges().upload(device));
            fills.insert(kind, mesh.upload(device));
        }
        Self { lines, fills }
    }
}

/// Grow-only instance buffer rewritten every frame.
pub struct InstanceBuffer {
    buffer: Buffer,
    capacity: usize,
}

impl InstanceBuffer {
    pub fn new(device: &Device, capacity: usize) -> Self {
        Self { buffer: Self::allocate(device, capacity), capacity }
    }

    fn allocate(device: &Device, capacity: usize) -> Buffer {
        device.create_buffer(&BufferDescriptor {
            label: Some("instance_buffer"),
            size: (capacity.max(1) * std::mem::size_of::<InstanceRaw>()) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Upload lines then fills back to back.
    fn write(&mut self, device: &Device, queue: &Queue, batches: &SceneBatches) {
        let needed = batches.instance_count();
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.capacity);
            tracing::debug!(capacity = self.capacity, "instance buffer grown");
        }
        let data: Vec<InstanceRaw> = batches
            .lines
            .iter()
            .chain(batches.fills.iter())
            .flat_map(|b| b.instances.iter().copied())
            .collect();
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&data));
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Consolidated render state to avoid parameter explosion
pub struct RenderState {
    // wgpu resources
    pub format: TextureFormat,
    pub alpha_mode: CompositeAlphaMode,
    pub width: u32,
    pub height: u32,
    pub camera: CameraResources,
    pub depth_view: TextureView,

    // Pipelines
    pub pipelines: PipelineResources,

    // Meshes
    pub meshes: SceneMeshes,
    pub instances: InstanceBuffer,

    // UI
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_full_output: Option<egui::FullOutput>,
    pub egui_dpr: f32,
}

impl RenderState {
    pub fn new(device: &Device, surface: &SurfaceConfiguration, grid_size: f32, grid_divisions: u32) -> Self {
        let camera = create_camera_resources(device);
        let pipelines = create_scene_pipelines(device, surface.format, &camera.bind_group_layout);
        let (_, depth_view) = create_depth_texture(device, surface.width, surface.height);
        Self {
            format: surface.format,
            alpha_mode: surface.alpha_mode,
            width: surface.width.max(1),
            height: surface.height.max(1),
            camera,
            depth_view,
            pipelines,
            meshes: SceneMeshes::new(device, grid_size, grid_divisions),
            instances: InstanceBuffer::new(device, 64),
            egui_renderer: egui_wgpu::Renderer::new(device, surface.format, egui_wgpu::RendererOptions::default()),
            egui_primitives: None,
            egui_full_output: None,
            egui_dpr: 1.0,
        }
    }

    fn surface_config(&self) -> SurfaceConfiguration {
        SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width: self.width,
            height: self.height,
            present_mode: PresentMode::Fifo,
            alpha_mode: self.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    /// Reconfigure the surface and depth buffer for a new size.
    pub fn resize(&mut self, device: &Device, surface: &Surface, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        surface.configure(device, &self.surface_config());
        self.depth_view = create_depth_texture(device, self.width, self.height).1;
    }

    pub fn write_uniforms(&self, queue: &Queue, camera: &Camera, lighting: &Lighting) {
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::from_camera(camera)));
        queue.write_buffer(&self.camera.lighting_buffer, 0, bytemuck::bytes_of(&LightingUniform::from(lighting)));
    }

    /// Tessellate a finished egui frame and keep it for the next draw.
    pub fn set_ui(&mut self, ctx: &egui::Context, mut full_output: egui::FullOutput, dpr: f32) {
        let primitives = ctx.tessellate(std::mem::take(&mut full_output.shapes), dpr);
        self.egui_primitives = Some(primitives);
        self.egui_full_output = Some(full_output);
        self.egui_dpr = dpr;
    }

    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
        batches: &SceneBatches,
    ) {
        let (egui_primitives, egui_full_output) = match (self.egui_primitives.take(), self.egui_full_output.take()) {
            (Some(prim), Some(output)) => (prim, output),
            _ => return, // No UI to render
        };

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point: self.egui_dpr,
        };

        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                surface.configure(device, &self.surface_config());
                match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("skipping frame after reconfigure: {e:?}");
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("skipping frame: {e:?}");
                return;
            }
        };

        self.instances.write(device, queue, batches);

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);
            rp.set_vertex_buffer(1, self.instances.buffer.slice(..));

            let mut first = 0u32;
            for (pipeline, list, meshes) in [
                (&self.pipelines.line_pipeline, &batches.lines, &self.meshes.lines),
                (&self.pipelines.fill_pipeline, &batches.fills, &self.meshes.fills),
            ] {
                rp.set_pipeline(pipeline);
                for batch in list {
                    let count = batch.instances.len() as u32;
                    let range = first..first + count;
                    first += count;
                    let Some(mesh) = meshes.get(&batch.mesh) else {
                        continue;
                    };
                    rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
                    rp.draw_indexed(0..mesh.index_count, 0, range);
                }
            }
        }

        // Upload egui textures
        for (id, image_delta) in &egui_full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        // Update egui buffers
        self.egui_renderer
            .update_buffers(device, queue, &mut encoder, &egui_primitives, &screen_descriptor);

        // Render egui overlay
        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &egui_primitives, &screen_descriptor);
        }

        // Free egui textures
        for id in &egui_full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 48);
    }

    #[test]
    fn lighting_packs_range_and_intensity() {
        let u = LightingUniform::from(&Lighting::default());
        assert_eq!(u.point_position, [10.0, 10.0, 10.0, 100.0]);
        assert_eq!(u.point_color, [0.0, 1.0, 0.0, 1.0]);
    }
}
