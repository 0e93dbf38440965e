use crate::shaders;
use bytemuck::{Pod, Zeroable};
use debugview_render::{
    DebugBackend, DebugError, DebugProgram, Geometry, IconImage, IconVertex, LineUniforms,
    LineVertex,
};
use glam::Mat4;
use std::num::NonZeroU64;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Depth format used by [`create_depth_view`] and expected by the overlay
/// pipelines when a depth attachment is supplied.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const INITIAL_DRAWS: u64 = 256;
const INITIAL_JOINTS: u64 = 256;
const MAT4_SIZE: u64 = std::mem::size_of::<[f32; 16]>() as u64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    mvp: [[f32; 4]; 4],
    color_mode: u32,
    joint_base: u32,
    _pad: [u32; 2],
}

const DRAW_UNIFORMS_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PaletteUniforms {
    colors: [[f32; 4]; 4],
}

impl PaletteUniforms {
    fn from_rgb(palette: &[[f32; 3]; 4]) -> Self {
        Self {
            colors: palette.map(|[r, g, b]| [r, g, b, 1.0]),
        }
    }
}

fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Smallest power-of-two multiple of `current` that holds `needed`.
fn grown_capacity(current: u64, needed: u64) -> u64 {
    let mut capacity = current.max(1);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}

/// Per-draw uniform blocks packed at a fixed stride for dynamic offsets.
struct UniformStaging {
    stride: u64,
    bytes: Vec<u8>,
}

impl UniformStaging {
    fn new(stride: u64) -> Self {
        Self {
            stride,
            bytes: Vec::new(),
        }
    }

    /// Append one block and return its dynamic offset.
    fn push(&mut self, uniforms: DrawUniforms) -> u32 {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(bytemuck::bytes_of(&uniforms));
        self.bytes.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Handle to an overlay mesh owned by [`WgpuDebugBackend`].
#[derive(Debug, PartialEq, Eq)]
pub struct MeshHandle(u32);

/// Handle to an icon texture owned by [`WgpuDebugBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHandle(u32);

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

enum Command {
    Program(DebugProgram),
    Lines {
        mesh: u32,
        offset: u32,
        index_count: u32,
    },
    Icon {
        mesh: u32,
        texture: u32,
        offset: u32,
    },
    Joints {
        mesh: u32,
        offset: u32,
        index_count: u32,
    },
}

/// wgpu implementation of [`DebugBackend`].
///
/// Draw calls are buffered; [`WgpuDebugBackend::encode`] uploads the frame's
/// uniforms and joint matrices and replays the draws into a render pass that
/// loads (never clears) the supplied attachments.
pub struct WgpuDebugBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    line_pipeline: wgpu::RenderPipeline,
    icon_pipeline: wgpu::RenderPipeline,
    joint_pipeline: wgpu::RenderPipeline,

    draw_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    joint_layout: wgpu::BindGroupLayout,

    draw_buffer: wgpu::Buffer,
    draw_capacity: u64,
    draw_bind_group: wgpu::BindGroup,

    palette_buffer: wgpu::Buffer,
    palette_bind_group: wgpu::BindGroup,

    joint_buffer: wgpu::Buffer,
    joint_capacity: u64,
    joint_bind_group: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    meshes: Vec<Option<GpuMesh>>,
    free_meshes: Vec<u32>,
    released_this_frame: Vec<u32>,
    textures: Vec<wgpu::BindGroup>,

    staging: UniformStaging,
    joint_staging: Vec<f32>,
    commands: Vec<Command>,
}

impl WgpuDebugBackend {
    /// `depth_format` must match the depth attachment later passed to
    /// `encode`, or be `None` when drawing without depth.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let stride = align_to(
            DRAW_UNIFORMS_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug_draw_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                },
                count: None,
            }],
        });

        let palette_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug_palette_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug_icon_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let joint_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug_joint_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let depth = |compare: wgpu::CompareFunction, write: bool| {
            depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: write,
                depth_compare: compare,
                stencil: Default::default(),
                bias: Default::default(),
            })
        };

        let line_pipeline = Self::create_pipeline(
            &device,
            PipelineDesc {
                label: "debug_line_pipeline",
                source: shaders::LINE_SHADER,
                vertex_entry: "vs_line",
                fragment_entry: "fs_line",
                layouts: &[&draw_layout, &palette_layout],
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32],
                }],
                topology: wgpu::PrimitiveTopology::LineList,
                color_format,
                blend: wgpu::BlendState::REPLACE,
                depth: depth(wgpu::CompareFunction::LessEqual, true),
            },
        );

        let icon_pipeline = Self::create_pipeline(
            &device,
            PipelineDesc {
                label: "debug_icon_pipeline",
                source: shaders::ICON_SHADER,
                vertex_entry: "vs_icon",
                fragment_entry: "fs_icon",
                layouts: &[&draw_layout, &texture_layout],
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<IconVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                color_format,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth: depth(wgpu::CompareFunction::LessEqual, true),
            },
        );

        // Joints are drawn on top of everything.
        let joint_pipeline = Self::create_pipeline(
            &device,
            PipelineDesc {
                label: "debug_joint_pipeline",
                source: shaders::JOINT_SHADER,
                vertex_entry: "vs_joint",
                fragment_entry: "fs_joint",
                layouts: &[&draw_layout, &joint_layout],
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                topology: wgpu::PrimitiveTopology::LineList,
                color_format,
                blend: wgpu::BlendState::REPLACE,
                depth: depth(wgpu::CompareFunction::Always, false),
            },
        );

        let draw_capacity = INITIAL_DRAWS * stride;
        let draw_buffer = Self::create_draw_buffer(&device, draw_capacity);
        let draw_bind_group = Self::create_draw_bind_group(&device, &draw_layout, &draw_buffer);

        let palette_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("debug_palette_buffer"),
            contents: bytemuck::bytes_of(&PaletteUniforms::from_rgb(
                &debugview_render::DEFAULT_PALETTE,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let palette_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debug_palette_bind_group"),
            layout: &palette_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: palette_buffer.as_entire_binding(),
            }],
        });

        let joint_capacity = INITIAL_JOINTS * MAT4_SIZE;
        let joint_buffer = Self::create_joint_buffer(&device, joint_capacity);
        let joint_bind_group = Self::create_joint_bind_group(&device, &joint_layout, &joint_buffer);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("debug_icon_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        tracing::debug!(stride, ?color_format, ?depth_format, "debug backend created");

        Self {
            device,
            queue,
            line_pipeline,
            icon_pipeline,
            joint_pipeline,
            draw_layout,
            texture_layout,
            joint_layout,
            draw_buffer,
            draw_capacity,
            draw_bind_group,
            palette_buffer,
            palette_bind_group,
            joint_buffer,
            joint_capacity,
            joint_bind_group,
            sampler,
            meshes: Vec::new(),
            free_meshes: Vec::new(),
            released_this_frame: Vec::new(),
            textures: Vec::new(),
            staging: UniformStaging::new(stride),
            joint_staging: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Number of buffered draw commands, program switches included.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Upload this frame's uniforms and record the buffered draws into a
    /// load-only pass over `color_view` (and `depth_view`, when given).
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: Option<&wgpu::TextureView>,
    ) {
        self.upload();

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("debug_overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                ..Default::default()
            });

            for command in &self.commands {
                match *command {
                    Command::Program(program) => match program {
                        DebugProgram::Lines => {
                            pass.set_pipeline(&self.line_pipeline);
                            pass.set_bind_group(1, &self.palette_bind_group, &[]);
                        }
                        DebugProgram::Icons => pass.set_pipeline(&self.icon_pipeline),
                        DebugProgram::Joints => {
                            pass.set_pipeline(&self.joint_pipeline);
                            pass.set_bind_group(1, &self.joint_bind_group, &[]);
                        }
                    },
                    Command::Lines {
                        mesh,
                        offset,
                        index_count,
                    }
                    | Command::Joints {
                        mesh,
                        offset,
                        index_count,
                    } => {
                        let Some(mesh) = self.mesh(mesh) else {
                            continue;
                        };
                        pass.set_bind_group(0, &self.draw_bind_group, &[offset]);
                        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..index_count, 0, 0..1);
                    }
                    Command::Icon {
                        mesh,
                        texture,
                        offset,
                    } => {
                        let (Some(mesh), Some(texture)) =
                            (self.mesh(mesh), self.textures.get(texture as usize))
                        else {
                            continue;
                        };
                        pass.set_bind_group(0, &self.draw_bind_group, &[offset]);
                        pass.set_bind_group(1, texture, &[]);
                        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..6, 0, 0..1);
                    }
                }
            }
        }

        self.commands.clear();
        self.staging.clear();
        self.joint_staging.clear();
        self.free_meshes.append(&mut self.released_this_frame);
    }

    fn mesh(&self, slot: u32) -> Option<&GpuMesh> {
        self.meshes.get(slot as usize).and_then(Option::as_ref)
    }

    fn upload(&mut self) {
        if self.staging.len() > self.draw_capacity {
            self.draw_capacity = grown_capacity(self.draw_capacity, self.staging.len());
            self.draw_buffer = Self::create_draw_buffer(&self.device, self.draw_capacity);
            self.draw_bind_group =
                Self::create_draw_bind_group(&self.device, &self.draw_layout, &self.draw_buffer);
            tracing::debug!(bytes = self.draw_capacity, "grew debug uniform buffer");
        }
        if self.staging.len() > 0 {
            self.queue
                .write_buffer(&self.draw_buffer, 0, &self.staging.bytes);
        }

        let joint_bytes = (self.joint_staging.len() * std::mem::size_of::<f32>()) as u64;
        if joint_bytes > self.joint_capacity {
            self.joint_capacity = grown_capacity(self.joint_capacity, joint_bytes);
            self.joint_buffer = Self::create_joint_buffer(&self.device, self.joint_capacity);
            self.joint_bind_group =
                Self::create_joint_bind_group(&self.device, &self.joint_layout, &self.joint_buffer);
            tracing::debug!(bytes = self.joint_capacity, "grew debug joint buffer");
        }
        if joint_bytes > 0 {
            self.queue.write_buffer(
                &self.joint_buffer,
                0,
                bytemuck::cast_slice(&self.joint_staging),
            );
        }
    }

    fn insert_mesh(&mut self, mesh: GpuMesh) -> MeshHandle {
        match self.free_meshes.pop() {
            Some(slot) => {
                self.meshes[slot as usize] = Some(mesh);
                MeshHandle(slot)
            }
            None => {
                self.meshes.push(Some(mesh));
                MeshHandle(self.meshes.len() as u32 - 1)
            }
        }
    }

    fn create_mesh(&mut self, label: &str, vertices: &[u8], indices: &[u32]) -> MeshHandle {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_vertices")),
                contents: vertices,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.insert_mesh(GpuMesh {
            vertex_buffer,
            index_buffer,
        })
    }

    fn stage(&mut self, mvp: Mat4, color_mode: u32, joint_base: u32) -> u32 {
        self.staging.push(DrawUniforms {
            mvp: mvp.to_cols_array_2d(),
            color_mode,
            joint_base,
            _pad: [0; 2],
        })
    }

    fn create_draw_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("debug_draw_uniforms"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_draw_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debug_draw_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORMS_SIZE),
                }),
            }],
        })
    }

    fn create_joint_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("debug_joint_models"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_joint_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debug_joint_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: desc.layouts,
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: desc.buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: Some(desc.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                ..Default::default()
            },
            depth_stencil: desc.depth,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: &'a str,
    vertex_entry: &'a str,
    fragment_entry: &'a str,
    layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    color_format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth: Option<wgpu::DepthStencilState>,
}

impl DebugBackend for WgpuDebugBackend {
    type Mesh = MeshHandle;
    type Texture = TextureHandle;

    fn create_line_mesh(&mut self, label: &str, geometry: &Geometry<LineVertex>) -> MeshHandle {
        self.create_mesh(
            label,
            bytemuck::cast_slice(&geometry.vertices),
            &geometry.indices,
        )
    }

    fn create_icon_mesh(&mut self, label: &str, geometry: &Geometry<IconVertex>) -> MeshHandle {
        self.create_mesh(
            label,
            bytemuck::cast_slice(&geometry.vertices),
            &geometry.indices,
        )
    }

    fn create_joint_mesh(&mut self, label: &str, joint_count: u32, indices: &[u32]) -> MeshHandle {
        let origins = vec![0.0_f32; joint_count as usize * 3];
        self.create_mesh(label, bytemuck::cast_slice(&origins), indices)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        if let Some(slot) = self.meshes.get_mut(mesh.0 as usize) {
            if slot.take().is_some() {
                self.released_this_frame.push(mesh.0);
            }
        }
    }

    fn create_texture(&mut self, label: &str, image: &IconImage) -> Result<TextureHandle, DebugError> {
        if image.width == 0 || image.height == 0 {
            return Err(DebugError::Backend(format!("{label}: empty image")));
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if image.width > limit || image.height > limit {
            return Err(DebugError::Backend(format!(
                "{label}: {}x{} exceeds the {limit} texel limit",
                image.width, image.height
            )));
        }

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.rgba,
        );
        let view = texture.create_view(&Default::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.textures.push(bind_group);
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn set_palette(&mut self, palette: &[[f32; 3]; 4]) {
        self.queue.write_buffer(
            &self.palette_buffer,
            0,
            bytemuck::bytes_of(&PaletteUniforms::from_rgb(palette)),
        );
    }

    fn use_program(&mut self, program: DebugProgram) {
        self.commands.push(Command::Program(program));
    }

    fn draw_lines(&mut self, mesh: &MeshHandle, uniforms: LineUniforms, index_count: u32) {
        let offset = self.stage(uniforms.mvp, uniforms.color_mode.index(), 0);
        self.commands.push(Command::Lines {
            mesh: mesh.0,
            offset,
            index_count,
        });
    }

    fn draw_icon(&mut self, mesh: &MeshHandle, texture: &TextureHandle, mvp: Mat4) {
        let offset = self.stage(mvp, 0, 0);
        self.commands.push(Command::Icon {
            mesh: mesh.0,
            texture: texture.0,
            offset,
        });
    }

    fn draw_joints(
        &mut self,
        mesh: &MeshHandle,
        view_projection: Mat4,
        joint_models: &[f32],
        index_count: u32,
    ) {
        let joint_base = (self.joint_staging.len() / 16) as u32;
        self.joint_staging.extend_from_slice(joint_models);
        let offset = self.stage(view_projection, 0, joint_base);
        self.commands.push(Command::Joints {
            mesh: mesh.0,
            offset,
            index_count,
        });
    }
}

/// Depth attachment sized to the surface.
pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

/// Clear colour and depth. Stands in for the scene pass the overlay is
/// drawn on top of.
pub fn clear_frame(
    encoder: &mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
    color: wgpu::Color,
) {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear_pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        ..Default::default()
    });
}
