use crate::mesh::{GpuMesh, MirrorVertex, ObjectVertex, mirror_vertices, object_vertices};
use crate::shaders;
use crate::textures::{self, DEPTH_FORMAT};
use crate::uniforms::{MirrorBlock, ObjectBlock, SkyboxBlock};
use glam::UVec2;
use skymirror_assets::SceneAssets;
use skymirror_render::{
    CullFace, DrawCall, DrawKind, GraphicsDevice, RenderError, RenderResult, RenderTarget,
};
use std::collections::{HashMap, HashSet};

/// Pipelines are keyed by the fixed-function state they bake in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    kind: DrawKind,
    depth_test: bool,
    cull: Option<CullFace>,
}

/// Uniform buffer and bind group for one draw kind on one target.
struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct ShaderProgram {
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    vs_entry: &'static str,
    fs_entry: &'static str,
}

struct OffscreenTarget {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    size: UVec2,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

impl ShaderProgram {
    fn new(
        device: &wgpu::Device,
        name: &str,
        source: &'static str,
        entries: &[wgpu::BindGroupLayoutEntry],
        vs_entry: &'static str,
        fs_entry: &'static str,
    ) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{name}_shader")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{name}_bind_group_layout")),
            entries,
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{name}_pipeline_layout")),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        Self {
            module,
            layout,
            bind_group_layout,
            vs_entry,
            fs_entry,
        }
    }
}

fn wgpu_face(face: CullFace) -> wgpu::Face {
    match face {
        CullFace::Front => wgpu::Face::Front,
        CullFace::Back => wgpu::Face::Back,
    }
}

fn uniform_size(kind: DrawKind) -> u64 {
    let size = match kind {
        DrawKind::Skybox => std::mem::size_of::<SkyboxBlock>(),
        DrawKind::Object => std::mem::size_of::<ObjectBlock>(),
        DrawKind::Mirror => std::mem::size_of::<MirrorBlock>(),
    };
    size as u64
}

/// wgpu renderer for the mirror scene.
///
/// Owns every GPU resource: shader programs, lazily built pipelines, the
/// uploaded meshes and textures, the offscreen reflection target, and the
/// screen depth buffer. Per frame, [`WgpuRenderer::begin_frame`] hands out a
/// [`WgpuFrame`] that the render pipeline drives.
pub struct WgpuRenderer {
    surface_format: wgpu::TextureFormat,
    skybox: ShaderProgram,
    object: ShaderProgram,
    mirror: ShaderProgram,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    slots: HashMap<(RenderTarget, DrawKind), UniformSlot>,
    object_mesh: GpuMesh,
    mirror_mesh: GpuMesh,
    reflection: OffscreenTarget,
    screen_depth: wgpu::TextureView,
    screen_size: UVec2,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        screen_size: UVec2,
        reflection_size: UVec2,
        assets: &SceneAssets,
    ) -> Self {
        let cube_entries = [
            uniform_entry(0),
            texture_entry(1, wgpu::TextureViewDimension::Cube),
            sampler_entry(2),
        ];
        let skybox = ShaderProgram::new(
            device,
            "skybox",
            shaders::SKYBOX_SHADER,
            &cube_entries,
            "vs_skybox",
            "fs_skybox",
        );
        let object = ShaderProgram::new(
            device,
            "object",
            shaders::OBJECT_SHADER,
            &cube_entries,
            "vs_object",
            "fs_object",
        );
        let mirror = ShaderProgram::new(
            device,
            "mirror",
            shaders::MIRROR_SHADER,
            &[
                uniform_entry(0),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
                texture_entry(3, wgpu::TextureViewDimension::D2),
                sampler_entry(4),
            ],
            "vs_mirror",
            "fs_mirror",
        );

        // Textures
        let cubemap = textures::upload_cubemap(device, queue, &assets.cubemap);
        let neutral = textures::neutral_distortion();
        let distortion = textures::upload_image(
            device,
            queue,
            "distortion_map",
            assets.distortion.as_ref().unwrap_or(&neutral),
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let clamp_sampler =
            textures::create_sampler(device, "clamp_sampler", wgpu::AddressMode::ClampToEdge);
        let mirrored_sampler =
            textures::create_sampler(device, "mirrored_sampler", wgpu::AddressMode::MirrorRepeat);

        let reflection_size = reflection_size.max(UVec2::ONE);
        let reflection = OffscreenTarget {
            color: textures::create_color_target(
                device,
                "reflection_color",
                reflection_size,
                surface_format,
            ),
            depth: textures::create_depth_texture(device, "reflection_depth", reflection_size),
            size: reflection_size,
        };

        // One uniform slot per (target, kind). The mirror is screen only.
        let mut slots = HashMap::new();
        let slot_keys = [
            (RenderTarget::Reflection, DrawKind::Skybox),
            (RenderTarget::Reflection, DrawKind::Object),
            (RenderTarget::Screen, DrawKind::Skybox),
            (RenderTarget::Screen, DrawKind::Object),
            (RenderTarget::Screen, DrawKind::Mirror),
        ];
        for (target, kind) in slot_keys {
            let label = format!("{target:?}_{kind:?}").to_lowercase();
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{label}_uniforms")),
                size: uniform_size(kind),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = match kind {
                DrawKind::Skybox | DrawKind::Object => {
                    let program = if kind == DrawKind::Skybox { &skybox } else { &object };
                    device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&format!("{label}_bind_group")),
                        layout: &program.bind_group_layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: buffer.as_entire_binding(),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::TextureView(&cubemap),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: wgpu::BindingResource::Sampler(&clamp_sampler),
                            },
                        ],
                    })
                }
                DrawKind::Mirror => device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label}_bind_group")),
                    layout: &mirror.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&reflection.color),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&clamp_sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::TextureView(&distortion),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: wgpu::BindingResource::Sampler(&mirrored_sampler),
                        },
                    ],
                }),
            };
            slots.insert((target, kind), UniformSlot { buffer, bind_group });
        }

        // Meshes
        let object_mesh = GpuMesh::upload(
            device,
            "object",
            &object_vertices(&assets.object),
            &assets.object.indices,
        );
        let mirror_mesh = GpuMesh::upload(
            device,
            "mirror",
            &mirror_vertices(&assets.mirror),
            &assets.mirror.indices,
        );

        let screen_size = screen_size.max(UVec2::ONE);
        let screen_depth = textures::create_depth_texture(device, "screen_depth", screen_size);

        tracing::info!(
            "wgpu renderer ready: {} object indices, {}px cubemap, reflection {}x{}",
            object_mesh.index_count,
            assets.cubemap.size,
            reflection_size.x,
            reflection_size.y
        );

        Self {
            surface_format,
            skybox,
            object,
            mirror,
            pipelines: HashMap::new(),
            slots,
            object_mesh,
            mirror_mesh,
            reflection,
            screen_depth,
            screen_size,
        }
    }

    /// Follow a surface resize. The reflection target keeps its startup size.
    pub fn resize(&mut self, device: &wgpu::Device, size: UVec2) {
        self.screen_size = size.max(UVec2::ONE);
        self.screen_depth = textures::create_depth_texture(device, "screen_depth", self.screen_size);
        tracing::debug!(
            "screen depth resized to {}x{}, reflection target left at {}x{}",
            self.screen_size.x,
            self.screen_size.y,
            self.reflection.size.x,
            self.reflection.size.y
        );
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen_size
    }

    pub fn reflection_size(&self) -> UVec2 {
        self.reflection.size
    }

    /// Start recording a frame that renders to `view`, the current surface
    /// texture. Nothing reaches the GPU until [`WgpuFrame::finish`].
    pub fn begin_frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        view: &'a wgpu::TextureView,
    ) -> WgpuFrame<'a> {
        WgpuFrame {
            renderer: self,
            device,
            queue,
            screen_view: view,
            bound: RenderTarget::Screen,
            depth_test: false,
            culling: false,
            cull_face: CullFace::Back,
            passes: Vec::new(),
            written: HashSet::new(),
        }
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        tracing::debug!("building pipeline {key:?}");
        let pipeline = self.create_pipeline(device, key);
        self.pipelines.insert(key, pipeline);
    }

    fn create_pipeline(&self, device: &wgpu::Device, key: PipelineKey) -> wgpu::RenderPipeline {
        let (program, buffers) = match key.kind {
            DrawKind::Skybox => (&self.skybox, vec![]),
            DrawKind::Object => (&self.object, vec![ObjectVertex::layout()]),
            DrawKind::Mirror => (&self.mirror, vec![MirrorVertex::layout()]),
        };
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{:?}_pipeline", key.kind).to_lowercase()),
            layout: Some(&program.layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some(program.vs_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some(program.fs_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull.map(wgpu_face),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }
}

/// A render pass to encode: one target, optionally cleared, then draws.
#[derive(Debug)]
struct PassRecord {
    target: RenderTarget,
    clear: bool,
    draws: Vec<PipelineKey>,
}

/// One frame in flight.
///
/// Implements [`GraphicsDevice`] by recording passes and writing uniforms
/// to the queue; [`WgpuFrame::finish`] encodes and submits everything in
/// recorded order.
pub struct WgpuFrame<'a> {
    renderer: &'a mut WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    screen_view: &'a wgpu::TextureView,
    bound: RenderTarget,
    depth_test: bool,
    culling: bool,
    cull_face: CullFace,
    passes: Vec<PassRecord>,
    written: HashSet<(RenderTarget, DrawKind)>,
}

impl WgpuFrame<'_> {
    fn current_pass(&mut self) -> &mut PassRecord {
        let reuse = self.passes.last().is_some_and(|p| p.target == self.bound);
        if !reuse {
            self.passes.push(PassRecord {
                target: self.bound,
                clear: false,
                draws: Vec::new(),
            });
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    fn write_uniforms(&self, slot: &UniformSlot, call: &DrawCall) {
        match call {
            DrawCall::Skybox {
                view_projection_inverse,
            } => self.queue.write_buffer(
                &slot.buffer,
                0,
                bytemuck::bytes_of(&SkyboxBlock::new(*view_projection_inverse)),
            ),
            DrawCall::Object(u) => {
                self.queue
                    .write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&ObjectBlock::from(u)))
            }
            DrawCall::Mirror(u) => {
                self.queue
                    .write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&MirrorBlock::from(u)))
            }
        }
    }

    /// Encode the recorded passes into one command buffer and submit it.
    pub fn finish(self) -> RenderResult<()> {
        let renderer = &*self.renderer;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        for record in &self.passes {
            let (color, depth) = match record.target {
                RenderTarget::Screen => (self.screen_view, &renderer.screen_depth),
                RenderTarget::Reflection => (&renderer.reflection.color, &renderer.reflection.depth),
            };
            let (color_load, depth_load) = if record.clear {
                (wgpu::LoadOp::Clear(wgpu::Color::BLACK), wgpu::LoadOp::Clear(1.0))
            } else {
                (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(match record.target {
                    RenderTarget::Screen => "screen_pass",
                    RenderTarget::Reflection => "reflection_pass",
                }),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for key in &record.draws {
                let pipeline = renderer.pipelines.get(key).ok_or_else(|| RenderError::DrawFailed {
                    kind: key.kind,
                    reason: format!("pipeline {key:?} was never built"),
                })?;
                let slot = renderer
                    .slots
                    .get(&(record.target, key.kind))
                    .ok_or(RenderError::InvalidDraw {
                        kind: key.kind,
                        target: record.target,
                    })?;
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &slot.bind_group, &[]);
                match key.kind {
                    DrawKind::Skybox => pass.draw(0..3, 0..1),
                    DrawKind::Object => renderer.object_mesh.draw(&mut pass),
                    DrawKind::Mirror => renderer.mirror_mesh.draw(&mut pass),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl GraphicsDevice for WgpuFrame<'_> {
    fn bind_target(&mut self, target: RenderTarget) -> RenderResult<()> {
        self.bound = target;
        Ok(())
    }

    fn target_size(&self, target: RenderTarget) -> UVec2 {
        match target {
            RenderTarget::Screen => self.renderer.screen_size,
            RenderTarget::Reflection => self.renderer.reflection.size,
        }
    }

    fn clear(&mut self) -> RenderResult<()> {
        let fresh = self
            .passes
            .last()
            .is_some_and(|p| p.target == self.bound && p.draws.is_empty());
        if fresh {
            self.current_pass().clear = true;
        } else {
            self.passes.push(PassRecord {
                target: self.bound,
                clear: true,
                draws: Vec::new(),
            });
        }
        Ok(())
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_culling(&mut self, enabled: bool) {
        self.culling = enabled;
    }

    fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
    }

    fn draw(&mut self, call: &DrawCall) -> RenderResult<()> {
        let kind = call.kind();
        let target = self.bound;
        let slot = self
            .renderer
            .slots
            .get(&(target, kind))
            .ok_or(RenderError::InvalidDraw { kind, target })?;
        self.write_uniforms(slot, call);
        if !self.written.insert((target, kind)) {
            tracing::warn!("{kind:?} drawn twice on {target:?} in one frame, last uniforms win");
        }

        let key = PipelineKey {
            kind,
            depth_test: self.depth_test,
            cull: self.culling.then_some(self.cull_face),
        };
        self.renderer.ensure_pipeline(self.device, key);
        self.current_pass().draws.push(key);
        Ok(())
    }
}
