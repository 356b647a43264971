use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use tangerine_assets::TextureData;
use tangerine_core::Viewport;
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::{BufferId, ProgramId, TextureId};
use crate::{
    device::{
        ClearValues, DepthCompare, GraphicsDevice, IndexFormat, PrimitiveTopology, UniformValue,
        VertexFormat,
    },
    error::DeviceError,
    programs::{LinkedShaders, ProgramInterface, UniformLocation, UniformType},
    texture::{GpuTexture, TextureHelper},
};

const UNIFORM_ALIGNMENT: u64 = 16;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    topology: PrimitiveTopology,
    depth_compare: DepthCompare,
    /// Vertex buffer `i` feeds `attributes[i]`.
    attributes: Vec<(u32, VertexFormat)>,
}

impl PipelineKey {
    /// The key the program is expected to draw with, built from reflection.
    fn for_interface(interface: &ProgramInterface) -> Result<Self, DeviceError> {
        let mut attributes = interface
            .attributes()
            .map(|input| {
                input.format.map(|format| (input.location, format)).ok_or_else(|| {
                    DeviceError::Pipeline(format!(
                        "attribute `{}` is not a float vector",
                        input.name
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        attributes.sort_by_key(|(location, _)| *location);

        Ok(Self {
            topology: PrimitiveTopology::TriangleList,
            depth_compare: DepthCompare::LessEqual,
            attributes,
        })
    }
}

/// CPU copy of one `var<uniform>` block. Uploads land here and are
/// written to the GPU right before a draw.
struct UniformBlockBuffer {
    group: u32,
    binding: u32,
    buffer: wgpu::Buffer,
    staging: Vec<u8>,
    dirty: bool,
}

struct GpuProgram {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    interface: ProgramInterface,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    blocks: Vec<UniformBlockBuffer>,
    /// Texture unit read by each texture binding, keyed by (group, binding).
    texture_units: HashMap<(u32, u32), u32>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl GpuProgram {
    fn new(device: &wgpu::Device, shaders: &LinkedShaders) -> Self {
        let interface = shaders.interface.clone();

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders.vertex.source.as_str().into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders.fragment.source.as_str().into()),
        });

        let bind_group_layouts: Vec<_> = (0..interface.group_count())
            .map(|group| {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Program Bind Group Layout"),
                    entries: &layout_entries(&interface, group),
                })
            })
            .collect();
        let layout_refs: Vec<_> = bind_group_layouts.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let blocks = interface
            .blocks()
            .iter()
            .map(|block| {
                let size = (block.size as u64).div_ceil(UNIFORM_ALIGNMENT) * UNIFORM_ALIGNMENT;
                UniformBlockBuffer {
                    group: block.group,
                    binding: block.binding,
                    buffer: device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(block.name.as_str()),
                        size,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                    staging: vec![0; size as usize],
                    dirty: true,
                }
            })
            .collect();

        Self {
            vertex,
            fragment,
            vertex_entry: shaders.vertex_entry.clone(),
            fragment_entry: shaders.fragment_entry.clone(),
            interface,
            bind_group_layouts,
            pipeline_layout,
            blocks,
            texture_units: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Builds and caches the pipeline for `key`. Validation failures come back as errors.
    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        key: &PipelineKey,
    ) -> Result<(), DeviceError> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .attributes
            .iter()
            .map(|&(location, format)| {
                [wgpu::VertexAttribute {
                    format: wgpu_vertex_format(format),
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = key
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(&(_, format), attribute)| wgpu::VertexBufferLayout {
                array_stride: format.byte_size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            cache: None,
            label: Some("Program Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.vertex,
                entry_point: Some(self.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.fragment,
                entry_point: Some(self.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureHelper::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu_compare(key.depth_compare),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: match key.topology {
                    PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
                },
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(DeviceError::Pipeline(error.to_string()));
        }

        log::debug!("render pipeline created for {key:?}");
        self.pipelines.insert(key.clone(), pipeline);
        Ok(())
    }

    fn flush_uniforms(&mut self, queue: &wgpu::Queue) {
        for block in self.blocks.iter_mut().filter(|block| block.dirty) {
            queue.write_buffer(&block.buffer, 0, &block.staging);
            block.dirty = false;
        }
    }

    fn bind_groups(
        &self,
        device: &wgpu::Device,
        units: &HashMap<u32, TextureId>,
        textures: &[GpuTexture],
        fallback: &GpuTexture,
    ) -> Vec<wgpu::BindGroup> {
        self.bind_group_layouts
            .iter()
            .zip(0u32..)
            .map(|(layout, group)| {
                let mut entries = Vec::new();

                for block in self.blocks.iter().filter(|b| b.group == group) {
                    entries.push(wgpu::BindGroupEntry {
                        binding: block.binding,
                        resource: block.buffer.as_entire_binding(),
                    });
                }

                for texture in self.interface.textures().iter().filter(|t| t.group == group) {
                    // An unset sampler reads unit 0.
                    let unit = self
                        .texture_units
                        .get(&(texture.group, texture.binding))
                        .copied()
                        .unwrap_or(0);
                    let gpu = units
                        .get(&unit)
                        .and_then(|id| textures.get(id.0 as usize))
                        .unwrap_or(fallback);

                    entries.push(wgpu::BindGroupEntry {
                        binding: texture.binding,
                        resource: wgpu::BindingResource::TextureView(&gpu.view),
                    });
                    if let Some(sampler) = texture.sampler {
                        entries.push(wgpu::BindGroupEntry {
                            binding: sampler,
                            resource: wgpu::BindingResource::Sampler(&gpu.sampler),
                        });
                    }
                }

                for sampler in self.interface.samplers().iter().filter(|s| s.group == group) {
                    let paired = self
                        .interface
                        .textures()
                        .iter()
                        .any(|t| t.group == group && t.sampler == Some(sampler.binding));
                    if !paired {
                        entries.push(wgpu::BindGroupEntry {
                            binding: sampler.binding,
                            resource: wgpu::BindingResource::Sampler(&fallback.sampler),
                        });
                    }
                }

                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Program Bind Group"),
                    layout,
                    entries: &entries,
                })
            })
            .collect()
    }
}

fn layout_entries(interface: &ProgramInterface, group: u32) -> Vec<wgpu::BindGroupLayoutEntry> {
    let visibility = wgpu::ShaderStages::VERTEX_FRAGMENT;
    let blocks = interface
        .blocks()
        .iter()
        .filter(|b| b.group == group)
        .map(|b| wgpu::BindGroupLayoutEntry {
            binding: b.binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    let textures = interface
        .textures()
        .iter()
        .filter(|t| t.group == group)
        .map(|t| wgpu::BindGroupLayoutEntry {
            binding: t.binding,
            visibility,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
    let samplers = interface
        .samplers()
        .iter()
        .filter(|s| s.group == group)
        .map(|s| wgpu::BindGroupLayoutEntry {
            binding: s.binding,
            visibility,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });

    blocks.chain(textures).chain(samplers).collect()
}

fn wgpu_vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

fn wgpu_compare(compare: DepthCompare) -> wgpu::CompareFunction {
    match compare {
        DepthCompare::Less => wgpu::CompareFunction::Less,
        DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthCompare::Always => wgpu::CompareFunction::Always,
    }
}

fn wgpu_index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

/// Bytes of `value` in uniform buffer layout. `mat3x3<f32>` columns are padded to 16 bytes.
fn uniform_bytes(value: UniformValue) -> Vec<u8> {
    match value {
        UniformValue::Int(v) => bytemuck::bytes_of(&v).to_vec(),
        UniformValue::Float(v) => bytemuck::bytes_of(&v).to_vec(),
        UniformValue::Vec3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
        UniformValue::Vec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
        UniformValue::Mat3(m) => {
            let columns: Vec<f32> = (0..3)
                .flat_map(|i| {
                    let column = m.col(i);
                    [column.x, column.y, column.z, 0.0]
                })
                .collect();
            bytemuck::cast_slice(&columns).to_vec()
        }
        UniformValue::Mat4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
    }
}

fn load_op<T>(clear: Option<T>) -> wgpu::LoadOp<T> {
    clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear)
}

fn clear_color(values: ClearValues) -> wgpu::Color {
    let [r, g, b, a] = values.color.map(f64::from);
    wgpu::Color { r, g, b, a }
}

/// Swapchain image acquired for the current frame.
struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    /// A clear requested but not yet folded into a render pass.
    pending_clear: Option<ClearValues>,
}

/// Pipeline state set by the render core between draws.
#[derive(Default)]
struct BoundState {
    program: Option<ProgramId>,
    depth_compare: DepthCompare,
    attributes: BTreeMap<u32, (BufferId, VertexFormat)>,
    index: Option<(BufferId, IndexFormat)>,
    texture_units: HashMap<u32, TextureId>,
}

/// Window-backed device on top of wgpu.
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    fallback_texture: GpuTexture,
    programs: Vec<GpuProgram>,
    buffers: Vec<wgpu::Buffer>,
    textures: Vec<GpuTexture>,
    bound: BoundState,
    frame: Option<Frame>,
}

impl WgpuDevice {
    pub fn new(window: Arc<Window>) -> Result<Self, DeviceError> {
        let size = window.inner_size();

        // 1. Instance and surface
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| DeviceError::ContextUnavailable(e.to_string()))?;

        // 2. Adapter and device
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| DeviceError::ContextUnavailable(e.to_string()))?;

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))
                .map_err(|e| DeviceError::ContextUnavailable(e.to_string()))?;

        // 3. Surface configuration
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                DeviceError::ContextUnavailable("surface reports no formats".to_owned())
            })?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // 4. Depth target and the white texture bound when no unit is set.
        let depth_texture =
            TextureHelper::create_depth_texture(
                &device,
                config.width,
                config.height,
                "Depth Texture",
            );
        let fallback_texture = GpuTexture::from_image(
            &device,
            &queue,
            &TextureData::solid("fallback white", [255; 4]),
            Some("Fallback White Texture"),
        );

        log::info!(
            "graphics device ready: {} ({:?}), {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            fallback_texture,
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            bound: BoundState::default(),
            frame: None,
        })
    }

    /// Reconfigures the surface. A zero-sized window keeps the old size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureHelper::create_depth_texture(&self.device, width, height, "Depth Texture");
    }

    /// Shows the current frame. A clear with no draw after it is flushed first.
    pub fn present(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };

        if let Some(clear) = frame.pending_clear {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Clear Encoder"),
                });
            {
                let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Clear Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear_color(clear)),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_texture,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear.depth),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });
            }
            self.queue.submit(std::iter::once(encoder.finish()));
        }

        frame.surface_texture.present();
    }

    fn acquire_frame(&mut self) -> Option<&mut Frame> {
        if self.frame.is_none() {
            let surface_texture = match self.surface.get_current_texture() {
                Ok(texture) => texture,
                Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                    self.surface.configure(&self.device, &self.config);
                    match self.surface.get_current_texture() {
                        Ok(texture) => texture,
                        Err(e) => {
                            log::warn!("surface still unavailable after reconfigure: {e}");
                            return None;
                        }
                    }
                }
                Err(e) => {
                    log::warn!("dropping frame, surface unavailable: {e}");
                    return None;
                }
            };
            let view = surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            self.frame = Some(Frame {
                surface_texture,
                view,
                pending_clear: None,
            });
        }
        self.frame.as_mut()
    }
}

impl GraphicsDevice for WgpuDevice {
    type Program = ProgramId;
    type Buffer = BufferId;
    type Texture = TextureId;

    fn create_program(&mut self, shaders: &LinkedShaders) -> Result<ProgramId, DeviceError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut program = GpuProgram::new(&self.device, shaders);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(DeviceError::Pipeline(error.to_string()));
        }

        let key = PipelineKey::for_interface(&program.interface)?;
        program.ensure_pipeline(&self.device, self.config.format, &key)?;

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(program);
        Ok(id)
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.buffers.push(buffer);
        BufferId(self.buffers.len() as u32 - 1)
    }

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.buffers.push(buffer);
        BufferId(self.buffers.len() as u32 - 1)
    }

    fn create_texture(&mut self, data: &TextureData) -> TextureId {
        let label = Some(data.name.as_str());
        let texture = GpuTexture::from_image(&self.device, &self.queue, data, label);
        self.textures.push(texture);
        TextureId(self.textures.len() as u32 - 1)
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn clear(&mut self, values: ClearValues) {
        if let Some(frame) = self.acquire_frame() {
            frame.pending_clear = Some(values);
        }
    }

    fn set_depth_test(&mut self, compare: DepthCompare) {
        self.bound.depth_compare = compare;
    }

    fn use_program(&mut self, program: ProgramId) {
        self.bound.program = Some(program);
    }

    fn set_uniform(&mut self, location: &UniformLocation, value: UniformValue) {
        let Some(program) = self
            .bound
            .program
            .and_then(|id| self.programs.get_mut(id.0 as usize))
        else {
            log::warn!("uniform `{}` set with no program in use", location.name());
            return;
        };
        if !value.fits(location.ty()) {
            log::warn!("{value:?} does not fit uniform `{}`", location.name());
            return;
        }

        if location.ty() == UniformType::Texture2d {
            if let UniformValue::Int(unit) = value {
                program
                    .texture_units
                    .insert((location.group(), location.binding()), unit.max(0) as u32);
            }
            return;
        }

        let Some(block) = program
            .blocks
            .iter_mut()
            .find(|b| b.group == location.group() && b.binding == location.binding())
        else {
            log::warn!("uniform `{}` has no backing block", location.name());
            return;
        };

        let bytes = uniform_bytes(value);
        let start = location.offset() as usize;
        let Some(target) = block.staging.get_mut(start..start + bytes.len()) else {
            log::warn!("uniform `{}` overruns its block", location.name());
            return;
        };
        target.copy_from_slice(&bytes);
        block.dirty = true;
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.bound.texture_units.insert(unit, texture);
    }

    fn bind_vertex_attribute(&mut self, slot: u32, buffer: BufferId, format: VertexFormat) {
        self.bound.attributes.insert(slot, (buffer, format));
    }

    fn bind_index_buffer(&mut self, buffer: BufferId, format: IndexFormat) {
        self.bound.index = Some((buffer, format));
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: u32) {
        let Some(program_id) = self.bound.program else {
            log::warn!("draw with no program in use");
            return;
        };
        let Some((index_id, index_format)) = self.bound.index else {
            log::warn!("draw with no index buffer bound");
            return;
        };
        if self.acquire_frame().is_none() {
            return;
        }
        let Some(program) = self.programs.get_mut(program_id.0 as usize) else {
            return;
        };

        // 1. Match every program input to a bound buffer.
        let mut locations: Vec<u32> = program.interface.attributes().map(|a| a.location).collect();
        locations.sort_unstable();
        let mut attributes = Vec::with_capacity(locations.len());
        let mut vertex_buffers = Vec::with_capacity(locations.len());
        for location in locations {
            let Some(&(buffer_id, format)) = self.bound.attributes.get(&location) else {
                log::warn!("no buffer bound for attribute location {location}, skipping draw");
                return;
            };
            let Some(buffer) = self.buffers.get(buffer_id.0 as usize) else {
                return;
            };
            attributes.push((location, format));
            vertex_buffers.push(buffer);
        }
        let Some(index_buffer) = self.buffers.get(index_id.0 as usize) else {
            return;
        };

        // 2. Pipeline and resources
        let key = PipelineKey {
            topology,
            depth_compare: self.bound.depth_compare,
            attributes,
        };
        if let Err(e) = program.ensure_pipeline(&self.device, self.config.format, &key) {
            log::error!("skipping draw: {e}");
            return;
        }
        program.flush_uniforms(&self.queue);
        let bind_groups = program.bind_groups(
            &self.device,
            &self.bound.texture_units,
            &self.textures,
            &self.fallback_texture,
        );
        let (Some(pipeline), Some(frame)) = (program.pipelines.get(&key), self.frame.as_mut())
        else {
            return;
        };

        // 3. Encode
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Draw Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Draw Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: load_op(frame.pending_clear.map(clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: load_op(frame.pending_clear.map(|clear| clear.depth)),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(pipeline);
            for (index, group) in (0u32..).zip(&bind_groups) {
                pass.set_bind_group(index, group, &[]);
            }
            for (slot, buffer) in (0u32..).zip(&vertex_buffers) {
                pass.set_vertex_buffer(slot, buffer.slice(..));
            }
            pass.set_index_buffer(index_buffer.slice(..), wgpu_index_format(index_format));
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        frame.pending_clear = None;

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat3, Vec3};

    use super::*;

    #[test]
    fn mat3_columns_are_padded() {
        let bytes = uniform_bytes(UniformValue::Mat3(Mat3::from_cols(Vec3::X, Vec3::Y, Vec3::Z)));
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        assert_eq!(
            floats,
            [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn vec3_is_twelve_bytes() {
        assert_eq!(uniform_bytes(UniformValue::Vec3(Vec3::ONE)).len(), 12);
    }

    #[test]
    fn missing_clear_loads() {
        assert_eq!(load_op::<f32>(None), wgpu::LoadOp::Load);
        assert_eq!(load_op(Some(1.0)), wgpu::LoadOp::Clear(1.0));
    }
}
