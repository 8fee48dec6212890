pub mod mesh;
pub mod pipeline;

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::Pod;
use paradise_core::{
    CameraUniforms, ClearFlags, DrawCall, LightUniforms, MeshData, MeshHandle, ObjectUniforms,
    RasterDevice, RasterState,
};
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::renderer::mesh::GpuMesh;
use crate::renderer::pipeline::ScenePipelines;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
const INITIAL_UNIFORM_SLOTS: u64 = 64;

/// Every state the scene renderer uses, built up front so shader errors surface at startup.
const PRESET_STATES: [RasterState; 5] = [
    RasterState::OPAQUE,
    RasterState::STENCIL_MARK,
    RasterState::PORTAL_INTERIOR,
    RasterState::STENCIL_UNMARK,
    RasterState::DEPTH_ONLY,
];

#[derive(Debug)]
struct DepthTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTexture {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Paradise Depth Stencil Texture"),
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
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Per-frame uniform staging with one aligned slot per recorded value,
/// bound through a dynamic offset.
#[derive(Debug)]
struct UniformArena {
    label: &'static str,
    item_size: u64,
    stride: u64,
    capacity: u64,
    staging: Vec<u8>,
    buffer: wgpu::Buffer,
}

impl UniformArena {
    fn new<T: Pod>(device: &wgpu::Device, label: &'static str, alignment: u64) -> Self {
        let item_size = std::mem::size_of::<T>() as u64;
        let stride = item_size.div_ceil(alignment) * alignment;
        Self {
            label,
            item_size,
            stride,
            capacity: INITIAL_UNIFORM_SLOTS,
            staging: Vec::new(),
            buffer: Self::create_buffer(device, label, stride * INITIAL_UNIFORM_SLOTS),
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn clear(&mut self) {
        self.staging.clear();
    }

    fn push<T: Pod>(&mut self, value: &T) -> u32 {
        let offset = self.staging.len();
        self.staging.extend_from_slice(bytemuck::bytes_of(value));
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    /// Copies the staged slots to the GPU. Returns `true` when the buffer was
    /// reallocated and bind groups referencing it must be rebuilt.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let slots = self.staging.len() as u64 / self.stride;
        let grew = slots > self.capacity;
        if grew {
            self.capacity = slots.next_power_of_two();
            self.buffer = Self::create_buffer(device, self.label, self.stride * self.capacity);
            debug!("Grew {} to {} slots", self.label, self.capacity);
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
        grew
    }

    fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: NonZeroU64::new(self.item_size),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Clear { flags: ClearFlags, color: [f32; 4] },
    State(RasterState),
    Draw {
        mesh: MeshHandle,
        camera_offset: u32,
        object_offset: u32,
    },
}

#[derive(Debug)]
pub enum RendererInitError {
    CreateSurface(wgpu::CreateSurfaceError),
    RequestAdapter(wgpu::RequestAdapterError),
    RequestDevice(wgpu::RequestDeviceError),
    UnsupportedSurface,
    Shader(String),
}

impl fmt::Display for RendererInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateSurface(err) => write!(f, "failed to create surface: {err}"),
            Self::RequestAdapter(err) => write!(f, "failed to request adapter: {err}"),
            Self::RequestDevice(err) => write!(f, "failed to request device: {err}"),
            Self::UnsupportedSurface => write!(f, "adapter does not support this surface"),
            Self::Shader(message) => write!(f, "failed to build scene pipelines: {message}"),
        }
    }
}

impl std::error::Error for RendererInitError {}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
    UnknownMesh(MeshHandle),
    MissingCamera,
    Validation(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMesh(handle) => write!(f, "draw references unknown mesh {}", handle.0),
            Self::MissingCamera => write!(f, "draw issued before any camera was set"),
            Self::Validation(message) => write!(f, "GPU validation error: {message}"),
        }
    }
}

impl std::error::Error for GpuError {}

/// `wgpu` rasterizer. Calls made through [`RasterDevice`] between
/// [`Renderer::begin_frame`] and [`Renderer::finish_frame`] are recorded and
/// replayed into render passes when the frame is submitted.
pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    pipelines: ScenePipelines,
    camera_uniforms: UniformArena,
    object_uniforms: UniformArena,
    light_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    object_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    commands: Vec<Command>,
    camera_offset: Option<u32>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RendererInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(RendererInitError::CreateSurface)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(RendererInitError::RequestAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Paradise Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(RendererInitError::RequestDevice)?;

        let initial_size = window.inner_size();
        let mut surface_config = surface
            .get_default_config(&adapter, initial_size.width.max(1), initial_size.height.max(1))
            .ok_or(RendererInitError::UnsupportedSurface)?;
        surface_config.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &surface_config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut pipelines = ScenePipelines::new(&device, surface_config.format, DEPTH_FORMAT);
        for state in PRESET_STATES {
            pipelines.prepare(&device, state);
        }
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RendererInitError::Shader(err.to_string()));
        }

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let camera_uniforms =
            UniformArena::new::<CameraUniforms>(&device, "Paradise Camera Uniforms", alignment);
        let object_uniforms =
            UniformArena::new::<ObjectUniforms>(&device, "Paradise Object Uniforms", alignment);
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Paradise Light Uniforms"),
            contents: bytemuck::bytes_of(&LightUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group =
            create_camera_bind_group(&device, &pipelines, &camera_uniforms, &light_buffer);
        let object_bind_group = create_object_bind_group(&device, &pipelines, &object_uniforms);
        let depth_texture = DepthTexture::new(&device, surface_config.width, surface_config.height);

        info!(
            "Renderer initialized: {}x{} {:?}, {} pipelines",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            pipelines.len()
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            depth_texture,
            pipelines,
            camera_uniforms,
            object_uniforms,
            light_buffer,
            camera_bind_group,
            object_bind_group,
            meshes: Vec::new(),
            commands: Vec::new(),
            camera_offset: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture = DepthTexture::new(&self.device, width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.camera_uniforms.clear();
        self.object_uniforms.clear();
        self.camera_offset = None;
    }

    /// Acquires the swapchain image and replays the recorded frame into it.
    /// Each clear starts a new render pass; everything else loads.
    pub fn finish_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if self.camera_uniforms.upload(&self.device, &self.queue) {
            self.camera_bind_group = create_camera_bind_group(
                &self.device,
                &self.pipelines,
                &self.camera_uniforms,
                &self.light_buffer,
            );
        }
        if self.object_uniforms.upload(&self.device, &self.queue) {
            self.object_bind_group =
                create_object_bind_group(&self.device, &self.pipelines, &self.object_uniforms);
        }
        for command in &self.commands {
            if let Command::State(state) = command {
                self.pipelines.prepare(&self.device, *state);
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Paradise Command Encoder"),
            });

        let mut state = RasterState::OPAQUE;
        let mut start = 0;
        while start < self.commands.len() {
            let clear = match self.commands[start] {
                Command::Clear { flags, color } => Some((flags, color)),
                _ => None,
            };
            let body = if clear.is_some() { start + 1 } else { start };
            let end = self.commands[body..]
                .iter()
                .position(|command| matches!(command, Command::Clear { .. }))
                .map_or(self.commands.len(), |offset| body + offset);

            {
                let mut render_pass = self.begin_pass(&mut encoder, &view, clear);
                state = self.replay(&mut render_pass, &self.commands[body..end], state);
            }
            start = end;
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn begin_pass<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: Option<(ClearFlags, [f32; 4])>,
    ) -> wgpu::RenderPass<'encoder> {
        let flags = clear.map_or(ClearFlags::empty(), |(flags, _)| flags);
        let color = clear.map_or([0.0; 4], |(_, color)| color);

        let color_load = if flags.contains(ClearFlags::COLOR) {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(color[0]),
                g: f64::from(color[1]),
                b: f64::from(color[2]),
                a: f64::from(color[3]),
            })
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if flags.contains(ClearFlags::DEPTH) {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        let stencil_load = if flags.contains(ClearFlags::STENCIL) {
            wgpu::LoadOp::Clear(0)
        } else {
            wgpu::LoadOp::Load
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Paradise Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    fn replay(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        commands: &[Command],
        mut state: RasterState,
    ) -> RasterState {
        let mut bound = false;
        for command in commands {
            match *command {
                Command::Clear { .. } => {}
                Command::State(next) => {
                    state = next;
                    bound = false;
                }
                Command::Draw {
                    mesh,
                    camera_offset,
                    object_offset,
                } => {
                    let (Some(gpu_mesh), Some(pipeline)) =
                        (self.meshes.get(mesh.0 as usize), self.pipelines.get(&state))
                    else {
                        continue;
                    };
                    if !bound {
                        render_pass.set_pipeline(pipeline);
                        render_pass
                            .set_stencil_reference(state.stencil.map_or(0, |test| test.reference));
                        bound = true;
                    }
                    render_pass.set_bind_group(0, &self.camera_bind_group, &[camera_offset]);
                    render_pass.set_bind_group(1, &self.object_bind_group, &[object_offset]);
                    gpu_mesh.draw(render_pass);
                }
            }
        }
        state
    }
}

fn create_camera_bind_group(
    device: &wgpu::Device,
    pipelines: &ScenePipelines,
    camera_uniforms: &UniformArena,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Paradise Camera Bind Group"),
        layout: &pipelines.camera_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_uniforms.binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: light_buffer.as_entire_binding(),
            },
        ],
    })
}

fn create_object_bind_group(
    device: &wgpu::Device,
    pipelines: &ScenePipelines,
    object_uniforms: &UniformArena,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Paradise Object Bind Group"),
        layout: &pipelines.object_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: object_uniforms.binding(),
        }],
    })
}

impl RasterDevice for Renderer {
    type Error = GpuError;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, GpuError> {
        let handle = MeshHandle(self.meshes.len() as u32);
        let label = format!("Paradise Mesh {}", handle.0);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let gpu_mesh = GpuMesh::upload(&self.device, &label, mesh);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::Validation(err.to_string()));
        }

        self.meshes.push(gpu_mesh);
        Ok(handle)
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        self.commands.push(Command::Clear { flags, color });
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.commands.push(Command::State(state));
    }

    fn set_camera(&mut self, camera: &CameraUniforms) {
        self.camera_offset = Some(self.camera_uniforms.push(camera));
    }

    fn set_lights(&mut self, lights: &LightUniforms) {
        self.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(lights));
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), GpuError> {
        if call.mesh.0 as usize >= self.meshes.len() {
            return Err(GpuError::UnknownMesh(call.mesh));
        }
        let camera_offset = self.camera_offset.ok_or(GpuError::MissingCamera)?;
        let object_offset = self.object_uniforms.push(&call.object);
        self.commands.push(Command::Draw {
            mesh: call.mesh,
            camera_offset,
            object_offset,
        });
        Ok(())
    }
}
