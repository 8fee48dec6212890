use std::num::NonZeroU64;

use paradise_core::{
    CameraUniforms, CompareFunction, LightUniforms, ObjectUniforms, RasterState, StencilOperation,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::renderer::mesh::vertex_layout;

/// Shader, layouts and one render pipeline per distinct [`RasterState`].
#[derive(Debug)]
pub struct ScenePipelines {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    pub object_bind_group_layout: wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    cache: FxHashMap<RasterState, wgpu::RenderPipeline>,
}

impl ScenePipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../../assets/shaders/scene.wgsl"
                ))
                .into(),
            ),
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Camera Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: uniform_size::<CameraUniforms>(),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: uniform_size::<LightUniforms>(),
                        },
                        count: None,
                    },
                ],
            });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Object Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: uniform_size::<ObjectUniforms>(),
                    },
                    count: None,
                }],
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        Self {
            shader,
            layout,
            camera_bind_group_layout,
            object_bind_group_layout,
            color_format,
            depth_format,
            cache: FxHashMap::default(),
        }
    }

    /// Builds the pipeline for `state` unless it is already cached.
    pub fn prepare(&mut self, device: &wgpu::Device, state: RasterState) {
        if self.cache.contains_key(&state) {
            return;
        }

        let color_writes = if state.color_write {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: color_writes,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Portal quads are seen from both sides.
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(depth_stencil_state(self.depth_format, &state)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        debug!("Created scene pipeline for {state:?}");
        self.cache.insert(state, pipeline);
    }

    pub fn get(&self, state: &RasterState) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(state)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

fn uniform_size<T>() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<T>() as u64)
}

pub fn depth_stencil_state(
    format: wgpu::TextureFormat,
    state: &RasterState,
) -> wgpu::DepthStencilState {
    let stencil = match state.stencil {
        Some(test) => {
            let face = wgpu::StencilFaceState {
                compare: compare_function(test.compare),
                fail_op: stencil_operation(test.fail_op),
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: stencil_operation(test.pass_op),
            };
            wgpu::StencilState {
                front: face,
                back: face,
                read_mask: test.read_mask,
                write_mask: test.write_mask,
            }
        }
        None => wgpu::StencilState::default(),
    };

    wgpu::DepthStencilState {
        format,
        depth_write_enabled: state.depth_write,
        depth_compare: if state.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil,
        bias: wgpu::DepthBiasState::default(),
    }
}

fn compare_function(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

fn stencil_operation(operation: StencilOperation) -> wgpu::StencilOperation {
    match operation {
        StencilOperation::Keep => wgpu::StencilOperation::Keep,
        StencilOperation::Zero => wgpu::StencilOperation::Zero,
        StencilOperation::Replace => wgpu::StencilOperation::Replace,
        StencilOperation::Invert => wgpu::StencilOperation::Invert,
        StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
        StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
        StencilOperation::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOperation::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
    }
}

#[cfg(test)]
mod tests {
    use paradise_core::RasterState;

    use super::depth_stencil_state;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    #[test]
    fn opaque_state_tests_and_writes_depth_without_stencil() {
        let state = depth_stencil_state(FORMAT, &RasterState::OPAQUE);
        assert!(state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Less);
        assert!(!state.stencil.is_enabled());
    }

    #[test]
    fn stencil_mark_always_fails_into_increment() {
        let state = depth_stencil_state(FORMAT, &RasterState::STENCIL_MARK);
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::Never);
        assert_eq!(
            state.stencil.front.fail_op,
            wgpu::StencilOperation::IncrementClamp
        );
        assert_eq!(state.stencil.front, state.stencil.back);
    }

    #[test]
    fn portal_interior_reads_stencil_without_writing() {
        let state = depth_stencil_state(FORMAT, &RasterState::PORTAL_INTERIOR);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(state.stencil.write_mask, 0);
        assert_eq!(state.stencil.read_mask, 0xff);
        assert!(state.depth_write_enabled);
    }

    #[test]
    fn unmark_decrements_on_match() {
        let state = depth_stencil_state(FORMAT, &RasterState::STENCIL_UNMARK);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::NotEqual);
        assert_eq!(
            state.stencil.front.fail_op,
            wgpu::StencilOperation::DecrementClamp
        );
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Less);
    }
}
