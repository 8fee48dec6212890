use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use paradise_math::Matrix4;

use crate::camera::CameraUniforms;
use crate::light::LightUniforms;
use crate::material::Material;
use crate::mesh::MeshData;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR   = 0b0000_0001;
        const DEPTH   = 0b0000_0010;
        const STENCIL = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    Invert,
    IncrementClamp,
    DecrementClamp,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilTest {
    pub compare: CompareFunction,
    pub reference: u32,
    pub fail_op: StencilOperation,
    pub pass_op: StencilOperation,
    pub read_mask: u32,
    pub write_mask: u32,
}

/// Fixed-function state for subsequent draws. `depth_test: false` means
/// every fragment passes the depth test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub color_write: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub stencil: Option<StencilTest>,
}

pub const PORTAL_STENCIL: u32 = 1;

impl RasterState {
    pub const OPAQUE: Self = Self {
        color_write: true,
        depth_write: true,
        depth_test: true,
        stencil: None,
    };

    /// Rasterizes a portal into the stencil buffer only.
    pub const STENCIL_MARK: Self = Self {
        color_write: false,
        depth_write: false,
        depth_test: false,
        stencil: Some(StencilTest {
            compare: CompareFunction::Never,
            reference: PORTAL_STENCIL,
            fail_op: StencilOperation::IncrementClamp,
            pass_op: StencilOperation::Keep,
            read_mask: 0xff,
            write_mask: 0xff,
        }),
    };

    /// Full shading restricted to the marked silhouette.
    pub const PORTAL_INTERIOR: Self = Self {
        color_write: true,
        depth_write: true,
        depth_test: true,
        stencil: Some(StencilTest {
            compare: CompareFunction::Equal,
            reference: PORTAL_STENCIL,
            fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            read_mask: 0xff,
            write_mask: 0x00,
        }),
    };

    pub const STENCIL_UNMARK: Self = Self {
        color_write: false,
        depth_write: false,
        depth_test: true,
        stencil: Some(StencilTest {
            compare: CompareFunction::NotEqual,
            reference: PORTAL_STENCIL,
            fail_op: StencilOperation::DecrementClamp,
            pass_op: StencilOperation::Keep,
            read_mask: 0xff,
            write_mask: 0xff,
        }),
    };

    pub const DEPTH_ONLY: Self = Self {
        color_write: false,
        depth_write: true,
        depth_test: true,
        stencil: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub world: Matrix4,
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
    pub dont_shade: u32,
    pub _padding: [u32; 2],
}

impl ObjectUniforms {
    pub fn new(world: Matrix4, material: &Material, dont_shade: bool) -> Self {
        Self {
            world,
            base_color: material.base_color.to_array(),
            roughness: material.roughness,
            metallic: material.metallic,
            dont_shade: u32::from(dont_shade),
            _padding: [0; 2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub object: ObjectUniforms,
}

/// Rasterizer the scene renderer drives. State set through these calls
/// persists until changed, like a classic immediate-mode context.
pub trait RasterDevice {
    type Error: std::error::Error + 'static;

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, Self::Error>;

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    fn set_raster_state(&mut self, state: RasterState);

    fn set_camera(&mut self, camera: &CameraUniforms);

    fn set_lights(&mut self, lights: &LightUniforms);

    fn draw(&mut self, call: &DrawCall) -> Result<(), Self::Error>;
}
