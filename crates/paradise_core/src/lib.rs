pub mod camera;
pub mod hierarchy;
pub mod light;
pub mod material;
pub mod mesh;
pub mod object;
pub mod portal;
pub mod raster;
pub mod renderer;
pub mod scene;

pub use camera::{Camera, CameraUniforms};
pub use hierarchy::{HierarchyError, NodeId, NodeTree, SceneNode};
pub use light::{LightUniforms, PointLight, MAX_LIGHTS};
pub use material::Material;
pub use mesh::{BoundingBox, MeshData, MeshError, Vertex};
pub use object::{MeshId, ObjectId, ObjectTag, RenderObject};
pub use portal::{LinkFrames, PortalFrame, PortalLink, PortalRegistry, PortalSide, TeleportEvent};
pub use raster::{
    ClearFlags, CompareFunction, DrawCall, MeshHandle, ObjectUniforms, RasterDevice, RasterState,
    StencilOperation, StencilTest,
};
pub use renderer::{RenderFrameStats, SceneRenderer};
pub use scene::{SceneBuildError, SceneDescription, SceneGraph, SceneWarning};
