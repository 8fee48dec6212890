pub mod error;
pub mod gl_math;
pub mod matrix;
pub mod transform;
pub mod vector;

pub use error::MathError;
pub use glam::{Mat3, Quat, Vec2, Vec3, Vec4};
pub use matrix::Matrix4;
pub use transform::Transform;
pub use vector::VectorExt;
