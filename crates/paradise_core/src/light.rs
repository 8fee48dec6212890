use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use paradise_math::VectorExt;

use crate::hierarchy::NodeId;

/// Upper bound on simultaneously shaded point lights.
pub const MAX_LIGHTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub node: NodeId,
    pub color: Vec3,
    /// Radiant power in watts.
    pub power: f32,
}

impl PointLight {
    pub fn scaled_color(&self) -> Vec3 {
        self.color.normalized() * self.power
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniforms {
    pub positions: [[f32; 4]; MAX_LIGHTS],
    pub colors: [[f32; 4]; MAX_LIGHTS],
    pub count: u32,
    pub _padding: [u32; 3],
}

impl Default for LightUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl LightUniforms {
    /// Packs `(world position, light)` pairs; unused slots stay black.
    pub fn pack<'a>(lights: impl IntoIterator<Item = (Vec3, &'a PointLight)>) -> Self {
        let mut uniforms = Self::default();
        for (slot, (position, light)) in lights.into_iter().take(MAX_LIGHTS).enumerate() {
            uniforms.positions[slot] = position.extend(1.0).to_array();
            uniforms.colors[slot] = light.scaled_color().extend(0.0).to_array();
            uniforms.count += 1;
        }
        uniforms
    }
}
