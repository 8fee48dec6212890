use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Metallic-roughness surface parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub base_color: Vec3,
    pub roughness: f32,
    pub metallic: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            roughness: 0.5,
            metallic: 0.0,
        }
    }
}

impl Material {
    pub fn sanitize(&mut self) {
        self.base_color = self.base_color.clamp(Vec3::ZERO, Vec3::ONE);
        self.roughness = self.roughness.clamp(0.0, 1.0);
        self.metallic = self.metallic.clamp(0.0, 1.0);
    }
}
