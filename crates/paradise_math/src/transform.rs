use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::gl_math::EPSILON;
use crate::matrix::Matrix4;
use crate::vector::VectorExt;

/// Position, Euler rotation (radians, applied X then Y then Z) and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn world_matrix(&self) -> Matrix4 {
        Matrix4::from_transform(self, false)
    }

    /// Inverse of [`Transform::world_matrix`], built in closed form.
    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::from_transform(self, true)
    }

    fn rotation_basis(&self) -> Mat3 {
        let rotation = Transform::new(Vec3::ZERO, self.rotation, Vec3::ONE).world_matrix();
        Mat3::from_cols(
            rotation.get_column(0).truncate(),
            rotation.get_column(1).truncate(),
            rotation.get_column(2).truncate(),
        )
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_basis().z_axis
    }

    pub fn back(&self) -> Vec3 {
        -self.forward()
    }

    pub fn up(&self) -> Vec3 {
        self.rotation_basis().y_axis
    }

    pub fn down(&self) -> Vec3 {
        -self.up()
    }

    pub fn right(&self) -> Vec3 {
        self.rotation_basis().x_axis
    }

    pub fn left(&self) -> Vec3 {
        -self.right()
    }

    /// Forward projected onto the ground plane.
    pub fn forward_flat(&self) -> Vec3 {
        let forward = self.forward();
        Vec3::new(forward.x, 0.0, forward.z).normalized()
    }

    pub fn back_flat(&self) -> Vec3 {
        -self.forward_flat()
    }

    pub fn right_flat(&self) -> Vec3 {
        let right = self.right();
        Vec3::new(right.x, 0.0, right.z).normalized()
    }

    /// A transform whose matrix cannot be inverted or contains non-finite values.
    pub fn is_degenerate(&self) -> bool {
        !self.position.is_finite()
            || !self.rotation.is_finite()
            || !self.scale.is_finite()
            || self.scale.abs().min_element() < EPSILON
    }
}

impl From<Matrix4> for Transform {
    fn from(matrix: Matrix4) -> Self {
        matrix.to_transform()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use glam::Vec3;

    use super::Transform;
    use crate::matrix::Matrix4;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1.0e-5
    }

    #[test]
    fn identity_basis() {
        let t = Transform::default();
        assert_eq!(t.forward(), Vec3::Z);
        assert_eq!(t.up(), Vec3::Y);
        assert_eq!(t.right(), Vec3::X);
        assert_eq!(t.world_matrix(), Matrix4::IDENTITY);
    }

    #[test]
    fn yaw_turns_forward_about_up() {
        let t = Transform::new(Vec3::ZERO, Vec3::new(0.0, FRAC_PI_2, 0.0), Vec3::ONE);
        assert!(close(t.forward(), Vec3::X));
        assert!(close(t.right(), Vec3::NEG_Z));
        assert!(close(t.up(), Vec3::Y));

        let flipped = Transform::new(Vec3::ZERO, Vec3::new(0.0, PI, 0.0), Vec3::ONE);
        assert!(close(flipped.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn flat_vectors_ignore_pitch() {
        let t = Transform::new(Vec3::ZERO, Vec3::new(-0.4, 0.0, 0.0), Vec3::ONE);
        assert!(t.forward().y.abs() > 0.1);
        assert!(close(t.forward_flat(), Vec3::Z));
        assert!(close(t.back_flat(), Vec3::NEG_Z));
        assert!(close(t.right_flat(), Vec3::X));
    }

    #[test]
    fn view_matrix_inverts_world_matrix() {
        let t = Transform::new(
            Vec3::new(3.0, -1.0, 7.5),
            Vec3::new(0.2, -1.3, 0.8),
            Vec3::new(1.5, 2.0, 0.5),
        );
        let mut product = t.world_matrix();
        product.multiply(&t.view_matrix());
        assert!(product.approx_eq(&Matrix4::IDENTITY, 1.0e-4));
    }

    #[test]
    fn degenerate_scale_is_detected() {
        assert!(!Transform::default().is_degenerate());
        let squashed = Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        assert!(squashed.is_degenerate());
        let broken = Transform::from_position(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(broken.is_degenerate());
    }
}
