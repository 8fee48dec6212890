use glam::{Mat3, Quat, Vec2, Vec3, Vec4};

use crate::gl_math::{sign, EPSILON};
use crate::matrix::euler_from_rotation;

pub trait VectorExt: Copy {
    fn magnitude(self) -> f32;

    /// Unit vector, or zero when the magnitude is below [`EPSILON`].
    fn normalized(self) -> Self;

    fn normalize_in_place(&mut self) -> &mut Self;

    fn negative(self) -> Self;
}

macro_rules! impl_vector_ext {
    ($ty:ty) => {
        impl VectorExt for $ty {
            fn magnitude(self) -> f32 {
                self.length()
            }

            fn normalized(self) -> Self {
                let length = self.length();
                if length < EPSILON {
                    return <$ty>::ZERO;
                }
                self * (1.0 / length)
            }

            fn normalize_in_place(&mut self) -> &mut Self {
                *self = self.normalized();
                self
            }

            fn negative(self) -> Self {
                -self
            }
        }
    };
}

impl_vector_ext!(Vec2);
impl_vector_ext!(Vec3);
impl_vector_ext!(Vec4);

/// Sign of `dot(depended - control, normal)`: `1` when `depended` is in front of the plane.
pub fn side(depended: Vec3, control: Vec3, normal: Vec3) -> f32 {
    sign((depended - control).dot(normal))
}

pub fn distance(a: Vec3, b: Vec3) -> f32 {
    (a - b).length()
}

pub fn angle(a: Vec3, b: Vec3) -> f32 {
    let magnitude = a.length() * b.length();
    if magnitude < EPSILON {
        return 0.0;
    }
    (a.dot(b) / magnitude).clamp(-1.0, 1.0).acos()
}

pub fn quaternion_to_euler(q: Quat) -> Vec3 {
    euler_from_rotation(&Mat3::from_quat(q.normalize()))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::{Quat, Vec2, Vec3, Vec4};

    use super::{angle, distance, quaternion_to_euler, side, VectorExt};
    use crate::matrix::Matrix4;
    use crate::transform::Transform;

    #[test]
    fn normalized_has_unit_length() {
        let samples = [
            Vec3::new(3.0, -4.0, 12.0),
            Vec3::new(1.0e-3, 0.0, 0.0),
            Vec3::new(-250.0, 17.5, 0.125),
        ];
        for v in samples {
            assert!((v.normalized().magnitude() - 1.0).abs() < 1.0e-5);
        }
        assert!((Vec4::new(1.0, 2.0, 3.0, 4.0).normalized().magnitude() - 1.0).abs() < 1.0e-5);
        assert!((Vec2::new(0.0, -9.0).normalized() - Vec2::new(0.0, -1.0)).length() < 1.0e-6);
    }

    #[test]
    fn normalized_near_zero_is_zero() {
        assert_eq!(Vec3::new(1.0e-7, 0.0, -1.0e-7).normalized(), Vec3::ZERO);
        assert_eq!(Vec4::ZERO.normalized(), Vec4::ZERO);

        let mut v = Vec3::new(0.0, 5.0, 0.0);
        v.normalize_in_place();
        assert_eq!(v, Vec3::Y);
    }

    #[test]
    fn side_reports_plane_half_space() {
        let portal = Vec3::ZERO;
        let normal = Vec3::Z;
        assert_eq!(side(Vec3::new(0.0, 0.0, 2.0), portal, normal), 1.0);
        assert_eq!(side(Vec3::new(0.0, 0.0, -2.0), portal, normal), -1.0);
        assert_eq!(side(Vec3::new(4.0, 1.0, 0.0), portal, normal), 0.0);
    }

    #[test]
    fn angle_and_distance() {
        assert!((angle(Vec3::X, Vec3::Y) - FRAC_PI_2).abs() < 1.0e-6);
        assert_eq!(angle(Vec3::ZERO, Vec3::Y), 0.0);
        assert!((distance(Vec3::new(1.0, 2.0, 2.0), Vec3::ZERO) - 3.0).abs() < 1.0e-6);
    }

    #[test]
    fn quaternion_euler_matches_matrix_rotation() {
        let q = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3);
        let euler = quaternion_to_euler(q);
        let transform = Transform::new(Vec3::ZERO, euler, Vec3::ONE);
        let from_euler = Matrix4::from_transform(&transform, false);
        let from_quat = Matrix4::from(glam::Mat4::from_quat(q));
        assert!(from_euler.approx_eq(&from_quat, 1.0e-5));
    }
}
