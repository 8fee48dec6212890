use std::ops::{Mul, MulAssign};

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::error::MathError;
use crate::gl_math::{clamp_unit, sign, EPSILON};
use crate::transform::Transform;

/// Below this the determinant is treated as zero by [`Matrix4::try_inverse`].
const SINGULAR_DETERMINANT: f32 = 1.0e-12;
const GIMBAL_LOCK_THRESHOLD: f32 = 1.0 - 1.0e-6;

/// 4x4 matrix stored column-major, `entries[column * 4 + row]`, the layout
/// uniform buffers expect.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix4 {
    pub entries: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        entries: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const ZERO: Self = Self { entries: [0.0; 16] };

    pub fn new(entries: [f32; 16]) -> Self {
        Self { entries }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn at(&self, row: usize, column: usize) -> f32 {
        self.entries[column * 4 + row]
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.entries[12], self.entries[13], self.entries[14])
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(
            self.get_column(0).truncate().length(),
            self.get_column(1).truncate().length(),
            self.get_column(2).truncate().length(),
        )
    }

    pub fn rotation(&self) -> Vec3 {
        let size = self.size();
        let safe = |s: f32| if s.abs() < EPSILON { 1.0 } else { s };
        let rotation = Mat3::from_cols(
            self.get_column(0).truncate() / safe(size.x),
            self.get_column(1).truncate() / safe(size.y),
            self.get_column(2).truncate() / safe(size.z),
        );
        euler_from_rotation(&rotation)
    }

    pub fn to_transform(&self) -> Transform {
        Transform::new(self.position(), self.rotation(), self.size())
    }

    pub fn write_to_transform(&self, transform: &mut Transform) {
        transform.position = self.position();
        transform.scale = self.size();
        transform.rotation = self.rotation();
    }

    pub fn get_row(&self, row: usize) -> Vec4 {
        Vec4::new(
            self.entries[row],
            self.entries[4 + row],
            self.entries[8 + row],
            self.entries[12 + row],
        )
    }

    pub fn set_row(&mut self, row: usize, v: Vec4) -> &mut Self {
        self.entries[row] = v.x;
        self.entries[4 + row] = v.y;
        self.entries[8 + row] = v.z;
        self.entries[12 + row] = v.w;
        self
    }

    pub fn get_column(&self, column: usize) -> Vec4 {
        let base = column * 4;
        Vec4::new(
            self.entries[base],
            self.entries[base + 1],
            self.entries[base + 2],
            self.entries[base + 3],
        )
    }

    pub fn set_column(&mut self, column: usize, v: Vec4) -> &mut Self {
        let base = column * 4;
        self.entries[base] = v.x;
        self.entries[base + 1] = v.y;
        self.entries[base + 2] = v.z;
        self.entries[base + 3] = v.w;
        self
    }

    pub fn transpose(&self) -> Self {
        let e = &self.entries;
        Self::new([
            e[0], e[4], e[8], e[12], //
            e[1], e[5], e[9], e[13], //
            e[2], e[6], e[10], e[14], //
            e[3], e[7], e[11], e[15],
        ])
    }

    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        Mat4::from(*self).to_cols_array_2d()
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.entries
            .iter()
            .zip(other.entries.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    pub fn is_finite(&self) -> bool {
        self.entries.iter().all(|e| e.is_finite())
    }

    pub fn product(a: &Self, b: &Self) -> Self {
        let a = &a.entries;
        let b = &b.entries;
        let mut out = [0.0; 16];
        for column in 0..4 {
            for row in 0..4 {
                out[column * 4 + row] = a[row] * b[column * 4]
                    + a[4 + row] * b[column * 4 + 1]
                    + a[8 + row] * b[column * 4 + 2]
                    + a[12 + row] * b[column * 4 + 3];
            }
        }
        Self::new(out)
    }

    pub fn multiply(&mut self, m: &Self) -> &mut Self {
        *self = Self::product(self, m);
        self
    }

    pub fn multiply_vector4(&self, v: Vec4) -> Vec4 {
        Vec4::new(
            self.get_row(0).dot(v),
            self.get_row(1).dot(v),
            self.get_row(2).dot(v),
            self.get_row(3).dot(v),
        )
    }

    pub fn transform_direction(&self, v: Vec3) -> Vec3 {
        self.multiply_vector4(v.extend(0.0)).truncate()
    }

    pub fn transform_point(&self, v: Vec3) -> Vec3 {
        let p = self.multiply_vector4(v.extend(1.0));
        p.truncate() * (1.0 / p.w)
    }

    /// General inverse by cofactor expansion. A singular matrix yields
    /// non-finite entries; use [`Matrix4::try_inverse`] where that matters.
    pub fn inverse(&self) -> Self {
        let (adjugate, determinant) = self.adjugate_and_determinant();
        let d = 1.0 / determinant;
        Self::new(adjugate.map(|entry| entry * d))
    }

    pub fn try_inverse(&self) -> Result<Self, MathError> {
        let (adjugate, determinant) = self.adjugate_and_determinant();
        if !determinant.is_finite() || determinant.abs() < SINGULAR_DETERMINANT {
            return Err(MathError::SingularMatrix { determinant });
        }
        let d = 1.0 / determinant;
        Ok(Self::new(adjugate.map(|entry| entry * d)))
    }

    pub fn determinant(&self) -> f32 {
        self.adjugate_and_determinant().1
    }

    fn adjugate_and_determinant(&self) -> ([f32; 16], f32) {
        let [m00, m01, m02, m03, m10, m11, m12, m13, m20, m21, m22, m23, m30, m31, m32, m33] =
            self.entries;

        let tmp0 = m22 * m33;
        let tmp1 = m32 * m23;
        let tmp2 = m12 * m33;
        let tmp3 = m32 * m13;
        let tmp4 = m12 * m23;
        let tmp5 = m22 * m13;
        let tmp6 = m02 * m33;
        let tmp7 = m32 * m03;
        let tmp8 = m02 * m23;
        let tmp9 = m22 * m03;
        let tmp10 = m02 * m13;
        let tmp11 = m12 * m03;
        let tmp12 = m20 * m31;
        let tmp13 = m30 * m21;
        let tmp14 = m10 * m31;
        let tmp15 = m30 * m11;
        let tmp16 = m10 * m21;
        let tmp17 = m20 * m11;
        let tmp18 = m00 * m31;
        let tmp19 = m30 * m01;
        let tmp20 = m00 * m21;
        let tmp21 = m20 * m01;
        let tmp22 = m00 * m11;
        let tmp23 = m10 * m01;

        let t0 = tmp0 * m11 + tmp3 * m21 + tmp4 * m31 - (tmp1 * m11 + tmp2 * m21 + tmp5 * m31);
        let t1 = tmp1 * m01 + tmp6 * m21 + tmp9 * m31 - (tmp0 * m01 + tmp7 * m21 + tmp8 * m31);
        let t2 = tmp2 * m01 + tmp7 * m11 + tmp10 * m31 - (tmp3 * m01 + tmp6 * m11 + tmp11 * m31);
        let t3 = tmp5 * m01 + tmp8 * m11 + tmp11 * m21 - (tmp4 * m01 + tmp9 * m11 + tmp10 * m21);

        let determinant = m00 * t0 + m10 * t1 + m20 * t2 + m30 * t3;

        let adjugate = [
            t0,
            t1,
            t2,
            t3,
            tmp1 * m10 + tmp2 * m20 + tmp5 * m30 - (tmp0 * m10 + tmp3 * m20 + tmp4 * m30),
            tmp0 * m00 + tmp7 * m20 + tmp8 * m30 - (tmp1 * m00 + tmp6 * m20 + tmp9 * m30),
            tmp3 * m00 + tmp6 * m10 + tmp11 * m30 - (tmp2 * m00 + tmp7 * m10 + tmp10 * m30),
            tmp4 * m00 + tmp9 * m10 + tmp10 * m20 - (tmp5 * m00 + tmp8 * m10 + tmp11 * m20),
            tmp12 * m13 + tmp15 * m23 + tmp16 * m33 - (tmp13 * m13 + tmp14 * m23 + tmp17 * m33),
            tmp13 * m03 + tmp18 * m23 + tmp21 * m33 - (tmp12 * m03 + tmp19 * m23 + tmp20 * m33),
            tmp14 * m03 + tmp19 * m13 + tmp22 * m33 - (tmp15 * m03 + tmp18 * m13 + tmp23 * m33),
            tmp17 * m03 + tmp20 * m13 + tmp23 * m23 - (tmp16 * m03 + tmp21 * m13 + tmp22 * m23),
            tmp14 * m22 + tmp17 * m32 + tmp13 * m12 - (tmp16 * m32 + tmp12 * m12 + tmp15 * m22),
            tmp20 * m32 + tmp12 * m02 + tmp19 * m22 - (tmp18 * m22 + tmp21 * m32 + tmp13 * m02),
            tmp18 * m12 + tmp23 * m32 + tmp15 * m02 - (tmp22 * m32 + tmp14 * m02 + tmp19 * m12),
            tmp22 * m22 + tmp16 * m02 + tmp21 * m12 - (tmp20 * m12 + tmp23 * m22 + tmp17 * m02),
        ];

        (adjugate, determinant)
    }

    /// Right-handed perspective projection with depth mapped to `[0, 1]`.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = (std::f32::consts::FRAC_PI_2 - 0.5 * fov_y).tan();
        let range_inv = 1.0 / (near - far);

        Self::new([
            f / aspect, 0.0, 0.0, 0.0, //
            0.0, f, 0.0, 0.0, //
            0.0, 0.0, far * range_inv, -1.0, //
            0.0, 0.0, near * far * range_inv, 0.0,
        ])
    }

    /// World matrix of an observer at `eye` facing `target` (looking down its local -Z).
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (eye - target).normalize_or_zero();
        let right = up.cross(forward).normalize_or_zero();
        let y = forward.cross(right).normalize_or_zero();

        Self::new([
            right.x, right.y, right.z, 0.0, //
            y.x, y.y, y.z, 0.0, //
            forward.x, forward.y, forward.z, 0.0, //
            eye.x, eye.y, eye.z, 1.0,
        ])
    }

    pub fn translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.entries[12] = v.x;
        m.entries[13] = v.y;
        m.entries[14] = v.z;
        m
    }

    pub fn rotation_x(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn rotation_y(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new([
            c, s, 0.0, 0.0, //
            -s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn scaling(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.entries[0] = v.x;
        m.entries[5] = v.y;
        m.entries[10] = v.z;
        m
    }

    pub fn translate(&mut self, v: Vec3) -> &mut Self {
        self.multiply(&Self::translation(v))
    }

    pub fn rotate_x(&mut self, radians: f32) -> &mut Self {
        self.multiply(&Self::rotation_x(radians))
    }

    pub fn rotate_y(&mut self, radians: f32) -> &mut Self {
        self.multiply(&Self::rotation_y(radians))
    }

    pub fn rotate_z(&mut self, radians: f32) -> &mut Self {
        self.multiply(&Self::rotation_z(radians))
    }

    pub fn rotate(&mut self, euler: Vec3) -> &mut Self {
        self.rotate_x(euler.x).rotate_y(euler.y).rotate_z(euler.z)
    }

    pub fn scale(&mut self, v: Vec3) -> &mut Self {
        self.multiply(&Self::scaling(v))
    }

    /// Closed-form `T · Rx·Ry·Rz · S`, or with `inverse` its inverse
    /// `S⁻¹ · (Rx·Ry·Rz)ᵀ · T⁻¹`, without composing or inverting matrices.
    pub fn from_transform(transform: &Transform, inverse: bool) -> Self {
        let Transform {
            position: t,
            rotation,
            scale,
        } = *transform;

        let (s, c) = rotation.x.sin_cos();
        let (b, a) = rotation.y.sin_cos();
        let (w, q) = rotation.z.sin_cos();

        let bs = b * s;
        let cq = c * q;
        let cw = c * w;

        // Rotation rows of Rx·Ry·Rz.
        let r00 = a * q;
        let r01 = -a * w;
        let r02 = b;
        let r10 = cw + bs * q;
        let r11 = cq - bs * w;
        let r12 = -s * a;
        let r20 = s * w - cq * b;
        let r21 = s * q + cw * b;
        let r22 = c * a;

        if inverse {
            let (i, o, p) = (1.0 / scale.x, 1.0 / scale.y, 1.0 / scale.z);

            let m00 = r00 * i;
            let m10 = r01 * o;
            let m20 = r02 * p;
            let m01 = r10 * i;
            let m11 = r11 * o;
            let m21 = r12 * p;
            let m02 = r20 * i;
            let m12 = r21 * o;
            let m22 = r22 * p;

            Self::new([
                m00, m10, m20, 0.0, //
                m01, m11, m21, 0.0, //
                m02, m12, m22, 0.0, //
                -(m00 * t.x + m01 * t.y + m02 * t.z),
                -(m10 * t.x + m11 * t.y + m12 * t.z),
                -(m20 * t.x + m21 * t.y + m22 * t.z),
                1.0,
            ])
        } else {
            Self::new([
                r00 * scale.x, r10 * scale.x, r20 * scale.x, 0.0, //
                r01 * scale.y, r11 * scale.y, r21 * scale.y, 0.0, //
                r02 * scale.z, r12 * scale.z, r22 * scale.z, 0.0, //
                t.x, t.y, t.z, 1.0,
            ])
        }
    }

    /// Replaces the near plane of a perspective projection with `clip_plane`
    /// (camera space, `(nx, ny, nz, d)`), keeping its positive half-space.
    /// The camera must lie on the plane's negative side.
    pub fn clip_projection(&mut self, clip_plane: Vec4) -> &mut Self {
        let e = &mut self.entries;
        let corner = Vec4::new(
            (sign(clip_plane.x) + e[8]) / e[0],
            (sign(clip_plane.y) + e[9]) / e[5],
            -1.0,
            (1.0 + e[10]) / e[14],
        );
        let denominator = clip_plane.dot(corner);
        if denominator.abs() < EPSILON || !denominator.is_finite() {
            return self;
        }

        let row = clip_plane * (1.0 / denominator);
        e[2] = row.x;
        e[6] = row.y;
        e[10] = row.z;
        e[14] = row.w;
        self
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Self) -> Self::Output {
        Matrix4::product(&self, &rhs)
    }
}

impl MulAssign for Matrix4 {
    fn mul_assign(&mut self, rhs: Self) {
        self.multiply(&rhs);
    }
}

impl From<Mat4> for Matrix4 {
    fn from(m: Mat4) -> Self {
        Self::new(m.to_cols_array())
    }
}

impl From<Matrix4> for Mat4 {
    fn from(m: Matrix4) -> Self {
        Mat4::from_cols_array(&m.entries)
    }
}

/// Euler angles `(x, y, z)` such that `rotation == Rx(x)·Ry(y)·Rz(z)`.
pub fn euler_from_rotation(rotation: &Mat3) -> Vec3 {
    // Mat3 columns: x_axis = column 0, so row r / column c is col(c)[r].
    let r00 = rotation.x_axis.x;
    let r01 = rotation.y_axis.x;
    let r02 = rotation.z_axis.x;
    let r10 = rotation.x_axis.y;
    let r11 = rotation.y_axis.y;
    let r12 = rotation.z_axis.y;
    let r22 = rotation.z_axis.z;

    let y = clamp_unit(r02).asin();
    if r02.abs() < GIMBAL_LOCK_THRESHOLD {
        Vec3::new((-r12).atan2(r22), y, (-r01).atan2(r00))
    } else {
        Vec3::new((r10 * sign(r02)).atan2(r11), y, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use glam::{Mat4, Vec3, Vec4};

    use super::Matrix4;
    use crate::transform::Transform;

    fn sample_transforms() -> Vec<Transform> {
        vec![
            Transform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.3, -0.7, 1.1), Vec3::ONE),
            Transform::new(
                Vec3::new(-4.0, 0.5, 9.0),
                Vec3::new(-1.2, 0.4, -2.5),
                Vec3::new(2.0, 0.5, 3.0),
            ),
            Transform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, PI, 0.0), Vec3::splat(0.25)),
            Transform::new(Vec3::ZERO, Vec3::new(0.05, 2.9, -0.6), Vec3::new(-1.0, 1.5, 1.0)),
        ]
    }

    #[test]
    fn product_matches_glam() {
        let a = Matrix4::from_transform(&sample_transforms()[0], false);
        let b = Matrix4::perspective(1.1, 1.5, 0.1, 50.0);
        let expected = Matrix4::from(Mat4::from(a) * Mat4::from(b));
        assert!(Matrix4::product(&a, &b).approx_eq(&expected, 1.0e-5));

        let mut chained = a;
        chained.multiply(&b);
        assert_eq!(chained, Matrix4::product(&a, &b));
    }

    #[test]
    fn multiply_by_inverse_is_identity() {
        for transform in sample_transforms() {
            let m = Matrix4::from_transform(&transform, false);
            let mut product = m;
            product.multiply(&m.inverse());
            assert!(product.approx_eq(&Matrix4::IDENTITY, 1.0e-4), "{product:?}");
        }

        let projection = Matrix4::perspective(1.2, 1.7, 0.05, 300.0);
        let mut product = projection;
        product.multiply(&projection.inverse());
        assert!(product.approx_eq(&Matrix4::IDENTITY, 1.0e-4));
    }

    #[test]
    fn try_inverse_rejects_singular_matrix() {
        let singular = Matrix4::scaling(Vec3::new(1.0, 0.0, 1.0));
        assert!(singular.try_inverse().is_err());
        assert!(!singular.inverse().is_finite());
        assert!(Matrix4::IDENTITY.try_inverse().is_ok());
    }

    #[test]
    fn closed_form_view_matches_generic_inverse() {
        for transform in sample_transforms() {
            let view = Matrix4::from_transform(&transform, true);
            let inverted = Matrix4::from_transform(&transform, false).inverse();
            assert!(view.approx_eq(&inverted, 1.0e-4), "{view:?} vs {inverted:?}");
        }
    }

    #[test]
    fn closed_form_world_matches_composed_matrices() {
        let transform = sample_transforms()[1];
        let mut composed = Matrix4::translation(transform.position);
        composed.rotate(transform.rotation).scale(transform.scale);
        assert!(Matrix4::from_transform(&transform, false).approx_eq(&composed, 1.0e-5));
    }

    #[test]
    fn to_transform_round_trips() {
        for transform in sample_transforms().into_iter().take(3) {
            let m = Matrix4::from_transform(&transform, false);
            let mut decomposed = Transform::default();
            m.write_to_transform(&mut decomposed);
            let rebuilt = Matrix4::from_transform(&decomposed, false);
            assert!(rebuilt.approx_eq(&m, 1.0e-4), "{rebuilt:?} vs {m:?}");
        }
    }

    #[test]
    fn to_transform_handles_gimbal_lock() {
        let transform = Transform::new(
            Vec3::new(1.0, -1.0, 2.0),
            Vec3::new(0.4, PI * 0.5, 0.0),
            Vec3::ONE,
        );
        let m = Matrix4::from_transform(&transform, false);
        let rebuilt = Matrix4::from_transform(&m.to_transform(), false);
        assert!(rebuilt.approx_eq(&m, 1.0e-4));
    }

    #[test]
    fn perspective_matches_glam_rh() {
        let ours = Matrix4::perspective(1.0, 16.0 / 9.0, 0.1, 100.0);
        let glam = Matrix4::from(Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0));
        assert!(ours.approx_eq(&glam, 1.0e-5));
    }

    #[test]
    fn clip_projection_with_near_plane_is_unchanged() {
        let near = 0.1;
        let projection = Matrix4::perspective(1.2, 1.3, near, 250.0);
        let mut clipped = projection;
        clipped.clip_projection(Vec4::new(0.0, 0.0, -1.0, -near));
        assert!(clipped.approx_eq(&projection, 1.0e-4), "{clipped:?}");
    }

    #[test]
    fn clip_projection_moves_near_plane_to_portal() {
        let mut projection = Matrix4::perspective(1.0, 1.0, 0.1, 100.0);
        // Plane z = -5 facing away from the camera.
        projection.clip_projection(Vec4::new(0.0, 0.0, -1.0, -5.0));

        let on_plane = projection.multiply_vector4(Vec4::new(0.3, -0.2, -5.0, 1.0));
        assert!((on_plane.z / on_plane.w).abs() < 1.0e-4);

        let in_front = projection.multiply_vector4(Vec4::new(0.0, 0.0, -2.0, 1.0));
        assert!(in_front.z / in_front.w < 0.0);

        let beyond = projection.multiply_vector4(Vec4::new(0.0, 0.0, -20.0, 1.0));
        let depth = beyond.z / beyond.w;
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn rotation_primitives_are_right_handed() {
        let m = Matrix4::rotation_y(PI * 0.5);
        assert!((m.transform_direction(Vec3::Z) - Vec3::X).length() < 1.0e-6);
        let m = Matrix4::rotation_x(PI * 0.5);
        assert!((m.transform_direction(Vec3::Y) - Vec3::Z).length() < 1.0e-6);
        let m = Matrix4::rotation_z(PI * 0.5);
        assert!((m.transform_direction(Vec3::X) - Vec3::Y).length() < 1.0e-6);
    }

    #[test]
    fn look_at_faces_target_down_negative_z() {
        let m = Matrix4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let facing = m.transform_direction(Vec3::NEG_Z);
        assert!((facing - Vec3::NEG_Z).length() < 1.0e-6);
        assert_eq!(m.position(), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn rows_and_columns() {
        let mut m = Matrix4::IDENTITY;
        m.set_row(2, Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(m.get_row(2), Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(m.at(2, 3), 4.0);
        assert_eq!(m.transpose().get_column(2), Vec4::new(1.0, 2.0, 3.0, 4.0));
        m.set_column(3, Vec4::new(5.0, 6.0, 7.0, 1.0));
        assert_eq!(m.position(), Vec3::new(5.0, 6.0, 7.0));
    }
}
