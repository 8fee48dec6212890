use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use paradise_math::{MathError, Matrix4, Transform, VectorExt};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub projection: Matrix4,
    pub view: Matrix4,
    pub position: [f32; 4],
}

impl CameraUniforms {
    pub fn new(projection: Matrix4, view: Matrix4, position: Vec3) -> Self {
        Self {
            projection,
            view,
            position: position.extend(1.0).to_array(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Matrix4,
}

impl Camera {
    pub const DEFAULT_FOV_Y: f32 = 70.0 * PI / 180.0;
    pub const DEFAULT_NEAR: f32 = 0.05;
    pub const DEFAULT_FAR: f32 = 500.0;

    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            transform: Transform::default(),
            fov_y,
            aspect,
            near,
            far,
            projection: Matrix4::perspective(fov_y, aspect, near, far),
        }
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn projection(&self) -> &Matrix4 {
        &self.projection
    }

    pub fn reset_projection(&mut self) {
        self.projection = Matrix4::perspective(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if !(aspect.is_finite() && aspect > 0.0) {
            return;
        }
        self.aspect = aspect;
        self.reset_projection();
    }

    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.fov_y = fov_y;
        self.reset_projection();
    }

    pub fn view_matrix(&self) -> Matrix4 {
        self.transform.view_matrix()
    }

    pub fn clipping_plane(plane: &Matrix4, view: &Matrix4, side: f32) -> Vec4 {
        let position = view.transform_point(plane.position());
        let forward = plane.get_column(2).truncate().normalized();
        let normal = (view.transform_direction(forward) * side).normalized();

        normal.extend(-position.dot(normal))
    }

    pub fn relative_mirror(&self, from: &Matrix4, to: &Matrix4) -> Result<Matrix4, MathError> {
        let mut mirror = self.view_matrix();
        mirror
            .multiply(from)
            .multiply(&Matrix4::rotation_y(PI))
            .multiply(&to.try_inverse()?);
        Ok(mirror)
    }

    pub fn uniforms(&self) -> CameraUniforms {
        CameraUniforms::new(self.projection, self.view_matrix(), self.transform.position)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FOV_Y, 1.0, Self::DEFAULT_NEAR, Self::DEFAULT_FAR)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use glam::{Vec3, Vec4};
    use paradise_math::{Matrix4, Transform};

    use super::Camera;

    #[test]
    fn projection_is_cached_until_reset() {
        let mut camera = Camera::new(1.0, 1.0, 0.1, 100.0);
        let before = *camera.projection();
        camera.transform.position = Vec3::new(3.0, 0.0, 0.0);
        assert_eq!(*camera.projection(), before);

        camera.set_aspect(2.0);
        assert_ne!(*camera.projection(), before);
        assert_eq!(*camera.projection(), Matrix4::perspective(1.0, 2.0, 0.1, 100.0));

        camera.set_aspect(0.0);
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn clipping_plane_in_camera_space() {
        let mut camera = Camera::default();
        camera.transform.position = Vec3::new(0.0, 0.0, 5.0);
        let portal = Matrix4::IDENTITY;

        let plane = Camera::clipping_plane(&portal, &camera.view_matrix(), -1.0);
        // Portal sits 5 units ahead of the camera, normal pointing away from it.
        assert!((plane - Vec4::new(0.0, 0.0, -1.0, -5.0)).length() < 1.0e-6);

        let degenerate = Camera::clipping_plane(&portal, &camera.view_matrix(), 0.0);
        assert_eq!(degenerate, Vec4::ZERO);
    }

    #[test]
    fn mirror_between_identical_frames_is_half_turn() {
        let camera = Camera::default();
        let frame = Transform::from_position(Vec3::new(2.0, 0.0, 1.0)).world_matrix();
        let mirror = camera.relative_mirror(&frame, &frame).unwrap();

        let expected = Matrix4::product(
            &Matrix4::product(&frame, &Matrix4::rotation_y(PI)),
            &frame.inverse(),
        );
        assert!(mirror.approx_eq(&expected, 1.0e-5));
    }

    #[test]
    fn mirror_rejects_singular_target() {
        let camera = Camera::default();
        let flat = Matrix4::scaling(Vec3::new(1.0, 1.0, 0.0));
        assert!(camera.relative_mirror(&Matrix4::IDENTITY, &flat).is_err());
    }
}
