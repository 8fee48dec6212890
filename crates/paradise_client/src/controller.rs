use glam::{Quat, Vec3};
use paradise_math::vector::quaternion_to_euler;
use paradise_math::{Transform, VectorExt};
use winit::keyboard::KeyCode;

use crate::input::InputState;

/// Mouse-look and WASD walking for a camera that looks down its local −Z.
///
/// Yaw and pitch are read back from the transform every update, so the
/// controller keeps working after a portal crossing rewrites the camera.
#[derive(Debug, Clone, Copy)]
pub struct FirstPersonController {
    /// World units per second.
    pub move_speed: f32,
    /// Radians per pixel of mouse travel.
    pub turn_speed: f32,
    pub pitch_limit: f32,
}

impl FirstPersonController {
    pub fn new(move_speed: f32, turn_speed: f32, pitch_limit: f32) -> Self {
        Self {
            move_speed,
            turn_speed,
            pitch_limit: pitch_limit.abs(),
        }
    }

    pub fn update(&self, transform: &mut Transform, input: &InputState, dt: f32) {
        self.update_look(transform, input);

        let direction = Self::movement_direction(transform, input);
        if direction != Vec3::ZERO {
            transform.position += direction * self.move_speed * dt.max(0.0);
        }
    }

    fn update_look(&self, transform: &mut Transform, input: &InputState) {
        if input.mouse_delta.length_squared() == 0.0 {
            return;
        }

        let look = transform.back();
        let mut pitch = look.y.clamp(-1.0, 1.0).asin();
        let mut yaw = (-look.x).atan2(-look.z);

        yaw -= input.mouse_delta.x * self.turn_speed;
        pitch -= input.mouse_delta.y * self.turn_speed;
        pitch = pitch.clamp(-self.pitch_limit, self.pitch_limit);

        let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch);
        transform.rotation = quaternion_to_euler(rotation);
    }

    fn movement_direction(transform: &Transform, input: &InputState) -> Vec3 {
        let ahead = transform.back_flat();
        let right = transform.right_flat();

        let mut direction = Vec3::ZERO;
        if input.is_pressed(KeyCode::KeyW) {
            direction += ahead;
        }
        if input.is_pressed(KeyCode::KeyS) {
            direction -= ahead;
        }
        if input.is_pressed(KeyCode::KeyD) {
            direction += right;
        }
        if input.is_pressed(KeyCode::KeyA) {
            direction -= right;
        }

        direction.normalized()
    }
}
