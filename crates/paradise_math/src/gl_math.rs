use std::f32::consts::PI;

/// Magnitudes below this are treated as zero.
pub const EPSILON: f32 = 1.0e-6;
pub const LUMENS_PER_WATT: f32 = 683.0;

pub fn to_radians(degrees: f32) -> f32 {
    degrees * (PI / 180.0)
}

pub fn to_degrees(radians: f32) -> f32 {
    radians * (180.0 / PI)
}

pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(-1.0, 1.0)
}

/// Sign with `sign(0) == 0`; NaN also maps to zero.
pub fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Horizontal field of view for a vertical one at the given aspect ratio.
pub fn to_horizontal_fov(vertical_fov: f32, aspect: f32) -> f32 {
    2.0 * ((vertical_fov * 0.5).tan() * aspect).atan()
}

/// Vertical field of view for a horizontal one at the given aspect ratio.
pub fn to_vertical_fov(horizontal_fov: f32, aspect: f32) -> f32 {
    2.0 * ((horizontal_fov * 0.5).tan() / aspect).atan()
}

/// Radiant power of an isotropic point light given its luminous intensity in candela.
pub fn candela_to_watts(intensity: f32) -> f32 {
    4.0 * PI * intensity / LUMENS_PER_WATT
}
