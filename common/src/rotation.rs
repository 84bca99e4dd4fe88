//! Axis rotations in degrees and the cutting-plane [`Orientation`].
//!
//! Rotations are applied one axis at a time rather than by concatenating
//! matrices, so the order of calls is significant.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Converts an angle in degrees of any magnitude into radians in `[0, 2π)`.
fn radians(degrees: f32) -> f32 {
    degrees.rem_euclid(360.0).to_radians()
}

/// Right-handed rotation about the X axis.
pub fn rotate_x(v: Vector3<f32>, degrees: f32) -> Vector3<f32> {
    let (sin, cos) = radians(degrees).sin_cos();
    Vector3::new(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos)
}

/// Right-handed rotation about the Y axis.
pub fn rotate_y(v: Vector3<f32>, degrees: f32) -> Vector3<f32> {
    let (sin, cos) = radians(degrees).sin_cos();
    Vector3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}

/// Right-handed rotation about the Z axis.
pub fn rotate_z(v: Vector3<f32>, degrees: f32) -> Vector3<f32> {
    let (sin, cos) = radians(degrees).sin_cos();
    Vector3::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z)
}

/// Rotation of the cutting-plane family, in degrees about each axis. The
/// planes are perpendicular to the Y axis of the frame produced by
/// [`Orientation::to_slice_frame`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Orientation {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Moves a model-space point into the slice-aligned frame: −z about Z,
    /// then −y about Y, then −x about X.
    pub fn to_slice_frame(&self, v: Vector3<f32>) -> Vector3<f32> {
        let v = rotate_z(v, -self.z);
        let v = rotate_y(v, -self.y);
        rotate_x(v, -self.x)
    }

    /// Inverse of [`Orientation::to_slice_frame`]: x about X, then y about Y,
    /// then z about Z.
    pub fn to_model_frame(&self, v: Vector3<f32>) -> Vector3<f32> {
        let v = rotate_x(v, self.x);
        let v = rotate_y(v, self.y);
        rotate_z(v, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vector3<f32>> for Orientation {
    fn from(value: Vector3<f32>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}
