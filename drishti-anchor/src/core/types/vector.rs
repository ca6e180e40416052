//! 3D vector type used for positions, directions, and plane normals.

use serde::{Deserialize, Serialize};

use crate::core::math::VECTOR_EPS;

/// A 3D vector in meters (or unitless for directions).
///
/// Serializes as a plain `[f64; 3]` array, which is also the on-disk
/// representation of anchor positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 3]", from = "[f64; 3]")]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Unit X axis (device right).
    pub const UNIT_X: Vec3 = Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };

    /// Unit Y axis (device up).
    pub const UNIT_Y: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    /// Unit Z axis (device forward).
    pub const UNIT_Z: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// Create a new vector.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product `self × other`.
    #[inline]
    pub fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared length (avoids sqrt).
    #[inline]
    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` if the vector is
    /// degenerate (length below [`VECTOR_EPS`]).
    #[inline]
    pub fn try_normalized(&self) -> Option<Vec3> {
        let len = self.length();
        if len < VECTOR_EPS {
            return None;
        }
        Some(self.scale(1.0 / len))
    }

    /// Component-wise scale.
    #[inline]
    pub fn scale(&self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    /// Vector addition.
    #[inline]
    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Vector subtraction `self - other`.
    #[inline]
    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Negation.
    #[inline]
    pub fn neg(&self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }

    /// Angle to another vector in radians, in `[0, π]`.
    ///
    /// Uses `atan2(|a × b|, a · b)`, which stays well-conditioned for
    /// near-parallel and near-antiparallel inputs where `acos` loses
    /// precision.
    #[inline]
    pub fn angle_to(&self, other: &Vec3) -> f64 {
        self.cross(other).length().atan2(self.dot(other))
    }

    /// Whether any component is NaN.
    #[inline]
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(a: [f64; 3]) -> Self {
        Vec3::new(a[0], a[1], a[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}
