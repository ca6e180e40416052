//! Unit quaternion orientation type.

use serde::{Deserialize, Serialize};

use super::Vec3;
use crate::core::math::VECTOR_EPS;

/// Orientation as a unit quaternion, `(x, y, z)` imaginary + `w` real.
///
/// Serializes as `[x, y, z, w]`, which is also the on-disk representation
/// of anchor orientations. Constructors normalize; the algebra here assumes
/// unit length so that the conjugate is the exact inverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", from = "[f64; 4]")]
pub struct UnitQuat {
    /// Imaginary X component
    pub x: f64,
    /// Imaginary Y component
    pub y: f64,
    /// Imaginary Z component
    pub z: f64,
    /// Real component
    pub w: f64,
}

impl UnitQuat {
    /// Identity rotation.
    pub const IDENTITY: UnitQuat = UnitQuat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Build from raw components, normalizing. A degenerate (near-zero)
    /// input yields the identity.
    #[inline]
    pub fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Self {
        UnitQuat { x, y, z, w }.normalized()
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    pub fn from_axis_angle(axis: &Vec3, angle: f64) -> Self {
        match axis.try_normalized() {
            Some(a) => {
                let (s, c) = (angle * 0.5).sin_cos();
                UnitQuat {
                    x: a.x * s,
                    y: a.y * s,
                    z: a.z * s,
                    w: c,
                }
            }
            None => UnitQuat::IDENTITY,
        }
    }

    /// Renormalized copy. Degenerate input yields the identity.
    #[inline]
    pub fn normalized(&self) -> UnitQuat {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len < VECTOR_EPS {
            return UnitQuat::IDENTITY;
        }
        let inv = 1.0 / len;
        UnitQuat {
            x: self.x * inv,
            y: self.y * inv,
            z: self.z * inv,
            w: self.w * inv,
        }
    }

    /// Hamilton product `self * other` (apply `other` first, then `self`).
    #[inline]
    pub fn mul(&self, other: &UnitQuat) -> UnitQuat {
        UnitQuat {
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        }
    }

    /// Conjugate; for a unit quaternion this is the inverse rotation.
    #[inline]
    pub fn conjugate(&self) -> UnitQuat {
        UnitQuat {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Rotate a vector by this quaternion.
    ///
    /// Uses `v' = v + 2w(q_v × v) + 2(q_v × (q_v × v))`.
    #[inline]
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v).scale(2.0);
        v.add(&t.scale(self.w)).add(&qv.cross(&t))
    }

    /// Quaternion dot product. Same rotation iff `|dot| ≈ 1` for unit
    /// quaternions (q and -q represent the same rotation).
    #[inline]
    pub fn dot(&self, other: &UnitQuat) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Whether this quaternion and `other` encode the same rotation,
    /// up to sign, within `epsilon`.
    #[inline]
    pub fn same_rotation(&self, other: &UnitQuat, epsilon: f64) -> bool {
        (self.dot(other).abs() - 1.0).abs() < epsilon
    }

    /// Build from a 3x3 rotation matrix in row-major order.
    ///
    /// Shepperd's method: branch on the largest diagonal term to avoid the
    /// near-zero divisor the naive trace formula hits for rotations close
    /// to 180°.
    pub fn from_rotation_matrix(m: &[[f64; 3]; 3]) -> Self {
        let trace = m[0][0] + m[1][1] + m[2][2];
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            UnitQuat {
                x: (m[2][1] - m[1][2]) / s,
                y: (m[0][2] - m[2][0]) / s,
                z: (m[1][0] - m[0][1]) / s,
                w: 0.25 * s,
            }
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
            UnitQuat {
                x: 0.25 * s,
                y: (m[0][1] + m[1][0]) / s,
                z: (m[0][2] + m[2][0]) / s,
                w: (m[2][1] - m[1][2]) / s,
            }
        } else if m[1][1] > m[2][2] {
            let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
            UnitQuat {
                x: (m[0][1] + m[1][0]) / s,
                y: 0.25 * s,
                z: (m[1][2] + m[2][1]) / s,
                w: (m[0][2] - m[2][0]) / s,
            }
        } else {
            let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
            UnitQuat {
                x: (m[0][2] + m[2][0]) / s,
                y: (m[1][2] + m[2][1]) / s,
                z: 0.25 * s,
                w: (m[1][0] - m[0][1]) / s,
            }
        };
        q.normalized()
    }

    /// The 3x3 rotation matrix for this quaternion, row-major.
    pub fn to_rotation_matrix(&self) -> [[f64; 3]; 3] {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, yy, zz) = (x * x2, y * y2, z * z2);
        let (xy, xz, yz) = (x * y2, x * z2, y * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        [
            [1.0 - (yy + zz), xy - wz, xz + wy],
            [xy + wz, 1.0 - (xx + zz), yz - wx],
            [xz - wy, yz + wx, 1.0 - (xx + yy)],
        ]
    }

    /// Orientation whose local +Z axis aligns with `forward` and whose
    /// local +Y axis aligns with `up`.
    ///
    /// Degenerate-input policy: behavior is undefined when `forward` and
    /// `up` are near-parallel or near-zero; callers guard against that
    /// before calling (the placement controller's facing-vector fallback
    /// exists for exactly this reason).
    pub fn look_rotation(forward: &Vec3, up: &Vec3) -> Self {
        let f = forward.try_normalized().unwrap_or(Vec3::UNIT_Z);
        let r = match up.cross(&f).try_normalized() {
            Some(r) => r,
            None => return UnitQuat::IDENTITY,
        };
        let u = f.cross(&r);
        // Columns are the local axes expressed in the parent frame.
        UnitQuat::from_rotation_matrix(&[
            [r.x, u.x, f.x],
            [r.y, u.y, f.y],
            [r.z, u.z, f.z],
        ])
    }

    /// Whether any component is NaN.
    #[inline]
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan() || self.w.is_nan()
    }
}

impl Default for UnitQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 4]> for UnitQuat {
    fn from(a: [f64; 4]) -> Self {
        UnitQuat::from_xyzw(a[0], a[1], a[2], a[3])
    }
}

impl From<UnitQuat> for [f64; 4] {
    fn from(q: UnitQuat) -> Self {
        [q.x, q.y, q.z, q.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_vec_eq(a: &Vec3, b: &Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    #[test]
    fn test_identity_rotation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_vec_eq(&UnitQuat::IDENTITY.rotate(&v), &v);
    }

    #[test]
    fn test_axis_angle_quarter_turn() {
        let q = UnitQuat::from_axis_angle(&Vec3::UNIT_Y, FRAC_PI_2);
        // +Z rotated a quarter turn about +Y lands on +X.
        assert_vec_eq(&q.rotate(&Vec3::UNIT_Z), &Vec3::UNIT_X);
    }

    #[test]
    fn test_conjugate_inverts() {
        let q = UnitQuat::from_axis_angle(&Vec3::new(1.0, 2.0, -0.5), 1.1);
        let v = Vec3::new(0.3, -4.0, 2.0);
        assert_vec_eq(&q.conjugate().rotate(&q.rotate(&v)), &v);
    }

    #[test]
    fn test_mul_composes_rotations() {
        let a = UnitQuat::from_axis_angle(&Vec3::UNIT_Y, 0.4);
        let b = UnitQuat::from_axis_angle(&Vec3::UNIT_X, -0.9);
        let v = Vec3::new(1.0, 0.5, -2.0);
        assert_vec_eq(&a.mul(&b).rotate(&v), &a.rotate(&b.rotate(&v)));
    }

    #[test]
    fn test_matrix_roundtrip_near_half_turn() {
        // Exercises the non-trace branches of Shepperd's method.
        let q = UnitQuat::from_axis_angle(&Vec3::new(0.2, 1.0, -0.3), PI - 1e-4);
        let back = UnitQuat::from_rotation_matrix(&q.to_rotation_matrix());
        assert!(q.same_rotation(&back, 1e-9));
    }

    #[test]
    fn test_look_rotation_axes() {
        let fwd = Vec3::new(0.0, 0.0, 1.0);
        let up = Vec3::new(0.0, 1.0, 0.0);
        let q = UnitQuat::look_rotation(&fwd, &up);
        assert_vec_eq(&q.rotate(&Vec3::UNIT_Z), &fwd);
        assert_vec_eq(&q.rotate(&Vec3::UNIT_Y), &up);

        let fwd = Vec3::new(1.0, 0.0, 1.0).try_normalized().unwrap();
        let q = UnitQuat::look_rotation(&fwd, &up);
        assert_vec_eq(&q.rotate(&Vec3::UNIT_Z), &fwd);
        assert_vec_eq(&q.rotate(&Vec3::UNIT_Y), &up);
    }

    #[test]
    fn test_same_rotation_up_to_sign() {
        let q = UnitQuat::from_axis_angle(&Vec3::UNIT_X, 0.7);
        let neg = UnitQuat {
            x: -q.x,
            y: -q.y,
            z: -q.z,
            w: -q.w,
        };
        assert!(q.same_rotation(&neg, 1e-12));
    }

    #[test]
    fn test_serde_array_form() {
        let q = UnitQuat::from_axis_angle(&Vec3::UNIT_Z, 0.3);
        let yaml = serde_yaml::to_string(&q).unwrap();
        let back: UnitQuat = serde_yaml::from_str(&yaml).unwrap();
        assert!(q.same_rotation(&back, 1e-12));
    }
}
