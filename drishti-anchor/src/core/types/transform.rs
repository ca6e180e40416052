//! Rigid transform between coordinate frames.

use serde::{Deserialize, Serialize};

use super::{UnitQuat, Vec3};

/// A rigid (rotation + translation) transform between two frames.
///
/// Naming convention throughout the crate: a value called `a_from_b` maps
/// points expressed in frame `b` into frame `a`, so frame chains compose
/// left to right:
///
/// ```text
/// world_from_anchor = world_from_device ∘ device_from_anchor
/// ```
///
/// Stored as rotation + translation rather than a raw 4x4 matrix; the
/// inverse is exact (conjugate rotation, rotated-negated translation) and
/// [`RigidTransform::to_matrix`] provides the homogeneous 4x4 view when one
/// is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Rotation part.
    pub rotation: UnitQuat,
    /// Translation part.
    pub translation: Vec3,
}

impl RigidTransform {
    /// Identity transform.
    pub const IDENTITY: RigidTransform = RigidTransform {
        rotation: UnitQuat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Build from parts.
    #[inline]
    pub fn new(rotation: UnitQuat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: UnitQuat::IDENTITY,
            translation,
        }
    }

    /// Pure rotation.
    #[inline]
    pub fn from_rotation(rotation: UnitQuat) -> Self {
        Self {
            rotation,
            translation: Vec3::ZERO,
        }
    }

    /// Frame-chaining product `self ∘ other`: apply `other` first, then
    /// `self`. Associative.
    #[inline]
    pub fn compose(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform {
            rotation: self.rotation.mul(&other.rotation).normalized(),
            translation: self
                .translation
                .add(&self.rotation.rotate(&other.translation)),
        }
    }

    /// Exact inverse. Valid rigid input is the caller's responsibility;
    /// no tolerance check is performed beyond quaternion renormalization.
    #[inline]
    pub fn inverse(&self) -> RigidTransform {
        let inv_rot = self.rotation.conjugate();
        RigidTransform {
            rotation: inv_rot,
            translation: inv_rot.rotate(&self.translation).neg(),
        }
    }

    /// Map a point from the source frame into the target frame.
    #[inline]
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.rotation.rotate(point).add(&self.translation)
    }

    /// Extract `(translation, orientation)`.
    #[inline]
    pub fn decompose(&self) -> (Vec3, UnitQuat) {
        (self.translation, self.rotation)
    }

    /// Homogeneous 4x4 matrix view, row-major; translation in the last
    /// column.
    pub fn to_matrix(&self) -> [[f64; 4]; 4] {
        let r = self.rotation.to_rotation_matrix();
        let t = self.translation;
        [
            [r[0][0], r[0][1], r[0][2], t.x],
            [r[1][0], r[1][1], r[1][2], t.y],
            [r[2][0], r[2][1], r[2][2], t.z],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_vec_eq(a: &Vec3, b: &Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    fn sample() -> RigidTransform {
        RigidTransform::new(
            UnitQuat::from_axis_angle(&Vec3::new(0.3, 1.0, -0.2), 0.8),
            Vec3::new(1.0, -2.0, 0.5),
        )
    }

    #[test]
    fn test_compose_identity() {
        let t = sample();
        let v = Vec3::new(0.1, 0.2, 0.3);
        assert_vec_eq(
            &t.compose(&RigidTransform::IDENTITY).transform_point(&v),
            &t.transform_point(&v),
        );
        assert_vec_eq(
            &RigidTransform::IDENTITY.compose(&t).transform_point(&v),
            &t.transform_point(&v),
        );
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = sample();
        let v = Vec3::new(-1.5, 0.7, 2.2);
        assert_vec_eq(&t.inverse().transform_point(&t.transform_point(&v)), &v);

        let id = t.compose(&t.inverse());
        assert_vec_eq(&id.translation, &Vec3::ZERO);
        assert!(id.rotation.same_rotation(&UnitQuat::IDENTITY, 1e-9));
    }

    #[test]
    fn test_compose_associative() {
        let a = sample();
        let b = RigidTransform::new(
            UnitQuat::from_axis_angle(&Vec3::UNIT_X, -0.4),
            Vec3::new(0.0, 3.0, -1.0),
        );
        let c = RigidTransform::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let v = Vec3::new(0.2, -0.3, 0.9);
        assert_vec_eq(
            &a.compose(&b).compose(&c).transform_point(&v),
            &a.compose(&b.compose(&c)).transform_point(&v),
        );
    }

    #[test]
    fn test_compose_chains_frames() {
        // world_from_device: device sits at (0,0,5) looking back toward the
        // origin (half turn about Y).
        let world_from_device = RigidTransform::new(
            UnitQuat::from_axis_angle(&Vec3::UNIT_Y, std::f64::consts::PI),
            Vec3::new(0.0, 0.0, 5.0),
        );
        // Anchor one meter in front of the device.
        let device_from_anchor = RigidTransform::from_translation(Vec3::new(0.0, 0.0, 1.0));
        let world_from_anchor = world_from_device.compose(&device_from_anchor);
        assert_vec_eq(&world_from_anchor.translation, &Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_to_matrix_translation_column() {
        let t = RigidTransform::new(
            UnitQuat::from_axis_angle(&Vec3::UNIT_Z, FRAC_PI_2),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let m = t.to_matrix();
        assert_relative_eq!(m[0][3], 7.0);
        assert_relative_eq!(m[1][3], 8.0);
        assert_relative_eq!(m[2][3], 9.0);
        assert_relative_eq!(m[3][3], 1.0);
        // Rotation sub-block: +X maps to +Y under a quarter turn about Z.
        assert_relative_eq!(m[1][0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_decompose() {
        let t = sample();
        let (pos, rot) = t.decompose();
        assert_vec_eq(&pos, &t.translation);
        assert!(rot.same_rotation(&t.rotation, 1e-12));
    }
}
