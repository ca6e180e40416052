//! The persisted anchor record.

use serde::{Deserialize, Serialize};

use crate::core::{RigidTransform, UnitQuat, Vec3};

/// Marker kind: an index into the fixed, externally owned asset table.
///
/// The table itself (meshes, labels) is presentation-owned; the core only
/// carries the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorKind(pub u32);

/// The persisted data unit for one placed marker.
///
/// Field order is the wire order of the per-area anchor file: kind,
/// position, orientation. Nothing else is persisted — creation timestamps
/// and device-relative transforms are meaningless across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Marker kind tag.
    pub kind: AnchorKind,
    /// Position in the world frame, meters.
    pub position: Vec3,
    /// Orientation in the world frame. Always normalized before write.
    pub orientation: UnitQuat,
}

impl AnchorRecord {
    /// Create a record at a world pose.
    pub fn new(kind: AnchorKind, position: Vec3, orientation: UnitQuat) -> Self {
        Self {
            kind,
            position,
            orientation: orientation.normalized(),
        }
    }

    /// The anchor's world transform.
    #[inline]
    pub fn world_transform(&self) -> RigidTransform {
        RigidTransform::new(self.orientation, self.position)
    }

    /// Overwrite the world pose from a composed transform, renormalizing
    /// the orientation.
    pub fn set_world_transform(&mut self, world_from_anchor: &RigidTransform) {
        let (position, orientation) = world_from_anchor.decompose();
        self.position = position;
        self.orientation = orientation.normalized();
    }
}
