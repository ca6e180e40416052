//! Core value types: vectors, quaternions, rigid transforms, timestamps.

mod quaternion;
mod timestamped;
mod transform;
mod vector;

pub use quaternion::UnitQuat;
pub use timestamped::Timestamped;
pub use transform::RigidTransform;
pub use vector::Vec3;
