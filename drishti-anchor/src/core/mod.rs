//! Foundation layer: math primitives and rigid-transform types.
//!
//! No internal dependencies. Everything above (anchor store, placement,
//! correction, persistence) builds on the types defined here.

pub mod math;
pub mod types;

pub use types::{RigidTransform, Timestamped, UnitQuat, Vec3};
