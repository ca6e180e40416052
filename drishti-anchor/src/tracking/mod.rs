//! Seams to the external tracking stack.
//!
//! The plane detector, 6-DoF pose service, depth sensor, area-map service,
//! and UI input are collaborators this crate consumes but does not
//! implement. Each is a trait injected into the components that need it;
//! [`mock`] provides scriptable implementations for tests and demos.

pub mod mock;
mod traits;

pub use traits::{
    AnchorPicker, AreaKey, AreaMapService, CameraView, DepthMode, DepthSensor, FramePair,
    PlaneDetector, PlaneHit, PoseEvent, PoseService, PromptPoll, ScreenPoint, ScreenRect,
    TextPrompt, TouchPhase, TouchSample, TrackingFrame, TrackingStatus,
};
