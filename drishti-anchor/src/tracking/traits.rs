//! Collaborator traits and the value types crossing those seams.

use std::fmt;

use crate::core::{RigidTransform, Timestamped, Vec3};
use crate::error::Result;

/// A point in screen space, pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a screen point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned screen-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    /// Top-left corner.
    pub min: ScreenPoint,
    /// Bottom-right corner.
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Create a rect from corners.
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    /// Whether a point lies inside (inclusive).
    pub fn contains(&self, p: &ScreenPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// The camera's world pose at the current frame.
///
/// Device convention: +X right, +Y up, +Z forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// `world_from_camera` transform.
    pub world_from_camera: RigidTransform,
}

impl CameraView {
    /// Wrap a camera pose.
    pub fn new(world_from_camera: RigidTransform) -> Self {
        Self { world_from_camera }
    }

    /// Camera forward axis in world coordinates.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.world_from_camera.rotation.rotate(&Vec3::UNIT_Z)
    }

    /// Camera right axis in world coordinates.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.world_from_camera.rotation.rotate(&Vec3::UNIT_X)
    }
}

/// A detected plane under a touch ray: center point and unit normal, both
/// in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHit {
    /// Plane center point.
    pub center: Vec3,
    /// Plane normal.
    pub normal: Vec3,
}

/// Coordinate frames the tracking service can relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingFrame {
    /// The persisted mapped-area frame the device re-localizes against.
    MappedArea,
    /// The moving device frame.
    Device,
}

/// A source/target frame pair for pose queries: the returned transform
/// maps points in `source` coordinates into `target` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramePair {
    /// Frame the pose is expressed relative to.
    pub target: TrackingFrame,
    /// Frame being located.
    pub source: TrackingFrame,
}

impl FramePair {
    /// Device pose expressed in the mapped-area frame — the query pair used
    /// for both placement timestamps and loop-closure correction.
    pub const DEVICE_IN_AREA: FramePair = FramePair {
        target: TrackingFrame::MappedArea,
        source: TrackingFrame::Device,
    };
}

/// Tracking status attached to a pose event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// Pose is valid and the device has matched the mapped area. The first
    /// such event gates all anchor interaction; every one of them is a
    /// loop-closure/re-localization signal.
    Relocalized,
    /// Pose is valid but not (yet) matched against the mapped area.
    Tracking,
    /// Tracking lost.
    Lost,
}

/// A pose-available event from the tracking service's stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEvent {
    /// Which frame pair the event refers to.
    pub frames: FramePair,
    /// Status of the pose estimate.
    pub status: TrackingStatus,
    /// Tracking timestamp of the event, seconds.
    pub timestamp: f64,
}

/// Touch phases of a single-touch input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    /// Finger down.
    Began,
    /// Finger moved.
    Moved,
    /// Finger up.
    Ended,
}

/// One sample of the touch stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    /// Screen position.
    pub position: ScreenPoint,
    /// Touch phase.
    pub phase: TouchPhase,
}

/// Depth sensor acquisition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// Sensor off. Default outside of placement — depth is only needed to
    /// validate the point cloud under a tap.
    Disabled,
    /// Maximum acquisition rate, used for the one frame placement needs.
    MaxRate,
}

/// Opaque identifier of a mapped area. The persisted anchor file for an
/// area is named after this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AreaKey(String);

impl AreaKey {
    /// Wrap an existing key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a fresh random key for a newly finalized area.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of polling a cooperative text-entry prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPoll {
    /// Entry still in progress; poll again next tick.
    Pending,
    /// User confirmed with the given name.
    Confirmed(String),
    /// User cancelled.
    Cancelled,
}

/// Plane detection over the current depth data.
pub trait PlaneDetector {
    /// Find the plane under the touch ray, if any. `None` is an expected,
    /// recoverable outcome (user tapped off-surface).
    fn find_plane(&mut self, camera: &CameraView, touch: ScreenPoint) -> Option<PlaneHit>;
}

/// The 6-DoF pose/tracking service.
pub trait PoseService {
    /// Pose for a frame pair at an exact past timestamp. `None` when the
    /// timestamp is stale or unknown to the tracker.
    fn pose_at(&self, frames: FramePair, timestamp: f64) -> Option<RigidTransform>;

    /// Latest pose estimate for a frame pair, with its timestamp.
    fn latest(&self, frames: FramePair) -> Option<Timestamped<RigidTransform>>;
}

/// The depth sensor's power/rate control and frame signal.
pub trait DepthSensor {
    /// Switch acquisition mode.
    fn set_mode(&mut self, mode: DepthMode);

    /// Whether a depth frame has arrived since enabling. Polled once per
    /// foreground tick; never blocks.
    fn frame_ready(&mut self) -> bool;
}

/// The heavyweight area-map finalization service. Runs on the background
/// worker thread, so implementations must be `Send`.
pub trait AreaMapService: Send {
    /// Finalize the currently tracked map and persist it, returning the
    /// key the area (and its anchor file) is stored under.
    fn finalize_and_persist(&mut self) -> Result<AreaKey>;
}

/// Presentation-owned ray-vs-collider hit test for anchor selection.
pub trait AnchorPicker {
    /// The anchor whose collider the touch ray intersects, if any.
    fn pick(&self, touch: ScreenPoint) -> Option<crate::anchor::AnchorId>;
}

/// Cooperative text-entry prompt (on-screen keyboard or equivalent).
pub trait TextPrompt {
    /// Open the prompt.
    fn begin(&mut self);

    /// Poll for completion. Called once per foreground tick.
    fn poll(&mut self) -> PromptPoll;
}
