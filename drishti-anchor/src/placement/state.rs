//! Placement state machine states and per-tick outcomes.

use crate::anchor::{AnchorId, AnchorKind};
use crate::tracking::ScreenPoint;

/// Placement controller state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementState {
    /// No placement in flight.
    Idle,

    /// Depth sensor enabled, waiting for the next depth frame so the
    /// plane query does not run against a stale point cloud.
    AwaitingDepth {
        /// The tap that started this placement.
        touch: ScreenPoint,
        /// Marker kind captured at tap time.
        kind: AnchorKind,
        /// Ticks spent waiting so far.
        ticks_waited: u32,
    },
}

impl PlacementState {
    /// Whether the controller can accept a new touch.
    pub fn is_idle(&self) -> bool {
        matches!(self, PlacementState::Idle)
    }

    /// State name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            PlacementState::Idle => "Idle",
            PlacementState::AwaitingDepth { .. } => "AwaitingDepth",
        }
    }
}

/// Outcome of one touch or one foreground tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementOutcome {
    /// Nothing happened.
    Idle,

    /// Placement in flight, still waiting on the depth frame.
    AwaitingDepth,

    /// An anchor was placed and appended to the store.
    Placed(AnchorId),

    /// No plane under the touch ray; placement aborted with no side
    /// effects.
    PlaneNotFound,

    /// The depth sensor never signalled within the configured wait
    /// window; placement aborted with no side effects.
    DepthTimeout,

    /// No usable tracking pose at placement time; placement aborted.
    TrackingLost,

    /// The tap selected an existing anchor.
    Selected(AnchorId),

    /// The tap landed on the selected anchor's screen panel and was
    /// swallowed as a UI hit.
    PanelHit,

    /// The touch was ignored (wrong phase, or an operation already in
    /// flight).
    Ignored,
}
