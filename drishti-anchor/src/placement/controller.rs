//! The placement controller: touch triage and depth-gated placement.

use crate::anchor::{AnchorId, AnchorKind, AnchorRecord, AnchorStore};
use crate::core::math::rad_to_deg;
use crate::core::{UnitQuat, Vec3};
use crate::tracking::{
    AnchorPicker, CameraView, DepthMode, DepthSensor, FramePair, PlaneDetector, PoseService,
    ScreenRect, TouchPhase, TouchSample,
};

use super::{PlacementConfig, PlacementOutcome, PlacementState};

/// Drives touch input through plane lookup to anchor instantiation.
///
/// One operation at a time: a touch that arrives while a placement is in
/// flight is ignored, and the depth wait is a cooperative per-tick poll,
/// never a block. Collaborators are injected at construction.
pub struct PlacementController {
    config: PlacementConfig,
    state: PlacementState,
    depth: Box<dyn DepthSensor>,
    planes: Box<dyn PlaneDetector>,
    picker: Box<dyn AnchorPicker>,
    selected: Option<AnchorId>,
    selection_panel: Option<ScreenRect>,
    selected_kind: AnchorKind,
}

impl PlacementController {
    /// Create a controller with its collaborators.
    pub fn new(
        config: PlacementConfig,
        depth: Box<dyn DepthSensor>,
        planes: Box<dyn PlaneDetector>,
        picker: Box<dyn AnchorPicker>,
    ) -> Self {
        Self {
            config,
            state: PlacementState::Idle,
            depth,
            planes,
            picker,
            selected: None,
            selection_panel: None,
            selected_kind: AnchorKind(0),
        }
    }

    /// Current state.
    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    /// Currently selected anchor, if any.
    pub fn selected(&self) -> Option<AnchorId> {
        self.selected
    }

    /// Marker kind used for the next placement.
    pub fn selected_kind(&self) -> AnchorKind {
        self.selected_kind
    }

    /// Choose the marker kind for subsequent placements.
    pub fn set_selected_kind(&mut self, kind: AnchorKind) {
        self.selected_kind = kind;
    }

    /// Presentation layer reports the selected anchor's screen panel rect
    /// (or clears it). Taps inside the rect are swallowed as UI hits.
    pub fn set_selection_panel(&mut self, rect: Option<ScreenRect>) {
        self.selection_panel = rect;
    }

    /// Drop the current selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.selection_panel = None;
    }

    /// Abort any in-flight placement and drop selection state. Used on
    /// session restart.
    pub fn reset(&mut self) {
        if !self.state.is_idle() {
            self.depth.set_mode(DepthMode::Disabled);
        }
        self.state = PlacementState::Idle;
        self.clear_selection();
    }

    /// Triage one touch sample.
    ///
    /// Only `Began` samples of the single-touch stream act; anything else
    /// is ignored, as is any touch while an operation is in flight. A tap
    /// inside the selection panel is a UI hit; a tap on a live (not
    /// mid-removal) anchor collider selects it; any other tap starts a
    /// placement by enabling the depth sensor and suspending until the
    /// next depth frame.
    pub fn on_touch(&mut self, sample: TouchSample, store: &AnchorStore) -> PlacementOutcome {
        if sample.phase != TouchPhase::Began || !self.state.is_idle() {
            return PlacementOutcome::Ignored;
        }

        if self.selected.is_some() {
            if let Some(rect) = self.selection_panel {
                if rect.contains(&sample.position) {
                    log::debug!("Tap swallowed by selection panel");
                    return PlacementOutcome::PanelHit;
                }
            }
        }

        if let Some(id) = self.picker.pick(sample.position) {
            if let Some(anchor) = store.get(id) {
                if !anchor.removing {
                    self.selected = Some(id);
                    log::debug!("Selected anchor {:?}", id);
                    return PlacementOutcome::Selected(id);
                }
                // A removing anchor is not selectable; the tap falls
                // through to placement.
            }
        }

        self.depth.set_mode(DepthMode::MaxRate);
        self.state = PlacementState::AwaitingDepth {
            touch: sample.position,
            kind: self.selected_kind,
            ticks_waited: 0,
        };
        log::debug!(
            "Placement started at ({:.0}, {:.0}), awaiting depth",
            sample.position.x,
            sample.position.y
        );
        PlacementOutcome::AwaitingDepth
    }

    /// Advance the state machine by one foreground tick.
    pub fn update(
        &mut self,
        store: &mut AnchorStore,
        poses: &dyn PoseService,
        camera: &CameraView,
    ) -> PlacementOutcome {
        let (touch, kind, ticks_waited) = match self.state {
            PlacementState::Idle => return PlacementOutcome::Idle,
            PlacementState::AwaitingDepth {
                touch,
                kind,
                ticks_waited,
            } => (touch, kind, ticks_waited),
        };

        if !self.depth.frame_ready() {
            let ticks_waited = ticks_waited + 1;
            if ticks_waited >= self.config.depth_timeout_ticks {
                self.depth.set_mode(DepthMode::Disabled);
                self.state = PlacementState::Idle;
                log::warn!("Depth frame never arrived, placement aborted");
                return PlacementOutcome::DepthTimeout;
            }
            self.state = PlacementState::AwaitingDepth {
                touch,
                kind,
                ticks_waited,
            };
            return PlacementOutcome::AwaitingDepth;
        }

        // Fresh depth frame in hand; the sensor is not needed outside of
        // placement.
        self.depth.set_mode(DepthMode::Disabled);
        self.state = PlacementState::Idle;

        let Some(hit) = self.planes.find_plane(camera, touch) else {
            log::debug!("No plane under touch ray, placement aborted");
            return PlacementOutcome::PlaneNotFound;
        };

        let Some(normal) = hit.normal.try_normalized() else {
            log::debug!("Degenerate plane normal, placement aborted");
            return PlacementOutcome::PlaneNotFound;
        };

        let Some(forward) = self.facing_vector(&normal, camera) else {
            log::debug!("Degenerate facing geometry, placement aborted");
            return PlacementOutcome::PlaneNotFound;
        };

        let Some(latest) = poses.latest(FramePair::DEVICE_IN_AREA) else {
            log::warn!("No tracking pose available, placement aborted");
            return PlacementOutcome::TrackingLost;
        };

        let orientation = UnitQuat::look_rotation(&forward, &normal);
        let record = AnchorRecord::new(kind, hit.center, orientation);
        let world_from_anchor = record.world_transform();
        // The anchor's pose in the device frame at this instant. This is
        // the frame-invariant quantity loop closure recomposes later.
        let device_from_anchor = camera
            .world_from_camera
            .inverse()
            .compose(&world_from_anchor);

        let id = store.insert_placed(record, latest.timestamp, device_from_anchor);
        self.clear_selection();
        log::info!(
            "Placed anchor {:?} kind {} at ({:.3}, {:.3}, {:.3})",
            id,
            kind.0,
            hit.center.x,
            hit.center.y,
            hit.center.z
        );
        PlacementOutcome::Placed(id)
    }

    /// Begin removing the selected anchor: mark it as mid-removal (it can
    /// no longer be selected) and clear the selection. The presentation
    /// layer calls [`PlacementController::finish_remove`] once its removal
    /// animation ends.
    pub fn begin_remove_selected(&mut self, store: &mut AnchorStore) -> Option<AnchorId> {
        let id = self.selected.take()?;
        self.selection_panel = None;
        let anchor = store.get_mut(id)?;
        anchor.removing = true;
        log::debug!("Removal started for anchor {:?}", id);
        Some(id)
    }

    /// Delete a mid-removal anchor from the store.
    pub fn finish_remove(&self, store: &mut AnchorStore, id: AnchorId) -> bool {
        let removed = store.remove(id).is_some();
        if removed {
            log::info!("Removed anchor {:?}", id);
        }
        removed
    }

    /// The anchor's facing vector for a plane normal.
    ///
    /// Keeps the anchor visually facing the viewer while its up axis stays
    /// aligned to the plane normal: project the camera forward vector onto
    /// the plane via the double cross-product. When the normal is nearly
    /// opposite the camera look direction the cross product degenerates,
    /// so fall back to `normal × camera_right`; the fallback also catches
    /// a degenerate primary product just short of the threshold.
    fn facing_vector(&self, normal: &Vec3, camera: &CameraView) -> Option<Vec3> {
        let camera_forward = camera.forward();
        let angle_deg = rad_to_deg(normal.angle_to(&camera_forward));

        let primary = if angle_deg < self.config.facing_fallback_threshold_deg {
            normal
                .cross(&camera_forward)
                .cross(normal)
                .try_normalized()
        } else {
            None
        };
        primary.or_else(|| normal.cross(&camera.right()).try_normalized())
    }
}
