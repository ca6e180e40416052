//! Session lifecycle: gating, save orchestration, restart.
//!
//! ```text
//! WaitingForRelocalization ──first relocalized pose──▶ Ready
//!        ▲                                              │ request_save
//!        │ restart                                      ▼
//!        │                                        AwaitingSaveName
//!        │                                              │ confirmed
//!        │                                              ▼
//!        └───────── save + restart ◀────────────── Finalizing
//! ```
//!
//! All store mutation happens on the foreground loop that calls
//! [`SessionLifecycle::tick`]; the background worker only finalizes the
//! area map and never touches anchors.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::anchor::AnchorStore;
use crate::correction::LoopClosureCorrector;
use crate::error::{AnchorError, Result};
use crate::persistence::AnchorGateway;
use crate::placement::{PlacementController, PlacementOutcome};
use crate::tracking::{
    AreaKey, AreaMapService, CameraView, FramePair, PoseEvent, PoseService, PromptPoll, TextPrompt,
    TouchSample, TrackingStatus,
};

use super::FinalizeWorker;

/// Session configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory anchor files are stored in. Default: `anchors`.
    #[serde(default = "default_anchor_dir")]
    pub anchor_dir: String,

    /// Key of the mapped area loaded at startup, if re-localizing against
    /// a previously saved area. `None` for a fresh mapping session.
    #[serde(default)]
    pub initial_area: Option<String>,
}

fn default_anchor_dir() -> String {
    "anchors".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            anchor_dir: default_anchor_dir(),
            initial_area: None,
        }
    }
}

/// Session lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// World tracking has not yet matched the mapped area; anchor
    /// interaction is not permitted because world positions are not
    /// globally meaningful yet.
    WaitingForRelocalization,

    /// Normal interactive operation.
    Ready,

    /// Save requested; waiting on the name prompt. Interaction blocked.
    AwaitingSaveName,

    /// Area-map finalization running on the background worker, polled
    /// each tick. Interaction blocked.
    Finalizing {
        /// Session name the user confirmed.
        name: String,
    },

    /// Restart requested while the worker was still in flight; waiting
    /// for it to stop before discarding state.
    Restarting,
}

impl SessionState {
    /// State name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::WaitingForRelocalization => "WaitingForRelocalization",
            SessionState::Ready => "Ready",
            SessionState::AwaitingSaveName => "AwaitingSaveName",
            SessionState::Finalizing { .. } => "Finalizing",
            SessionState::Restarting => "Restarting",
        }
    }
}

/// What one foreground tick produced.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Nothing notable.
    Idle,

    /// A placement-controller outcome.
    Placement(PlacementOutcome),

    /// Name confirmed; finalization started on the worker.
    SaveStarted,

    /// Anchors persisted; the session is restarting.
    Saved {
        /// Key the area and its anchor file were stored under.
        key: AreaKey,
        /// Number of anchors written.
        anchors: usize,
    },

    /// The name prompt was cancelled; back to normal operation.
    SaveCancelled,

    /// A deferred restart completed.
    Restarted,
}

/// Orchestrates the anchor subsystem across a session.
pub struct SessionLifecycle {
    config: SessionConfig,
    state: SessionState,
    store: AnchorStore,
    controller: PlacementController,
    corrector: LoopClosureCorrector,
    gateway: AnchorGateway,
    poses: Box<dyn PoseService>,
    prompt: Box<dyn TextPrompt>,
    area_map: Arc<Mutex<dyn AreaMapService>>,
    worker: Option<FinalizeWorker>,
    area_key: Option<AreaKey>,
}

impl SessionLifecycle {
    /// Assemble a session from its collaborators.
    pub fn new(
        config: SessionConfig,
        controller: PlacementController,
        corrector: LoopClosureCorrector,
        poses: Box<dyn PoseService>,
        prompt: Box<dyn TextPrompt>,
        area_map: Arc<Mutex<dyn AreaMapService>>,
    ) -> Result<Self> {
        let gateway = AnchorGateway::new(Path::new(&config.anchor_dir))?;
        let area_key = config.initial_area.clone().map(AreaKey::new);
        Ok(Self {
            config,
            state: SessionState::WaitingForRelocalization,
            store: AnchorStore::new(),
            controller,
            corrector,
            gateway,
            poses,
            prompt,
            area_map,
            worker: None,
            area_key,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The live anchor store.
    pub fn store(&self) -> &AnchorStore {
        &self.store
    }

    /// Key of the currently loaded area, if any.
    pub fn area_key(&self) -> Option<&AreaKey> {
        self.area_key.as_ref()
    }

    /// Whether anchor interaction is currently permitted.
    pub fn is_interactive(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Placement controller access for presentation wiring (marker kind,
    /// selection panel rect, removal).
    pub fn placement_mut(&mut self) -> &mut PlacementController {
        &mut self.controller
    }

    /// Feed one event from the tracking service's pose stream.
    ///
    /// The first re-localized pose unblocks the session (loading any
    /// persisted anchors for the area); every re-localized pose is a
    /// loop-closure signal and triggers a correction pass.
    pub fn handle_pose_event(&mut self, event: PoseEvent) {
        if event.frames != FramePair::DEVICE_IN_AREA
            || event.status != TrackingStatus::Relocalized
        {
            return;
        }

        if self.state == SessionState::WaitingForRelocalization {
            let records = match &self.area_key {
                Some(key) => self.gateway.load_or_empty(key),
                None => Vec::new(),
            };
            self.store.replace_all(records);
            self.state = SessionState::Ready;
            log::info!(
                "Session ready: re-localized with {} restored anchors",
                self.store.len()
            );
        }

        if self.state != SessionState::Restarting {
            self.corrector.correct_all(&mut self.store, &*self.poses);
        }
    }

    /// Feed one touch sample. Ignored unless the session is interactive.
    pub fn handle_touch(&mut self, sample: TouchSample) -> PlacementOutcome {
        if !self.is_interactive() {
            return PlacementOutcome::Ignored;
        }
        self.controller.on_touch(sample, &self.store)
    }

    /// Ask to save the session. Opens the name prompt; a no-op (returns
    /// `false`) unless the session is interactive — in particular while a
    /// previous save's worker is still in flight.
    pub fn request_save(&mut self) -> bool {
        if !self.is_interactive() {
            return false;
        }
        self.prompt.begin();
        self.state = SessionState::AwaitingSaveName;
        log::info!("Save requested, awaiting session name");
        true
    }

    /// The application moved to the background. Tracking continuity cannot
    /// be guaranteed across a pause, so the session restarts
    /// unconditionally, discarding unsaved anchors — an explicit, accepted
    /// data-loss boundary.
    pub fn notify_backgrounded(&mut self) {
        if self.state == SessionState::WaitingForRelocalization {
            return;
        }
        log::warn!(
            "Application backgrounded, restarting session ({} unsaved anchors discarded)",
            self.store.len()
        );
        if self.worker.as_ref().is_some_and(|w| w.is_running()) {
            // No mid-flight cancellation: wait for the worker to stop.
            self.state = SessionState::Restarting;
        } else {
            self.restart_now();
        }
    }

    /// Advance the session by one foreground tick.
    pub fn tick(&mut self, camera: &CameraView) -> Result<SessionEvent> {
        match self.state.clone() {
            SessionState::WaitingForRelocalization => Ok(SessionEvent::Idle),

            SessionState::Ready => {
                match self.controller.update(&mut self.store, &*self.poses, camera) {
                    PlacementOutcome::Idle => Ok(SessionEvent::Idle),
                    outcome => Ok(SessionEvent::Placement(outcome)),
                }
            }

            SessionState::AwaitingSaveName => match self.prompt.poll() {
                PromptPoll::Pending => Ok(SessionEvent::Idle),
                PromptPoll::Cancelled => {
                    self.state = SessionState::Ready;
                    log::info!("Save cancelled");
                    Ok(SessionEvent::SaveCancelled)
                }
                PromptPoll::Confirmed(name) => {
                    self.worker = Some(FinalizeWorker::spawn(Arc::clone(&self.area_map)));
                    log::info!("Session '{}' confirmed, finalizing area map", name);
                    self.state = SessionState::Finalizing { name };
                    Ok(SessionEvent::SaveStarted)
                }
            },

            SessionState::Finalizing { name } => {
                if self.worker.as_ref().is_some_and(|w| w.is_running()) {
                    return Ok(SessionEvent::Idle);
                }
                let result = self.worker.take().and_then(|w| w.try_result());
                match result {
                    Some(Ok(key)) => {
                        // Final correction pass so persisted coordinates
                        // carry the best available estimate.
                        self.corrector.correct_all(&mut self.store, &*self.poses);
                        let records = self.store.records();
                        self.gateway.save(&records, &key)?;
                        let anchors = records.len();
                        log::info!("Session '{}' saved under area {}", name, key);
                        self.area_key = Some(key.clone());
                        self.restart_now();
                        Ok(SessionEvent::Saved { key, anchors })
                    }
                    Some(Err(e)) => {
                        // Explicit failure, no silent data loss: anchors
                        // stay in memory and the session remains usable.
                        log::error!("Area-map finalization failed: {}", e);
                        self.state = SessionState::Ready;
                        Err(e)
                    }
                    None => {
                        log::error!("Finalize worker stopped without a result");
                        self.state = SessionState::Ready;
                        Err(AnchorError::AreaMap(
                            "finalize worker stopped without a result".to_string(),
                        ))
                    }
                }
            }

            SessionState::Restarting => {
                if self.worker.as_ref().is_some_and(|w| w.is_running()) {
                    return Ok(SessionEvent::Idle);
                }
                if let Some(worker) = self.worker.take() {
                    if let Some(result) = worker.try_result() {
                        log::info!(
                            "Discarding finalize result during restart: {:?}",
                            result.as_ref().map(|k| k.to_string())
                        );
                    }
                }
                self.restart_now();
                Ok(SessionEvent::Restarted)
            }
        }
    }

    /// Discard all in-memory state and wait for the next re-localization,
    /// which reloads the anchor set from disk.
    fn restart_now(&mut self) {
        debug_assert!(!self.worker.as_ref().is_some_and(|w| w.is_running()));
        self.worker = None;
        self.store.clear();
        self.controller.reset();
        self.state = SessionState::WaitingForRelocalization;
        log::info!("Session restarted");
    }

    /// The configured anchor directory (mainly for diagnostics).
    pub fn anchor_dir(&self) -> &str {
        &self.config.anchor_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorKind;
    use crate::core::{RigidTransform, Vec3};
    use crate::placement::PlacementConfig;
    use crate::tracking::mock::{
        MockAnchorPicker, MockAreaMapService, MockDepthSensor, MockPlaneDetector, MockPoseService,
        MockTextPrompt,
    };
    use crate::tracking::{PlaneHit, ScreenPoint, TouchPhase};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Rig {
        session: SessionLifecycle,
        planes: MockPlaneDetector,
        poses: MockPoseService,
        prompt: MockTextPrompt,
        area_map: MockAreaMapService,
        camera: CameraView,
        _dir: TempDir,
    }

    fn rig(initial_area: Option<&str>) -> Rig {
        let dir = TempDir::new().unwrap();
        let planes = MockPlaneDetector::new();
        let poses = MockPoseService::new();
        poses.set_latest(FramePair::DEVICE_IN_AREA, RigidTransform::IDENTITY, 1.0);
        let prompt = MockTextPrompt::new();
        let area_map = MockAreaMapService::new(AreaKey::new("saved-area"));

        let controller = PlacementController::new(
            PlacementConfig::default(),
            Box::new(MockDepthSensor::new(1)),
            Box::new(planes.clone()),
            Box::new(MockAnchorPicker::new()),
        );
        let config = SessionConfig {
            anchor_dir: dir.path().to_string_lossy().into_owned(),
            initial_area: initial_area.map(str::to_string),
        };
        let session = SessionLifecycle::new(
            config,
            controller,
            LoopClosureCorrector::identity(),
            Box::new(poses.clone()),
            Box::new(prompt.clone()),
            Arc::new(Mutex::new(area_map.clone())),
        )
        .unwrap();

        Rig {
            session,
            planes,
            poses,
            prompt,
            area_map,
            camera: CameraView::new(RigidTransform::IDENTITY),
            _dir: dir,
        }
    }

    fn relocalized(timestamp: f64) -> PoseEvent {
        PoseEvent {
            frames: FramePair::DEVICE_IN_AREA,
            status: TrackingStatus::Relocalized,
            timestamp,
        }
    }

    fn tap(x: f64, y: f64) -> TouchSample {
        TouchSample {
            position: ScreenPoint::new(x, y),
            phase: TouchPhase::Began,
        }
    }

    fn place_one(r: &mut Rig) {
        r.planes.set_hit(PlaneHit {
            center: Vec3::new(0.0, 0.0, 2.0),
            normal: Vec3::UNIT_Y,
        });
        assert_eq!(
            r.session.handle_touch(tap(400.0, 600.0)),
            PlacementOutcome::AwaitingDepth
        );
        let event = r.session.tick(&r.camera).unwrap();
        assert!(matches!(
            event,
            SessionEvent::Placement(PlacementOutcome::Placed(_))
        ));
    }

    /// Tick until the session produces a non-idle event (the worker is
    /// asynchronous, so Finalizing spans a few polls).
    fn tick_until_event(r: &mut Rig) -> Result<SessionEvent> {
        for _ in 0..5000 {
            match r.session.tick(&r.camera) {
                Ok(SessionEvent::Idle) => std::thread::sleep(Duration::from_millis(1)),
                other => return other,
            }
        }
        panic!("session never produced an event");
    }

    #[test]
    fn test_interaction_gated_on_relocalization() {
        let mut r = rig(None);
        assert_eq!(
            r.session.handle_touch(tap(0.0, 0.0)),
            PlacementOutcome::Ignored
        );
        assert!(!r.session.request_save());

        r.session.handle_pose_event(relocalized(1.0));
        assert!(r.session.is_interactive());
        place_one(&mut r);
        assert_eq!(r.session.store().len(), 1);
    }

    #[test]
    fn test_non_relocalized_events_do_not_unblock() {
        let mut r = rig(None);
        r.session.handle_pose_event(PoseEvent {
            frames: FramePair::DEVICE_IN_AREA,
            status: TrackingStatus::Tracking,
            timestamp: 1.0,
        });
        assert!(!r.session.is_interactive());
    }

    #[test]
    fn test_save_flow_persists_and_restarts() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        place_one(&mut r);
        place_one(&mut r);

        assert!(r.session.request_save());
        // Interaction is blocked during the save flow.
        assert_eq!(
            r.session.handle_touch(tap(0.0, 0.0)),
            PlacementOutcome::Ignored
        );
        assert_eq!(r.prompt.begun(), 1);

        r.prompt.push(PromptPoll::Pending);
        assert_eq!(r.session.tick(&r.camera).unwrap(), SessionEvent::Idle);

        r.prompt.push(PromptPoll::Confirmed("Kitchen".to_string()));
        assert_eq!(r.session.tick(&r.camera).unwrap(), SessionEvent::SaveStarted);

        let event = tick_until_event(&mut r).unwrap();
        let SessionEvent::Saved { key, anchors } = event else {
            panic!("expected save, got {:?}", event);
        };
        assert_eq!(key.as_str(), "saved-area");
        assert_eq!(anchors, 2);

        // Restarted: store discarded, waiting for re-localization again.
        assert_eq!(
            r.session.state(),
            &SessionState::WaitingForRelocalization
        );
        assert!(r.session.store().is_empty());

        // The next re-localization reloads the persisted set.
        r.session.handle_pose_event(relocalized(2.0));
        assert_eq!(r.session.store().len(), 2);
        assert!(r.session.store().iter().all(|a| !a.is_correctable()));
    }

    #[test]
    fn test_save_cancelled_returns_to_ready() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        place_one(&mut r);

        r.session.request_save();
        r.prompt.push(PromptPoll::Cancelled);
        assert_eq!(
            r.session.tick(&r.camera).unwrap(),
            SessionEvent::SaveCancelled
        );
        assert!(r.session.is_interactive());
        assert_eq!(r.session.store().len(), 1);
    }

    #[test]
    fn test_second_save_request_is_noop_while_finalizing() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        r.area_map.set_delay(Duration::from_millis(50));

        r.session.request_save();
        r.prompt.push(PromptPoll::Confirmed("A".to_string()));
        r.session.tick(&r.camera).unwrap();

        assert!(!r.session.request_save());
        let _ = tick_until_event(&mut r).unwrap();
        assert_eq!(r.area_map.calls(), 1);
    }

    #[test]
    fn test_finalize_failure_keeps_anchors() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        place_one(&mut r);

        r.area_map.set_failure("disk full");
        r.session.request_save();
        r.prompt.push(PromptPoll::Confirmed("A".to_string()));
        r.session.tick(&r.camera).unwrap();

        assert!(tick_until_event(&mut r).is_err());
        // No silent data loss: the session stays usable with its anchors.
        assert!(r.session.is_interactive());
        assert_eq!(r.session.store().len(), 1);
    }

    #[test]
    fn test_backgrounding_forces_restart() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        place_one(&mut r);

        r.session.notify_backgrounded();
        assert_eq!(
            r.session.state(),
            &SessionState::WaitingForRelocalization
        );
        assert!(r.session.store().is_empty());
    }

    #[test]
    fn test_backgrounding_defers_until_worker_stops() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        r.area_map.set_delay(Duration::from_millis(30));

        r.session.request_save();
        r.prompt.push(PromptPoll::Confirmed("A".to_string()));
        r.session.tick(&r.camera).unwrap();

        r.session.notify_backgrounded();
        assert_eq!(r.session.state(), &SessionState::Restarting);

        let event = tick_until_event(&mut r).unwrap();
        assert_eq!(event, SessionEvent::Restarted);
        assert_eq!(
            r.session.state(),
            &SessionState::WaitingForRelocalization
        );
    }

    #[test]
    fn test_missing_initial_area_degrades_to_empty() {
        let mut r = rig(Some("missing-key"));
        r.session.handle_pose_event(relocalized(1.0));
        assert!(r.session.is_interactive());
        assert!(r.session.store().is_empty());
    }

    #[test]
    fn test_relocalization_runs_correction_pass() {
        let mut r = rig(None);
        r.session.handle_pose_event(relocalized(1.0));
        place_one(&mut r);

        // Loop closure: the tracker revises the device pose recorded at
        // the anchor's creation timestamp by 10cm in x.
        let drift = RigidTransform::from_translation(Vec3::new(0.1, 0.0, 0.0));
        r.poses
            .rewrite_history(FramePair::DEVICE_IN_AREA, 1.0, drift);

        r.session.handle_pose_event(relocalized(2.0));

        let anchor = r.session.store().iter().next().unwrap();
        assert!((anchor.record.position.x - 0.1).abs() < 1e-9);
        assert!((anchor.record.position.z - 2.0).abs() < 1e-9);
    }
}
