//! Scriptable mock collaborators for tests and demos.
//!
//! Each mock shares its state behind an `Arc`, so a clone kept by the test
//! keeps scripting the instance after ownership of the original moved into
//! a controller or session.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::anchor::AnchorId;
use crate::core::{RigidTransform, Timestamped};
use crate::error::{AnchorError, Result};

use super::{
    AnchorPicker, AreaKey, AreaMapService, CameraView, DepthMode, DepthSensor, FramePair,
    PlaneDetector, PlaneHit, PoseService, PromptPoll, ScreenPoint, TextPrompt,
};

/// Mock depth sensor: becomes ready a configurable number of polls after
/// being switched to max rate.
#[derive(Clone)]
pub struct MockDepthSensor {
    state: Arc<Mutex<DepthState>>,
}

struct DepthState {
    mode: DepthMode,
    polls_until_ready: u32,
    polls: u32,
}

impl MockDepthSensor {
    /// Ready on the `polls_until_ready`-th poll after enabling.
    pub fn new(polls_until_ready: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(DepthState {
                mode: DepthMode::Disabled,
                polls_until_ready,
                polls: 0,
            })),
        }
    }

    /// Current mode, for assertions.
    pub fn mode(&self) -> DepthMode {
        self.state.lock().unwrap().mode
    }
}

impl DepthSensor for MockDepthSensor {
    fn set_mode(&mut self, mode: DepthMode) {
        let mut s = self.state.lock().unwrap();
        s.mode = mode;
        s.polls = 0;
    }

    fn frame_ready(&mut self) -> bool {
        let mut s = self.state.lock().unwrap();
        if s.mode != DepthMode::MaxRate {
            return false;
        }
        s.polls += 1;
        s.polls >= s.polls_until_ready
    }
}

/// Mock plane detector returning a scripted hit or miss.
#[derive(Clone, Default)]
pub struct MockPlaneDetector {
    state: Arc<Mutex<PlaneState>>,
}

#[derive(Default)]
struct PlaneState {
    response: Option<PlaneHit>,
    calls: usize,
}

impl MockPlaneDetector {
    /// Detector that misses until scripted otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next responses to report this plane.
    pub fn set_hit(&self, hit: PlaneHit) {
        self.state.lock().unwrap().response = Some(hit);
    }

    /// Script the next responses to miss.
    pub fn set_miss(&self) {
        self.state.lock().unwrap().response = None;
    }

    /// Number of `find_plane` calls so far.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl PlaneDetector for MockPlaneDetector {
    fn find_plane(&mut self, _camera: &CameraView, _touch: ScreenPoint) -> Option<PlaneHit> {
        let mut s = self.state.lock().unwrap();
        s.calls += 1;
        s.response
    }
}

/// Mock pose service with a scripted latest pose and per-timestamp history.
#[derive(Clone, Default)]
pub struct MockPoseService {
    state: Arc<Mutex<PoseState>>,
}

#[derive(Default)]
struct PoseState {
    latest: HashMap<FramePair, Timestamped<RigidTransform>>,
    history: HashMap<FramePair, Vec<(f64, RigidTransform)>>,
}

impl MockPoseService {
    /// Service with no poses scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latest pose for a pair and record it in the history, so a
    /// later `pose_at` for the same timestamp resolves.
    pub fn set_latest(&self, frames: FramePair, pose: RigidTransform, timestamp: f64) {
        let mut s = self.state.lock().unwrap();
        s.latest.insert(frames, Timestamped::new(pose, timestamp));
        s.history.entry(frames).or_default().push((timestamp, pose));
    }

    /// Rewrite the pose the tracker reports for an already-recorded
    /// timestamp — the loop-closure case.
    pub fn rewrite_history(&self, frames: FramePair, timestamp: f64, pose: RigidTransform) {
        let mut s = self.state.lock().unwrap();
        let entries = s.history.entry(frames).or_default();
        match entries
            .iter_mut()
            .find(|(t, _)| (*t - timestamp).abs() < crate::core::math::TIMESTAMP_EPS)
        {
            Some(entry) => entry.1 = pose,
            None => entries.push((timestamp, pose)),
        }
    }

    /// Drop all history for a pair, making `pose_at` queries stale.
    pub fn forget_history(&self, frames: FramePair) {
        self.state.lock().unwrap().history.remove(&frames);
    }
}

impl PoseService for MockPoseService {
    fn pose_at(&self, frames: FramePair, timestamp: f64) -> Option<RigidTransform> {
        let s = self.state.lock().unwrap();
        s.history.get(&frames).and_then(|entries| {
            entries
                .iter()
                .find(|(t, _)| (t - timestamp).abs() < crate::core::math::TIMESTAMP_EPS)
                .map(|(_, pose)| *pose)
        })
    }

    fn latest(&self, frames: FramePair) -> Option<Timestamped<RigidTransform>> {
        self.state.lock().unwrap().latest.get(&frames).copied()
    }
}

/// Mock anchor picker returning a scripted hit.
#[derive(Clone, Default)]
pub struct MockAnchorPicker {
    hit: Arc<Mutex<Option<AnchorId>>>,
}

impl MockAnchorPicker {
    /// Picker that hits nothing until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script which anchor the next pick hits.
    pub fn set_hit(&self, id: Option<AnchorId>) {
        *self.hit.lock().unwrap() = id;
    }
}

impl AnchorPicker for MockAnchorPicker {
    fn pick(&self, _touch: ScreenPoint) -> Option<AnchorId> {
        *self.hit.lock().unwrap()
    }
}

/// Mock text prompt replaying a scripted sequence of poll results.
#[derive(Clone, Default)]
pub struct MockTextPrompt {
    state: Arc<Mutex<PromptState>>,
}

#[derive(Default)]
struct PromptState {
    script: VecDeque<PromptPoll>,
    begun: usize,
}

impl MockTextPrompt {
    /// Prompt that reports `Pending` until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a poll result.
    pub fn push(&self, poll: PromptPoll) {
        self.state.lock().unwrap().script.push_back(poll);
    }

    /// How many times the prompt was opened.
    pub fn begun(&self) -> usize {
        self.state.lock().unwrap().begun
    }
}

impl TextPrompt for MockTextPrompt {
    fn begin(&mut self) {
        self.state.lock().unwrap().begun += 1;
    }

    fn poll(&mut self) -> PromptPoll {
        self.state
            .lock()
            .unwrap()
            .script
            .pop_front()
            .unwrap_or(PromptPoll::Pending)
    }
}

/// Mock area-map service: optionally slow, optionally failing.
#[derive(Clone)]
pub struct MockAreaMapService {
    state: Arc<Mutex<AreaMapState>>,
}

struct AreaMapState {
    key: AreaKey,
    delay: Duration,
    fail: Option<String>,
    calls: usize,
}

impl MockAreaMapService {
    /// Service that finalizes instantly under the given key.
    pub fn new(key: AreaKey) -> Self {
        Self {
            state: Arc::new(Mutex::new(AreaMapState {
                key,
                delay: Duration::ZERO,
                fail: None,
                calls: 0,
            })),
        }
    }

    /// Make finalization take this long (exercises worker polling).
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    /// Make finalization fail with this message.
    pub fn set_failure(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail = Some(message.into());
    }

    /// Number of finalization runs so far.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl AreaMapService for MockAreaMapService {
    fn finalize_and_persist(&mut self) -> Result<AreaKey> {
        let (delay, outcome) = {
            let mut s = self.state.lock().unwrap();
            s.calls += 1;
            let outcome = match &s.fail {
                Some(msg) => Err(AnchorError::AreaMap(msg.clone())),
                None => Ok(s.key.clone()),
            };
            (s.delay, outcome)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        outcome
    }
}
