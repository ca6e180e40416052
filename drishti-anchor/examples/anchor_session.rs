//! End-to-end anchor session on the mock tracking stack.
//!
//! Places two markers on detected planes, saves the session (area-map
//! finalization on the background worker), restarts, and restores the
//! anchors from disk.
//!
//! Run with: cargo run --example anchor_session

use std::sync::{Arc, Mutex};

use drishti_anchor::tracking::mock::{
    MockAnchorPicker, MockAreaMapService, MockDepthSensor, MockPlaneDetector, MockPoseService,
    MockTextPrompt,
};
use drishti_anchor::{
    AnchorKind, AreaKey, CameraView, DrishtiConfig, FramePair, LoopClosureCorrector,
    PlacementController, PlaneHit, PoseEvent, PromptPoll, RigidTransform, ScreenPoint,
    SessionEvent, SessionLifecycle, TouchPhase, TouchSample, TrackingStatus, Vec3,
};

fn main() -> drishti_anchor::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let dir = tempfile::TempDir::new()?;
    let mut config = DrishtiConfig::default();
    config.session.anchor_dir = dir.path().to_string_lossy().into_owned();

    // Mock tracking stack: depth frame on the first poll, identity device
    // pose, instant area-map finalization.
    let planes = MockPlaneDetector::new();
    let poses = MockPoseService::new();
    poses.set_latest(FramePair::DEVICE_IN_AREA, RigidTransform::IDENTITY, 0.5);
    let prompt = MockTextPrompt::new();
    let area_map = MockAreaMapService::new(AreaKey::generate());

    let controller = PlacementController::new(
        config.placement.clone(),
        Box::new(MockDepthSensor::new(1)),
        Box::new(planes.clone()),
        Box::new(MockAnchorPicker::new()),
    );
    let mut session = SessionLifecycle::new(
        config.session.clone(),
        controller,
        LoopClosureCorrector::identity(),
        Box::new(poses.clone()),
        Box::new(prompt.clone()),
        Arc::new(Mutex::new(area_map)),
    )?;

    let camera = CameraView::new(RigidTransform::IDENTITY);

    // World tracking matches the (empty) area; interaction unblocks.
    session.handle_pose_event(PoseEvent {
        frames: FramePair::DEVICE_IN_AREA,
        status: TrackingStatus::Relocalized,
        timestamp: 0.5,
    });

    // Tap the floor, then a wall.
    let surfaces = [
        (ScreenPoint::new(400.0, 600.0), PlaneHit {
            center: Vec3::new(0.0, 0.0, 2.0),
            normal: Vec3::UNIT_Y,
        }),
        (ScreenPoint::new(200.0, 300.0), PlaneHit {
            center: Vec3::new(-1.0, 1.2, 3.0),
            normal: Vec3::UNIT_X,
        }),
    ];
    for (i, (touch, hit)) in surfaces.iter().enumerate() {
        planes.set_hit(*hit);
        session.placement_mut().set_selected_kind(AnchorKind(i as u32));
        session.handle_touch(TouchSample {
            position: *touch,
            phase: TouchPhase::Began,
        });
        // One tick waits on the depth frame, the next places.
        while !matches!(
            session.tick(&camera)?,
            SessionEvent::Placement(drishti_anchor::PlacementOutcome::Placed(_))
        ) {}
    }
    println!("placed {} anchors", session.store().len());

    // Save: prompt for a name, finalize on the worker, persist, restart.
    session.request_save();
    prompt.push(PromptPoll::Confirmed("Living Room".to_string()));
    let saved_key = loop {
        match session.tick(&camera)? {
            SessionEvent::Saved { key, anchors } => {
                println!("saved {} anchors under area {}", anchors, key);
                break key;
            }
            _ => std::thread::sleep(std::time::Duration::from_millis(1)),
        }
    };

    // Fresh session over the same area restores the set on
    // re-localization.
    assert_eq!(session.area_key(), Some(&saved_key));
    session.handle_pose_event(PoseEvent {
        frames: FramePair::DEVICE_IN_AREA,
        status: TrackingStatus::Relocalized,
        timestamp: 9.0,
    });
    println!("restored {} anchors after restart", session.store().len());
    for anchor in session.store().iter() {
        let p = anchor.record.position;
        println!(
            "  kind {} at ({:.2}, {:.2}, {:.2})",
            anchor.record.kind.0, p.x, p.y, p.z
        );
    }

    Ok(())
}
