//! Re-projects anchor world transforms after re-localization.

use crate::anchor::AnchorStore;
use crate::core::RigidTransform;
use crate::tracking::{FramePair, PoseService};

/// Counts from one correction pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CorrectionReport {
    /// Anchors whose world pose was rewritten.
    pub corrected: usize,
    /// Anchors skipped because the tracker no longer resolves their
    /// creation timestamp; they keep their last known world transform.
    pub skipped: usize,
    /// Anchors loaded from disk (no creation timestamp), never touched.
    pub untouched: usize,
}

/// Rewrites every correctable anchor's world pose from the tracker's
/// current best estimate of the device pose at that anchor's creation
/// time.
///
/// The pass is idempotent for unchanged pose data: it reads only the
/// frame-invariant `device_from_anchor` transform and writes only the
/// world pose. It runs on every loop-closure/re-localization signal and
/// once more immediately before a save, so persisted coordinates carry
/// the best available correction.
pub struct LoopClosureCorrector {
    world_from_tracking_origin: RigidTransform,
    device_calibration: RigidTransform,
}

impl LoopClosureCorrector {
    /// Create a corrector with the session's fixed frame transforms:
    /// the world pose of the tracking origin (the mapped-area frame) and
    /// the calibration between the tracked device frame and the camera
    /// frame anchors were recorded against.
    pub fn new(
        world_from_tracking_origin: RigidTransform,
        device_calibration: RigidTransform,
    ) -> Self {
        Self {
            world_from_tracking_origin,
            device_calibration,
        }
    }

    /// Corrector for a stack whose world frame coincides with the mapped
    /// area and whose camera sits at the tracked device origin.
    pub fn identity() -> Self {
        Self::new(RigidTransform::IDENTITY, RigidTransform::IDENTITY)
    }

    /// Run one correction pass over the whole store.
    pub fn correct_all(&self, store: &mut AnchorStore, poses: &dyn PoseService) -> CorrectionReport {
        let mut report = CorrectionReport::default();

        for anchor in store.iter_mut() {
            let Some(timestamp) = anchor.creation_timestamp else {
                report.untouched += 1;
                continue;
            };

            let Some(tracked) = poses.pose_at(FramePair::DEVICE_IN_AREA, timestamp) else {
                log::debug!(
                    "No pose at t={:.6} for anchor {:?}, keeping last transform",
                    timestamp,
                    anchor.id
                );
                report.skipped += 1;
                continue;
            };

            let world_from_anchor = self
                .world_from_tracking_origin
                .compose(&tracked)
                .compose(&self.device_calibration)
                .compose(&anchor.device_from_anchor);
            anchor.record.set_world_transform(&world_from_anchor);
            report.corrected += 1;
        }

        log::debug!(
            "Correction pass: {} corrected, {} skipped, {} untouched",
            report.corrected,
            report.skipped,
            report.untouched
        );
        report
    }
}
