//! DrishtiAnchor - AR marker placement and loop-closure correction
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    session/                         │  ← Orchestration
//! │       (lifecycle, background finalize worker)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │       placement/   correction/   persistence/       │  ← Core operations
//! │   (touch → anchor, drift rewrite, area files)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    tracking/                        │  ← Collaborator seams
//! │      (plane detector, pose service, UI input)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     anchor/                         │  ← Data model
//! │               (record, store)                       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      core/                          │  ← Foundation
//! │              (transforms, math)                     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # What it does
//!
//! - A 2D tap becomes a 3D anchor on a detected physical plane, oriented
//!   to face the viewer with its up axis on the plane normal.
//! - Each anchor records its pose relative to the device at placement
//!   time; on every loop-closure/re-localization signal the corrector
//!   recomposes world poses from that frame-invariant transform, undoing
//!   accumulated drift.
//! - The anchor set persists per mapped area (one YAML file per area key)
//!   and is restored on the next session over the same area.
//! - Saving runs the heavyweight area-map finalization on a single
//!   background worker polled by the foreground loop, then writes anchors
//!   and restarts the session.
//!
//! Plane detection, 6-DoF tracking, and UI are external collaborators
//! behind the traits in [`tracking`]; [`tracking::mock`] has scriptable
//! implementations for tests and demos.

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Anchor data model (depends on core)
// ============================================================================
pub mod anchor;

// ============================================================================
// Layer 3: Tracking seams (depends on core, anchor)
// ============================================================================
pub mod tracking;

// ============================================================================
// Layer 4: Core operations (depend on core, anchor, tracking)
// ============================================================================
pub mod correction;
pub mod persistence;
pub mod placement;

// ============================================================================
// Layer 5: Orchestration (depends on all layers)
// ============================================================================
pub mod session;

// Ambient concerns
pub mod config;
pub mod error;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::{RigidTransform, Timestamped, UnitQuat, Vec3};

// Anchor model
pub use anchor::{AnchorId, AnchorInstance, AnchorKind, AnchorRecord, AnchorStore};

// Tracking seams
pub use tracking::{
    AnchorPicker, AreaKey, AreaMapService, CameraView, DepthMode, DepthSensor, FramePair,
    PlaneDetector, PlaneHit, PoseEvent, PoseService, PromptPoll, ScreenPoint, ScreenRect,
    TextPrompt, TouchPhase, TouchSample, TrackingFrame, TrackingStatus,
};

// Operations
pub use correction::{CorrectionReport, LoopClosureCorrector};
pub use persistence::{AnchorGateway, GatewayError};
pub use placement::{PlacementConfig, PlacementController, PlacementOutcome, PlacementState};

// Orchestration
pub use session::{FinalizeWorker, SessionConfig, SessionEvent, SessionLifecycle, SessionState};

// Ambient
pub use config::DrishtiConfig;
pub use error::{AnchorError, Result};
