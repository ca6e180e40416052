//! Touch-driven anchor placement: state machine from tap to stored anchor.

mod config;
mod controller;
mod state;

pub use config::PlacementConfig;
pub use controller::PlacementController;
pub use state::{PlacementOutcome, PlacementState};
