//! Session orchestration: initialization gating, the save flow, and the
//! background area-map finalize worker.

mod lifecycle;
mod worker;

pub use lifecycle::{SessionConfig, SessionEvent, SessionLifecycle, SessionState};
pub use worker::FinalizeWorker;
