//! Loop-closure correction of anchor world poses.

mod corrector;

pub use corrector::{CorrectionReport, LoopClosureCorrector};
