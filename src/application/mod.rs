//! Application layer: Use cases and services.
//!
//! There is one use case: score a submitted form against the loaded model.

mod assessment;

pub use assessment::AssessmentService;
