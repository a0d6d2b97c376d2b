//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the pretrained model.

mod predictor;

pub use predictor::{aligned_values, Predictor, PredictorError};
