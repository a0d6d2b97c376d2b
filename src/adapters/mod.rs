//! Adapters layer: Concrete implementations of ports.
//!
//! - `model`: JSON model artifacts (random forest, logistic regression),
//!   signature verification, schema alignment
//! - `sanitize`: PII filtering for logs

pub mod model;
pub mod sanitize;

pub use model::{LoadedModel, ModelError, ModelInfo, ModelLoader, Verification};
