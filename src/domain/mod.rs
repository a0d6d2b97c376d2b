//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. The feature deriver lives here because it is
//! the one piece of logic that must stay bit-for-bit aligned with the
//! training pipeline.

mod assessment;
pub mod features;
mod patient;

pub use assessment::{Assessment, BmiCategory, Prediction, RiskLabel};
pub use features::{derive, FeatureSchema, FeatureVector};
pub use patient::{
    Answer, PatientInput, Sex, SmokingStatus, AGE_RANGE, BLOOD_SUGAR_RANGE, CHOLESTEROL_RANGE,
    HEIGHT_RANGE, WAIST_RANGE, WEIGHT_RANGE,
};

/// Errors raised by domain validation and category parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown {field} category: {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("{field} {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),
}
