//! Predictor port: Trait for the pretrained risk classifier.
//!
//! The model is an opaque collaborator. The only contract the core keeps
//! with it is column alignment: a [`FeatureVector`] is accepted only when its
//! schema names match the model's `feature_names` exactly.

use crate::domain::{FeatureVector, RiskLabel};

/// Errors that can occur while scoring a single feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error("Feature count mismatch: got {got}, model expects {expected}")]
    ShapeMismatch { got: usize, expected: usize },

    #[error("Feature {index} is {got:?}, model expects {expected:?}")]
    SchemaMismatch {
        index: usize,
        got: String,
        expected: String,
    },

    #[error("Model produced a non-finite probability")]
    NonFinite,
}

/// Binary classifier over a fixed feature schema.
///
/// Implementations are immutable after load and shared read-only.
pub trait Predictor: Send + Sync {
    /// Column names the model was fit on, in order.
    fn feature_names(&self) -> &[String];

    /// Predicted class.
    ///
    /// # Errors
    /// Returns [`PredictorError`] if the vector does not match the model schema.
    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel, PredictorError>;

    /// Probability of the positive class, in `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`PredictorError`] if the vector does not match the model schema
    /// or the model output is not finite.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, PredictorError>;
}

/// Flatten `features` after checking it against the model's column names.
///
/// Shared by every adapter so the alignment rule lives in one place.
///
/// # Errors
/// Returns [`PredictorError::ShapeMismatch`] or [`PredictorError::SchemaMismatch`].
pub fn aligned_values(
    features: &FeatureVector,
    model_names: &[String],
) -> Result<Vec<f64>, PredictorError> {
    let names = features.names();
    if names.len() != model_names.len() {
        return Err(PredictorError::ShapeMismatch {
            got: names.len(),
            expected: model_names.len(),
        });
    }
    for (index, (got, expected)) in names.iter().zip(model_names).enumerate() {
        if *got != expected.as_str() {
            return Err(PredictorError::SchemaMismatch {
                index,
                got: (*got).to_string(),
                expected: expected.clone(),
            });
        }
    }
    Ok(features.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive, FeatureSchema, PatientInput};

    fn names(schema: FeatureSchema) -> Vec<String> {
        schema.feature_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aligned_values_accepts_matching_schema() {
        let vector = derive(&PatientInput::default(), FeatureSchema::RawClinical);
        let values = aligned_values(&vector, &names(FeatureSchema::RawClinical))
            .expect("schemas match");
        assert_eq!(values.len(), 9);
    }

    #[test]
    fn test_aligned_values_rejects_other_schema() {
        let vector = derive(&PatientInput::default(), FeatureSchema::MetabolicProxy);
        let err = aligned_values(&vector, &names(FeatureSchema::RawClinical))
            .expect_err("different schema");
        assert_eq!(err, PredictorError::ShapeMismatch { got: 13, expected: 9 });
    }

    #[test]
    fn test_aligned_values_rejects_renamed_column() {
        let vector = derive(&PatientInput::default(), FeatureSchema::RawClinical);
        let mut model_names = names(FeatureSchema::RawClinical);
        model_names[6] = "cholesterol_level".to_string();

        let err = aligned_values(&vector, &model_names).expect_err("renamed column");
        assert!(matches!(err, PredictorError::SchemaMismatch { index: 6, .. }));
    }
}
