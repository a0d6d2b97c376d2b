//! Assessment service: scores one form submission.
//!
//! This service coordinates:
//! - Bounds check on the submitted form
//! - Feature derivation for the configured schema
//! - Label and probability from the shared predictor
//!
//! Nothing is persisted; the returned [`Assessment`] is the only copy.

use std::sync::Arc;

use crate::adapters::sanitize::Redacted;
use crate::domain::features::bmi;
use crate::domain::{derive, Assessment, FeatureSchema, PatientInput, Prediction};
use crate::ports::Predictor;
use crate::HeartCheckError;

/// Runs the risk check against a model loaded once at startup.
#[derive(Clone)]
pub struct AssessmentService {
    predictor: Arc<dyn Predictor>,
    schema: FeatureSchema,
}

impl AssessmentService {
    /// Create a service over an already verified and schema-aligned predictor.
    pub fn new(predictor: Arc<dyn Predictor>, schema: FeatureSchema) -> Self {
        Self { predictor, schema }
    }

    #[must_use]
    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// Derive features for `input` and score them.
    ///
    /// # Errors
    /// Returns [`HeartCheckError::Domain`] for the first out-of-range field, or
    /// [`HeartCheckError::Prediction`] if the model rejects the vector.
    pub fn assess(&self, input: &PatientInput) -> Result<Assessment, HeartCheckError> {
        if let Err(errors) = input.validate() {
            tracing::warn!("Rejected submission with {} out-of-range field(s)", errors.len());
            if let Some(first) = errors.into_iter().next() {
                return Err(first.into());
            }
        }

        let features = derive(input, self.schema);
        let bmi = bmi(input.weight_kg, input.height_cm);
        tracing::debug!(
            "Derived {} features (schema={}, bmi={:?})",
            features.names().len(),
            self.schema,
            Redacted(bmi)
        );

        let label = self.predictor.predict(&features)?;
        let probability = self.predictor.predict_probability(&features)?;

        tracing::info!("Assessment complete: {}", label);

        Ok(Assessment::new(features, bmi, Prediction::new(label, probability)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::model::forest::tests::sample_forest;
    use crate::domain::{Answer, RiskLabel};

    fn service() -> AssessmentService {
        AssessmentService::new(Arc::new(sample_forest()), FeatureSchema::MetabolicProxy)
    }

    #[test]
    fn test_assess_defaults() {
        let assessment = service().assess(&PatientInput::default()).expect("assess");

        // count 0, age 50 -> (0.1 + 0.3) / 2
        assert!((assessment.prediction.probability - 0.2).abs() < 1e-12);
        assert_eq!(assessment.prediction.label, RiskLabel::Low);
        assert!((assessment.bmi - 70.0 / (1.7 * 1.7)).abs() < 1e-9);
        assert_eq!(assessment.bmi_line(), "BMI: 24.2 → Normal/Ideal weight");
    }

    #[test]
    fn test_assess_high_risk() {
        let input = PatientInput {
            age: 72,
            hypertension: Answer::Yes,
            diabetes: Answer::Yes,
            weight_kg: 95.0,
            ..Default::default()
        };
        let assessment = service().assess(&input).expect("assess");

        assert_eq!(assessment.prediction.label, RiskLabel::High);
        assert!((0.0..=1.0).contains(&assessment.prediction.probability));
        assert_eq!(assessment.features.obesity(), 1);
        assert!(assessment.bmi_line().ends_with("Obese"));
    }

    #[test]
    fn test_assess_rejects_out_of_range() {
        let input = PatientInput {
            height_cm: 90.0,
            ..Default::default()
        };
        let err = service().assess(&input).expect_err("must fail");
        assert!(matches!(err, HeartCheckError::Domain(_)));
    }

    #[test]
    fn test_assess_schema_disagreement_is_prediction_error() {
        let service = AssessmentService::new(Arc::new(sample_forest()), FeatureSchema::RawClinical);
        let err = service.assess(&PatientInput::default()).expect_err("must fail");
        assert!(matches!(err, HeartCheckError::Prediction(_)));
    }
}
