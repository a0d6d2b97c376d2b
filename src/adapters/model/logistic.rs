//! Logistic regression classifier with optional standard scaling.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::domain::{FeatureVector, RiskLabel};
use crate::ports::{aligned_values, Predictor, PredictorError};

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
    /// Decision threshold on the positive-class probability.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl LogisticRegression {
    /// # Errors
    /// Returns [`ModelError::Invalid`] if parameter lengths disagree or a
    /// parameter is not finite.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(ModelError::Invalid("logistic regression has no features".into()));
        }
        if self.coefficients.len() != n {
            return Err(ModelError::Invalid(
                "coefficient count does not match feature_names length".into(),
            ));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err(ModelError::Invalid("non-finite coefficient".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::Invalid(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }

        match (&self.scaler_mean, &self.scaler_scale) {
            (None, None) => {}
            (Some(mean), Some(scale)) => {
                if mean.len() != n || scale.len() != n {
                    return Err(ModelError::Invalid(
                        "scaler lengths do not match feature_names length".into(),
                    ));
                }
                if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                    return Err(ModelError::Invalid(
                        "scaler_scale must be finite and non-zero".into(),
                    ));
                }
            }
            _ => {
                return Err(ModelError::Invalid(
                    "scaler_mean and scaler_scale must be given together".into(),
                ))
            }
        }
        Ok(())
    }

    /// Linear score `intercept + Σ coef · x_scaled`.
    fn decision_function(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let x = aligned_values(features, &self.feature_names)?;

        let mut z = self.intercept;
        for (i, (value, coef)) in x.iter().zip(&self.coefficients).enumerate() {
            let scaled = match (&self.scaler_mean, &self.scaler_scale) {
                (Some(mean), Some(scale)) => (value - mean[i]) / scale[i],
                _ => *value,
            };
            z += coef * scaled;
        }
        Ok(z)
    }
}

impl Predictor for LogisticRegression {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel, PredictorError> {
        let p = self.predict_probability(features)?;
        Ok(if p >= self.threshold {
            RiskLabel::High
        } else {
            RiskLabel::Low
        })
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let p = sigmoid(self.decision_function(features)?);
        if !p.is_finite() {
            return Err(PredictorError::NonFinite);
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive, FeatureSchema, PatientInput};

    fn clinical_model() -> LogisticRegression {
        LogisticRegression {
            feature_names: FeatureSchema::RawClinical
                .feature_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            // age only
            coefficients: vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            intercept: 0.0,
            scaler_mean: Some(vec![50.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            scaler_scale: Some(vec![10.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
            threshold: 0.5,
        }
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_scaled_probability() {
        let model = clinical_model();
        model.validate().expect("valid model");

        let at_mean = derive(&PatientInput::default(), FeatureSchema::RawClinical);
        let p = model.predict_probability(&at_mean).expect("predict");
        assert!((p - 0.5).abs() < 1e-12);
        // Threshold is inclusive.
        assert_eq!(model.predict(&at_mean).expect("predict"), RiskLabel::High);

        let young = PatientInput {
            age: 30,
            ..Default::default()
        };
        let x = derive(&young, FeatureSchema::RawClinical);
        let p = model.predict_probability(&x).expect("predict");
        assert!((p - sigmoid(-2.0)).abs() < 1e-12);
        assert_eq!(model.predict(&x).expect("predict"), RiskLabel::Low);
    }

    #[test]
    fn test_validate_rejects_half_scaler() {
        let mut model = clinical_model();
        model.scaler_scale = None;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let mut model = clinical_model();
        if let Some(scale) = model.scaler_scale.as_mut() {
            scale[3] = 0.0;
        }
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_coefficient_count() {
        let mut model = clinical_model();
        model.coefficients.pop();
        assert!(model.validate().is_err());
    }
}
