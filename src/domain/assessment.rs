//! Prediction and assessment result types.

use serde::{Deserialize, Serialize};

use super::features::FeatureVector;

/// Binary model label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0
    Low,
    /// Class 1, the positive class
    High,
}

impl RiskLabel {
    /// Map a class index to a label. Anything but 1 is the negative class.
    #[must_use]
    pub fn from_class(class: usize) -> Self {
        if class == 1 {
            Self::High
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - keep up a healthy lifestyle",
            Self::High => "High risk - please see a doctor for a full check-up",
        }
    }

    /// RGB for TUI display.
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),  // Emerald (#10B981)
            Self::High => (244, 63, 94),  // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW RISK"),
            Self::High => write!(f, "HIGH RISK"),
        }
    }
}

/// Model output for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,

    /// Probability of the positive class (0.0 to 1.0)
    pub probability: f64,
}

impl Prediction {
    #[must_use]
    pub fn new(label: RiskLabel, probability: f64) -> Self {
        Self { label, probability }
    }

    /// Positive-class probability as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }

    /// Result sentence as shown under the risk banner.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.label {
            RiskLabel::High => format!("{:.1}% chance of a heart attack", self.percent()),
            RiskLabel::Low => format!("Only {:.1}% risk", self.percent()),
        }
    }
}

/// Weight category shown next to the BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Normal,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_flag(obesity: u8) -> Self {
        if obesity == 0 {
            Self::Normal
        } else {
            Self::Obese
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal/Ideal weight",
            Self::Obese => "Obese",
        }
    }
}

/// Complete result of one risk check. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub features: FeatureVector,
    pub bmi: f64,
    pub prediction: Prediction,
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(features: FeatureVector, bmi: f64, prediction: Prediction) -> Self {
        Self {
            features,
            bmi,
            prediction,
            assessed_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_flag(self.features.obesity())
    }

    /// "BMI: 24.2 → Normal/Ideal weight"
    #[must_use]
    pub fn bmi_line(&self) -> String {
        format!("BMI: {:.1} → {}", self.bmi, self.bmi_category().label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::{derive, FeatureSchema};
    use crate::domain::patient::PatientInput;

    #[test]
    fn test_label_from_class() {
        assert_eq!(RiskLabel::from_class(0), RiskLabel::Low);
        assert_eq!(RiskLabel::from_class(1), RiskLabel::High);
    }

    #[test]
    fn test_summary_formatting() {
        let high = Prediction::new(RiskLabel::High, 0.8234);
        assert_eq!(high.summary(), "82.3% chance of a heart attack");

        let low = Prediction::new(RiskLabel::Low, 0.05);
        assert_eq!(low.summary(), "Only 5.0% risk");
    }

    #[test]
    fn test_bmi_line() {
        let input = PatientInput::default();
        let features = derive(&input, FeatureSchema::MetabolicProxy);
        let assessment = Assessment::new(features, 24.221, Prediction::new(RiskLabel::Low, 0.1));

        assert_eq!(assessment.bmi_category(), BmiCategory::Normal);
        assert_eq!(assessment.bmi_line(), "BMI: 24.2 → Normal/Ideal weight");
    }
}
