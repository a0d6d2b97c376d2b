//! Patient input types for heart-attack risk checking.
//!
//! Every radio/select choice on the form is a closed enumeration, so the
//! feature deriver can never meet an unmapped category. Text parsing exists
//! only at the boundary (config, fixtures) and fails with
//! [`DomainError::UnknownCategory`].

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Age slider bounds, in years.
pub const AGE_RANGE: RangeInclusive<u32> = 20..=100;
/// Body weight bounds, in kg.
pub const WEIGHT_RANGE: RangeInclusive<f64> = 30.0..=200.0;
/// Body height bounds, in cm.
pub const HEIGHT_RANGE: RangeInclusive<f64> = 120.0..=210.0;
/// Waist circumference bounds, in cm.
pub const WAIST_RANGE: RangeInclusive<f64> = 60.0..=150.0;
/// Total cholesterol bounds, in mg/dL.
pub const CHOLESTEROL_RANGE: RangeInclusive<f64> = 100.0..=400.0;
/// Fasting blood sugar bounds, in mg/dL.
pub const BLOOD_SUGAR_RANGE: RangeInclusive<f64> = 60.0..=300.0;

/// Yes/No answer to a diagnosis question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Answer {
    #[default]
    No,
    Yes,
}

impl Answer {
    /// All answers in form order.
    pub const ALL: [Answer; 2] = [Answer::No, Answer::Yes];

    /// Model encoding: No = 0, Yes = 1.
    #[must_use]
    pub fn as_flag(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl FromStr for Answer {
    type Err = DomainError;

    /// Exact, case-sensitive match on "No" / "Yes".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "No" => Ok(Self::No),
            "Yes" => Ok(Self::Yes),
            other => Err(DomainError::UnknownCategory {
                field: "answer",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Smoking history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    #[default]
    Never,
    Former,
    Current,
}

impl SmokingStatus {
    pub const ALL: [SmokingStatus; 3] = [Self::Never, Self::Former, Self::Current];

    /// Model encoding: never = 0, former = 1, current = 2.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Never => 0,
            Self::Former => 1,
            Self::Current => 2,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Never => "Never smoked",
            Self::Former => "Former (quit)",
            Self::Current => "Current smoker",
        }
    }
}

impl FromStr for SmokingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "former" => Ok(Self::Former),
            "current" => Ok(Self::Current),
            other => Err(DomainError::UnknownCategory {
                field: "smoking_status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SmokingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sex as asked on the form. Not part of any model schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Self::Male, Self::Female];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(DomainError::UnknownCategory {
                field: "sex",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One form submission. Ephemeral: built on submit, dropped after the
/// assessment is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Age in years
    pub age: u32,

    pub sex: Sex,

    pub previous_heart_disease: Answer,
    pub hypertension: Answer,
    pub diabetes: Answer,

    pub smoking_status: SmokingStatus,

    pub weight_kg: f64,
    pub height_cm: f64,
    pub waist_circumference_cm: f64,

    /// Total cholesterol in mg/dL
    pub cholesterol_total_mg_dl: f64,

    /// Fasting blood sugar in mg/dL
    pub fasting_blood_sugar_mg_dl: f64,

    /// Self-reported obesity (BMI ≥ 30). Only asked when the clinical schema
    /// is active; otherwise obesity is derived from BMI.
    #[serde(default)]
    pub reported_obesity: Option<Answer>,
}

impl Default for PatientInput {
    /// Form defaults.
    fn default() -> Self {
        Self {
            age: 50,
            sex: Sex::Male,
            previous_heart_disease: Answer::No,
            hypertension: Answer::No,
            diabetes: Answer::No,
            smoking_status: SmokingStatus::Never,
            weight_kg: 70.0,
            height_cm: 170.0,
            waist_circumference_cm: 90.0,
            cholesterol_total_mg_dl: 200.0,
            fasting_blood_sugar_mg_dl: 100.0,
            reported_obesity: None,
        }
    }
}

impl PatientInput {
    /// Check every numeric field against the form bounds.
    ///
    /// The deriver never calls this; it is for the presentation layer.
    ///
    /// # Errors
    /// Returns one [`DomainError::OutOfRange`] per offending field.
    pub fn validate(&self) -> Result<(), Vec<DomainError>> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(DomainError::OutOfRange {
                field: "age",
                value: f64::from(self.age),
                min: f64::from(*AGE_RANGE.start()),
                max: f64::from(*AGE_RANGE.end()),
            });
        }

        let numeric = [
            ("weight_kg", self.weight_kg, &WEIGHT_RANGE),
            ("height_cm", self.height_cm, &HEIGHT_RANGE),
            ("waist_circumference_cm", self.waist_circumference_cm, &WAIST_RANGE),
            ("cholesterol_total_mg_dl", self.cholesterol_total_mg_dl, &CHOLESTEROL_RANGE),
            ("fasting_blood_sugar_mg_dl", self.fasting_blood_sugar_mg_dl, &BLOOD_SUGAR_RANGE),
        ];
        for (field, value, range) in numeric {
            if !range.contains(&value) {
                errors.push(DomainError::OutOfRange {
                    field,
                    value,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_mapping() {
        assert_eq!(Answer::No.as_flag(), 0);
        assert_eq!(Answer::Yes.as_flag(), 1);
        assert_eq!(Answer::from(true), Answer::Yes);
    }

    #[test]
    fn test_answer_parse_is_case_sensitive() {
        assert_eq!("Yes".parse::<Answer>().expect("exact match"), Answer::Yes);
        assert_eq!("No".parse::<Answer>().expect("exact match"), Answer::No);

        let err = "yes".parse::<Answer>().expect_err("lowercase must fail");
        assert!(matches!(err, DomainError::UnknownCategory { field: "answer", .. }));
        assert!("Ya".parse::<Answer>().is_err());
    }

    #[test]
    fn test_smoking_codes() {
        let codes: Vec<u8> = SmokingStatus::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0, 1, 2]);
        assert_eq!("former".parse::<SmokingStatus>().expect("parse"), SmokingStatus::Former);
        assert!("Former".parse::<SmokingStatus>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(PatientInput::default().validate().is_ok());
    }

    #[test]
    fn test_validation_reports_each_field() {
        let input = PatientInput {
            age: 12,
            height_cm: 250.0,
            fasting_blood_sugar_mg_dl: 20.0,
            ..Default::default()
        };
        let errors = input.validate().expect_err("should be out of range");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let input = PatientInput {
            age: 100,
            weight_kg: 30.0,
            height_cm: 210.0,
            waist_circumference_cm: 150.0,
            cholesterol_total_mg_dl: 400.0,
            fasting_blood_sugar_mg_dl: 60.0,
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_deserialize_rejects_unknown_smoking_status() {
        let json = r#"{
            "age": 40, "sex": "female",
            "previous_heart_disease": "No", "hypertension": "Yes", "diabetes": "No",
            "smoking_status": "sometimes",
            "weight_kg": 60.0, "height_cm": 160.0, "waist_circumference_cm": 80.0,
            "cholesterol_total_mg_dl": 180.0, "fasting_blood_sugar_mg_dl": 90.0
        }"#;
        assert!(serde_json::from_str::<PatientInput>(json).is_err());
    }
}
