//! Feature derivation: patient form input to model attribute vector.
//!
//! Two schemas exist because two exports of the model were trained on
//! different columns. Whichever is active, the emitted order must equal the
//! training-time column order exactly; [`FeatureSchema::feature_names`] is the
//! golden list the model loader checks artifacts against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::patient::{Answer, PatientInput};
use super::DomainError;

/// BMI at or above which the metabolic schema flags obesity (Asian cut-off).
pub const OBESITY_BMI_ASIAN: f64 = 27.5;

/// BMI at or above which the clinical schema flags obesity when the patient
/// did not answer the question.
pub const OBESITY_BMI_WHO: f64 = 30.0;

/// Total cholesterol above which the metabolic proxy counts a risk factor.
pub const HIGH_CHOLESTEROL_MG_DL: f64 = 200.0;

/// Number of risk factors at which the metabolic syndrome proxy is set.
pub const METABOLIC_SYNDROME_MIN_COUNT: u8 = 3;

/// Golden column order for [`FeatureSchema::MetabolicProxy`].
pub const METABOLIC_FEATURE_NAMES: [&str; 13] = [
    "metabolic_syndrome_count",
    "previous_heart_disease",
    "hypertension",
    "metabolic_syndrome",
    "diabetes",
    "obesity",
    "smoking_status",
    "age_group",
    "age",
    "cholesterol_level",
    "fasting_blood_sugar",
    "BMI_est",
    "waist_circumference",
];

/// Golden column order for [`FeatureSchema::RawClinical`].
pub const CLINICAL_FEATURE_NAMES: [&str; 9] = [
    "age",
    "previous_heart_disease",
    "hypertension",
    "diabetes",
    "obesity",
    "smoking_status",
    "cholesterol_total",
    "fasting_blood_sugar",
    "waist_circumference",
];

/// Which training-time column layout the model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeatureSchema {
    /// Engineered features: metabolic proxy, age/cholesterol bins, BMI.
    #[default]
    #[serde(rename = "metabolic")]
    MetabolicProxy,
    /// Mostly raw measurements with a user-supplied obesity flag.
    #[serde(rename = "clinical")]
    RawClinical,
}

impl FeatureSchema {
    #[must_use]
    pub fn feature_names(self) -> &'static [&'static str] {
        match self {
            Self::MetabolicProxy => &METABOLIC_FEATURE_NAMES,
            Self::RawClinical => &CLINICAL_FEATURE_NAMES,
        }
    }

    /// Whether the form must ask the obesity question directly.
    #[must_use]
    pub fn asks_obesity(self) -> bool {
        matches!(self, Self::RawClinical)
    }

    /// Check that `names` is exactly this schema's golden list.
    ///
    /// # Errors
    /// Returns [`DomainError::SchemaMismatch`] naming the first position that differs.
    pub fn check_names<S: AsRef<str>>(self, names: &[S]) -> Result<(), DomainError> {
        let expected = self.feature_names();
        if names.len() != expected.len() {
            return Err(DomainError::SchemaMismatch(format!(
                "expected {} columns for {} schema, got {}",
                expected.len(),
                self,
                names.len()
            )));
        }
        for (i, (got, want)) in names.iter().zip(expected.iter()).enumerate() {
            if got.as_ref() != *want {
                return Err(DomainError::SchemaMismatch(format!(
                    "column {i}: expected {want:?}, got {:?}",
                    got.as_ref()
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for FeatureSchema {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metabolic" => Ok(Self::MetabolicProxy),
            "clinical" => Ok(Self::RawClinical),
            other => Err(DomainError::UnknownCategory {
                field: "feature_schema",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetabolicProxy => f.write_str("metabolic"),
            Self::RawClinical => f.write_str("clinical"),
        }
    }
}

/// Body mass index from weight in kg and height in cm.
#[must_use]
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Obesity flag from BMI against a threshold (inclusive).
#[must_use]
pub fn obesity_from_bmi(bmi: f64, threshold: f64) -> u8 {
    u8::from(bmi >= threshold)
}

/// Age bucket: `<30`, `<45`, `<60`, `<80`, rest.
#[must_use]
pub fn age_group(age: u32) -> u8 {
    match age {
        0..=29 => 0,
        30..=44 => 1,
        45..=59 => 2,
        60..=79 => 3,
        _ => 4,
    }
}

/// Cholesterol bucket: `<200`, `<240`, rest.
#[must_use]
pub fn cholesterol_level(cholesterol_total: f64) -> u8 {
    if cholesterol_total < 200.0 {
        0
    } else if cholesterol_total < 240.0 {
        1
    } else {
        2
    }
}

/// Count of metabolic risk factors, in `0..=4`.
#[must_use]
pub fn metabolic_count(
    diabetes: Answer,
    hypertension: Answer,
    obesity: u8,
    cholesterol_total: f64,
) -> u8 {
    diabetes.as_flag()
        + hypertension.as_flag()
        + obesity.min(1)
        + u8::from(cholesterol_total > HIGH_CHOLESTEROL_MG_DL)
}

#[must_use]
pub fn metabolic_syndrome(count: u8) -> u8 {
    u8::from(count >= METABOLIC_SYNDROME_MIN_COUNT)
}

/// Columns of the metabolic proxy schema, in training order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetabolicFeatures {
    pub metabolic_syndrome_count: u8,
    pub previous_heart_disease: u8,
    pub hypertension: u8,
    pub metabolic_syndrome: u8,
    pub diabetes: u8,
    pub obesity: u8,
    pub smoking_status: u8,
    pub age_group: u8,
    pub age: u32,
    pub cholesterol_level: u8,
    pub fasting_blood_sugar: f64,
    #[serde(rename = "BMI_est")]
    pub bmi_est: f64,
    pub waist_circumference: f64,
}

impl MetabolicFeatures {
    /// Values in [`METABOLIC_FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.metabolic_syndrome_count),
            f64::from(self.previous_heart_disease),
            f64::from(self.hypertension),
            f64::from(self.metabolic_syndrome),
            f64::from(self.diabetes),
            f64::from(self.obesity),
            f64::from(self.smoking_status),
            f64::from(self.age_group),
            f64::from(self.age),
            f64::from(self.cholesterol_level),
            self.fasting_blood_sugar,
            self.bmi_est,
            self.waist_circumference,
        ]
    }
}

/// Columns of the raw clinical schema, in training order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFeatures {
    pub age: u32,
    pub previous_heart_disease: u8,
    pub hypertension: u8,
    pub diabetes: u8,
    pub obesity: u8,
    pub smoking_status: u8,
    pub cholesterol_total: f64,
    pub fasting_blood_sugar: f64,
    pub waist_circumference: f64,
}

impl ClinicalFeatures {
    /// Values in [`CLINICAL_FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.age),
            f64::from(self.previous_heart_disease),
            f64::from(self.hypertension),
            f64::from(self.diabetes),
            f64::from(self.obesity),
            f64::from(self.smoking_status),
            self.cholesterol_total,
            self.fasting_blood_sugar,
            self.waist_circumference,
        ]
    }
}

/// Model input for one patient, tagged with its schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum FeatureVector {
    Metabolic(MetabolicFeatures),
    Clinical(ClinicalFeatures),
}

impl FeatureVector {
    #[must_use]
    pub fn schema(&self) -> FeatureSchema {
        match self {
            Self::Metabolic(_) => FeatureSchema::MetabolicProxy,
            Self::Clinical(_) => FeatureSchema::RawClinical,
        }
    }

    #[must_use]
    pub fn names(&self) -> &'static [&'static str] {
        self.schema().feature_names()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Metabolic(f) => f.to_vec(),
            Self::Clinical(f) => f.to_vec(),
        }
    }

    /// The obesity flag that was fed to the model.
    #[must_use]
    pub fn obesity(&self) -> u8 {
        match self {
            Self::Metabolic(f) => f.obesity,
            Self::Clinical(f) => f.obesity,
        }
    }
}

/// Derive the model input for `schema` from one form submission.
///
/// Total for every in-bounds input; has no side effects.
#[must_use]
pub fn derive(input: &PatientInput, schema: FeatureSchema) -> FeatureVector {
    let bmi_est = bmi(input.weight_kg, input.height_cm);

    match schema {
        FeatureSchema::MetabolicProxy => {
            let obesity = obesity_from_bmi(bmi_est, OBESITY_BMI_ASIAN);
            let count = metabolic_count(
                input.diabetes,
                input.hypertension,
                obesity,
                input.cholesterol_total_mg_dl,
            );

            FeatureVector::Metabolic(MetabolicFeatures {
                metabolic_syndrome_count: count,
                previous_heart_disease: input.previous_heart_disease.as_flag(),
                hypertension: input.hypertension.as_flag(),
                metabolic_syndrome: metabolic_syndrome(count),
                diabetes: input.diabetes.as_flag(),
                obesity,
                smoking_status: input.smoking_status.code(),
                age_group: age_group(input.age),
                age: input.age,
                cholesterol_level: cholesterol_level(input.cholesterol_total_mg_dl),
                fasting_blood_sugar: input.fasting_blood_sugar_mg_dl,
                bmi_est,
                waist_circumference: input.waist_circumference_cm,
            })
        }
        FeatureSchema::RawClinical => {
            let obesity = match input.reported_obesity {
                Some(answer) => answer.as_flag(),
                None => obesity_from_bmi(bmi_est, OBESITY_BMI_WHO),
            };

            FeatureVector::Clinical(ClinicalFeatures {
                age: input.age,
                previous_heart_disease: input.previous_heart_disease.as_flag(),
                hypertension: input.hypertension.as_flag(),
                diabetes: input.diabetes.as_flag(),
                obesity,
                smoking_status: input.smoking_status.code(),
                cholesterol_total: input.cholesterol_total_mg_dl,
                fasting_blood_sugar: input.fasting_blood_sugar_mg_dl,
                waist_circumference: input.waist_circumference_cm,
            })
        }
    }
}
