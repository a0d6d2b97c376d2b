//! Random forest classifier exported in array-of-nodes form.
//!
//! Each tree uses the scikit-learn `tree_` layout: parallel arrays indexed by
//! node id, `children_left[i] == -1` marks a leaf, and `value[i]` holds the
//! class distribution (counts or fractions) at that node.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::domain::{FeatureVector, RiskLabel};
use crate::ports::{aligned_values, Predictor, PredictorError};

const LEAF: i64 = -1;

/// A single fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Structural checks run once at load so traversal can index freely.
    ///
    /// Children must point strictly forward, which also rules out cycles.
    fn validate(
        &self,
        index: usize,
        n_features: usize,
        n_classes: usize,
    ) -> Result<(), ModelError> {
        let n = self.node_count();
        if n == 0 {
            return Err(ModelError::Invalid(format!("tree {index} has no nodes")));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(ModelError::Invalid(format!(
                "tree {index}: node arrays have different lengths"
            )));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(ModelError::Invalid(format!(
                        "tree {index} node {node}: half-leaf ({left}, {right})"
                    )));
                }
                let dist = &self.value[node];
                if dist.len() != n_classes {
                    return Err(ModelError::Invalid(format!(
                        "tree {index} node {node}: expected {n_classes} class values, got {}",
                        dist.len()
                    )));
                }
                let negative = dist.iter().any(|v| !v.is_finite() || *v < 0.0);
                if negative || dist.iter().sum::<f64>() <= 0.0 {
                    return Err(ModelError::Invalid(format!(
                        "tree {index} node {node}: leaf distribution is empty or negative"
                    )));
                }
                continue;
            }

            let in_range = |child: i64| child > node as i64 && (child as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(ModelError::Invalid(format!(
                    "tree {index} node {node}: child index out of range ({left}, {right})"
                )));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(ModelError::Invalid(format!(
                    "tree {index} node {node}: feature {feature} out of range"
                )));
            }
            if self.threshold[node].is_nan() {
                return Err(ModelError::Invalid(format!(
                    "tree {index} node {node}: NaN threshold"
                )));
            }
        }
        Ok(())
    }

    /// Leaf reached by `x`, as a raw class distribution.
    fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }

    /// Normalized class distribution at the leaf reached by `x`.
    fn predict_proba_row(&self, x: &[f64], out: &mut [f64]) {
        let dist = self.leaf(x);
        let total: f64 = dist.iter().sum();
        for (acc, v) in out.iter_mut().zip(dist) {
            *acc += v / total;
        }
    }
}

/// Averaging ensemble of decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub feature_names: Vec<String>,
    #[serde(default = "default_n_classes")]
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

fn default_n_classes() -> usize {
    2
}

impl RandomForest {
    /// # Errors
    /// Returns [`ModelError::Invalid`] on any structural inconsistency.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.is_empty() {
            return Err(ModelError::Invalid("random forest has no features".into()));
        }
        if self.n_classes != 2 {
            return Err(ModelError::Invalid(format!(
                "binary classifier required, got n_classes={}",
                self.n_classes
            )));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("random forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.feature_names.len(), self.n_classes)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree leaf distributions.
    fn class_distribution(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictorError> {
        let x = aligned_values(features, &self.feature_names)?;
        let mut dist = vec![0.0; self.n_classes];
        for tree in &self.trees {
            tree.predict_proba_row(&x, &mut dist);
        }
        let n = self.trees.len() as f64;
        for v in dist.iter_mut() {
            *v /= n;
        }
        if dist.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::NonFinite);
        }
        Ok(dist)
    }
}

impl Predictor for RandomForest {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel, PredictorError> {
        let dist = self.class_distribution(features)?;
        // First maximum wins, so ties go to the negative class.
        let mut best = 0;
        for (class, p) in dist.iter().enumerate().skip(1) {
            if *p > dist[best] {
                best = class;
            }
        }
        Ok(RiskLabel::from_class(best))
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let dist = self.class_distribution(features)?;
        Ok(dist[1].clamp(0.0, 1.0))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{derive, Answer, FeatureSchema, PatientInput};

    /// Stump on column `feature`: left leaf `left`, right leaf `right`.
    pub(crate) fn stump(
        feature: i64,
        threshold: f64,
        left: [f64; 2],
        right: [f64; 2],
    ) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![vec![1.0, 1.0], left.to_vec(), right.to_vec()],
        }
    }

    pub(crate) fn metabolic_names() -> Vec<String> {
        FeatureSchema::MetabolicProxy
            .feature_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Two trees keyed on metabolic_syndrome_count (col 0) and age (col 8).
    pub(crate) fn sample_forest() -> RandomForest {
        RandomForest {
            feature_names: metabolic_names(),
            n_classes: 2,
            trees: vec![
                stump(0, 1.5, [90.0, 10.0], [20.0, 80.0]),
                stump(8, 59.5, [0.7, 0.3], [0.1, 0.9]),
            ],
        }
    }

    #[test]
    fn test_sample_forest_is_valid() {
        sample_forest().validate().expect("valid forest");
    }

    #[test]
    fn test_probability_is_mean_of_leaves() {
        let forest = sample_forest();

        // count 0, age 50 -> (0.1 + 0.3) / 2
        let low = derive(&PatientInput::default(), FeatureSchema::MetabolicProxy);
        let p = forest.predict_probability(&low).expect("predict");
        assert!((p - 0.2).abs() < 1e-12);
        assert_eq!(forest.predict(&low).expect("predict"), RiskLabel::Low);

        // count 2, age 70 -> (0.8 + 0.9) / 2
        let high_input = PatientInput {
            age: 70,
            hypertension: Answer::Yes,
            diabetes: Answer::Yes,
            ..Default::default()
        };
        let high = derive(&high_input, FeatureSchema::MetabolicProxy);
        let p = forest.predict_probability(&high).expect("predict");
        assert!((p - 0.85).abs() < 1e-12);
        assert_eq!(forest.predict(&high).expect("predict"), RiskLabel::High);
    }

    #[test]
    fn test_tie_goes_to_negative_class() {
        let forest = RandomForest {
            feature_names: metabolic_names(),
            n_classes: 2,
            trees: vec![stump(0, 0.5, [5.0, 5.0], [5.0, 5.0])],
        };
        let x = derive(&PatientInput::default(), FeatureSchema::MetabolicProxy);
        assert_eq!(forest.predict(&x).expect("predict"), RiskLabel::Low);
        assert!((forest.predict_probability(&x).expect("predict") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_goes_left_when_equal() {
        let forest = RandomForest {
            feature_names: metabolic_names(),
            n_classes: 2,
            trees: vec![stump(8, 50.0, [1.0, 0.0], [0.0, 1.0])],
        };
        let x = derive(&PatientInput::default(), FeatureSchema::MetabolicProxy);
        assert_eq!(forest.predict_probability(&x).expect("predict"), 0.0);
    }

    #[test]
    fn test_rejects_clinical_vector() {
        let forest = sample_forest();
        let x = derive(&PatientInput::default(), FeatureSchema::RawClinical);
        assert!(matches!(
            forest.predict(&x),
            Err(PredictorError::ShapeMismatch { got: 9, expected: 13 })
        ));
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let mut forest = sample_forest();
        forest.trees[0].children_left[0] = 0;
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_feature_out_of_range() {
        let mut forest = sample_forest();
        forest.trees[1].feature[0] = 13;
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_multiclass() {
        let mut forest = sample_forest();
        forest.n_classes = 3;
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_leaf() {
        let mut forest = sample_forest();
        forest.trees[0].value[1] = vec![0.0, 0.0];
        assert!(forest.validate().is_err());
    }
}
