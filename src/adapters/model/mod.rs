//! Model adapter: loads the pretrained classifier artifact.
//!
//! The artifact is a JSON export (`model.json`) tagged by `kind`. Loading
//! runs, in order:
//! 1. Signed-manifest verification (or an explicit unsigned opt-in)
//! 2. Structural validation of the model parameters
//! 3. Column alignment against the configured [`FeatureSchema`]
//!
//! Any failure refuses the model. The result is an immutable handle meant to
//! be created once per process and shared.

pub mod forest;
pub mod integrity;
pub mod logistic;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::domain::{FeatureSchema, FeatureVector, RiskLabel};
use crate::ports::{Predictor, PredictorError};

pub use forest::{DecisionTree, RandomForest};
pub use logistic::LogisticRegression;

/// File name of the model export inside a model directory.
pub const MODEL_FILE: &str = "model.json";

/// Errors raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model I/O error: {0}")]
    Io(String),

    #[error("Model parse error: {0}")]
    Parse(String),

    #[error("Invalid model: {0}")]
    Invalid(String),

    #[error("Model schema mismatch: {0}")]
    SchemaMismatch(#[from] crate::domain::DomainError),

    #[error("Model signature error: {0}")]
    Signature(String),

    #[error("Model integrity error: {0}")]
    Integrity(String),

    #[error("Model at {0:?} is not signed; set HEARTCHECK_ALLOW_UNSIGNED_MODELS=true to load it anyway")]
    Unsigned(PathBuf),
}

/// Every model kind the loader understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ModelArtifact {
    /// # Errors
    /// Returns [`ModelError::Invalid`] on inconsistent parameters.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::LogisticRegression(m) => m.validate(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::LogisticRegression(_) => "logistic_regression",
        }
    }

    fn inner(&self) -> &dyn Predictor {
        match self {
            Self::RandomForest(m) => m,
            Self::LogisticRegression(m) => m,
        }
    }
}

impl Predictor for ModelArtifact {
    fn feature_names(&self) -> &[String] {
        self.inner().feature_names()
    }

    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel, PredictorError> {
        self.inner().predict(features)
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        self.inner().predict_probability(features)
    }
}

/// How the loaded artifact was authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Manifest signature and hashes verified; carries the manifest SHA-256.
    Signed { fingerprint: String },
    /// Loaded through the unsigned opt-in.
    Unsigned,
}

/// Summary of the loaded model for display.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub path: PathBuf,
    pub kind: &'static str,
    pub schema: FeatureSchema,
    pub n_features: usize,
    pub n_trees: Option<usize>,
    pub verification: Verification,
}

/// A verified, validated, schema-aligned model.
pub struct LoadedModel {
    pub predictor: Arc<dyn Predictor>,
    pub info: ModelInfo,
}

/// Loader settings, usually built from [`crate::config::AppConfig`].
#[derive(Debug, Clone)]
pub struct ModelLoader {
    schema: FeatureSchema,
    allow_unsigned: bool,
    verifying_key: Option<VerifyingKey>,
}

impl ModelLoader {
    #[must_use]
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            allow_unsigned: false,
            verifying_key: None,
        }
    }

    #[must_use]
    pub fn allow_unsigned(mut self, allow: bool) -> Self {
        self.allow_unsigned = allow;
        self
    }

    #[must_use]
    pub fn verifying_key(mut self, key: Option<VerifyingKey>) -> Self {
        self.verifying_key = key;
        self
    }

    /// Load the model at `path` (a model directory or a `model.json` file).
    ///
    /// # Errors
    /// Returns [`ModelError`] if the artifact cannot be read, authenticated,
    /// validated, or aligned with the configured schema.
    pub fn load(&self, path: &Path) -> Result<LoadedModel, ModelError> {
        if !path.exists() {
            return Err(ModelError::Io(format!("Model path not found: {path:?}")));
        }

        let base_dir = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };

        let verification = self.authenticate(base_dir)?;

        // A signed manifest binds MODEL_FILE, so never substitute another file.
        let model_path = match (&verification, path.is_file()) {
            (Verification::Unsigned, true) => path.to_path_buf(),
            _ => base_dir.join(MODEL_FILE),
        };

        let content = std::fs::read_to_string(&model_path)
            .map_err(|e| ModelError::Io(format!("Failed to read {model_path:?}: {e}")))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        artifact.validate()?;
        self.schema.check_names(artifact.feature_names())?;

        let n_trees = match &artifact {
            ModelArtifact::RandomForest(forest) => Some(forest.tree_count()),
            ModelArtifact::LogisticRegression(_) => None,
        };

        let info = ModelInfo {
            path: model_path,
            kind: artifact.kind(),
            schema: self.schema,
            n_features: artifact.feature_names().len(),
            n_trees,
            verification,
        };

        tracing::info!(
            "Loaded {} model from {:?} (schema={}, n_features={}, n_trees={:?})",
            info.kind,
            info.path,
            info.schema,
            info.n_features,
            info.n_trees
        );

        Ok(LoadedModel {
            predictor: Arc::new(artifact),
            info,
        })
    }

    fn authenticate(&self, base_dir: &Path) -> Result<Verification, ModelError> {
        if !integrity::is_signed(base_dir) {
            if self.allow_unsigned {
                tracing::warn!(
                    "Loading UNSIGNED model from {:?} (HEARTCHECK_ALLOW_UNSIGNED_MODELS=true)",
                    base_dir
                );
                return Ok(Verification::Unsigned);
            }
            tracing::error!("Model signature not found in {:?}", base_dir);
            return Err(ModelError::Unsigned(base_dir.to_path_buf()));
        }

        let key = self.verifying_key.as_ref().ok_or_else(|| {
            ModelError::Signature(
                "Model is signed but no public key is configured (HEARTCHECK_MODEL_PUBKEY_B64)"
                    .into(),
            )
        })?;

        let (_, fingerprint) = integrity::verify_dir(base_dir, key)?;
        Ok(Verification::Signed { fingerprint })
    }
}
