//! # Heartcheck
//!
//! Terminal heart-attack risk checker backed by a pretrained classifier.
//!
//! A patient fills in a short form; the answers are turned into the exact
//! feature vector the model was trained on and scored locally. Nothing is
//! stored: the form, features and result live only for one screen.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Patient input, feature derivation, prediction types
//! - `ports`: The [`ports::Predictor`] trait the model sits behind
//! - `adapters`: Model loading and verification, log sanitization
//! - `application`: The risk assessment use case
//! - `config`: `HEARTCHECK_*` environment settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Assessment, FeatureSchema, PatientInput, Prediction, RiskLabel};

/// Result type for Heartcheck operations
pub type Result<T> = std::result::Result<T, HeartCheckError>;

/// Main error type for Heartcheck
#[derive(Debug, thiserror::Error)]
pub enum HeartCheckError {
    #[error("Invalid patient data: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Model unavailable: {0}")]
    Model(#[from] adapters::ModelError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] ports::PredictorError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
