//! Runtime configuration from `HEARTCHECK_*` environment variables.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HEARTCHECK_MODEL_PATH` | `models` | model directory or `model.json` |
//! | `HEARTCHECK_FEATURE_SCHEMA` | `metabolic` | `metabolic` or `clinical` |
//! | `HEARTCHECK_ALLOW_UNSIGNED_MODELS` | `false` | load models without `model.sig` |
//! | `HEARTCHECK_MODEL_PUBKEY_B64` | unset | Ed25519 verifying key, base64 |
//! | `HEARTCHECK_MODEL_PUBKEY_B64_FILE` | unset | file holding the key above |
//! | `HEARTCHECK_LOG_MODE` | `auto` | `auto`, `file` or `stdout` |
//! | `HEARTCHECK_LOG_FILE` | `heartcheck.log` | log file when logging to file |

use std::path::PathBuf;

use ed25519_dalek::VerifyingKey;

use crate::adapters::model::integrity::verifying_key_from_b64;
use crate::adapters::ModelLoader;
use crate::domain::FeatureSchema;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Failed to read {var} file {path:?}: {source}")]
    File {
        var: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(ConfigError::Invalid {
                var: "HEARTCHECK_LOG_MODE",
                reason: format!("expected auto, file or stdout, got {other:?}"),
            }),
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub schema: FeatureSchema,
    pub allow_unsigned_models: bool,
    pub model_pubkey: Option<VerifyingKey>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            schema: FeatureSchema::MetabolicProxy,
            allow_unsigned_models: false,
            model_pubkey: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("heartcheck.log"),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, so tests need not touch the
    /// process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_path = lookup("HEARTCHECK_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let schema = match lookup("HEARTCHECK_FEATURE_SCHEMA") {
            Some(v) => v.trim().parse::<FeatureSchema>().map_err(|e| {
                ConfigError::Invalid {
                    var: "HEARTCHECK_FEATURE_SCHEMA",
                    reason: e.to_string(),
                }
            })?,
            None => defaults.schema,
        };

        let allow_unsigned_models = lookup("HEARTCHECK_ALLOW_UNSIGNED_MODELS")
            .map(|v| parse_bool(&v))
            .unwrap_or(defaults.allow_unsigned_models);

        let pubkey_b64 = match lookup("HEARTCHECK_MODEL_PUBKEY_B64_FILE") {
            Some(path) => {
                let path = PathBuf::from(path.trim());
                Some(std::fs::read_to_string(&path).map_err(|source| ConfigError::File {
                    var: "HEARTCHECK_MODEL_PUBKEY_B64_FILE",
                    path,
                    source,
                })?)
            }
            None => lookup("HEARTCHECK_MODEL_PUBKEY_B64"),
        };
        let model_pubkey = pubkey_b64
            .map(|b64| {
                verifying_key_from_b64(&b64).map_err(|e| ConfigError::Invalid {
                    var: "HEARTCHECK_MODEL_PUBKEY_B64",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let log_mode = match lookup("HEARTCHECK_LOG_MODE") {
            Some(v) => LogMode::parse(v.trim())?,
            None => defaults.log_mode,
        };

        let log_file = lookup("HEARTCHECK_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_file);

        Ok(Self {
            model_path,
            schema,
            allow_unsigned_models,
            model_pubkey,
            log_mode,
            log_file,
        })
    }

    /// Model loader carrying this configuration's trust settings.
    #[must_use]
    pub fn model_loader(&self) -> ModelLoader {
        ModelLoader::new(self.schema)
            .allow_unsigned(self.allow_unsigned_models)
            .verifying_key(self.model_pubkey)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(config.model_path, PathBuf::from("models"));
        assert_eq!(config.schema, FeatureSchema::MetabolicProxy);
        assert!(!config.allow_unsigned_models);
        assert!(config.model_pubkey.is_none());
        assert_eq!(config.log_mode, LogMode::Auto);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("HEARTCHECK_MODEL_PATH", "/opt/models/v2"),
            ("HEARTCHECK_FEATURE_SCHEMA", "clinical"),
            ("HEARTCHECK_ALLOW_UNSIGNED_MODELS", "yes"),
            ("HEARTCHECK_LOG_MODE", "stdout"),
        ]))
        .expect("valid config");

        assert_eq!(config.model_path, PathBuf::from("/opt/models/v2"));
        assert_eq!(config.schema, FeatureSchema::RawClinical);
        assert!(config.allow_unsigned_models);
        assert!(!config.log_mode.use_file(true));
    }

    #[test]
    fn test_unknown_schema_is_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("HEARTCHECK_FEATURE_SCHEMA", "legacy")]))
            .expect_err("must fail");
        assert!(err.to_string().contains("HEARTCHECK_FEATURE_SCHEMA"));
    }

    #[test]
    fn test_bad_pubkey_is_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("HEARTCHECK_MODEL_PUBKEY_B64", "nope")]))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::Invalid { var: "HEARTCHECK_MODEL_PUBKEY_B64", .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("on"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_log_mode_auto() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
    }
}
