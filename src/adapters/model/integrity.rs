//! Signed manifest verification for model directories.
//!
//! A signed directory holds `manifest.json` (SHA-256 of every bound file) and
//! `model.sig` (Ed25519 signature over the exact manifest bytes). The
//! `sign_model` binary produces both.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ModelError, MODEL_FILE};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Relative file name to lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Hash `files` (relative to `dir`) into a version 1 manifest.
    ///
    /// # Errors
    /// Returns [`ModelError::Io`] if a file cannot be read.
    pub fn build(dir: &Path, files: &[&str]) -> Result<Self, ModelError> {
        let mut map = BTreeMap::new();
        for rel in files {
            let path = dir.join(rel);
            let bytes = fs::read(&path)
                .map_err(|e| ModelError::Io(format!("Failed to read {path:?}: {e}")))?;
            map.insert((*rel).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: 1,
            created_at: Some(chrono::Utc::now().timestamp()),
            files: map,
        })
    }
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

/// Whether `dir` carries both signature files.
#[must_use]
pub fn is_signed(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).exists() && dir.join(SIGNATURE_FILE).exists()
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns [`ModelError::Signature`] on bad base64 or a wrong key length.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelError::Signature("Invalid public key base64".into()))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| {
            ModelError::Signature("Invalid public key length (expected 32 bytes)".into())
        })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ModelError::Signature("Invalid verifying key".into()))
}

/// Verify the manifest signature and every file hash it lists.
///
/// Returns the manifest and the SHA-256 of its bytes (used as the model
/// fingerprint).
///
/// # Errors
/// Fails closed on any missing file, bad signature, or hash mismatch.
pub fn verify_dir(dir: &Path, key: &VerifyingKey) -> Result<(ModelManifest, String), ModelError> {
    let sig_bytes = fs::read(dir.join(SIGNATURE_FILE))
        .map_err(|e| ModelError::Io(format!("Failed to read signature: {e}")))?;
    let sig: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Signature("Invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig);

    let manifest_bytes = fs::read(dir.join(MANIFEST_FILE))
        .map_err(|e| ModelError::Io(format!("Failed to read manifest: {e}")))?;

    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ModelError::Signature("Invalid model signature".into()))?;

    let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ModelError::Parse(format!("Invalid {MANIFEST_FILE} format: {e}")))?;

    if manifest.version != 1 {
        return Err(ModelError::Integrity(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }

    if let Some(created_at) = manifest.created_at {
        if created_at > chrono::Utc::now().timestamp() + MAX_FUTURE_SKEW_SECS {
            return Err(ModelError::Integrity("manifest created_at is in the future".into()));
        }
    }

    if !manifest.files.contains_key(MODEL_FILE) {
        return Err(ModelError::Integrity(format!(
            "{MANIFEST_FILE} must include {MODEL_FILE}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ModelError::Integrity(format!(
                "Manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ModelError::Integrity(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!("Model signature and hashes verified");
    Ok((manifest, sha256_hex(&manifest_bytes)))
}

// Constant-time compare for hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    pub(crate) fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    pub(crate) fn sign_dir(dir: &Path, key: &SigningKey, files: &[&str]) {
        let manifest = ModelManifest::build(dir, files).expect("build manifest");
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        let signature: Signature = key.sign(&bytes);
        fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
    }

    #[test]
    fn test_verify_signed_dir() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");
        let key = signing_key();
        sign_dir(temp.path(), &key, &[MODEL_FILE]);

        let (manifest, fingerprint) =
            verify_dir(temp.path(), &key.verifying_key()).expect("should verify");
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(fingerprint.len(), 64);
    }

    #[test]
    fn test_tampered_model_fails() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");
        let key = signing_key();
        sign_dir(temp.path(), &key, &[MODEL_FILE]);

        fs::write(temp.path().join(MODEL_FILE), b"{ }").expect("tamper");
        let err = verify_dir(temp.path(), &key.verifying_key()).expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");
        sign_dir(temp.path(), &signing_key(), &[MODEL_FILE]);

        let err = verify_dir(temp.path(), &signing_key().verifying_key()).expect_err("must fail");
        assert!(matches!(err, ModelError::Signature(_)));
    }

    #[test]
    fn test_manifest_must_bind_model() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");
        fs::write(temp.path().join("notes.txt"), b"x").expect("write other");
        let key = signing_key();
        sign_dir(temp.path(), &key, &["notes.txt"]);

        let err = verify_dir(temp.path(), &key.verifying_key()).expect_err("must fail");
        assert!(matches!(err, ModelError::Integrity(_)));
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        let decoded = verifying_key_from_b64(&format!("{b64}\n")).expect("decode");
        assert_eq!(decoded, key.verifying_key());

        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
