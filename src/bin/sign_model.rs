//! Model signing utility for heartcheck model directories.
//!
//! Writes a manifest (`manifest.json`) holding the SHA-256 of `model.json`,
//! and an Ed25519 signature over the manifest bytes (`model.sig`).
//!
//! # Usage
//!
//! ```bash
//! sign_model <model_dir>
//! sign_model --generate-key <seed_file> [--force]
//! ```
//!
//! The signing seed (32 bytes, base64) is read from the file named by
//! `HEARTCHECK_MODEL_SIGNING_KEY_B64_FILE`. Seed material is zeroized after
//! use and only the public key is ever printed.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use heartcheck::adapters::model::integrity::{ModelManifest, MANIFEST_FILE, SIGNATURE_FILE};
use heartcheck::adapters::model::MODEL_FILE;

const KEY_FILE_ENV: &str = "HEARTCHECK_MODEL_SIGNING_KEY_B64_FILE";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    Sign { model_dir: PathBuf },
    GenerateKey { out: PathBuf, force: bool },
}

fn usage() -> String {
    "Usage: sign_model <model_dir>\n       sign_model --generate-key <seed_file> [--force]".to_string()
}

fn parse_args() -> Result<Command, String> {
    let mut args = env::args().skip(1);
    let mut model_dir: Option<PathBuf> = None;
    let mut key_out: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--generate-key" => {
                let v = args.next().ok_or_else(usage)?;
                key_out = Some(PathBuf::from(v));
            }
            "--force" => force = true,
            "-h" | "--help" => return Err(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    match (key_out, model_dir) {
        (Some(out), None) => Ok(Command::GenerateKey { out, force }),
        (None, Some(model_dir)) => Ok(Command::Sign { model_dir }),
        _ => Err(usage()),
    }
}

fn read_signing_seed() -> Result<Seed, String> {
    let path = env::var(KEY_FILE_ENV).map_err(|_| {
        format!("Missing signing key. Set {KEY_FILE_ENV} to a file holding the base64 seed.")
    })?;
    let content = Zeroizing::new(
        fs::read_to_string(path.trim())
            .map_err(|e| format!("Failed reading signing key file: {e}"))?,
    );

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .map_err(|e| format!("Invalid base64 in signing key: {e}"))?,
    );
    if raw.len() != 32 {
        return Err(format!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        ));
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn sign(model_dir: &Path) -> Result<(), String> {
    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .ok_or_else(|| "Model path has no parent directory".to_string())?
    } else {
        model_dir
    };
    if !model_dir.join(MODEL_FILE).exists() {
        return Err(format!("No {MODEL_FILE} found in {model_dir:?}"));
    }

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let manifest = ModelManifest::build(model_dir, &[MODEL_FILE]).map_err(|e| e.to_string())?;
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes()).map_err(|e| format!("Failed to write {sig_path:?}: {e}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "HEARTCHECK_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn generate_key(out: &Path, force: bool) -> Result<(), String> {
    if out.exists() && !force {
        return Err(format!("Refusing to overwrite existing file {out:?}. Use --force."));
    }

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let verifying_key = SigningKey::from_bytes(&seed.0).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create {parent:?}: {e}"))?;
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(0o600);
    }

    let mut file = opts.open(out).map_err(|e| format!("Failed to open {out:?}: {e}"))?;
    file.write_all(seed_b64.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|e| format!("Failed to write {out:?}: {e}"))?;

    // Print only non-secret material.
    println!("Wrote signing seed (base64) to {out:?}");
    println!(
        "HEARTCHECK_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );
    Ok(())
}

fn main() -> Result<(), String> {
    match parse_args()? {
        Command::Sign { model_dir } => sign(&model_dir),
        Command::GenerateKey { out, force } => generate_key(&out, force),
    }
}
