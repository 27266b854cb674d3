//! # Key Resolution
//!
//! Each environment has its own key:
//! - **Default environment**: `config/master.key`
//! - **Named environment**: `config/credentials/<env>.key`
//! - **Format**: 64 hex characters, surrounding whitespace ignored
//! - **Override**: an environment variable (`ENC_CREDS_MASTER_KEY` unless
//!   configured otherwise) takes precedence over the key file
//!
//! Key files are never committed; they are distributed out of band.

use crate::credentials::Environment;
use crate::crypto::CryptoKey;
use crate::error::{CredsError, Result};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Locates keys for environments below a repository root
pub struct KeyManager {
    root: PathBuf,
    env_var: String,
}

impl KeyManager {
    pub fn new(root: impl AsRef<Path>, env_var: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            env_var: env_var.into(),
        }
    }

    /// Path of the key file for an environment
    pub fn key_path(&self, environment: &Environment) -> PathBuf {
        self.root.join(environment.key_path())
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolve the key for an environment
    pub fn resolve_key(&self, environment: &Environment) -> Result<CryptoKey> {
        load_key(&self.key_path(environment), &self.env_var, environment)
    }
}

/// Read a key from `env_var` if set, otherwise from `key_path`
pub fn load_key(key_path: &Path, env_var: &str, environment: &Environment) -> Result<CryptoKey> {
    if let Ok(value) = env::var(env_var) {
        if !value.trim().is_empty() {
            tracing::debug!(env_var, "using key from environment");
            return CryptoKey::from_hex(&value);
        }
    }

    match fs::read_to_string(key_path) {
        Ok(text) => {
            tracing::debug!(path = %key_path.display(), "using key file");
            CryptoKey::from_hex(&text)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CredsError::MissingKey {
            environment: environment.to_string(),
            key_path: key_path.display().to_string(),
            env_var: env_var.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}
