//! Credentials files and the environments they belong to.
//!
//! ```text
//! config/credentials.yml.enc             default environment, key config/master.key
//! config/credentials/<env>.yml.enc       named environment,   key config/credentials/<env>.key
//! ```

use crate::crypto::CryptoKey;
use crate::error::Result;
use crate::key::{load_key, KeyManager};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = ".yml.enc";
const DEFAULT_STEM: &str = "credentials";
const CREDENTIALS_DIR: &str = "credentials";

/// Length of the random part git puts in front of textconv temp files (`XXXXXX_`)
const GIT_TEMP_PREFIX_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Default,
    Named(String),
}

impl Environment {
    /// Environment from a user supplied name; `default` and the empty string mean the default
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "" | "default" => Environment::Default,
            other => Environment::Named(other.to_string()),
        }
    }

    /// Infer the environment from a credentials file path.
    ///
    /// Works on repository paths (`config/credentials/production.yml.enc`)
    /// and on the temporary copies git hands to a textconv program
    /// (`/tmp/Ab12Cd_production.yml.enc`).
    pub fn from_path(path: &Path) -> Self {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Environment::Default;
        };
        let Some(stem) = name.strip_suffix(EXTENSION) else {
            return Environment::Default;
        };

        let in_credentials_dir = path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|dir| dir == CREDENTIALS_DIR);
        if in_credentials_dir && !stem.is_empty() {
            return Environment::Named(stem.to_string());
        }

        match strip_git_temp_prefix(stem) {
            Some(DEFAULT_STEM) | None => Environment::Default,
            Some("") => Environment::Default,
            Some(env) => Environment::Named(env.to_string()),
        }
    }

    /// Credentials file, relative to the repository root
    pub fn content_path(&self) -> PathBuf {
        match self {
            Environment::Default => Path::new("config").join(format!("{DEFAULT_STEM}{EXTENSION}")),
            Environment::Named(name) => Path::new("config")
                .join(CREDENTIALS_DIR)
                .join(format!("{name}{EXTENSION}")),
        }
    }

    /// Key file, relative to the repository root
    pub fn key_path(&self) -> PathBuf {
        match self {
            Environment::Default => Path::new("config").join("master.key"),
            Environment::Named(name) => Path::new("config")
                .join(CREDENTIALS_DIR)
                .join(format!("{name}.key")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Default => f.write_str("default"),
            Environment::Named(name) => f.write_str(name),
        }
    }
}

fn strip_git_temp_prefix(stem: &str) -> Option<&str> {
    let prefix = stem.get(..GIT_TEMP_PREFIX_LEN)?;
    let rest = stem.get(GIT_TEMP_PREFIX_LEN..)?.strip_prefix('_')?;
    prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then_some(rest)
}

/// An encrypted credentials file and the key that opens it
#[derive(Debug, Clone)]
pub struct EncryptedFile {
    content_path: PathBuf,
    key_path: PathBuf,
    env_key_name: String,
    environment: Environment,
}

impl EncryptedFile {
    pub fn new(
        content_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
        env_key_name: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            content_path: content_path.into(),
            key_path: key_path.into(),
            env_key_name: env_key_name.into(),
            environment,
        }
    }

    /// Content at an arbitrary path, opened with the key of `environment`
    pub fn with_key_of(
        content_path: impl Into<PathBuf>,
        environment: &Environment,
        keys: &KeyManager,
    ) -> Self {
        Self::new(
            content_path,
            keys.key_path(environment),
            keys.env_var(),
            environment.clone(),
        )
    }

    /// The environment's own credentials file below `root`
    pub fn for_environment(root: &Path, environment: &Environment, keys: &KeyManager) -> Self {
        Self::with_key_of(root.join(environment.content_path()), environment, keys)
    }

    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    pub fn key(&self) -> Result<CryptoKey> {
        load_key(&self.key_path, &self.env_key_name, &self.environment)
    }

    /// Ciphertext exactly as stored
    pub fn read_raw(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.content_path)?)
    }

    /// Decrypted content
    pub fn read(&self) -> Result<Vec<u8>> {
        let key = self.key()?;
        key.decrypt(&self.read_raw()?)
    }

    /// Encrypt `plaintext` and replace the stored content
    pub fn write(&self, plaintext: &[u8]) -> Result<()> {
        let key = self.key()?;
        fs::write(&self.content_path, key.encrypt(plaintext)?)?;
        Ok(())
    }
}
