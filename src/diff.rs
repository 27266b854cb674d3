//! Decrypting view of a credentials file, used by git as a `textconv` program.
//!
//! `git diff` must keep working for people without the key, so anything that
//! cannot be decrypted is shown as its raw ciphertext instead of failing.

use crate::credentials::{EncryptedFile, Environment};
use crate::error::Result;
use crate::key::KeyManager;
use std::path::Path;

/// Shown in place of an empty plaintext so it is not mistaken for a failed decryption
pub const EMPTY_PLACEHOLDER: &[u8] = b"<no credentials>\n";

pub struct DiffOrchestrator {
    keys: KeyManager,
}

impl DiffOrchestrator {
    pub fn new(keys: KeyManager) -> Self {
        Self { keys }
    }

    /// Text for `path`, decrypted when possible.
    ///
    /// The environment is inferred from the file name unless given.
    pub fn diff(&self, path: &Path, environment: Option<Environment>) -> Result<Vec<u8>> {
        let environment = environment.unwrap_or_else(|| Environment::from_path(path));
        let file = EncryptedFile::with_key_of(path, &environment, &self.keys);

        let ciphertext = file.read_raw()?;
        let decrypted = file
            .key()
            .and_then(|key| key.decrypt(&ciphertext));

        match decrypted {
            Ok(plaintext) if plaintext.is_empty() => Ok(EMPTY_PLACEHOLDER.to_vec()),
            Ok(plaintext) => Ok(plaintext),
            Err(e) if e.is_unreadable() => {
                tracing::warn!(
                    %environment,
                    path = %path.display(),
                    error = %e,
                    "showing raw ciphertext"
                );
                Ok(ciphertext)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptoKey;
    use std::fs;
    use tempfile::TempDir;

    const KEY_VAR: &str = "ENC_CREDS_TEST_DIFF_UNSET";

    fn setup() -> (TempDir, CryptoKey, DiffOrchestrator) {
        let temp = TempDir::new().unwrap();
        let key = CryptoKey::generate();
        let key_path = temp.path().join(Environment::Default.key_path());
        fs::create_dir_all(key_path.parent().unwrap()).unwrap();
        fs::write(&key_path, key.to_hex()).unwrap();
        let orchestrator = DiffOrchestrator::new(KeyManager::new(temp.path(), KEY_VAR));
        (temp, key, orchestrator)
    }

    #[test]
    fn test_decrypts_readable_file() {
        let (temp, key, diff) = setup();
        let path = temp.path().join("credentials.yml.enc");
        fs::write(&path, key.encrypt(b"token: abc\n").unwrap()).unwrap();

        assert_eq!(diff.diff(&path, None).unwrap(), b"token: abc\n");
    }

    #[test]
    fn test_empty_plaintext_has_placeholder() {
        let (temp, key, diff) = setup();
        let path = temp.path().join("credentials.yml.enc");
        fs::write(&path, key.encrypt(b"").unwrap()).unwrap();

        assert_eq!(diff.diff(&path, None).unwrap(), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn test_wrong_key_shows_raw_ciphertext() {
        let (temp, _key, diff) = setup();
        let path = temp.path().join("credentials.yml.enc");
        let ciphertext = CryptoKey::generate().encrypt(b"token: abc\n").unwrap();
        fs::write(&path, &ciphertext).unwrap();

        assert_eq!(diff.diff(&path, None).unwrap(), ciphertext);
    }

    #[test]
    fn test_garbage_is_returned_unchanged() {
        let (temp, _key, diff) = setup();
        let path = temp.path().join("credentials.yml.enc");
        let garbage: Vec<u8> = (0..=255).collect();
        fs::write(&path, &garbage).unwrap();

        assert_eq!(diff.diff(&path, None).unwrap(), garbage);
    }

    #[test]
    fn test_missing_key_shows_raw_ciphertext() {
        let (temp, key, diff) = setup();
        let path = temp.path().join("staging.yml.enc");
        let ciphertext = key.encrypt(b"token: abc\n").unwrap();
        fs::write(&path, &ciphertext).unwrap();

        let staging = Some(Environment::Named("staging".into()));
        assert_eq!(diff.diff(&path, staging).unwrap(), ciphertext);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let (temp, _key, diff) = setup();
        assert!(diff.diff(&temp.path().join("absent.yml.enc"), None).is_err());
    }
}
