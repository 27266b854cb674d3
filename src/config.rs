//! Per-repository settings.
//!
//! Read from an optional `.enc-creds.toml` at the repository root, then
//! overridden field by field from `ENC_CREDS_*` environment variables.
//!
//! ```toml
//! driver = "enc_creds"
//! command = "enc-creds"
//! merge_program = "git"
//! key_env = "ENC_CREDS_MASTER_KEY"
//! ```

use crate::error::{CredsError, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;

pub const CONFIG_FILE: &str = ".enc-creds.toml";
const ENV_PREFIX: &str = "ENC_CREDS_";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Name of the git diff/merge driver
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Command git runs to reach this tool
    #[serde(default = "default_command")]
    pub command: String,
    /// Program providing `merge-file`
    #[serde(default = "default_merge_program")]
    pub merge_program: String,
    /// Environment variable that may carry the key
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

fn default_driver() -> String {
    "enc_creds".into()
}

fn default_command() -> String {
    "enc-creds".into()
}

fn default_merge_program() -> String {
    "git".into()
}

fn default_key_env() -> String {
    "ENC_CREDS_MASTER_KEY".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            command: default_command(),
            merge_program: default_merge_program(),
            key_env: default_key_env(),
        }
    }
}

impl Settings {
    /// Load settings for the repository rooted at `root`
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        let mut settings = if config_path.exists() {
            Config::builder()
                .add_source(File::new(
                    config_path
                        .to_str()
                        .ok_or_else(|| CredsError::Config("Invalid config path".into()))?,
                    FileFormat::Toml,
                ))
                .build()
                .and_then(|cfg| cfg.try_deserialize::<Settings>())
                .map_err(|err| {
                    CredsError::Config(format!("Failed to load {}: {err}", config_path.display()))
                })?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        let var = |name: &str| env::var(format!("{ENV_PREFIX}{name}")).ok();

        if let Some(driver) = var("DRIVER") {
            self.driver = driver;
        }
        if let Some(command) = var("COMMAND") {
            self.command = command;
        }
        if let Some(program) = var("MERGE_PROGRAM") {
            self.merge_program = program;
        }
        if let Some(key_env) = var("KEY_ENV") {
            self.key_env = key_env;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VARS: [&str; 4] = [
        "ENC_CREDS_DRIVER",
        "ENC_CREDS_COMMAND",
        "ENC_CREDS_MERGE_PROGRAM",
        "ENC_CREDS_KEY_ENV",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial_test::serial]
    fn defaults_when_file_missing() {
        clear_env();
        let temp = TempDir::new().unwrap();

        assert_eq!(Settings::load(temp.path()).unwrap(), Settings::default());
    }

    #[test]
    #[serial_test::serial]
    fn file_values_are_read() {
        clear_env();
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            r#"
                driver = "secrets"
                command = "/usr/local/bin/enc-creds"
            "#,
        )
        .unwrap();

        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings.driver, "secrets");
        assert_eq!(settings.command, "/usr/local/bin/enc-creds");
        assert_eq!(settings.merge_program, "git");
        assert_eq!(settings.key_env, "ENC_CREDS_MASTER_KEY");
    }

    #[test]
    #[serial_test::serial]
    fn env_overrides_file() {
        clear_env();
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "driver = \"from_file\"\n").unwrap();

        env::set_var("ENC_CREDS_DRIVER", "from_env");
        env::set_var("ENC_CREDS_KEY_ENV", "APP_MASTER_KEY");
        let settings = Settings::load(temp.path()).unwrap();
        clear_env();

        assert_eq!(settings.driver, "from_env");
        assert_eq!(settings.key_env, "APP_MASTER_KEY");
    }

    #[test]
    #[serial_test::serial]
    fn malformed_file_is_an_error() {
        clear_env();
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "driver = [").unwrap();

        assert!(matches!(
            Settings::load(temp.path()),
            Err(CredsError::Config(_))
        ));
    }
}
