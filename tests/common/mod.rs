use assert_cmd::{cargo::cargo_bin_cmd, Command};
use enc_creds::{CryptoKey, Environment};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;

/// Create a new temporary git repository with user config set.
pub fn create_git_repo() -> TempDir {
    let temp = TempDir::new().expect("failed to create temp dir");

    git(temp.path(), &["init"]);
    git(temp.path(), &["config", "user.email", "test@example.com"]);
    git(temp.path(), &["config", "user.name", "Test User"]);

    temp
}

/// Run git in `dir`, asserting success, and return its stdout.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Local git config value, `None` when unset.
#[allow(dead_code)]
pub fn git_config(dir: &Path, name: &str) -> Option<String> {
    let output = StdCommand::new("git")
        .args(["config", "--local", "--get", name])
        .current_dir(dir)
        .output()
        .expect("failed to run git config");
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Convenience helper for spawning the enc-creds binary via assert_cmd.
#[allow(dead_code)]
pub fn enc_creds_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("enc-creds");
    cmd.env_remove("ENC_CREDS_MASTER_KEY")
        .env_remove("ENC_CREDS_LOG")
        .env_remove("ENC_CREDS_DRIVER")
        .env_remove("ENC_CREDS_COMMAND")
        .env_remove("ENC_CREDS_MERGE_PROGRAM")
        .env_remove("ENC_CREDS_KEY_ENV");
    cmd
}

/// Absolute path to the enc-creds test binary.
#[allow(dead_code)]
pub fn enc_creds_bin() -> &'static str {
    env!("CARGO_BIN_EXE_enc-creds")
}

/// Generate a key for `environment` and store it where the tool looks for it.
#[allow(dead_code)]
pub fn write_key(root: &Path, environment: &Environment) -> CryptoKey {
    let key = CryptoKey::generate();
    let path = root.join(environment.key_path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{}\n", key.to_hex())).unwrap();
    key
}

/// Encrypt `plaintext` into `path` (relative to `root`), creating parent directories.
#[allow(dead_code)]
pub fn write_encrypted(root: &Path, path: impl AsRef<Path>, key: &CryptoKey, plaintext: &str) -> PathBuf {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, key.encrypt(plaintext.as_bytes()).unwrap()).unwrap();
    path
}

/// Decrypt the file at `path` to a string.
#[allow(dead_code)]
pub fn read_decrypted(path: &Path, key: &CryptoKey) -> String {
    String::from_utf8(key.decrypt(&fs::read(path).unwrap()).unwrap()).unwrap()
}
