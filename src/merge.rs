//! # Three-way Merge of Encrypted Credentials
//!
//! Invoked by git as a merge driver (`enc-creds merge %A %O %B %P`):
//!
//! ```text
//! ours/base/theirs ciphertext → decrypt → temp plaintext ×3
//!                              → git merge-file (result lands in ours)
//!                              → encrypt → %A
//! ```
//!
//! git reads the driver's result back from `%A` and writes it to the work
//! tree itself; `%P` only names the file, which selects the environment.
//!
//! Every decrypted operand lives in an [`EphemeralPlaintext`], which deletes
//! its file when dropped, so no plaintext outlives the invocation whether the
//! merge is clean, conflicted, or aborted.

use crate::credentials::{EncryptedFile, Environment};
use crate::error::{CredsError, Result};
use crate::key::KeyManager;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// git merge-file reports at most this many conflicts; larger statuses are errors
const MAX_CONFLICTS: i32 = 127;

/// Result of a three-way text merge
#[derive(Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Clean(Vec<u8>),
    Conflicted(Vec<u8>, u32),
    ToolError(i32),
}

impl MergeOutcome {
    /// Interpret the merge tool's exit status. `None` means it was killed by a signal.
    pub fn from_status(status: Option<i32>, merged: Vec<u8>) -> Self {
        match status {
            Some(0) => MergeOutcome::Clean(merged),
            Some(n @ 1..=MAX_CONFLICTS) => MergeOutcome::Conflicted(merged, n as u32),
            Some(code) => MergeOutcome::ToolError(code),
            None => MergeOutcome::ToolError(-1),
        }
    }

    /// Merged text, conflict markers included; `None` after a tool failure
    pub fn merged(&self) -> Option<&[u8]> {
        match self {
            MergeOutcome::Clean(text) | MergeOutcome::Conflicted(text, _) => Some(text),
            MergeOutcome::ToolError(_) => None,
        }
    }

    /// Process exit code git expects from a merge driver
    pub fn exit_code(&self) -> i32 {
        match self {
            MergeOutcome::Clean(_) => 0,
            MergeOutcome::Conflicted(_, count) => *count as i32,
            MergeOutcome::ToolError(code) => *code,
        }
    }
}

// Merged text is plaintext; keep it out of debug output
impl fmt::Debug for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOutcome::Clean(text) => write!(f, "Clean(<{} bytes>)", text.len()),
            MergeOutcome::Conflicted(text, count) => {
                write!(f, "Conflicted(<{} bytes>, {count})", text.len())
            }
            MergeOutcome::ToolError(code) => write!(f, "ToolError({code})"),
        }
    }
}

/// A three-way text merge writing its result into `ours` in place
pub trait ThreeWayMerge {
    /// Returns the tool's exit status, `None` if it was killed by a signal
    fn merge_in_place(&self, ours: &Path, base: &Path, theirs: &Path) -> Result<Option<i32>>;
}

/// `git merge-file`
pub struct GitMergeFile {
    program: String,
}

impl GitMergeFile {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ThreeWayMerge for GitMergeFile {
    fn merge_in_place(&self, ours: &Path, base: &Path, theirs: &Path) -> Result<Option<i32>> {
        let status = Command::new(&self.program)
            .arg("merge-file")
            .arg("-q")
            .args(["-L", "ours", "-L", "base", "-L", "theirs"])
            .arg(ours)
            .arg(base)
            .arg(theirs)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| CredsError::MergeTool(format!("{} merge-file: {e}", self.program)))?;

        tracing::debug!(?status, "merge-file finished");
        Ok(status.code())
    }
}

/// Decrypted content in a temporary file that is deleted on drop
pub struct EphemeralPlaintext {
    file: NamedTempFile,
}

impl EphemeralPlaintext {
    pub fn create_in(dir: &Path, plaintext: &[u8]) -> Result<Self> {
        // NamedTempFile is created with mode 0600
        let mut file = tempfile::Builder::new()
            .prefix("enc-creds-")
            .suffix(".yml")
            .tempfile_in(dir)?;
        file.write_all(plaintext)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current content, which may have been rewritten by the merge tool
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(fs::read(self.path())?)
    }
}

/// The four paths git hands to a merge driver
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub ours: PathBuf,
    pub base: PathBuf,
    pub theirs: PathBuf,
    pub real_path: PathBuf,
    pub environment: Environment,
}

impl MergeRequest {
    /// Build a request, inferring the environment from `real_path`
    pub fn new(
        ours: impl Into<PathBuf>,
        base: impl Into<PathBuf>,
        theirs: impl Into<PathBuf>,
        real_path: impl Into<PathBuf>,
    ) -> Self {
        let real_path = real_path.into();
        let environment = Environment::from_path(&real_path);
        Self {
            ours: ours.into(),
            base: base.into(),
            theirs: theirs.into(),
            real_path,
            environment,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Decrypting,
    Merging,
    Encrypting,
}

pub struct MergeOrchestrator<M: ThreeWayMerge> {
    keys: KeyManager,
    tool: M,
    temp_dir: PathBuf,
}

impl<M: ThreeWayMerge> MergeOrchestrator<M> {
    pub fn new(keys: KeyManager, tool: M) -> Self {
        Self {
            keys,
            tool,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the decrypted operands
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Merge the three versions and write the encrypted result over `ours`.
    ///
    /// Conflicts are not an error: the conflicted text, markers included, is
    /// encrypted and written like a clean result. On a tool failure nothing
    /// is written.
    pub fn merge(&self, request: &MergeRequest) -> Result<MergeOutcome> {
        tracing::info!(
            environment = %request.environment,
            path = %request.real_path.display(),
            "merging credentials"
        );

        let mut stage = Stage::Decrypting;
        let result = self.run(request, &mut stage);
        if let Err(e) = &result {
            tracing::warn!(?stage, error = %e, "merge aborted");
        }
        result
    }

    fn run(&self, request: &MergeRequest, stage: &mut Stage) -> Result<MergeOutcome> {
        let env = &request.environment;
        let ours = EncryptedFile::with_key_of(&request.ours, env, &self.keys);
        let base = EncryptedFile::with_key_of(&request.base, env, &self.keys);
        let theirs = EncryptedFile::with_key_of(&request.theirs, env, &self.keys);

        // Dropped in reverse order on every return path, deleting the files
        let ours_plain = self.decrypt_to_temp(&ours)?;
        let base_plain = EphemeralPlaintext::create_in(&self.temp_dir, &read_base(&base)?)?;
        let theirs_plain = self.decrypt_to_temp(&theirs)?;

        *stage = Stage::Merging;
        let status = self.tool.merge_in_place(
            ours_plain.path(),
            base_plain.path(),
            theirs_plain.path(),
        )?;
        let outcome = MergeOutcome::from_status(status, ours_plain.read()?);
        tracing::debug!(?outcome, "merge result");

        *stage = Stage::Encrypting;
        if let Some(merged) = outcome.merged() {
            ours.write(merged)?;
        }

        Ok(outcome)
    }

    fn decrypt_to_temp(&self, file: &EncryptedFile) -> Result<EphemeralPlaintext> {
        let plaintext = file.read()?;
        EphemeralPlaintext::create_in(&self.temp_dir, &plaintext)
    }
}

/// The common ancestor may be missing or empty when both sides added the file
fn read_base(base: &EncryptedFile) -> Result<Vec<u8>> {
    let raw = match base.read_raw() {
        Ok(raw) => raw,
        Err(CredsError::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    base.key()?.decrypt(&raw)
}
