//! # enc-creds
//!
//! Git diff and merge driver for encrypted credentials files.
//!
//! Applications keep their secrets in `config/credentials.yml.enc` (default
//! environment) or `config/credentials/<env>.yml.enc`, encrypted with a key
//! that never enters the repository. Git sees those files as opaque blobs:
//! diffs are noise and concurrent edits always conflict. `enc-creds` plugs
//! into git so that
//!
//! - `git diff` / `git log -p` show the decrypted text (textconv), and
//! - `git merge` / `git rebase` merge the decrypted text with
//!   `git merge-file` and store the result encrypted again.
//!
//! ## Quick Start
//!
//! ```bash
//! # Once per clone
//! enc-creds diff --enroll
//!
//! # Commit the attributes so everybody routes the same files
//! git add .gitattributes
//! git commit -m "Diff and merge credentials in plaintext"
//! ```
//!
//! Enrollment writes two things, and `--disenroll` removes both:
//!
//! ```text
//! .gitattributes
//!   config/credentials/*.yml.enc diff=enc_creds merge=enc_creds
//!   config/credentials.yml.enc diff=enc_creds merge=enc_creds
//!
//! .git/config
//!   diff.enc_creds.textconv = enc-creds diff
//!   merge.enc_creds.driver  = enc-creds merge %A %O %B %P
//! ```
//!
//! ## Keys
//!
//! | environment | credentials                           | key                              |
//! |-------------|---------------------------------------|----------------------------------|
//! | default     | `config/credentials.yml.enc`          | `config/master.key`              |
//! | `<env>`     | `config/credentials/<env>.yml.enc`    | `config/credentials/<env>.key`   |
//!
//! `ENC_CREDS_MASTER_KEY` overrides the key file. Keys are 32 random bytes,
//! hex encoded.
//!
//! ## Merging
//!
//! The merge driver decrypts ours, base and theirs into temporary files that
//! are removed on every exit path, runs `git merge-file`, then encrypts the
//! result with the ours-side key, conflict markers included. Its exit status
//! is the number of conflicts, so git reports a conflicted merge as usual and
//! the markers can be resolved in the decrypted view.
//!
//! ## Configuration
//!
//! An optional `.enc-creds.toml` at the repository root (see [`config`]) and
//! `ENC_CREDS_*` environment variables adjust the driver name, the command
//! git runs, the merge program and the key variable. `ENC_CREDS_LOG` sets the
//! log filter (`tracing` syntax); logs go to stderr.
//!
//! ## Module Overview
//!
//! - [`crypto`] - AES-256-GCM encryption of whole files
//! - [`key`] - Key resolution per environment
//! - [`credentials`] - Environments and the encrypted file accessor
//! - [`enrollment`] - `.gitattributes` and git config registration
//! - [`diff`] - Decrypting textconv with raw fallback
//! - [`merge`] - Three-way merge of encrypted versions
//! - [`git`] - Repository discovery and config access
//! - [`config`] - Per-repository settings
//! - [`error`] - Error types

pub mod commands;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod diff;
pub mod enrollment;
pub mod error;
pub mod git;
pub mod key;
pub mod merge;

pub use credentials::{EncryptedFile, Environment};
pub use crypto::CryptoKey;
pub use error::{CredsError, Result};
pub use git::GitRepo;
pub use key::KeyManager;
pub use merge::{MergeOrchestrator, MergeOutcome, MergeRequest};
