//! # Enrollment
//!
//! Routes credentials files through this tool by keeping two stores in step:
//!
//! - a block in the repository's `.gitattributes`:
//!   ```text
//!   config/credentials/*.yml.enc diff=enc_creds merge=enc_creds
//!   config/credentials.yml.enc diff=enc_creds merge=enc_creds
//!   ```
//! - the driver commands in the local git config:
//!   ```text
//!   diff.enc_creds.textconv = enc-creds diff
//!   merge.enc_creds.driver  = enc-creds merge %A %O %B %P
//!   ```
//!
//! The transitions are pure functions over [`EnrollmentState`];
//! [`EnrollmentManager`] only loads and persists that state. Presence of the
//! attributes block is the single source of truth for "enrolled".
//!
//! Appended to an existing `.gitattributes`, the block starts with its own
//! newline, so disenrolling gives back the exact previous bytes whether or
//! not the file ended with a newline. A missing file is created for the
//! block and removed with it.
//!
//! The git config side is owned by the driver: enrolling overwrites any
//! existing `diff.<driver>.textconv` and `merge.<driver>.driver` values,
//! and disenrolling unsets them rather than restoring earlier values.

use crate::config::Settings;
use crate::error::Result;
use crate::git::GitRepo;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ATTRIBUTES_FILE: &str = ".gitattributes";

const PATTERNS: [&str; 2] = ["config/credentials/*.yml.enc", "config/credentials.yml.enc"];

/// Name and command line of the git driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    name: String,
    command: String,
}

impl Driver {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.driver, &settings.command)
    }

    /// The block appended to `.gitattributes`
    pub fn entry(&self) -> String {
        PATTERNS
            .iter()
            .map(|pattern| format!("{pattern} diff={0} merge={0}\n", self.name))
            .collect()
    }

    pub fn textconv_key(&self) -> String {
        format!("diff.{}.textconv", self.name)
    }

    pub fn merge_key(&self) -> String {
        format!("merge.{}.driver", self.name)
    }

    pub fn textconv_command(&self) -> String {
        format!("{} diff", self.command)
    }

    pub fn merge_command(&self) -> String {
        format!("{} merge %A %O %B %P", self.command)
    }
}

/// Snapshot of everything enrollment touches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentState {
    /// `.gitattributes` content, `None` when the file does not exist
    pub attributes: Option<String>,
    pub textconv: Option<String>,
    pub merge_driver: Option<String>,
}

impl EnrollmentState {
    pub fn is_enrolled(&self, driver: &Driver) -> bool {
        let entry = driver.entry();
        self.attributes.as_deref().is_some_and(|content| {
            content.starts_with(&entry) || content.contains(&separated(&entry))
        })
    }
}

/// The entry as appended to existing content; the leading newline is part of it
fn separated(entry: &str) -> String {
    format!("\n{entry}")
}

pub fn apply_enroll(state: EnrollmentState, driver: &Driver) -> EnrollmentState {
    if state.is_enrolled(driver) {
        return state;
    }

    let entry = driver.entry();
    let attributes = match state.attributes {
        None => entry,
        Some(content) => content + &separated(&entry),
    };

    EnrollmentState {
        attributes: Some(attributes),
        textconv: Some(driver.textconv_command()),
        merge_driver: Some(driver.merge_command()),
    }
}

pub fn apply_disenroll(state: EnrollmentState, driver: &Driver) -> EnrollmentState {
    if !state.is_enrolled(driver) {
        return state;
    }

    let entry = driver.entry();
    let attributes = state.attributes.and_then(|content| {
        let content = content.replace(&separated(&entry), "");
        match content.strip_prefix(entry.as_str()) {
            // the file only existed for the entry
            Some("") => None,
            Some(rest) => Some(rest.to_string()),
            None => Some(content),
        }
    });

    EnrollmentState {
        attributes,
        textconv: None,
        merge_driver: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Unchanged,
}

pub struct EnrollmentManager {
    repo: GitRepo,
    root: PathBuf,
    driver: Driver,
}

impl EnrollmentManager {
    pub fn new(repo: GitRepo, driver: Driver) -> Result<Self> {
        let root = repo.workdir()?.to_path_buf();
        Ok(Self { repo, root, driver })
    }

    pub fn attributes_path(&self) -> PathBuf {
        self.root.join(ATTRIBUTES_FILE)
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn is_enrolled(&self) -> Result<bool> {
        let attributes = read_optional(&self.attributes_path())?;
        Ok(EnrollmentState {
            attributes,
            ..Default::default()
        }
        .is_enrolled(&self.driver))
    }

    pub fn load_state(&self) -> Result<EnrollmentState> {
        Ok(EnrollmentState {
            attributes: read_optional(&self.attributes_path())?,
            textconv: self.repo.config_get(&self.driver.textconv_key())?,
            merge_driver: self.repo.config_get(&self.driver.merge_key())?,
        })
    }

    pub fn enroll(&self) -> Result<Transition> {
        self.transition(apply_enroll)
    }

    pub fn disenroll(&self) -> Result<Transition> {
        self.transition(apply_disenroll)
    }

    fn transition(
        &self,
        apply: fn(EnrollmentState, &Driver) -> EnrollmentState,
    ) -> Result<Transition> {
        let before = self.load_state()?;
        let after = apply(before.clone(), &self.driver);
        if before.is_enrolled(&self.driver) == after.is_enrolled(&self.driver) {
            return Ok(Transition::Unchanged);
        }

        if after.attributes != before.attributes {
            let path = self.attributes_path();
            match &after.attributes {
                Some(content) => fs::write(&path, content)?,
                None => fs::remove_file(&path)?,
            }
            tracing::debug!(path = %path.display(), "updated attributes");
        }
        if after.textconv != before.textconv {
            self.repo
                .config_put(&self.driver.textconv_key(), after.textconv.as_deref())?;
        }
        if after.merge_driver != before.merge_driver {
            self.repo
                .config_put(&self.driver.merge_key(), after.merge_driver.as_deref())?;
        }

        Ok(Transition::Applied)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
