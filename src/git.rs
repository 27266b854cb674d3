use crate::error::{CredsError, Result};
use git2::{ErrorCode, Repository};
use std::path::{Path, PathBuf};

pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open repository at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| CredsError::NotInGitRepo)?;
        Ok(Self { repo })
    }

    /// Get repository root path
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or(CredsError::Other(
            "Repository has no working directory".into(),
        ))
    }

    fn local_config(&self) -> Result<git2::Config> {
        Ok(self.repo.config()?.open_level(git2::ConfigLevel::Local)?)
    }

    /// Read a string from the local config
    pub fn config_get(&self, name: &str) -> Result<Option<String>> {
        let config = self.local_config()?;
        match config.get_string(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a key in the local config, or remove it when `value` is `None`
    pub fn config_put(&self, name: &str, value: Option<&str>) -> Result<()> {
        let mut config = self.local_config()?;
        match value {
            Some(value) => config.set_str(name, value)?,
            None => match config.remove(name) {
                Ok(()) => {}
                Err(e) if e.code() == ErrorCode::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

/// Root that key and credentials paths are resolved against: the work tree
/// when inside a repository, otherwise the current directory.
pub fn resolve_root() -> Result<PathBuf> {
    match GitRepo::open(".") {
        Ok(repo) => Ok(repo.workdir()?.to_path_buf()),
        Err(CredsError::NotInGitRepo) => Ok(std::env::current_dir()?),
        Err(e) => Err(e),
    }
}
