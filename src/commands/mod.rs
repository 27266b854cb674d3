pub mod diff;
pub mod enroll;
pub mod merge;
pub mod show;

pub use diff::diff;
pub use enroll::{disenroll, enroll};
pub use merge::merge;
pub use show::show;

use crate::config::Settings;
use crate::error::Result;
use crate::git::resolve_root;
use crate::key::KeyManager;
use std::path::PathBuf;

/// Repository root, its settings, and the keys below it
pub(crate) struct Context {
    pub root: PathBuf,
    pub settings: Settings,
    pub keys: KeyManager,
}

impl Context {
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        let settings = Settings::load(&root)?;
        let keys = KeyManager::new(&root, settings.key_env.as_str());
        Ok(Self {
            root,
            settings,
            keys,
        })
    }
}
