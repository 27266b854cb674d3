use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredsError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Missing key for {environment} credentials. Put it in {key_path} or set {env_var}"
    )]
    MissingKey {
        environment: String,
        key_path: String,
        env_var: String,
    },

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Invalid key format (expected {expected} hex characters)")]
    InvalidKeyFormat { expected: usize },

    #[error("Could not run merge tool: {0}")]
    MergeTool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not in a git repository")]
    NotInGitRepo,

    #[error("{0}")]
    Other(String),
}

impl CredsError {
    /// Errors that mean "this content cannot be read with what we have".
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            CredsError::Decrypt(_) | CredsError::MissingKey { .. } | CredsError::InvalidKeyFormat { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CredsError>;
