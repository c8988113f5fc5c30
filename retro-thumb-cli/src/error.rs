use thiserror::Error;

use retro_thumb_lib::{CacheError, ConfigError, CreateError};

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Thumbnail creation failed
    #[error("{0}")]
    Create(#[from] CreateError),

    /// Download cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CliError {
    /// Process exit status. Thumbnail failures keep their entry point code.
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Self::Create(e) => u8::try_from(e.code()).unwrap_or(1),
            _ => 1,
        }
    }
}
