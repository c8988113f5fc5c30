use thiserror::Error;

/// Errors that stop the daemon before it starts serving.
#[derive(Debug, Error)]
pub(crate) enum DaemonError {
    /// Session bus connection or name request failed
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// Neither `--cache-dir` nor `$XDG_CACHE_HOME` gave a directory
    #[error("Cannot determine the thumbnail cache directory")]
    NoCacheDir,
}
