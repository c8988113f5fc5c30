use thiserror::Error;

/// Failures of the thumbnail entry point.
///
/// Each variant maps to a stable integer code shared by the C ABI and the
/// D-Bus `Error` signal.
#[derive(Debug, Error)]
pub enum CreateError {
    /// Reserved code. Never produced.
    #[error("Refusing to run as root")]
    RunningAsRoot,

    #[error("Invalid image size: {0}")]
    InvalidImageSize(i64),

    #[error("Cannot open source file: {0}")]
    SourceFile(String),

    #[error("Source file is not supported")]
    SourceFileNotSupported,

    #[error("Source file has no usable image")]
    NoImage,

    #[error("Cannot write output file: {0}")]
    OutputFile(String),

    #[error("Source file is on a network filesystem")]
    BadFilesystem,

    #[error("Thumbnails are disabled for {0}")]
    ClassDisabled(String),

    #[error("Invalid flags: {0:#x}")]
    InvalidFlags(u32),
}

impl CreateError {
    pub fn source_file(msg: impl Into<String>) -> Self {
        Self::SourceFile(msg.into())
    }

    pub fn output_file(msg: impl Into<String>) -> Self {
        Self::OutputFile(msg.into())
    }

    /// Integer code reported to C callers and D-Bus clients. Zero is success.
    pub fn code(&self) -> i32 {
        match self {
            Self::RunningAsRoot => 1,
            Self::InvalidImageSize(_) => 2,
            Self::SourceFile(_) => 3,
            Self::SourceFileNotSupported => 4,
            Self::NoImage => 5,
            Self::OutputFile(_) => 6,
            Self::BadFilesystem => 7,
            Self::ClassDisabled(_) => 8,
            Self::InvalidFlags(_) => 9,
        }
    }
}

/// Errors from the external image download cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Download exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Could not determine cache directory")]
    NoCacheDir,
}

impl CacheError {
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }
}

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Rejections of thumbnail queue method calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Service is shutting down.")]
    ShuttingDown,

    #[error("Invalid handle: {0}")]
    InvalidHandle(u32),
}
