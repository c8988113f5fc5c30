pub mod backend;
pub mod cache;
pub mod context;
pub mod create;
pub mod error;
pub mod ffi;
pub mod filesystem;
pub mod network;
pub mod png_writer;
pub mod settings;
pub mod thumbnail;
pub mod thumbnailer;

pub use backend::{ImageBackend, RgbaBackend};
pub use cache::{CacheManager, CacheUsage, Downloader, HttpDownloader};
pub use context::RomDataFactory;
pub use create::{NO_XDG_THUMBNAIL_METADATA, Pipeline, SourceFile, ThumbnailInfo};
pub use error::{CacheError, ConfigError, CreateError, QueueError};
pub use network::{FixedNetworkStatus, NetworkManagerStatus, NetworkStatus};
pub use png_writer::{PngWriter, XdgMetadata};
pub use settings::{Config, ConfigStore, ImageTypePriority};
pub use thumbnail::{ThumbnailCreator, ThumbnailOutput, rescale_aspect};
pub use thumbnailer::{
    RequestQueue, ServiceExit, ServiceHandle, ServiceOptions, ThumbnailBackend,
    ThumbnailerService, ThumbnailerSignal,
};

pub use retro_thumb_core;
