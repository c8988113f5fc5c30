//! The thumbnail entry point: source file in, PNG out.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use url::Url;

use retro_thumb_core::ImageSize;

use crate::backend::{ImageBackend, RgbaBackend};
use crate::cache::{self, CacheManager, HttpDownloader};
use crate::context::RomDataFactory;
use crate::error::CreateError;
use crate::filesystem;
use crate::network::{NetworkManagerStatus, NetworkStatus};
use crate::png_writer::{PngWriter, XdgMetadata};
use crate::settings::ConfigStore;
use crate::thumbnail::ThumbnailCreator;
use crate::thumbnailer::ThumbnailBackend;

/// Skip the `Thumb::*` text chunks.
pub const NO_XDG_THUMBNAIL_METADATA: u32 = 1 << 0;

const KNOWN_FLAGS: u32 = NO_XDG_THUMBNAIL_METADATA;

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailInfo {
    pub class_name: &'static str,
    pub uri: String,
    pub full_size: ImageSize,
    pub thumb_size: ImageSize,
}

/// A source file located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// URI recorded in `Thumb::URI`.
    pub uri: String,
}

/// Turn a path or URI argument into a local path and its URI.
///
/// `file://` URIs are kept verbatim. Plain paths are made absolute and
/// percent-encoded. Other schemes are remote sources.
pub fn resolve_source(source: &str, allow_network: bool) -> Result<SourceFile, CreateError> {
    if let Ok(url) = Url::parse(source) {
        // Single-letter schemes are drive letters.
        if url.scheme().len() > 1 {
            if url.scheme() != "file" {
                return Err(if allow_network {
                    CreateError::source_file(format!("unsupported URI scheme '{}'", url.scheme()))
                } else {
                    CreateError::BadFilesystem
                });
            }
            let path = url
                .to_file_path()
                .map_err(|()| CreateError::source_file(format!("not a local file URI: {source}")))?;
            return Ok(SourceFile {
                path,
                uri: source.to_string(),
            });
        }
    }

    let mut path = PathBuf::from(source);
    if path.is_relative() {
        let cwd = std::env::current_dir().map_err(|e| CreateError::source_file(e.to_string()))?;
        path = cwd.join(path);
    }
    let uri = Url::from_file_path(&path)
        .map_err(|()| CreateError::source_file(format!("cannot build a URI for {source}")))?
        .to_string();
    Ok(SourceFile { path, uri })
}

/// Everything needed to turn ROM files into thumbnails.
pub struct Pipeline {
    factory: RomDataFactory,
    config: ConfigStore,
    cache: CacheManager,
    network: Box<dyn NetworkStatus>,
}

impl Pipeline {
    pub fn new(
        factory: RomDataFactory,
        config: ConfigStore,
        cache: CacheManager,
        network: Box<dyn NetworkStatus>,
    ) -> Self {
        Self {
            factory,
            config,
            cache,
            network,
        }
    }

    /// Built-in readers, the user's configuration and cache, and
    /// NetworkManager for metered detection.
    pub fn system() -> Self {
        let root = cache::default_cache_root().unwrap_or_else(|e| {
            let fallback = std::env::temp_dir().join("retro-thumb");
            log::warn!("{e}; caching downloads in {}", fallback.display());
            fallback
        });
        Self::new(
            RomDataFactory::with_default_readers(),
            ConfigStore::open_default(),
            CacheManager::with_root(root, std::sync::Arc::new(HttpDownloader)),
            Box::new(NetworkManagerStatus),
        )
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn factory(&self) -> &RomDataFactory {
        &self.factory
    }

    /// Create a thumbnail of `source` (path or URI) at `output`.
    ///
    /// `max_size` bounds both dimensions; zero keeps the native size.
    pub fn create_thumbnail(
        &self,
        source: &str,
        output: &Path,
        max_size: i32,
        flags: u32,
    ) -> Result<ThumbnailInfo, CreateError> {
        if flags & !KNOWN_FLAGS != 0 {
            return Err(CreateError::InvalidFlags(flags));
        }
        let req = u32::try_from(max_size)
            .map_err(|_| CreateError::InvalidImageSize(i64::from(max_size)))?;

        let config = self.config.snapshot();
        let allow_network = config.options.enable_thumbnail_on_network_fs;
        let source = resolve_source(source, allow_network)?;
        if !allow_network && filesystem::is_on_network_fs(&source.path) {
            return Err(CreateError::BadFilesystem);
        }

        let file = File::open(&source.path)
            .map_err(|e| CreateError::source_file(format!("{}: {e}", source.path.display())))?;
        let meta = file
            .metadata()
            .map_err(|e| CreateError::source_file(format!("{}: {e}", source.path.display())))?;
        if meta.is_dir() {
            return Err(CreateError::source_file(format!(
                "{} is a directory",
                source.path.display()
            )));
        }

        let mut reader = BufReader::new(file);
        let rom = self
            .factory
            .open(&mut reader)
            .ok_or(CreateError::SourceFileNotSupported)?;

        let backend = RgbaBackend;
        let creator =
            ThumbnailCreator::new(&backend, &config, self.cache.clone(), self.network.as_ref());
        let thumb = creator.get_thumbnail(rom.as_ref(), req)?;

        let mut writer = PngWriter::new();
        if flags & NO_XDG_THUMBNAIL_METADATA == 0 {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs());
            writer = writer.with_xdg_metadata(&XdgMetadata {
                uri: source.uri.clone(),
                mtime,
                mime_type: rom.mime_type().to_string(),
                file_size: meta.len(),
                full_size: thumb.full_size,
            });
        }
        writer.write(output, &backend.into_rom_image(thumb.image))?;

        Ok(ThumbnailInfo {
            class_name: rom.class_name(),
            uri: source.uri,
            full_size: thumb.full_size,
            thumb_size: thumb.thumb_size,
        })
    }
}

impl ThumbnailBackend for Pipeline {
    fn create(&self, uri: &str, output: &Path, max_size: i32, flags: u32) -> Result<(), CreateError> {
        self.create_thumbnail(uri, output, max_size, flags).map(|_| ())
    }
}
