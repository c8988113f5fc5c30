//! Download cache for external images.
//!
//! Files live under `<cache_dir>/retro-thumb/<key>`, where the key is a
//! relative path chosen by the ROM reader (e.g. `ds/cover/US/ADME.jpg`).
//! A zero-byte file records a failed download so the same URL is not
//! retried on every thumbnail request.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::CacheError;

/// Largest response body that will be stored.
pub const MAX_DOWNLOAD_SIZE: u64 = 4 * 1024 * 1024;

/// How long a failed download is remembered.
const NEGATIVE_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const USER_AGENT: &str = concat!("retro-thumb/", env!("CARGO_PKG_VERSION"));

/// Default cache root.
pub fn default_cache_root() -> Result<PathBuf, CacheError> {
    let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
    Ok(base.join("retro-thumb"))
}

/// Validate a cache key and make it safe to use as a relative path.
///
/// Absolute keys, backslashes, drive separators, and `..` components are
/// rejected. Control characters and `"*<>?|` are replaced with `_`.
pub fn filter_cache_key(key: &str) -> Result<String, CacheError> {
    if key.is_empty() {
        return Err(CacheError::invalid_key("empty key"));
    }
    if key.starts_with('/') || key.starts_with('\\') {
        return Err(CacheError::invalid_key(format!("absolute key '{key}'")));
    }
    if key.contains('\\') || key.contains(':') {
        return Err(CacheError::invalid_key(format!("'{key}' contains a path separator")));
    }
    if key.split('/').any(|component| component == "..") {
        return Err(CacheError::invalid_key(format!("'{key}' escapes the cache")));
    }

    Ok(key
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '"' | '*' | '<' | '>' | '?' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect())
}

/// Transport used to fetch external images.
pub trait Downloader: Send + Sync {
    /// Fetch `url`, optionally through `proxy`, refusing bodies larger than `limit`.
    fn fetch(&self, url: &str, proxy: Option<&str>, limit: u64) -> Result<Vec<u8>, CacheError>;
}

/// HTTP(S) downloader backed by `reqwest`.
#[derive(Debug, Default)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, proxy: Option<&str>, limit: u64) -> Result<Vec<u8>, CacheError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30));
        builder = match proxy {
            Some(proxy) => builder.proxy(
                reqwest::Proxy::all(proxy).map_err(|e| CacheError::download(e.to_string()))?,
            ),
            None => builder.no_proxy(),
        };
        let client = builder
            .build()
            .map_err(|e| CacheError::download(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| CacheError::download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CacheError::download(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(CacheError::TooLarge { limit });
        }

        let mut body = Vec::new();
        response.take(limit + 1).read_to_end(&mut body)?;
        if body.len() as u64 > limit {
            return Err(CacheError::TooLarge { limit });
        }
        Ok(body)
    }
}

/// Usage summary for the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheUsage {
    pub files: u64,
    pub bytes: u64,
    /// Zero-byte entries recording failed downloads.
    pub negative: u64,
}

/// Local cache of downloaded external images.
#[derive(Clone)]
pub struct CacheManager {
    root: PathBuf,
    proxy: Option<String>,
    downloader: Arc<dyn Downloader>,
}

impl CacheManager {
    /// Cache in the user's cache directory, downloading over HTTP.
    pub fn new() -> Result<Self, CacheError> {
        Ok(Self::with_root(default_cache_root()?, Arc::new(HttpDownloader)))
    }

    pub fn with_root(root: impl Into<PathBuf>, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            root: root.into(),
            proxy: None,
            downloader,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Proxy for subsequent downloads. `None` connects directly.
    pub fn set_proxy(&mut self, proxy: Option<String>) {
        self.proxy = proxy;
    }

    /// Path a key maps to, whether or not it exists.
    pub fn cache_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        Ok(self.root.join(filter_cache_key(key)?))
    }

    /// Path of an already-downloaded file. Never touches the network.
    pub fn find_in_cache(&self, key: &str) -> Option<PathBuf> {
        let path = self.cache_path(key).ok()?;
        let meta = fs::metadata(&path).ok()?;
        (meta.is_file() && meta.len() > 0).then_some(path)
    }

    /// Return the cached file for `key`, downloading `url` if needed.
    ///
    /// `Ok(None)` means no image is available: the URL is blank, the
    /// download failed, or a recent download of it failed.
    pub fn download(&self, url: &str, key: &str) -> Result<Option<PathBuf>, CacheError> {
        let path = self.cache_path(key)?;

        if let Ok(meta) = fs::metadata(&path) {
            if meta.len() > 0 {
                return Ok(Some(path));
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
                .unwrap_or_default();
            if age < NEGATIVE_CACHE_TTL {
                log::debug!("cache: negative entry for {key}");
                return Ok(None);
            }
            fs::remove_file(&path)?;
        }

        if url.trim().is_empty() {
            return Ok(None);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        log::debug!("cache: downloading {url}");
        match self.downloader.fetch(url, self.proxy(), MAX_DOWNLOAD_SIZE) {
            Ok(body) if !body.is_empty() => {
                let tmp = path.with_extension("part");
                fs::write(&tmp, &body)?;
                fs::rename(&tmp, &path)?;
                Ok(Some(path))
            }
            Ok(_) => {
                log::debug!("cache: empty response for {url}");
                self.write_negative_entry(&path);
                Ok(None)
            }
            Err(e) => {
                log::debug!("cache: {url}: {e}");
                self.write_negative_entry(&path);
                Ok(None)
            }
        }
    }

    fn write_negative_entry(&self, path: &Path) {
        if let Err(e) = fs::write(path, b"") {
            log::warn!("Failed to write {}: {e}", path.display());
        }
    }

    /// Count the files in the cache.
    pub fn usage(&self) -> Result<CacheUsage, CacheError> {
        let mut usage = CacheUsage::default();
        if self.root.is_dir() {
            walk(&self.root, &mut usage)?;
        }
        Ok(usage)
    }

    /// Delete every cached file.
    pub fn clear(&self) -> Result<(), CacheError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

fn walk(dir: &Path, usage: &mut CacheUsage) -> Result<(), CacheError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            walk(&entry.path(), usage)?;
        } else if meta.len() == 0 {
            usage.negative += 1;
        } else {
            usage.files += 1;
            usage.bytes += meta.len();
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
