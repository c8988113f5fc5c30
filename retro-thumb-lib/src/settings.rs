//! Thumbnailer configuration (`~/.config/retro-thumb/config.toml`).
//!
//! The file is optional. Missing keys fall back to defaults, and a file
//! that fails to parse is ignored with a warning. [`ConfigStore`] re-reads
//! the file whenever its modification time changes, so long-running
//! services pick up edits without a restart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use retro_thumb_core::ImageType;

use crate::error::ConfigError;

/// Maximum number of entries in one image type priority list.
const MAX_PRIORITY_ENTRIES: usize = 32;

/// Priority used when a class has no entry of its own.
pub const DEFAULT_IMAGE_TYPE_PRIORITY: &[ImageType] = &[
    ImageType::ExtTitleScreen,
    ImageType::ExtMedia,
    ImageType::ExtCover,
    ImageType::ExtBox,
    ImageType::IntImage,
    ImageType::IntMedia,
    ImageType::IntIcon,
    ImageType::IntBanner,
];

/// Canonical path to the configuration file.
pub fn config_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("retro-thumb").join("config.toml")
}

/// How much external artwork may be downloaded on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthMode {
    /// Never download; only use images already in the cache.
    None,
    /// Download, but skip high-resolution scans.
    NormalRes,
    /// Download everything.
    HighRes,
}

/// When small pixel-art images are upscaled with nearest-neighbor filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeUpPolicy {
    None,
    /// Only when a dimension is at most half the requested size.
    #[default]
    Half,
    /// Whenever a dimension is below the requested size.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub ext_image_download: bool,
    pub use_int_icon_for_small_sizes: bool,
    pub img_bandwidth_unmetered: BandwidthMode,
    pub img_bandwidth_metered: BandwidthMode,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            ext_image_download: true,
            use_int_icon_for_small_sizes: true,
            img_bandwidth_unmetered: BandwidthMode::HighRes,
            img_bandwidth_metered: BandwidthMode::NormalRes,
        }
    }
}

impl DownloadSettings {
    /// Bandwidth mode for the current connection.
    pub fn bandwidth_mode(&self, metered: bool) -> BandwidthMode {
        if metered {
            self.img_bandwidth_metered
        } else {
            self.img_bandwidth_unmetered
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    pub resize_up: ResizeUpPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsSettings {
    pub enable_thumbnail_on_network_fs: bool,
}

/// One `[image_types]` value: either `"IntIcon, ExtCover"` or `["IntIcon", "ExtCover"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriorityEntry {
    List(String),
    Array(Vec<String>),
}

impl PriorityEntry {
    fn names(&self) -> Vec<&str> {
        match self {
            Self::List(s) => s.trim().trim_matches('"').split(',').collect(),
            Self::Array(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Image type priority for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTypePriority {
    /// The class has its own list.
    Custom(Vec<ImageType>),
    /// No usable entry; the global default list applies.
    Default(Vec<ImageType>),
    /// Thumbnails are turned off for this class.
    Disabled,
}

/// Parse one priority entry. `None` means no valid image types were named.
fn parse_priority(entry: &PriorityEntry) -> Option<ImageTypePriority> {
    let mut types = Vec::new();
    for (i, name) in entry.names().into_iter().map(str::trim).enumerate() {
        if i == 0 && name.eq_ignore_ascii_case("no") {
            return Some(ImageTypePriority::Disabled);
        }
        if name.is_empty() {
            continue;
        }
        let Ok(image_type) = name.parse::<ImageType>() else {
            log::debug!("config: ignoring unknown image type '{name}'");
            continue;
        };
        if types.contains(&image_type) {
            continue;
        }
        if types.len() >= MAX_PRIORITY_ENTRIES {
            break;
        }
        types.push(image_type);
    }

    if types.is_empty() {
        None
    } else {
        Some(ImageTypePriority::Custom(types))
    }
}

/// The full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub downloads: DownloadSettings,
    pub thumbnails: ThumbnailSettings,
    pub options: OptionsSettings,
    /// Per-class image type priority, keyed by class name (case-insensitive).
    pub image_types: BTreeMap<String, PriorityEntry>,
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a configuration file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                return Self::default();
            }
        };
        match Self::from_toml_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration atomically.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = self.to_toml_string()?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Image type priority for a class name.
    pub fn image_type_priority(&self, class_name: &str) -> ImageTypePriority {
        let entry = self
            .image_types
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(class_name))
            .map(|(_, v)| v);

        entry
            .and_then(parse_priority)
            .unwrap_or_else(|| ImageTypePriority::Default(DEFAULT_IMAGE_TYPE_PRIORITY.to_vec()))
    }
}

/// A configuration file that reloads itself when it changes on disk.
pub struct ConfigStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

struct StoreState {
    mtime: Option<SystemTime>,
    config: Arc<Config>,
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mtime = modified_time(&path);
        let config = Arc::new(Config::load(&path));
        Self {
            path,
            state: Mutex::new(StoreState { mtime, config }),
        }
    }

    /// Store backed by [`config_path`].
    pub fn open_default() -> Self {
        Self::new(config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current configuration, reloading first if the file's mtime changed.
    pub fn snapshot(&self) -> Arc<Config> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mtime = modified_time(&self.path);
        if mtime != state.mtime {
            log::debug!("config: reloading {}", self.path.display());
            state.config = Arc::new(Config::load(&self.path));
            state.mtime = mtime;
        }
        Arc::clone(&state.config)
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
