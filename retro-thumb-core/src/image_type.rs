/// Image types a ROM can expose for thumbnailing.
///
/// Internal images are decoded from the file itself (icons, banners,
/// embedded artwork). External images live on a remote database and are
/// fetched through the download cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageType {
    // Internal
    IntIcon,
    IntBanner,
    IntMedia,
    IntImage,

    // External
    ExtMedia,
    ExtCover,
    ExtCover3D,
    ExtCoverFull,
    ExtBox,
    ExtTitleScreen,
}

/// All image types in bit order.
const ALL_IMAGE_TYPES: &[ImageType] = &[
    ImageType::IntIcon,
    ImageType::IntBanner,
    ImageType::IntMedia,
    ImageType::IntImage,
    ImageType::ExtMedia,
    ImageType::ExtCover,
    ImageType::ExtCover3D,
    ImageType::ExtCoverFull,
    ImageType::ExtBox,
    ImageType::ExtTitleScreen,
];

impl ImageType {
    /// Name used in configuration files (e.g. `"ExtCover3D"`).
    pub fn config_name(&self) -> &'static str {
        match self {
            Self::IntIcon => "IntIcon",
            Self::IntBanner => "IntBanner",
            Self::IntMedia => "IntMedia",
            Self::IntImage => "IntImage",
            Self::ExtMedia => "ExtMedia",
            Self::ExtCover => "ExtCover",
            Self::ExtCover3D => "ExtCover3D",
            Self::ExtCoverFull => "ExtCoverFull",
            Self::ExtBox => "ExtBox",
            Self::ExtTitleScreen => "ExtTitleScreen",
        }
    }

    /// Human-readable description.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IntIcon => "Internal icon",
            Self::IntBanner => "Internal banner",
            Self::IntMedia => "Internal media scan",
            Self::IntImage => "Internal image",
            Self::ExtMedia => "External media scan",
            Self::ExtCover => "External cover scan",
            Self::ExtCover3D => "External cover scan (3D version)",
            Self::ExtCoverFull => "External cover scan (front and back)",
            Self::ExtBox => "External box scan",
            Self::ExtTitleScreen => "External title screen",
        }
    }

    /// True for images decoded from the ROM itself.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::IntIcon | Self::IntBanner | Self::IntMedia | Self::IntImage
        )
    }

    /// True for images fetched from a remote database.
    pub fn is_external(&self) -> bool {
        !self.is_internal()
    }

    /// Bit position in an [`ImageTypeSet`].
    pub fn bit(&self) -> u32 {
        1 << (*self as u32)
    }

    /// All image types, internal first.
    pub fn all() -> &'static [ImageType] {
        ALL_IMAGE_TYPES
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config_name())
    }
}

/// Error returned when a string cannot be parsed into an `ImageType`.
#[derive(Debug, Clone)]
pub struct ImageTypeParseError(pub String);

impl std::fmt::Display for ImageTypeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown image type: '{}'", self.0)
    }
}

impl std::error::Error for ImageTypeParseError {}

impl std::str::FromStr for ImageType {
    type Err = ImageTypeParseError;

    /// Parse a configuration name (case-insensitive, surrounding whitespace ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ALL_IMAGE_TYPES
            .iter()
            .copied()
            .find(|t| t.config_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ImageTypeParseError(s.to_string()))
    }
}

/// A set of image types, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ImageTypeSet(u32);

impl ImageTypeSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, image_type: ImageType) -> bool {
        self.0 & image_type.bit() != 0
    }

    pub fn insert(&mut self, image_type: ImageType) {
        self.0 |= image_type.bit();
    }

    pub fn remove(&mut self, image_type: ImageType) {
        self.0 &= !image_type.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in bit order.
    pub fn iter(&self) -> impl Iterator<Item = ImageType> + '_ {
        ALL_IMAGE_TYPES.iter().copied().filter(|t| self.contains(*t))
    }
}

impl FromIterator<ImageType> for ImageTypeSet {
    fn from_iter<I: IntoIterator<Item = ImageType>>(iter: I) -> Self {
        let mut set = Self::empty();
        for t in iter {
            set.insert(t);
        }
        set
    }
}

/// Per-image-type post-processing hints reported by a ROM reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ImageProcessingFlags(u32);

impl ImageProcessingFlags {
    /// Upscale with nearest-neighbor filtering (pixel art).
    pub const RESCALE_NEAREST: Self = Self(1 << 0);
    /// Stretch 256/512-wide images to an 8:7 pixel aspect ratio.
    pub const RESCALE_ASPECT_8TO7: Self = Self(1 << 1);
    /// Rescale to the second "dimensions" field of the ROM.
    pub const RESCALE_RFT_DIMENSIONS_2: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for ImageProcessingFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
#[path = "tests/image_type_tests.rs"]
mod tests;
