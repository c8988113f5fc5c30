//! Neutral image types shared between ROM readers and the thumbnail pipeline.

use image::RgbaImage;

/// Width/height pair. Zero in either dimension means unknown or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Filter used when rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalingMethod {
    /// Keeps hard pixel edges. Used for pixel art.
    Nearest,
    /// Smooth interpolation for photographic sources.
    Bilinear,
}

/// Significant bits per channel (PNG `sBIT`). All zero means "ignore".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Sbit {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Sbit {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0 && self.alpha == 0
    }

    /// Chunk payload for an RGBA image.
    pub fn to_rgba_bytes(&self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

/// A decoded image plus its significant-bits metadata.
#[derive(Debug, Clone)]
pub struct RomImage {
    pub pixels: RgbaImage,
    pub sbit: Sbit,
}

impl RomImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            sbit: Sbit::default(),
        }
    }

    pub fn with_sbit(mut self, sbit: Sbit) -> Self {
        self.sbit = sbit;
        self
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.pixels.width(), self.pixels.height())
    }

    pub fn is_valid(&self) -> bool {
        self.size().is_valid()
    }
}

/// One candidate download location for an external image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtUrl {
    /// Remote URL.
    pub url: String,
    /// Relative path inside the download cache (e.g. `ds/coverM/US/ADME.jpg`).
    pub cache_key: String,
    /// Expected size, or zero if unknown.
    pub width: u32,
    pub height: u32,
    /// Large scan that should only be downloaded when bandwidth allows.
    pub high_res: bool,
}

/// An image size a reader can provide for one image type.
///
/// The first entry of a list is the default size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSizeDef {
    /// Suffix used in remote file names (`"M"`, `"HQ"`), if any.
    pub name: Option<&'static str>,
    pub width: u32,
    pub height: u32,
    /// Quality index. Values of 2 and above are high resolution.
    pub index: u16,
}

impl ImageSizeDef {
    pub const fn new(name: Option<&'static str>, width: u32, height: u32, index: u16) -> Self {
        Self {
            name,
            width,
            height,
            index,
        }
    }
}

/// Requested image size when asking a reader for external URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeRequest {
    /// The reader's default size.
    #[default]
    Default,
    Smallest,
    Largest,
    /// Thumbnail edge length in pixels.
    Pixels(u32),
}

impl From<u32> for SizeRequest {
    fn from(size: u32) -> Self {
        if size == 0 {
            Self::Default
        } else {
            Self::Pixels(size)
        }
    }
}

/// Pick the size definition that best fits a request.
///
/// For a pixel request, the smallest size whose larger dimension is at
/// least the requested size wins. If every size is smaller, the largest one
/// is used.
pub fn select_best_size(defs: &[ImageSizeDef], request: SizeRequest) -> Option<&ImageSizeDef> {
    let first = defs.first()?;
    if defs.len() == 1 {
        return Some(first);
    }

    let longest = |d: &ImageSizeDef| d.width.max(d.height);
    let shortest = |d: &ImageSizeDef| d.width.min(d.height);

    match request {
        SizeRequest::Default => Some(first),
        SizeRequest::Smallest => defs.iter().min_by_key(|d| shortest(d)),
        SizeRequest::Largest => defs.iter().max_by_key(|d| longest(d)),
        SizeRequest::Pixels(size) => {
            let mut best = first;
            let mut best_sz = longest(first);
            for def in &defs[1..] {
                if best_sz == size {
                    break;
                }
                let sz = longest(def);
                let better = if best_sz >= size {
                    sz >= size && sz < best_sz
                } else {
                    sz > best_sz
                };
                if better {
                    best = def;
                    best_sz = sz;
                }
            }
            Some(best)
        }
    }
}
