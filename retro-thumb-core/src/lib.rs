use std::io::{Read, Seek};

pub mod error;
pub mod field;
pub mod image_type;
pub mod rom_image;
pub mod util;

pub use error::RomDataError;
pub use field::{FieldValue, RomField};
pub use image_type::{ImageProcessingFlags, ImageType, ImageTypeParseError, ImageTypeSet};
pub use rom_image::{
    ExtUrl, ImageSize, ImageSizeDef, RomImage, Sbit, ScalingMethod, SizeRequest, select_best_size,
};

/// A reader that implements both Read and Seek.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Broad classification of an opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    RomImage,
    DiscImage,
    Unknown,
}

impl FileType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RomImage => "ROM Image",
            Self::DiscImage => "Disc Image",
            Self::Unknown => "Unknown",
        }
    }
}

/// A parsed ROM or disc image, as seen by the thumbnail pipeline.
///
/// The pipeline only reads from this handle. It asks which image types are
/// available, fetches internal images directly, and asks for ranked
/// download candidates for external ones.
pub trait RomData: Send {
    /// Reader class name, used as the key for per-class configuration
    /// (e.g. `"NintendoDS"`).
    fn class_name(&self) -> &'static str;

    /// MIME type of the source file, or an empty string if unknown.
    fn mime_type(&self) -> &'static str;

    fn file_type(&self) -> FileType;

    /// Image types this particular file can provide.
    fn supported_image_types(&self) -> ImageTypeSet;

    /// Post-processing hints for one image type.
    fn image_processing_flags(&self, _image_type: ImageType) -> ImageProcessingFlags {
        ImageProcessingFlags::empty()
    }

    /// Decode an internal image. Returns `None` for external types or when
    /// the file has no such image.
    fn image(&self, image_type: ImageType) -> Option<RomImage>;

    /// Ranked download candidates for an external image type.
    ///
    /// Better fits for `size` come first. Empty when the type is internal or
    /// no remote image exists for this title.
    fn ext_urls(&self, _image_type: ImageType, _size: SizeRequest) -> Vec<ExtUrl> {
        Vec::new()
    }

    /// Metadata fields, in display order.
    fn fields(&self) -> &[RomField] {
        &[]
    }
}

/// Detects and opens one file format.
///
/// Readers are registered with a factory that probes each one in turn.
pub trait RomReader: Send + Sync {
    /// Class name reported by opened files.
    fn class_name(&self) -> &'static str;

    /// File extensions commonly used for this format (lowercase, no dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Every image type this reader can ever report.
    fn supported_image_types(&self) -> ImageTypeSet;

    /// Quick magic-number check. The reader position is unspecified afterwards.
    fn can_handle(&self, reader: &mut dyn ReadSeek) -> bool;

    /// Parse the file.
    fn open(&self, reader: &mut dyn ReadSeek) -> Result<Box<dyn RomData>, RomDataError>;
}
