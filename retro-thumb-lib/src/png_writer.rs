//! PNG output with XDG thumbnail metadata.
//!
//! Text chunks are written in a fixed order ahead of the image data:
//! `Software`, then `Thumb::MTime`, `Thumb::Mimetype`, `Thumb::Size`,
//! `Thumb::Image::Width`, `Thumb::Image::Height` and `Thumb::URI`.
//! Values outside Latin-1 (such as an undecoded non-ASCII URI) go into
//! iTXt chunks instead of tEXt.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use retro_thumb_core::{ImageSize, RomImage};

use crate::error::CreateError;

pub const SOFTWARE: &str = concat!("retro-thumb ", env!("CARGO_PKG_VERSION"));

/// Facts about the source file recorded in the thumbnail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XdgMetadata {
    /// Source URI, written verbatim.
    pub uri: String,
    /// Source modification time in seconds since the epoch.
    pub mtime: Option<u64>,
    /// Empty if unknown.
    pub mime_type: String,
    /// Source size in bytes. Zero if unknown.
    pub file_size: u64,
    /// Size of the image before it was fitted to the thumbnail.
    pub full_size: ImageSize,
}

/// Writes RGBA thumbnails as PNG.
#[derive(Debug, Clone)]
pub struct PngWriter {
    text: Vec<(String, String)>,
}

impl Default for PngWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PngWriter {
    pub fn new() -> Self {
        Self {
            text: vec![("Software".to_string(), SOFTWARE.to_string())],
        }
    }

    pub fn with_xdg_metadata(mut self, meta: &XdgMetadata) -> Self {
        if let Some(mtime) = meta.mtime {
            self.push("Thumb::MTime", mtime.to_string());
        }
        if !meta.mime_type.is_empty() {
            self.push("Thumb::Mimetype", meta.mime_type.clone());
        }
        if meta.file_size > 0 {
            self.push("Thumb::Size", meta.file_size.to_string());
        }
        self.push("Thumb::Image::Width", meta.full_size.width.to_string());
        self.push("Thumb::Image::Height", meta.full_size.height.to_string());
        self.push("Thumb::URI", meta.uri.clone());
        self
    }

    fn push(&mut self, key: &str, value: String) {
        self.text.push((key.to_string(), value));
    }

    /// Text chunks in write order.
    pub fn text_chunks(&self) -> &[(String, String)] {
        &self.text
    }

    /// Write `image` to `path`. A partially written file is left on failure.
    pub fn write(&self, path: &Path, image: &RomImage) -> Result<(), CreateError> {
        let file = File::create(path)
            .map_err(|e| CreateError::output_file(format!("{}: {e}", path.display())))?;
        self.write_to(BufWriter::new(file), image)
            .map_err(|e| CreateError::output_file(format!("{}: {e}", path.display())))
    }

    pub fn write_to<W: Write>(&self, out: W, image: &RomImage) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(out, image.pixels.width(), image.pixels.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        for (key, value) in &self.text {
            if value.chars().all(|c| c <= '\u{ff}') {
                encoder.add_text_chunk(key.clone(), value.clone())?;
            } else {
                encoder.add_itxt_chunk(key.clone(), value.clone())?;
            }
        }

        let mut writer = encoder.write_header()?;
        if !image.sbit.is_empty() {
            writer.write_chunk(png::chunk::sBIT, &image.sbit.to_rgba_bytes())?;
        }
        writer.write_image_data(image.pixels.as_raw())?;
        writer.finish()
    }
}

#[cfg(test)]
#[path = "tests/png_writer_tests.rs"]
mod tests;
