//! Nintendo DS ROM reader.
//!
//! Supports:
//! - DS ROMs (.nds)
//! - DSi-enhanced ROMs (.dsi, .srl)
//!
//! The cartridge header occupies bytes 0x000–0x1FF. Detection uses the
//! 156-byte Nintendo logo at 0xC0 and the logo checksum 0xCF56 at 0x15C.
//! The icon/title block pointed to by 0x068 holds a 32×32 4bpp icon with a
//! 16-color BGR555 palette, which is the internal thumbnail source.

use std::io::SeekFrom;

use image::{Rgba, RgbaImage};

use retro_thumb_core::util::{bgr555_to_rgb888, read_ascii, read_u16_le, read_u32_le};
use retro_thumb_core::{
    ExtUrl, FileType, ImageProcessingFlags, ImageSizeDef, ImageType, ImageTypeSet, ReadSeek,
    RomData, RomDataError, RomField, RomImage, RomReader, Sbit, SizeRequest, select_best_size,
};

use crate::gametdb::{self, ArtPath};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const HEADER_SIZE: usize = 0x200;

/// Expected logo checksum value at 0x15C.
const EXPECTED_LOGO_CHECKSUM: u16 = 0xCF56;

/// Nintendo compressed logo bitmap (156 bytes at offset 0xC0).
pub(crate) const NINTENDO_LOGO: [u8; 156] = [
    0x24, 0xFF, 0xAE, 0x51, 0x69, 0x9A, 0xA2, 0x21, 0x3D, 0x84, 0x82, 0x0A, 0x84, 0xE4, 0x09, 0xAD,
    0x11, 0x24, 0x8B, 0x98, 0xC0, 0x81, 0x7F, 0x21, 0xA3, 0x52, 0xBE, 0x19, 0x93, 0x09, 0xCE, 0x20,
    0x10, 0x46, 0x4A, 0x4A, 0xF8, 0x27, 0x31, 0xEC, 0x58, 0xC7, 0xE8, 0x33, 0x82, 0xE3, 0xCE, 0xBF,
    0x85, 0xF4, 0xDF, 0x94, 0xCE, 0x4B, 0x09, 0xC1, 0x94, 0x56, 0x8A, 0xC0, 0x13, 0x72, 0xA7, 0xFC,
    0x9F, 0x84, 0x4D, 0x73, 0xA3, 0xCA, 0x9A, 0x61, 0x58, 0x97, 0xA3, 0x27, 0xFC, 0x03, 0x98, 0x76,
    0x23, 0x1D, 0xC7, 0x61, 0x03, 0x04, 0xAE, 0x56, 0xBF, 0x38, 0x84, 0x00, 0x40, 0xA7, 0x0E, 0xFD,
    0xFF, 0x52, 0xFE, 0x03, 0x6F, 0x95, 0x30, 0xF1, 0x97, 0xFB, 0xC0, 0x85, 0x60, 0xD6, 0x80, 0x25,
    0xA9, 0x63, 0xBE, 0x03, 0x01, 0x4E, 0x38, 0xE2, 0xF9, 0xA2, 0x34, 0xFF, 0xBB, 0x3E, 0x03, 0x44,
    0x78, 0x00, 0x90, 0xCB, 0x88, 0x11, 0x3A, 0x94, 0x65, 0xC0, 0x7C, 0x63, 0x87, 0xF0, 0x3C, 0xAF,
    0xD6, 0x25, 0xE4, 0x8B, 0x38, 0x0A, 0xAC, 0x72, 0x21, 0xD4, 0xF8, 0x07,
];

/// Icon/title block: version, CRCs, icon, palette, then six 256-byte titles.
const BANNER_SIZE: usize = 0x840;
const BANNER_ICON_OFFSET: usize = 0x020;
const BANNER_PALETTE_OFFSET: usize = 0x220;
const BANNER_TITLE_EN_OFFSET: usize = 0x340;
const BANNER_TITLE_LEN: usize = 0x100;

const ICON_DIM: u32 = 32;

const CLASS_NAME: &str = "NintendoDS";
const MIME_TYPE: &str = "application/x-nintendo-ds-rom";

const COVER_SIZES: &[ImageSizeDef] = &[
    ImageSizeDef::new(None, 160, 144, 0),
    ImageSizeDef::new(Some("M"), 400, 352, 2),
    ImageSizeDef::new(Some("HQ"), 768, 680, 3),
];

const COVER_FULL_SIZES: &[ImageSizeDef] = &[
    ImageSizeDef::new(None, 340, 144, 0),
    ImageSizeDef::new(Some("M"), 856, 352, 2),
    ImageSizeDef::new(Some("HQ"), 1616, 680, 3),
];

const BOX_SIZES: &[ImageSizeDef] = &[ImageSizeDef::new(None, 240, 216, 0)];

// ---------------------------------------------------------------------------
// Header parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct DsHeader {
    title: String,
    id4: [u8; 4],
    maker_code: String,
    unit_code: u8,
    icon_title_offset: u32,
}

fn has_valid_logo(header: &[u8]) -> bool {
    header.len() >= HEADER_SIZE
        && header[0xC0..0xC0 + NINTENDO_LOGO.len()] == NINTENDO_LOGO
        && read_u16_le(header, 0x15C) == EXPECTED_LOGO_CHECKSUM
}

fn parse_header(header: &[u8]) -> DsHeader {
    let mut id4 = [0u8; 4];
    id4.copy_from_slice(&header[0x00C..0x010]);
    DsHeader {
        title: read_ascii(&header[0x000..0x00C]),
        id4,
        maker_code: read_ascii(&header[0x010..0x012]),
        unit_code: header[0x012],
        icon_title_offset: read_u32_le(header, 0x068),
    }
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<[u8; HEADER_SIZE], RomDataError> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    if file_size < HEADER_SIZE as u64 {
        return Err(RomDataError::TooSmall {
            expected: HEADER_SIZE as u64,
            actual: file_size,
        });
    }
    reader.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    Ok(header)
}

/// Decode the English title from the icon/title block (UTF-16LE, first line only).
fn banner_title(banner: &[u8]) -> Option<String> {
    let raw = &banner[BANNER_TITLE_EN_OFFSET..BANNER_TITLE_EN_OFFSET + BANNER_TITLE_LEN];
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    let title = String::from_utf16_lossy(&units);
    let first_line = title.lines().next().unwrap_or_default().trim().to_string();
    if first_line.is_empty() {
        None
    } else {
        Some(first_line)
    }
}

/// Decode the 32×32 tiled 4bpp icon. Palette index 0 is transparent.
pub(crate) fn decode_icon(banner: &[u8]) -> RgbaImage {
    let mut palette = [Rgba([0, 0, 0, 0]); 16];
    for (i, entry) in palette.iter_mut().enumerate().skip(1) {
        let [r, g, b] = bgr555_to_rgb888(read_u16_le(banner, BANNER_PALETTE_OFFSET + i * 2));
        *entry = Rgba([r, g, b, 0xFF]);
    }

    let bitmap = &banner[BANNER_ICON_OFFSET..BANNER_ICON_OFFSET + 0x200];
    RgbaImage::from_fn(ICON_DIM, ICON_DIM, |x, y| {
        // 4×4 tiles of 8×8 pixels, 32 bytes per tile, low nibble first.
        let tile = (y / 8) * 4 + (x / 8);
        let offset = (tile * 32 + (y % 8) * 4 + (x % 8) / 2) as usize;
        let byte = bitmap[offset];
        let index = if x % 2 == 0 { byte & 0x0F } else { byte >> 4 };
        palette[index as usize]
    })
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Reader for Nintendo DS cartridge dumps.
#[derive(Debug, Default)]
pub struct NintendoDsReader;

impl NintendoDsReader {
    pub fn new() -> Self {
        Self
    }
}

impl RomReader for NintendoDsReader {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["nds", "dsi", "srl"]
    }

    fn supported_image_types(&self) -> ImageTypeSet {
        [
            ImageType::IntIcon,
            ImageType::ExtCover,
            ImageType::ExtCoverFull,
            ImageType::ExtBox,
        ]
        .into_iter()
        .collect()
    }

    fn can_handle(&self, reader: &mut dyn ReadSeek) -> bool {
        read_header(reader).is_ok_and(|h| has_valid_logo(&h))
    }

    fn open(&self, reader: &mut dyn ReadSeek) -> Result<Box<dyn RomData>, RomDataError> {
        let raw = read_header(reader)?;
        if !has_valid_logo(&raw) {
            return Err(RomDataError::invalid_format("Nintendo logo not found"));
        }
        let header = parse_header(&raw);

        let banner = if header.icon_title_offset == 0 {
            None
        } else {
            let mut buf = vec![0u8; BANNER_SIZE];
            reader.seek(SeekFrom::Start(header.icon_title_offset as u64))?;
            match reader.read_exact(&mut buf) {
                Ok(()) => Some(buf),
                Err(e) => {
                    log::debug!(
                        "NDS icon/title block at {:#x} unreadable: {e}",
                        header.icon_title_offset
                    );
                    None
                }
            }
        };

        Ok(Box::new(NintendoDs::new(header, banner)))
    }
}

// ---------------------------------------------------------------------------
// Opened ROM
// ---------------------------------------------------------------------------

/// An opened Nintendo DS ROM.
pub struct NintendoDs {
    header: DsHeader,
    banner: Option<Vec<u8>>,
    fields: Vec<RomField>,
}

impl NintendoDs {
    fn new(header: DsHeader, banner: Option<Vec<u8>>) -> Self {
        let mut fields = vec![RomField::text("Title", header.title.clone())];
        if let Some(full_title) = banner.as_deref().and_then(banner_title) {
            fields.push(RomField::text("Full Title", full_title));
        }
        fields.push(RomField::text(
            "Game ID",
            String::from_utf8_lossy(&header.id4).into_owned(),
        ));
        fields.push(RomField::text("Publisher", header.maker_code.clone()));
        fields.push(RomField::text(
            "Hardware",
            match header.unit_code {
                0x02 => "Nintendo DS, Nintendo DSi",
                0x03 => "Nintendo DSi",
                _ => "Nintendo DS",
            },
        ));
        Self {
            header,
            banner,
            fields,
        }
    }

    /// GameTDB has no art for prototypes, download demos, or homebrew.
    fn has_external_art(&self) -> bool {
        let id4 = &self.header.id4;
        id4 != b"NTRJ" && id4 != b"####" && id4.iter().all(|b| b.is_ascii_graphic())
    }
}

impl RomData for NintendoDs {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn file_type(&self) -> FileType {
        FileType::RomImage
    }

    fn supported_image_types(&self) -> ImageTypeSet {
        let mut set = ImageTypeSet::empty();
        if self.banner.is_some() {
            set.insert(ImageType::IntIcon);
        }
        if self.has_external_art() {
            set.insert(ImageType::ExtCover);
            set.insert(ImageType::ExtCoverFull);
            set.insert(ImageType::ExtBox);
        }
        set
    }

    fn image_processing_flags(&self, image_type: ImageType) -> ImageProcessingFlags {
        match image_type {
            ImageType::IntIcon => ImageProcessingFlags::RESCALE_NEAREST,
            // GameTDB scans already carry alpha.
            _ => ImageProcessingFlags::empty(),
        }
    }

    fn image(&self, image_type: ImageType) -> Option<RomImage> {
        if image_type != ImageType::IntIcon {
            return None;
        }
        let banner = self.banner.as_deref()?;
        Some(RomImage::new(decode_icon(banner)).with_sbit(Sbit::new(5, 5, 5, 1)))
    }

    fn ext_urls(&self, image_type: ImageType, size: SizeRequest) -> Vec<ExtUrl> {
        if !self.has_external_art() {
            return Vec::new();
        }

        let (base, ext, sizes) = match image_type {
            ImageType::ExtCover => ("cover", ".jpg", COVER_SIZES),
            ImageType::ExtCoverFull => ("coverfull", ".jpg", COVER_FULL_SIZES),
            ImageType::ExtBox => ("box", ".png", BOX_SIZES),
            _ => return Vec::new(),
        };
        let Some(best) = select_best_size(sizes, size) else {
            return Vec::new();
        };

        // High-resolution picks also list the default size as a fallback
        // for when large downloads are disallowed.
        let mut picks = vec![(best, best.index >= 2)];
        if best.index >= 2 {
            picks.push((&sizes[0], false));
        }

        let id = String::from_utf8_lossy(&self.header.id4).into_owned();
        let languages = gametdb::languages_for_region(self.header.id4[3]);
        let mut urls = Vec::new();
        for (def, high_res) in picks {
            let art = ArtPath {
                system: "ds",
                kind: format!("{base}{}", def.name.unwrap_or_default()),
                id: &id,
                ext,
            };
            art.push_urls(&mut urls, languages, def, high_res);
        }
        urls
    }

    fn fields(&self) -> &[RomField] {
        &self.fields
    }
}

#[cfg(test)]
#[path = "tests/ds_tests.rs"]
mod tests;
