//! Nintendo GameCube and Wii disc image reader.
//!
//! Supports uncompressed ISO/GCM images. Both consoles share the same
//! 0x440-byte disc header; the magic word at 0x18 (Wii) or 0x1C (GameCube)
//! tells them apart. Thumbnails come from GameTDB, keyed by the ID6.

use std::io::SeekFrom;

use retro_thumb_core::util::{read_ascii, read_u32_be};
use retro_thumb_core::{
    ExtUrl, FileType, ImageSizeDef, ImageType, ImageTypeSet, ReadSeek, RomData, RomDataError,
    RomField, RomImage, RomReader, SizeRequest, select_best_size,
};

use crate::gametdb::{self, ArtPath};

const HEADER_SIZE: usize = 0x60;

const WII_MAGIC: u32 = 0x5D1C_9EA3;
const GCN_MAGIC: u32 = 0xC233_9F3D;

const CLASS_NAME: &str = "GameCube";

const MEDIA_SIZES: &[ImageSizeDef] = &[ImageSizeDef::new(None, 160, 160, 0)];
const COVER_SIZES: &[ImageSizeDef] = &[ImageSizeDef::new(None, 160, 224, 0)];
const COVER_3D_SIZES: &[ImageSizeDef] = &[ImageSizeDef::new(None, 176, 248, 0)];
const COVER_FULL_SIZES: &[ImageSizeDef] = &[
    ImageSizeDef::new(None, 512, 340, 0),
    ImageSizeDef::new(Some("HQ"), 1024, 680, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscSystem {
    GameCube,
    Wii,
}

#[derive(Debug, Clone)]
struct DiscHeader {
    id6: [u8; 6],
    disc_number: u8,
    revision: u8,
    title: String,
    system: DiscSystem,
}

fn detect_system(header: &[u8]) -> Option<DiscSystem> {
    if read_u32_be(header, 0x18) == WII_MAGIC {
        Some(DiscSystem::Wii)
    } else if read_u32_be(header, 0x1C) == GCN_MAGIC {
        Some(DiscSystem::GameCube)
    } else {
        None
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

/// Reader for GameCube and Wii disc images.
#[derive(Debug, Default)]
pub struct GameCubeReader;

impl GameCubeReader {
    pub fn new() -> Self {
        Self
    }
}

impl RomReader for GameCubeReader {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["iso", "gcm"]
    }

    fn supported_image_types(&self) -> ImageTypeSet {
        [
            ImageType::ExtMedia,
            ImageType::ExtCover,
            ImageType::ExtCover3D,
            ImageType::ExtCoverFull,
        ]
        .into_iter()
        .collect()
    }

    fn can_handle(&self, reader: &mut dyn ReadSeek) -> bool {
        read_header(reader).is_ok_and(|h| detect_system(&h).is_some())
    }

    fn open(&self, reader: &mut dyn ReadSeek) -> Result<Box<dyn RomData>, RomDataError> {
        let raw = read_header(reader)?;
        let system = detect_system(&raw)
            .ok_or_else(|| RomDataError::invalid_format("No GameCube or Wii disc magic"))?;
        let mut id6 = [0u8; 6];
        id6.copy_from_slice(&raw[0x00..0x06]);
        let header = DiscHeader {
            id6,
            disc_number: raw[0x06],
            revision: raw[0x07],
            title: read_ascii(&raw[0x20..0x60]),
            system,
        };
        Ok(Box::new(GameCubeDisc::new(header)))
    }
}

/// An opened GameCube or Wii disc.
pub struct GameCubeDisc {
    header: DiscHeader,
    fields: Vec<RomField>,
}

impl GameCubeDisc {
    fn new(header: DiscHeader) -> Self {
        let fields = vec![
            RomField::text("Title", header.title.clone()),
            RomField::text("Game ID", String::from_utf8_lossy(&header.id6).into_owned()),
            RomField::text("Disc #", (header.disc_number as u32 + 1).to_string()),
            RomField::text("Revision", format!("{:02}", header.revision)),
        ];
        Self { header, fields }
    }

    /// ID6 with non-printable bytes replaced by underscores.
    fn printable_id6(&self) -> String {
        self.header
            .id6
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '_' })
            .collect()
    }

    /// Generic IDs used by prototypes, update partitions, and channels.
    fn has_external_art(&self) -> bool {
        let id6 = &self.header.id6;
        id6[0] != b'_' && id6 != b"RELSAB" && &id6[..4] != b"RABA"
    }
}

impl RomData for GameCubeDisc {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn mime_type(&self) -> &'static str {
        match self.header.system {
            DiscSystem::GameCube => "application/x-gamecube-rom",
            DiscSystem::Wii => "application/x-wii-rom",
        }
    }

    fn file_type(&self) -> FileType {
        FileType::DiscImage
    }

    fn supported_image_types(&self) -> ImageTypeSet {
        if self.has_external_art() {
            GameCubeReader.supported_image_types()
        } else {
            ImageTypeSet::empty()
        }
    }

    fn image(&self, _image_type: ImageType) -> Option<RomImage> {
        None
    }

    fn ext_urls(&self, image_type: ImageType, size: SizeRequest) -> Vec<ExtUrl> {
        if !self.has_external_art() {
            return Vec::new();
        }

        let (base, sizes) = match image_type {
            ImageType::ExtMedia => ("disc", MEDIA_SIZES),
            ImageType::ExtCover => ("cover", COVER_SIZES),
            ImageType::ExtCover3D => ("cover3D", COVER_3D_SIZES),
            ImageType::ExtCoverFull => ("coverfull", COVER_FULL_SIZES),
            _ => return Vec::new(),
        };
        let Some(best) = select_best_size(sizes, size) else {
            return Vec::new();
        };

        let id6 = self.printable_id6();
        let languages = gametdb::languages_for_region(self.header.id6[3]);
        let mut urls = Vec::new();

        // Later discs of a multi-disc set have their own disc scans.
        if image_type == ImageType::ExtMedia && self.header.disc_number > 0 {
            let art = ArtPath {
                system: "wii",
                kind: format!("{base}{}", self.header.disc_number as u32 + 1),
                id: &id6,
                ext: ".png",
            };
            art.push_urls(&mut urls, languages, best, false);
        }

        let high_res = best.name.is_some();
        let mut picks = vec![(best, high_res)];
        if high_res {
            picks.push((&sizes[0], false));
        }
        for (def, high_res) in picks {
            let art = ArtPath {
                system: "wii",
                kind: format!("{base}{}", def.name.unwrap_or_default()),
                id: &id6,
                ext: ".png",
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
#[path = "tests/gamecube_tests.rs"]
mod tests;
