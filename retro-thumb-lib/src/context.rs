//! Registry of ROM readers.

use std::io::SeekFrom;

use retro_thumb_core::{ReadSeek, RomData, RomReader};
use retro_thumb_nintendo::{GameCubeReader, NintendoDsReader};

/// Detects a file's format and opens it with the matching reader.
///
/// Readers are probed in registration order; the first one whose magic
/// check passes and that opens the file wins.
pub struct RomDataFactory {
    readers: Vec<Box<dyn RomReader>>,
}

impl Default for RomDataFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RomDataFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Factory with every built-in reader registered.
    pub fn with_default_readers() -> Self {
        let mut factory = Self::new();
        factory
            .register(NintendoDsReader::new())
            .register(GameCubeReader::new());
        factory
    }

    pub fn register<R: RomReader + 'static>(&mut self, reader: R) -> &mut Self {
        self.readers.push(Box::new(reader));
        self
    }

    pub fn readers(&self) -> impl Iterator<Item = &dyn RomReader> {
        self.readers.iter().map(|r| r.as_ref())
    }

    pub fn class_names(&self) -> Vec<&'static str> {
        self.readers.iter().map(|r| r.class_name()).collect()
    }

    /// Open `reader` with the first reader that recognizes it.
    pub fn open(&self, reader: &mut dyn ReadSeek) -> Option<Box<dyn RomData>> {
        for rom_reader in &self.readers {
            if reader.seek(SeekFrom::Start(0)).is_err() || !rom_reader.can_handle(reader) {
                continue;
            }
            if reader.seek(SeekFrom::Start(0)).is_err() {
                continue;
            }
            match rom_reader.open(reader) {
                Ok(data) => return Some(data),
                Err(e) => log::debug!("{}: {e}", rom_reader.class_name()),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_thumb_core::{FileType, ImageType, ImageTypeSet, RomDataError, RomImage};
    use std::io::{Cursor, Read};

    struct MagicReader {
        magic: &'static [u8; 4],
        class_name: &'static str,
        fail_open: bool,
    }

    struct MagicRom(&'static str);

    impl RomData for MagicRom {
        fn class_name(&self) -> &'static str {
            self.0
        }
        fn mime_type(&self) -> &'static str {
            ""
        }
        fn file_type(&self) -> FileType {
            FileType::Unknown
        }
        fn supported_image_types(&self) -> ImageTypeSet {
            ImageTypeSet::empty()
        }
        fn image(&self, _image_type: ImageType) -> Option<RomImage> {
            None
        }
    }

    impl RomReader for MagicReader {
        fn class_name(&self) -> &'static str {
            self.class_name
        }
        fn file_extensions(&self) -> &'static [&'static str] {
            &["bin"]
        }
        fn supported_image_types(&self) -> ImageTypeSet {
            ImageTypeSet::empty()
        }
        fn can_handle(&self, reader: &mut dyn ReadSeek) -> bool {
            let mut magic = [0u8; 4];
            reader.read_exact(&mut magic).is_ok() && &magic == self.magic
        }
        fn open(&self, reader: &mut dyn ReadSeek) -> Result<Box<dyn RomData>, RomDataError> {
            let mut magic = [0u8; 4];
            reader.read_exact(&mut magic)?;
            if self.fail_open {
                return Err(RomDataError::invalid_format("truncated"));
            }
            Ok(Box::new(MagicRom(self.class_name)))
        }
    }

    fn factory() -> RomDataFactory {
        let mut factory = RomDataFactory::new();
        factory
            .register(MagicReader {
                magic: b"AAAA",
                class_name: "Broken",
                fail_open: true,
            })
            .register(MagicReader {
                magic: b"AAAA",
                class_name: "First",
                fail_open: false,
            })
            .register(MagicReader {
                magic: b"BBBB",
                class_name: "Second",
                fail_open: false,
            });
        factory
    }

    #[test]
    fn picks_first_reader_that_opens() {
        let data = factory().open(&mut Cursor::new(b"AAAA....".to_vec())).unwrap();
        assert_eq!(data.class_name(), "First");
        let data = factory().open(&mut Cursor::new(b"BBBB".to_vec())).unwrap();
        assert_eq!(data.class_name(), "Second");
    }

    #[test]
    fn unknown_format() {
        assert!(factory().open(&mut Cursor::new(b"CCCC".to_vec())).is_none());
        assert!(factory().open(&mut Cursor::new(Vec::new())).is_none());
    }

    #[test]
    fn default_readers() {
        let factory = RomDataFactory::with_default_readers();
        assert_eq!(factory.class_names(), vec!["NintendoDS", "GameCube"]);
        assert!(factory.open(&mut Cursor::new(vec![0u8; 0x1000])).is_none());
    }

    #[test]
    fn reader_position_is_reset() {
        let mut cursor = Cursor::new(b"BBBB".to_vec());
        cursor.set_position(4);
        assert!(factory().open(&mut cursor).is_some());
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    }
}
