use super::*;
use image::{Rgba, RgbaImage};
use retro_thumb_core::Sbit;

fn sample() -> RomImage {
    RomImage::new(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])))
}

fn metadata() -> XdgMetadata {
    XdgMetadata {
        uri: "file:///roms/My%20Game.nds".to_string(),
        mtime: Some(1_700_000_000),
        mime_type: "application/x-nintendo-ds-rom".to_string(),
        file_size: 8_388_608,
        full_size: ImageSize::new(32, 32),
    }
}

fn read_text(bytes: &[u8]) -> Vec<(String, String)> {
    let decoder = png::Decoder::new(bytes);
    let reader = decoder.read_info().unwrap();
    reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect()
}

#[test]
fn xdg_chunks_in_order() {
    let mut out = Vec::new();
    PngWriter::new()
        .with_xdg_metadata(&metadata())
        .write_to(&mut out, &sample())
        .unwrap();

    let keys: Vec<_> = read_text(&out).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            "Software",
            "Thumb::MTime",
            "Thumb::Mimetype",
            "Thumb::Size",
            "Thumb::Image::Width",
            "Thumb::Image::Height",
            "Thumb::URI",
        ]
    );
}

#[test]
fn xdg_values() {
    let mut out = Vec::new();
    PngWriter::new()
        .with_xdg_metadata(&metadata())
        .write_to(&mut out, &sample())
        .unwrap();
    let text = read_text(&out);
    let value = |key: &str| text.iter().find(|(k, _)| k == key).unwrap().1.clone();

    assert_eq!(value("Software"), SOFTWARE);
    assert_eq!(value("Thumb::MTime"), "1700000000");
    assert_eq!(value("Thumb::Size"), "8388608");
    assert_eq!(value("Thumb::Image::Width"), "32");
    assert_eq!(value("Thumb::Image::Height"), "32");
    assert_eq!(value("Thumb::URI"), "file:///roms/My%20Game.nds");
}

#[test]
fn optional_fields_are_omitted() {
    let meta = XdgMetadata {
        mtime: None,
        mime_type: String::new(),
        ..metadata()
    };
    let writer = PngWriter::new().with_xdg_metadata(&meta);
    let keys: Vec<_> = writer.text_chunks().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "Software",
            "Thumb::Size",
            "Thumb::Image::Width",
            "Thumb::Image::Height",
            "Thumb::URI",
        ]
    );
}

#[test]
fn unknown_file_size_is_omitted() {
    let meta = XdgMetadata {
        file_size: 0,
        ..metadata()
    };
    let writer = PngWriter::new().with_xdg_metadata(&meta);
    assert!(!writer.text_chunks().iter().any(|(k, _)| k == "Thumb::Size"));
    assert!(writer.text_chunks().iter().any(|(k, _)| k == "Thumb::URI"));
}

#[test]
fn non_latin1_uri_uses_itxt() {
    let meta = XdgMetadata {
        uri: "file:///roms/ゲーム.nds".to_string(),
        ..metadata()
    };
    let mut out = Vec::new();
    PngWriter::new()
        .with_xdg_metadata(&meta)
        .write_to(&mut out, &sample())
        .unwrap();

    let latin1: Vec<_> = read_text(&out).into_iter().map(|(k, _)| k).collect();
    assert!(latin1.contains(&"Thumb::Size".to_string()));
    assert!(!latin1.contains(&"Thumb::URI".to_string()));

    let reader = png::Decoder::new(out.as_slice()).read_info().unwrap();
    let uri = reader
        .info()
        .utf8_text
        .iter()
        .find(|chunk| chunk.keyword == "Thumb::URI")
        .unwrap();
    assert_eq!(uri.get_text().unwrap(), "file:///roms/ゲーム.nds");
}

#[test]
fn software_only_without_metadata() {
    let mut out = Vec::new();
    PngWriter::new().write_to(&mut out, &sample()).unwrap();
    assert_eq!(read_text(&out), vec![("Software".to_string(), SOFTWARE.to_string())]);
}

#[test]
fn pixels_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thumb.png");
    PngWriter::new().write(&path, &sample()).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(decoded.get_pixel(2, 1), &Rgba([1, 2, 3, 255]));
}

#[test]
fn sbit_chunk_written_when_set() {
    let has_sbit = |bytes: &[u8]| bytes.windows(4).any(|w| w == b"sBIT");

    let mut plain = Vec::new();
    PngWriter::new().write_to(&mut plain, &sample()).unwrap();
    assert!(!has_sbit(&plain));

    let mut with_sbit = Vec::new();
    let image = sample().with_sbit(Sbit::new(5, 5, 5, 1));
    PngWriter::new().write_to(&mut with_sbit, &image).unwrap();
    let at = with_sbit.windows(4).position(|w| w == b"sBIT").unwrap();
    assert_eq!(&with_sbit[at + 4..at + 8], &[5, 5, 5, 1]);
}

#[test]
fn unwritable_path_is_output_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("thumb.png");
    let err = PngWriter::new().write(&path, &sample()).unwrap_err();
    assert_eq!(err.code(), 6);
}
