use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_thumb_lib::{NO_XDG_THUMBNAIL_METADATA, Pipeline, ThumbnailInfo};

use crate::error::CliError;

pub(crate) fn thumbnail_flags(no_metadata: bool) -> u32 {
    if no_metadata {
        NO_XDG_THUMBNAIL_METADATA
    } else {
        0
    }
}

/// Create one thumbnail.
pub(crate) fn run_thumbnail(
    pipeline: &Pipeline,
    source: &str,
    output: &Path,
    size: i32,
    no_metadata: bool,
) -> Result<ThumbnailInfo, CliError> {
    let info = pipeline.create_thumbnail(source, output, size, thumbnail_flags(no_metadata))?;

    println!(
        "{} {} [{}]",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        output.display().if_supports_color(Stdout, |t| t.bold()),
        info.class_name.if_supports_color(Stdout, |t| t.cyan()),
    );
    if info.full_size == info.thumb_size {
        println!("  Size: {}", info.thumb_size);
    } else {
        println!("  Size: {} (from {})", info.thumb_size, info.full_size);
    }
    if !no_metadata {
        println!(
            "  URI:  {}",
            info.uri.if_supports_color(Stdout, |t| t.dimmed())
        );
    }
    Ok(info)
}
