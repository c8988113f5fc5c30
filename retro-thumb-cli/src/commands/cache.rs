use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_thumb_lib::CacheManager;
use retro_thumb_lib::retro_thumb_core::util::format_bytes_approx;

use crate::error::CliError;

/// Print the download cache location and usage.
pub(crate) fn run_cache_path(cache: &CacheManager) -> Result<(), CliError> {
    println!("{}", cache.root().display());
    let usage = cache.usage()?;
    log::info!(
        "{} files, {}; {} failed downloads remembered",
        usage.files,
        format_bytes_approx(usage.bytes),
        usage.negative,
    );
    Ok(())
}

/// Delete every cached download.
pub(crate) fn run_cache_clear(cache: &CacheManager) -> Result<(), CliError> {
    let usage = cache.usage()?;
    cache.clear()?;
    println!(
        "{} Cache cleared ({} freed)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        format_bytes_approx(usage.bytes),
    );
    Ok(())
}
