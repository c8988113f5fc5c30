//! retro-thumb CLI
//!
//! Create thumbnails for ROM and disc images from the command line.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use retro_thumb_lib::{CacheManager, ConfigStore, Pipeline, RomDataFactory};

use crate::commands::cache::{run_cache_clear, run_cache_path};
use crate::commands::config::{run_config_path, run_config_show};
use crate::commands::thumbnail::run_thumbnail;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "retro-thumb")]
#[command(about = "Create thumbnails for ROM and disc images", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a PNG thumbnail of a ROM or disc image
    Thumbnail {
        /// Maximum thumbnail size in pixels (0 keeps the native size)
        #[arg(short, long, default_value_t = 256)]
        size: i32,

        /// Don't write XDG thumbnail metadata
        #[arg(short = 'n', long)]
        no_metadata: bool,

        /// Source file path or file:// URI
        source: String,

        /// Output PNG path
        output: PathBuf,
    },

    /// Show or locate the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage the external image download cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory and its usage
    Path,

    /// Delete all cached downloads
    Clear,
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(level_filter(cli.verbose))
        .parse_default_env()
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{} {}",
                "\u{2718}".if_supports_color(Stderr, |t| t.red()),
                e,
            );
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Thumbnail {
            size,
            no_metadata,
            source,
            output,
        } => {
            let pipeline = Pipeline::system();
            run_thumbnail(&pipeline, &source, &output, size, no_metadata).map(|_| ())
        }
        Commands::Config { action } => {
            let store = ConfigStore::open_default();
            match action {
                ConfigAction::Show => {
                    run_config_show(&store, &RomDataFactory::with_default_readers())
                }
                ConfigAction::Path => {
                    run_config_path(&store);
                    Ok(())
                }
            }
        }
        Commands::Cache { action } => {
            let cache = CacheManager::new()?;
            match action {
                CacheAction::Path => run_cache_path(&cache),
                CacheAction::Clear => run_cache_clear(&cache),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_thumb_lib::CreateError;

    #[test]
    fn thumbnail_defaults() {
        let cli = Cli::try_parse_from(["retro-thumb", "thumbnail", "game.iso", "out.png"]).unwrap();
        match cli.command {
            Commands::Thumbnail {
                size,
                no_metadata,
                source,
                output,
            } => {
                assert_eq!(size, 256);
                assert!(!no_metadata);
                assert_eq!(source, "game.iso");
                assert_eq!(output, PathBuf::from("out.png"));
            }
            _ => panic!("expected thumbnail command"),
        }
    }

    #[test]
    fn thumbnail_options() {
        let cli = Cli::try_parse_from([
            "retro-thumb",
            "-vv",
            "thumbnail",
            "-s",
            "128",
            "-n",
            "file:///roms/game.nds",
            "out.png",
        ])
        .unwrap();
        assert_eq!(level_filter(cli.verbose), LevelFilter::Debug);
        assert!(matches!(
            cli.command,
            Commands::Thumbnail {
                size: 128,
                no_metadata: true,
                ..
            }
        ));
    }

    #[test]
    fn config_and_cache_subcommands() {
        assert!(matches!(
            Cli::try_parse_from(["retro-thumb", "config", "show"]).unwrap().command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
        assert!(matches!(
            Cli::try_parse_from(["retro-thumb", "cache", "clear"]).unwrap().command,
            Commands::Cache {
                action: CacheAction::Clear
            }
        ));
        assert!(Cli::try_parse_from(["retro-thumb", "cache", "fetch"]).is_err());
    }

    #[test]
    fn exit_codes_follow_create_errors() {
        assert_eq!(CliError::from(CreateError::NoImage).exit_code(), 5);
        assert_eq!(CliError::from(CreateError::InvalidFlags(4)).exit_code(), 9);
        assert_eq!(
            CliError::from(std::io::Error::other("disk on fire")).exit_code(),
            1
        );
    }
}
