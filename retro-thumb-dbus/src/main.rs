//! retro-thumb-dbus
//!
//! Session bus thumbnailer daemon. File managers queue ROM thumbnail
//! requests; results land in the XDG thumbnail cache. The daemon exits
//! after a period of inactivity or when it loses its bus name.

mod error;
mod interface;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use log::LevelFilter;
use zbus::{connection, fdo};

use retro_thumb_lib::{
    Pipeline, ServiceExit, ServiceHandle, ServiceOptions, ThumbnailBackend, ThumbnailerService,
};

use crate::error::DaemonError;
use crate::interface::{BUS_NAME, OBJECT_PATH, SpecializedThumbnailer, forward_signals};

#[derive(Parser, Debug)]
#[command(name = "retro-thumb-dbus")]
#[command(about = "D-Bus thumbnailer for ROM and disc images", long_about = None)]
struct Cli {
    /// Thumbnail cache root (defaults to $XDG_CACHE_HOME)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Seconds of inactivity before exiting
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
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

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(serve(cli)) {
        Ok(exit) => {
            log::info!("Exiting ({exit:?})");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(cli: Cli) -> Result<ServiceExit, DaemonError> {
    let cache_dir = cli
        .cache_dir
        .or_else(dirs::cache_dir)
        .ok_or(DaemonError::NoCacheDir)?;
    log::debug!("Thumbnail cache: {}", cache_dir.display());

    let backend: Arc<dyn ThumbnailBackend> = Arc::new(Pipeline::system());
    let (service, signals) = ThumbnailerService::new(
        ServiceOptions {
            cache_dir: Some(cache_dir),
            idle_timeout: Duration::from_secs(cli.timeout),
        },
        Some(backend),
    );
    let handle = service.handle();

    let conn = connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, SpecializedThumbnailer::new(handle.clone()))?
        .build()
        .await?;
    log::info!("Serving {BUS_NAME} at {OBJECT_PATH}");

    let iface = conn
        .object_server()
        .interface::<_, SpecializedThumbnailer>(OBJECT_PATH)
        .await?;
    let forwarder = tokio::spawn(forward_signals(iface, signals));

    let dbus = fdo::DBusProxy::new(&conn).await?;
    let name_watch = tokio::spawn(watch_name_lost(dbus, handle));

    let exit = service.run().await;

    // The service dropped its sender, so the forwarder drains and ends.
    if let Err(e) = forwarder.await {
        log::warn!("Signal forwarder failed: {e}");
    }
    name_watch.abort();
    Ok(exit)
}

/// Stop the service if another process takes over the bus name.
async fn watch_name_lost(dbus: fdo::DBusProxy<'static>, handle: ServiceHandle) {
    let mut lost = match dbus.receive_name_lost().await {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("Cannot watch for NameLost: {e}");
            return;
        }
    };
    while let Some(signal) = lost.next().await {
        let Ok(args) = signal.args() else {
            continue;
        };
        if args.name().as_str() == BUS_NAME {
            log::info!("Lost bus name {BUS_NAME}");
            handle.shutdown();
            return;
        }
    }
}
