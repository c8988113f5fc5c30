//! The `SpecializedThumbnailer1` object exported on the session bus.

use tokio::sync::mpsc;
use zbus::object_server::{InterfaceRef, SignalContext};
use zbus::{fdo, interface};

use retro_thumb_lib::{QueueError, ServiceHandle, ThumbnailerSignal};

pub(crate) const BUS_NAME: &str = "com.gerbilsoft.rom_properties.SpecializedThumbnailer1";
pub(crate) const OBJECT_PATH: &str = "/com/gerbilsoft/rom_properties/SpecializedThumbnailer1";

pub(crate) struct SpecializedThumbnailer {
    handle: ServiceHandle,
}

impl SpecializedThumbnailer {
    pub(crate) fn new(handle: ServiceHandle) -> Self {
        Self { handle }
    }
}

fn to_fdo_error(err: QueueError) -> fdo::Error {
    match err {
        QueueError::ShuttingDown => fdo::Error::NoServer(err.to_string()),
        QueueError::InvalidHandle(_) => fdo::Error::InvalidArgs(err.to_string()),
    }
}

#[interface(name = "com.gerbilsoft.rom_properties.SpecializedThumbnailer1")]
impl SpecializedThumbnailer {
    /// Queue a thumbnail request and return its handle.
    async fn queue(
        &self,
        uri: &str,
        mime_type: &str,
        flavor: &str,
        urgent: bool,
    ) -> fdo::Result<u32> {
        let handle = self
            .handle
            .queue(uri, mime_type, flavor, urgent)
            .map_err(to_fdo_error)?;
        log::debug!("queued {uri} ({flavor}) as handle {handle}");
        Ok(handle)
    }

    /// Acknowledged but not cancelled; the request still runs.
    async fn dequeue(&self, handle: u32) -> fdo::Result<()> {
        self.handle.dequeue(handle).map_err(to_fdo_error)
    }

    #[zbus(signal)]
    async fn started(ctxt: &SignalContext<'_>, handle: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn ready(ctxt: &SignalContext<'_>, handle: u32, uri: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn error(
        ctxt: &SignalContext<'_>,
        handle: u32,
        failed_uri: &str,
        error_code: i32,
        message: &str,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn finished(ctxt: &SignalContext<'_>, handle: u32) -> zbus::Result<()>;
}

/// Emit queue signals on the bus until the service drops its sender.
pub(crate) async fn forward_signals(
    iface: InterfaceRef<SpecializedThumbnailer>,
    mut signals: mpsc::UnboundedReceiver<ThumbnailerSignal>,
) {
    let ctxt = iface.signal_context();
    while let Some(signal) = signals.recv().await {
        let result = match &signal {
            ThumbnailerSignal::Started { handle } => {
                SpecializedThumbnailer::started(ctxt, *handle).await
            }
            ThumbnailerSignal::Ready { handle, uri } => {
                SpecializedThumbnailer::ready(ctxt, *handle, uri).await
            }
            ThumbnailerSignal::Error {
                handle,
                uri,
                code,
                message,
            } => SpecializedThumbnailer::error(ctxt, *handle, uri, *code, message).await,
            ThumbnailerSignal::Finished { handle } => {
                SpecializedThumbnailer::finished(ctxt, *handle).await
            }
        };
        if let Err(e) = result {
            log::warn!("Failed to emit {signal:?}: {e}");
        }
    }
}
