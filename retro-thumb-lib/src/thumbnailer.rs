//! Thumbnail request queue and its processing loop.
//!
//! File managers queue requests over D-Bus; [`ThumbnailerService::run`]
//! processes them one at a time and reports progress as
//! [`ThumbnailerSignal`]s on an unbounded channel. When the queue has been
//! empty for the idle timeout, the service shuts itself down and refuses
//! further requests.
//!
//! Urgent requests go to the front of the queue, so two urgent requests
//! queued back to back run newest first.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, mpsc};
use tokio::time::Duration;

use crate::error::{CreateError, QueueError};

/// Idle time before the service exits.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Target size for the `normal` flavor.
pub const NORMAL_SIZE: i32 = 128;
/// Target size for the `large` flavor.
pub const LARGE_SIZE: i32 = 256;

/// `Error` signal code for a failed thumbnail.
const ERROR_CODE_FAILED: i32 = 2;

/// Creates one thumbnail file.
pub trait ThumbnailBackend: Send + Sync {
    fn create(&self, uri: &str, output: &Path, max_size: i32, flags: u32) -> Result<(), CreateError>;
}

/// XDG cache file name for a URI: MD5 of the URI in lowercase hex, plus `.png`.
pub fn thumbnail_filename(uri: &str) -> String {
    format!("{:x}.png", md5::compute(uri.as_bytes()))
}

/// A queued thumbnail request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub handle: u32,
    pub uri: String,
    /// `large` flavor (256px) rather than `normal` (128px).
    pub large: bool,
}

/// Progress reports, mirroring the D-Bus signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailerSignal {
    Started {
        handle: u32,
    },
    Ready {
        handle: u32,
        uri: String,
    },
    Error {
        handle: u32,
        uri: String,
        code: i32,
        message: String,
    },
    Finished {
        handle: u32,
    },
}

/// Pending requests plus handle allocation.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<Request>,
    last_handle: u32,
    shut_down: bool,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request and return its handle. Handles are never zero.
    pub fn queue(
        &mut self,
        uri: &str,
        _mime_type: &str,
        flavor: &str,
        urgent: bool,
    ) -> Result<u32, QueueError> {
        if self.shut_down {
            return Err(QueueError::ShuttingDown);
        }

        self.last_handle = self.last_handle.wrapping_add(1);
        if self.last_handle == 0 {
            self.last_handle = 1;
        }
        let request = Request {
            handle: self.last_handle,
            uri: uri.to_string(),
            large: flavor.eq_ignore_ascii_case("large"),
        };
        if urgent {
            self.pending.push_front(request);
        } else {
            self.pending.push_back(request);
        }
        Ok(self.last_handle)
    }

    /// Cancellation is not supported; this only validates the handle.
    pub fn dequeue(&mut self, handle: u32) -> Result<(), QueueError> {
        if handle == 0 {
            return Err(QueueError::InvalidHandle(handle));
        }
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Request> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Refuse new requests from now on.
    pub fn shut_down(&mut self) {
        self.shut_down = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

/// Process one request, reporting each step through `emit`.
///
/// Always ends with `Finished`.
pub fn process_request(
    backend: Option<&dyn ThumbnailBackend>,
    cache_dir: Option<&Path>,
    request: &Request,
    emit: &mut dyn FnMut(ThumbnailerSignal),
) {
    let handle = request.handle;
    let Some(cache_dir) = cache_dir.filter(|dir| !dir.as_os_str().is_empty()) else {
        report_failure(emit, handle, "", "Thumbnail cache directory is empty.");
        return;
    };
    let Some(backend) = backend else {
        report_failure(emit, handle, "", "No thumbnailer function is available.");
        return;
    };

    emit(ThumbnailerSignal::Started { handle });

    let (flavor, size) = if request.large {
        ("large", LARGE_SIZE)
    } else {
        ("normal", NORMAL_SIZE)
    };
    let dir = cache_dir.join("thumbnails").join(flavor);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        log::debug!("thumbnail: cannot create {}: {e}", dir.display());
        report_failure(
            emit,
            handle,
            &request.uri,
            "Cannot mkdir() the thumbnail cache directory.",
        );
        return;
    }

    let path = dir.join(thumbnail_filename(&request.uri));
    match backend.create(&request.uri, &path, size, 0) {
        Ok(()) => {
            log::debug!("thumbnail: {} -> {} [OK]", request.uri, path.display());
            emit(ThumbnailerSignal::Ready {
                handle,
                uri: request.uri.clone(),
            });
        }
        Err(e) => {
            log::debug!(
                "thumbnail: {} -> {} [ERR={}]",
                request.uri,
                path.display(),
                e.code()
            );
            emit(ThumbnailerSignal::Error {
                handle,
                uri: request.uri.clone(),
                code: ERROR_CODE_FAILED,
                message: format!("Thumbnail creation failed (code {}): {e}", e.code()),
            });
        }
    }
    emit(ThumbnailerSignal::Finished { handle });
}

fn report_failure(
    emit: &mut dyn FnMut(ThumbnailerSignal),
    handle: u32,
    uri: &str,
    message: &str,
) {
    emit(ThumbnailerSignal::Error {
        handle,
        uri: uri.to_string(),
        code: 0,
        message: message.to_string(),
    });
    emit(ThumbnailerSignal::Finished { handle });
}

/// Why [`ThumbnailerService::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceExit {
    /// Nothing was queued for the idle timeout.
    Idle,
    /// [`ServiceHandle::shutdown`] was called.
    Stopped,
}

/// Cloneable front end of the queue, used by the D-Bus interface.
#[derive(Clone)]
pub struct ServiceHandle {
    queue: Arc<Mutex<RequestQueue>>,
    wake: Arc<Notify>,
}

impl ServiceHandle {
    fn lock(&self) -> MutexGuard<'_, RequestQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn queue(
        &self,
        uri: &str,
        mime_type: &str,
        flavor: &str,
        urgent: bool,
    ) -> Result<u32, QueueError> {
        let handle = self.lock().queue(uri, mime_type, flavor, urgent)?;
        self.wake.notify_one();
        Ok(handle)
    }

    pub fn dequeue(&self, handle: u32) -> Result<(), QueueError> {
        self.lock().dequeue(handle)
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Stop accepting requests and end the processing loop.
    pub fn shutdown(&self) {
        self.lock().shut_down();
        self.wake.notify_one();
    }
}

/// Service settings.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Root of the XDG thumbnail cache (usually `$XDG_CACHE_HOME`).
    pub cache_dir: Option<PathBuf>,
    pub idle_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Single-consumer processing loop over a [`RequestQueue`].
pub struct ThumbnailerService {
    handle: ServiceHandle,
    backend: Option<Arc<dyn ThumbnailBackend>>,
    options: ServiceOptions,
    signals: mpsc::UnboundedSender<ThumbnailerSignal>,
}

impl ThumbnailerService {
    pub fn new(
        options: ServiceOptions,
        backend: Option<Arc<dyn ThumbnailBackend>>,
    ) -> (Self, mpsc::UnboundedReceiver<ThumbnailerSignal>) {
        let (signals, signal_rx) = mpsc::unbounded_channel();
        let handle = ServiceHandle {
            queue: Arc::new(Mutex::new(RequestQueue::new())),
            wake: Arc::new(Notify::new()),
        };
        let service = Self {
            handle,
            backend,
            options,
            signals,
        };
        (service, signal_rx)
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Process requests until idle or stopped.
    pub async fn run(self) -> ServiceExit {
        loop {
            let next = {
                let mut queue = self.handle.lock();
                if queue.is_shut_down() {
                    return ServiceExit::Stopped;
                }
                queue.pop()
            };

            if let Some(request) = next {
                self.process(request).await;
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = self.handle.wake.notified() => {}
                _ = tokio::time::sleep(self.options.idle_timeout) => {
                    let mut queue = self.handle.lock();
                    if queue.is_empty() {
                        queue.shut_down();
                        log::debug!(
                            "Shutting down due to {} seconds of inactivity.",
                            self.options.idle_timeout.as_secs()
                        );
                        return ServiceExit::Idle;
                    }
                }
            }
        }
    }

    async fn process(&self, request: Request) {
        let backend = self.backend.clone();
        let cache_dir = self.options.cache_dir.clone();
        let signals = self.signals.clone();
        let handle = request.handle;
        let uri = request.uri.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut emit = |signal| {
                let _ = signals.send(signal);
            };
            process_request(backend.as_deref(), cache_dir.as_deref(), &request, &mut emit);
        })
        .await;

        if let Err(e) = result {
            log::warn!("thumbnail: {uri}: worker failed: {e}");
            let _ = self.signals.send(ThumbnailerSignal::Error {
                handle,
                uri,
                code: ERROR_CODE_FAILED,
                message: e.to_string(),
            });
            let _ = self.signals.send(ThumbnailerSignal::Finished { handle });
        }
    }
}

#[cfg(test)]
#[path = "tests/thumbnailer_tests.rs"]
mod tests;
