//! SystemApi trait, OTA progress events, and the error type.

use crate::{OtaTarget, SystemInfo, SystemUpdate};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Device system API (info, restart, config patch, OTA).
#[async_trait]
pub trait SystemApi: Send + Sync {
    /// Fetch the current system info snapshot.
    async fn get_info(&self) -> Result<SystemInfo, SystemApiError>;

    /// Ask the device to restart; returns the device's reply text.
    async fn restart(&self) -> Result<String, SystemApiError>;

    /// Patch device configuration. Takes effect on the device after restart.
    async fn update_system(&self, update: &SystemUpdate) -> Result<(), SystemApiError>;

    /// Read the image at `path`, then upload it. Spawns the work on the current tokio runtime and
    /// returns immediately; progress and the outcome arrive through the handle.
    fn ota_update(&self, target: OtaTarget, path: PathBuf) -> OtaUpload;

    fn perform_ota_update(&self, path: PathBuf) -> OtaUpload {
        self.ota_update(OtaTarget::Firmware, path)
    }

    fn perform_www_ota_update(&self, path: PathBuf) -> OtaUpload {
        self.ota_update(OtaTarget::Www, path)
    }
}

/// One step of an OTA upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtaEvent {
    /// Image read; request about to be sent.
    Sent { total: u64 },
    /// `loaded` bytes of `total` handed to the transport.
    UploadProgress { loaded: u64, total: u64 },
    /// Final device reply. Always the last event of a successful upload.
    Response { status: u16, body: String },
}

impl OtaEvent {
    /// Upload progress in percent, for `UploadProgress` events only.
    pub fn percent(&self) -> Option<u8> {
        match *self {
            OtaEvent::UploadProgress { loaded, total } => {
                if total == 0 {
                    Some(100)
                } else {
                    Some((loaded.min(total) * 100 / total) as u8)
                }
            }
            _ => None,
        }
    }
}

pub type OtaEventSender = mpsc::UnboundedSender<Result<OtaEvent, SystemApiError>>;

/// Receiving end of an OTA upload. An `Err` item ends the stream.
///
/// Dropping the handle does not cancel the upload.
pub struct OtaUpload {
    rx: mpsc::UnboundedReceiver<Result<OtaEvent, SystemApiError>>,
    done: bool,
}

impl OtaUpload {
    /// Create a handle and the sender an implementation forwards events into.
    pub fn from_channel() -> (OtaEventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx, done: false })
    }

    /// Next event in order; `None` once the upload finished or failed.
    pub async fn next(&mut self) -> Option<Result<OtaEvent, SystemApiError>> {
        if self.done {
            return None;
        }
        let item = self.rx.recv().await;
        match &item {
            None | Some(Err(_)) | Some(Ok(OtaEvent::Response { .. })) => self.done = true,
            _ => {}
        }
        item
    }

    /// Drain all events and return the device's reply body.
    pub async fn finish(mut self) -> Result<String, SystemApiError> {
        while let Some(item) = self.next().await {
            if let OtaEvent::Response { body, .. } = item? {
                return Ok(body);
            }
        }
        Err(SystemApiError::Transport(
            "upload ended without a response".to_string(),
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SystemApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("device returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
}
