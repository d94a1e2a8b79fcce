//! Error types for the photobooth
//!
//! Errors are split by the stage that produced them, because the capture loop
//! treats them differently: a failed on-demand capture or download is
//! reported and the loop carries on, while a failed preview or a device that
//! cannot be opened ends the process.

use std::path::PathBuf;
use thiserror::Error;

/// Error reported by a device session (transport level)
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device went away
    #[error("Device disconnected")]
    Disconnected,

    /// The device is busy with another operation
    #[error("Device busy")]
    Busy,

    /// The device rejected or failed a request
    #[error("Device error {code}: {message}")]
    Protocol { code: i32, message: String },

    /// A file or setting the request referred to does not exist on the device
    #[error("Not found on device: {0}")]
    NotFound(String),

    /// The device does not support this operation
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// I/O error talking to the device
    #[error("Device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The device session could not be established
#[derive(Error, Debug)]
pub enum InitError {
    /// No camera answered on any port
    #[error("No camera detected. Make sure the camera is connected and switched on.")]
    NoDevice,

    /// A camera was found but the session could not be opened
    #[error("Failed to open camera session: {0}")]
    Session(#[source] DeviceError),
}

/// A capture (full or preview) failed
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The device failed the capture command
    #[error("Capture command failed: {0}")]
    Device(#[source] DeviceError),

    /// The device produced an empty preview frame
    #[error("Device returned an empty preview frame")]
    EmptyPreview,

    /// Writing the preview to disk failed
    #[error("Failed to save preview to '{}': {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Downloading the freshly captured image failed
    #[error("Failed to download captured image: {0}")]
    Transfer(#[source] TransferError),
}

/// Moving a device file into a local artifact failed
#[derive(Error, Debug)]
pub enum TransferError {
    /// The local file could not be created
    #[error("Failed to create '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device refused to hand out the file
    #[error("Failed to download '{remote}': {source}")]
    Download {
        remote: String,
        #[source]
        source: DeviceError,
    },

    /// The device stream broke while reading
    #[error("Transfer of '{remote}' interrupted: {source}")]
    Stream {
        remote: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the local file failed
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Polling the device for events failed (distinct from a timeout event)
#[derive(Error, Debug)]
#[error("Event poll failed: {0}")]
pub struct PollError(#[source] pub DeviceError);

/// Reloading camera settings failed
#[derive(Error, Debug)]
pub enum ReloadError {
    /// The settings file could not be read
    #[error("Failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of the settings file is not `name=value`
    #[error("Invalid setting at {}:{line}: '{text}'", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        text: String,
    },

    /// The device rejected one or more settings
    #[error("Device rejected {failed} of {total} settings")]
    Rejected { failed: usize, total: usize },
}

/// Fatal errors that end the capture loop
#[derive(Error, Debug)]
pub enum BoothError {
    /// The device session could not be established
    #[error(transparent)]
    Init(#[from] InitError),

    /// Live preview failed; the session is no longer usable
    #[error("Preview capture failed: {0}")]
    Preview(#[source] CaptureError),

    /// An output location could not be written
    #[error("Cannot write to '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for fatal loop errors
pub type Result<T> = std::result::Result<T, BoothError>;
