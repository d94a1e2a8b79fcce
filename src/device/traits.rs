//! Device abstraction traits
//!
//! This module defines the boundary between the capture loop and whatever
//! talks to the physical camera. The loop only ever sees a [`DeviceSession`]:
//! an exclusive, already-initialized connection to one device. Opening a
//! session goes through a [`DeviceConnector`], so the simulated backend, the
//! scripted test mock and any hardware backend are interchangeable.
//!
//! # Architecture
//!
//! - `DeviceConnector` - Opens a session (the `init` step)
//! - `DeviceSession` - Capture, preview, download, delete, event polling
//! - `RemoteFileRef` - A file resident on the device (folder + name)
//! - `HardwareEvent` - Events the device raises on its own
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use photobooth::device::traits::{CaptureMode, DeviceConnector, DeviceSession};
//! use photobooth::device::SimulatedConnector;
//!
//! fn snap<C: DeviceConnector>(connector: &C) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = connector.open()?;
//!     let file = session.capture(CaptureMode::Image)?;
//!     println!("Captured {} on the device", file);
//!     session.shutdown();
//!     Ok(())
//! }
//!
//! snap(&SimulatedConnector::default()).unwrap();
//! ```

use crate::core::error::{DeviceError, InitError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::io::Read;
use std::time::Duration;

/// A file resident on the device, addressed by folder and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteFileRef {
    /// Folder on the device (e.g. "/store_00010001/DCIM/100CANON")
    pub folder: String,
    /// File name inside the folder (e.g. "IMG_0001.JPG")
    pub name: String,
}

impl RemoteFileRef {
    /// Create a new remote file reference
    pub fn new(folder: &str, name: &str) -> Self {
        Self {
            folder: folder.to_string(),
            name: name.to_string(),
        }
    }

    /// Lowercased extension of the device-side name, if it has one
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_lowercase())
    }
}

impl Display for RemoteFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.folder.ends_with('/') {
            write!(f, "{}{}", self.folder, self.name)
        } else {
            write!(f, "{}/{}", self.folder, self.name)
        }
    }
}

/// What kind of capture to ask the device for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Full-resolution still image
    #[default]
    Image,
    /// Movie clip
    Movie,
    /// Audio clip
    Sound,
}

/// An event raised by the device itself
///
/// `Other` carries the raw discriminant of anything the backend could not
/// classify, so new event kinds are reported instead of dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareEvent {
    /// A new file appeared on the device (e.g. the shutter button was pressed)
    FileAdded(RemoteFileRef),
    /// A new folder appeared on the device
    FolderAdded(String),
    /// The device finished a capture
    CaptureComplete,
    /// Nothing happened within the poll timeout
    Timeout,
    /// The device reported something it could not name, with an optional message
    Unknown(Option<String>),
    /// Unrecognized event tag
    Other(i32),
}

impl HardwareEvent {
    /// Short name of the event kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            HardwareEvent::FileAdded(_) => "file-added",
            HardwareEvent::FolderAdded(_) => "folder-added",
            HardwareEvent::CaptureComplete => "capture-complete",
            HardwareEvent::Timeout => "timeout",
            HardwareEvent::Unknown(_) => "unknown",
            HardwareEvent::Other(_) => "other",
        }
    }

    /// Whether this event ends a drain pass
    pub fn is_timeout(&self) -> bool {
        matches!(self, HardwareEvent::Timeout)
    }
}

/// Basic information about the connected device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device manufacturer (e.g. "Canon Inc.")
    pub manufacturer: String,
    /// Device model (e.g. "EOS 5D Mark IV")
    pub model: String,
    /// Port or connection the session runs over (e.g. "usb:001,004")
    pub port: String,
}

impl DeviceInfo {
    /// Create a new DeviceInfo
    pub fn new(manufacturer: &str, model: &str, port: &str) -> Self {
        Self {
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            port: port.to_string(),
        }
    }
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.manufacturer, self.model, self.port)
    }
}

/// An exclusive, initialized connection to one device
///
/// Every operation takes `&mut self`: the device protocol is not reentrant,
/// so at most one operation is in flight on a session at any time.
pub trait DeviceSession {
    /// Information about the device behind this session
    fn info(&self) -> &DeviceInfo;

    /// Trigger a capture; the new file stays on the device until downloaded
    fn capture(&mut self, mode: CaptureMode) -> Result<RemoteFileRef, DeviceError>;

    /// Grab a low-resolution live-view frame, returned as encoded JPEG bytes
    fn capture_preview(&mut self) -> Result<Vec<u8>, DeviceError>;

    /// Open a byte stream over the content of a device file
    fn download<'a>(
        &'a mut self,
        file: &RemoteFileRef,
    ) -> Result<Box<dyn Read + 'a>, DeviceError>;

    /// Remove a file from the device
    fn delete(&mut self, file: &RemoteFileRef) -> Result<(), DeviceError>;

    /// Wait at most `timeout` for the next hardware event
    ///
    /// Returns `HardwareEvent::Timeout` when nothing arrived in time; an `Err`
    /// means the poll itself failed.
    fn poll_event(&mut self, timeout: Duration) -> Result<HardwareEvent, DeviceError>;

    /// Change a named device setting (e.g. "iso" = "400")
    fn set_setting(&mut self, name: &str, value: &str) -> Result<(), DeviceError>;

    /// Release the device. Consumes the session so it cannot be released twice.
    fn shutdown(self)
    where
        Self: Sized;
}

/// Opens sessions to a device
pub trait DeviceConnector {
    /// The session type produced by this connector
    type Session: DeviceSession;

    /// Establish an exclusive session with the device
    fn open(&self) -> Result<Self::Session, InitError>;
}
