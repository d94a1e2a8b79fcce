//! Device interaction module
//!
//! # Submodules
//!
//! - `traits` - The session abstraction the capture loop is written against
//! - `simulated` - An in-process camera rendering real JPEG frames
//!
//! # Architecture
//!
//! The capture loop never talks to a camera directly:
//!
//! - `DeviceConnector` - Opens a session
//! - `DeviceSession` - Capture, preview, download, delete, event polling
//!
//! The simulated camera and the scripted test mock both implement these
//! traits; a hardware backend plugs in the same way.

pub mod simulated;
pub mod traits;

// Re-export commonly used types for convenience
pub use simulated::{SimulatedCamera, SimulatedConnector};
pub use traits::{
    CaptureMode, DeviceConnector, DeviceInfo, DeviceSession, HardwareEvent, RemoteFileRef,
};
