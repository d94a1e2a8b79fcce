//! Test Database Module
//!
//! Scripted devices for exercising the capture loop without a camera
//! attached.
//!
//! - **Mock camera**: in-memory file store and scripted event queue
//! - **Failure injection**: refused downloads, broken streams, failed
//!   previews, rejected settings
//! - **Inspection**: clones share state, so a test can keep a handle to see
//!   what the loop did with the camera it was given
//!
//! # Quick Start
//!
//! ```rust
//! use photobooth::device::{DeviceSession, HardwareEvent};
//! use photobooth::testdb::{fake_jpeg, MockCamera};
//! use std::time::Duration;
//!
//! let camera = MockCamera::new();
//! let file = camera.announce_file("/store", "IMG1.JPG", fake_jpeg(1, 1024));
//!
//! let mut session = camera.clone();
//! let event = session.poll_event(Duration::from_millis(1)).unwrap();
//! assert_eq!(event, HardwareEvent::FileAdded(file));
//! ```

pub mod mock_device;

// Re-export commonly used types for convenience
pub use mock_device::{fake_jpeg, BreakingReader, MockCamera, MockCameraConfig, MOCK_CAPTURE_FOLDER};
