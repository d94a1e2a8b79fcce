//! Photobooth Library
//!
//! Drives a tethered camera in a loop: keep a live preview image fresh,
//! take a full-resolution picture when asked, and download every picture
//! the camera takes on its own.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`core`] - The capture loop, configuration, error handling, trigger
//!   flags and file transfer
//! - [`device`] - The device session traits and the simulated camera
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - A scripted mock camera for testing without hardware
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use photobooth::core::booth::Photobooth;
//! use photobooth::core::config::Config;
//! use photobooth::core::triggers::TriggerFlags;
//! use photobooth::device::{DeviceConnector, SimulatedConnector};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let session = SimulatedConnector::new(config.simulator.clone()).open()?;
//!
//!     // Hand the latches to whatever sets them (signal handlers, a GUI...)
//!     let flags = TriggerFlags::new();
//!     let booth = Photobooth::new(session, flags.clone(), &config)?;
//!
//!     flags.request_capture();
//!     let stats = booth.run()?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```
//!
//! # Files Written
//!
//! - `preview.jpg` - replaced whole on every loop iteration
//! - `image-000.jpg`, `image-001.jpg`, ... - every full-resolution image,
//!   numbered in the order it arrived; numbers are never reused

pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
