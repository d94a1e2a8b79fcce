//! The capture loop
//!
//! [`Photobooth`] owns the camera session and drives it forever:
//!
//! 1. serve a pending capture request (failures are reported, not fatal)
//! 2. serve a pending settings reload (failures are reported, not fatal)
//! 3. replace the live preview (failure is fatal)
//! 4. drain the camera's event queue, downloading announced files
//!
//! Termination requests are honoured between steps, never in the middle of
//! a capture or transfer. When the loop ends, for whatever reason, the
//! session is shut down exactly once.

use crate::core::capture::{CaptureController, CaptureSequence};
use crate::core::config::Config;
use crate::core::drain::{DrainEnd, EventDrain};
use crate::core::error::{BoothError, Result};
use crate::core::settings;
use crate::core::triggers::TriggerFlags;
use crate::device::traits::DeviceSession;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Counters over the lifetime of the loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Loop iterations started
    pub iterations: u64,
    /// Preview frames written
    pub previews: u64,
    /// On-demand captures saved
    pub captures: u64,
    /// On-demand captures that failed
    pub capture_failures: u64,
    /// Files downloaded after the camera announced them
    pub downloads: u64,
    /// Announced files that could not be downloaded
    pub download_failures: u64,
    /// Hardware events dispatched
    pub hardware_events: u64,
    /// Drain passes cut short by a failed poll
    pub poll_failures: u64,
    /// Settings reloads that succeeded
    pub reloads: u64,
    /// Settings reloads that failed
    pub reload_failures: u64,
    /// Bytes of full-resolution images saved
    pub bytes_saved: u64,
}

impl LoopStats {
    /// Full-resolution images saved, whatever triggered them
    pub fn images_saved(&self) -> u64 {
        self.captures + self.downloads
    }
}

impl std::fmt::Display for LoopStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_mb = self.bytes_saved as f64 / 1_048_576.0;
        write!(
            f,
            "Previews: {}, Captures: {}, Downloads: {}, Failures: {}, Total size: {:.2} MB",
            self.previews,
            self.captures,
            self.downloads,
            self.capture_failures + self.download_failures,
            size_mb
        )
    }
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// Termination was requested
    Terminated,
}

/// Drives one camera session until terminated
pub struct Photobooth<S: DeviceSession> {
    session: S,
    flags: TriggerFlags,
    controller: CaptureController,
    drain: EventDrain,
    sequence: CaptureSequence,
    settings_file: PathBuf,
    stats: LoopStats,
}

impl<S: DeviceSession> Photobooth<S> {
    /// Take ownership of an open session
    ///
    /// Creates the output directory if needed.
    pub fn new(session: S, flags: TriggerFlags, config: &Config) -> Result<Self> {
        let directory = &config.output.directory;
        if !directory.as_os_str().is_empty() {
            if let Err(source) = fs::create_dir_all(directory) {
                session.shutdown();
                return Err(BoothError::Output {
                    path: directory.clone(),
                    source,
                });
            }
        }

        info!("Camera: {}", session.info());

        Ok(Self {
            session,
            flags,
            controller: CaptureController::new(&config.output.preview_path()),
            drain: EventDrain::new(config.events.poll_timeout(), config.events.max_drain()),
            sequence: CaptureSequence::from_config(&config.output),
            settings_file: config.camera.settings_file.clone(),
            stats: LoopStats::default(),
        })
    }

    /// Counters so far
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// The shared image numbering
    pub fn sequence(&self) -> &CaptureSequence {
        &self.sequence
    }

    /// Run until termination is requested or a fatal error occurs
    pub fn run(self) -> Result<LoopStats> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), calling `on_iteration` after every completed iteration
    pub fn run_with<F: FnMut(&LoopStats)>(mut self, mut on_iteration: F) -> Result<LoopStats> {
        let outcome = loop {
            match self.run_iteration() {
                Ok(Flow::Continue) => on_iteration(&self.stats),
                Ok(Flow::Terminated) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        let Photobooth { session, stats, .. } = self;
        session.shutdown();
        debug!("Camera session closed");

        match outcome {
            Ok(()) => {
                info!("Stopped. {}", stats);
                Ok(stats)
            }
            Err(e) => {
                error!("Stopping after fatal error: {}", e);
                Err(e)
            }
        }
    }

    /// Run a single iteration of the loop
    pub fn run_iteration(&mut self) -> Result<Flow> {
        if self.flags.terminate_requested() {
            return Ok(Flow::Terminated);
        }
        self.stats.iterations += 1;

        if self.flags.take_capture() {
            self.capture_on_demand();
        }
        if self.flags.take_reload() {
            self.reload_settings();
        }
        if self.flags.terminate_requested() {
            return Ok(Flow::Terminated);
        }

        self.controller
            .capture_preview(&mut self.session)
            .map_err(BoothError::Preview)?;
        self.stats.previews += 1;

        if self.flags.terminate_requested() {
            return Ok(Flow::Terminated);
        }

        let report = self.drain.drain(&mut self.session, &mut self.sequence);
        self.stats.hardware_events += report.events as u64;
        self.stats.downloads += report.downloaded.len() as u64;
        self.stats.download_failures += report.failed as u64;
        self.stats.bytes_saved += report.bytes;
        if report.ended_by == DrainEnd::PollFailed {
            self.stats.poll_failures += 1;
        }

        Ok(Flow::Continue)
    }

    fn capture_on_demand(&mut self) {
        match self
            .controller
            .capture_to_file(&mut self.session, &mut self.sequence)
        {
            Ok(saved) => {
                self.stats.captures += 1;
                self.stats.bytes_saved += saved.bytes;
            }
            Err(e) => {
                error!("On-demand capture failed: {}", e);
                self.stats.capture_failures += 1;
            }
        }
    }

    fn reload_settings(&mut self) {
        info!("Reloading camera settings from {}", self.settings_file.display());
        match settings::reload_settings(&mut self.session, &self.settings_file) {
            Ok(applied) => {
                info!("Applied {} camera settings", applied);
                self.stats.reloads += 1;
            }
            Err(e) => {
                error!("Settings reload failed: {}", e);
                self.stats.reload_failures += 1;
            }
        }
    }
}
