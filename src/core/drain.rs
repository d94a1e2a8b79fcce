//! Hardware event drain
//!
//! One drain pass empties the camera's event queue: it polls with a short
//! timeout and dispatches every event until the camera reports `Timeout`.
//! Files the camera announces (`FileAdded`) are downloaded here and nowhere
//! else, whether or not this process asked for them.
//!
//! A pass also ends when a poll fails, or when it has been running longer
//! than its time budget, so a camera that never goes quiet cannot keep the
//! loop from serving capture requests and previews.

use crate::core::capture::CaptureSequence;
use crate::core::error::PollError;
use crate::core::sink;
use crate::device::traits::{DeviceSession, HardwareEvent, RemoteFileRef};
use log::{debug, error, info, trace, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Why a drain pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// The camera had nothing more to report
    Timeout,
    /// The poll itself failed
    PollFailed,
    /// The pass ran out of time
    Budget,
}

/// What happened during one drain pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Events dispatched, not counting the final timeout
    pub events: usize,
    /// Files downloaded
    pub downloaded: Vec<PathBuf>,
    /// Bytes downloaded
    pub bytes: u64,
    /// Announced files that could not be downloaded
    pub failed: usize,
    /// Why the pass ended
    pub ended_by: DrainEnd,
}

impl DrainReport {
    fn new() -> Self {
        Self {
            events: 0,
            downloaded: Vec::new(),
            bytes: 0,
            failed: 0,
            ended_by: DrainEnd::Timeout,
        }
    }
}

/// Polls a session's event queue and routes announced files to disk
#[derive(Debug, Clone)]
pub struct EventDrain {
    poll_timeout: Duration,
    budget: Duration,
}

impl EventDrain {
    /// Create a drain polling with `poll_timeout`, giving up after `budget`
    pub fn new(poll_timeout: Duration, budget: Duration) -> Self {
        Self {
            poll_timeout,
            budget,
        }
    }

    /// Run one pass over the event queue
    pub fn drain<S: DeviceSession + ?Sized>(
        &self,
        session: &mut S,
        sequence: &mut CaptureSequence,
    ) -> DrainReport {
        let started = Instant::now();
        let mut report = DrainReport::new();

        loop {
            if started.elapsed() >= self.budget {
                debug!(
                    "Event drain stopped after {:?} with the queue still busy ({} events)",
                    self.budget, report.events
                );
                report.ended_by = DrainEnd::Budget;
                break;
            }

            let event = match session.poll_event(self.poll_timeout).map_err(PollError) {
                Ok(event) => event,
                Err(e) => {
                    warn!("{}", e);
                    report.ended_by = DrainEnd::PollFailed;
                    break;
                }
            };

            trace!("Camera event: {}", event.kind());
            if event.is_timeout() {
                report.ended_by = DrainEnd::Timeout;
                break;
            }

            report.events += 1;
            self.dispatch(session, sequence, event, &mut report);
        }

        report
    }

    fn dispatch<S: DeviceSession + ?Sized>(
        &self,
        session: &mut S,
        sequence: &mut CaptureSequence,
        event: HardwareEvent,
        report: &mut DrainReport,
    ) {
        match event {
            HardwareEvent::FileAdded(remote) => {
                info!("File added on the camera: {}", remote);
                self.download(session, sequence, remote, report);
            }
            HardwareEvent::FolderAdded(path) => {
                info!("Folder added on the camera: {}", path);
            }
            HardwareEvent::CaptureComplete => {
                info!("Capture complete");
            }
            HardwareEvent::Unknown(Some(message)) => {
                debug!("Unknown camera event: {}", message);
            }
            HardwareEvent::Unknown(None) => {
                debug!("Unknown camera event");
            }
            HardwareEvent::Other(code) => {
                warn!("Unrecognized camera event type {}", code);
            }
            // Handled by the caller
            HardwareEvent::Timeout => {}
        }
    }

    fn download<S: DeviceSession + ?Sized>(
        &self,
        session: &mut S,
        sequence: &mut CaptureSequence,
        remote: RemoteFileRef,
        report: &mut DrainReport,
    ) {
        let number = sequence.allocate();
        let path = sequence.path_for(number, Some(&remote));
        let described = remote.to_string();

        match sink::transfer(session, remote, &path) {
            Ok(bytes) => {
                report.bytes += bytes;
                report.downloaded.push(path);
            }
            Err(e) => {
                error!(
                    "Failed to download {} as {}: {}",
                    described,
                    path.display(),
                    e
                );
                report.failed += 1;
            }
        }
    }
}
