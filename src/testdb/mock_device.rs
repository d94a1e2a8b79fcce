//! Scripted mock camera for testing without a real device
//!
//! `MockCamera` implements [`DeviceSession`] on top of an in-memory file store
//! and a scripted event queue. Clones share state, so a test can hand one
//! clone to the capture loop (which consumes it) and keep another to inspect
//! what happened: which files were deleted, which settings were applied,
//! whether the session was shut down.

use crate::core::error::{DeviceError, InitError};
use crate::device::traits::{
    CaptureMode, DeviceConnector, DeviceInfo, DeviceSession, HardwareEvent, RemoteFileRef,
};
use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Folder the mock camera stores its own captures in
pub const MOCK_CAPTURE_FOLDER: &str = "/store_00010001/DCIM/100MOCK";

/// What the next poll returns
#[derive(Debug, Clone)]
enum ScriptedPoll {
    Event(HardwareEvent),
    Fail,
}

/// Failure injection for the mock camera
#[derive(Debug, Clone, Default)]
pub struct MockCameraConfig {
    /// Full captures fail
    pub fail_capture: bool,
    /// Preview captures fail
    pub fail_preview: bool,
    /// Preview captures return no bytes
    pub empty_preview: bool,
    /// Downloads of these file names are refused
    pub refuse_download: Vec<String>,
    /// Downloads of these file names break after this many bytes
    pub break_stream: Vec<(String, usize)>,
    /// Deletes fail
    pub fail_delete: bool,
    /// Settings with these names are rejected
    pub reject_settings: Vec<String>,
    /// Opening the session fails
    pub fail_open: bool,
}

#[derive(Default)]
struct MockState {
    config: MockCameraConfig,
    files: HashMap<RemoteFileRef, Vec<u8>>,
    script: VecDeque<ScriptedPoll>,
    endless: Option<HardwareEvent>,
    captures_taken: u32,
    previews_taken: u64,
    deleted: Vec<RemoteFileRef>,
    settings: Vec<(String, String)>,
    polls: usize,
    shutdowns: usize,
    preview_hook: Option<Box<dyn FnMut() + Send>>,
}

/// Scripted camera session; clones share the same device state
#[derive(Clone)]
pub struct MockCamera {
    info: DeviceInfo,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    /// Create a mock camera with an empty store and no scripted events
    pub fn new() -> Self {
        Self {
            info: DeviceInfo::new("Mock Cameras Ltd.", "Mock 1", "mock:0"),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create with specific failure injection
    pub fn with_config(config: MockCameraConfig) -> Self {
        let camera = Self::new();
        camera.lock().config = config;
        camera
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock still holds consistent state
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the failure injection
    pub fn set_config(&self, config: MockCameraConfig) {
        self.lock().config = config;
    }

    /// Put a file on the device without announcing it
    pub fn add_file(&self, folder: &str, name: &str, content: Vec<u8>) -> RemoteFileRef {
        let file = RemoteFileRef::new(folder, name);
        self.lock().files.insert(file.clone(), content);
        file
    }

    /// Put a file on the device and queue the matching `FileAdded` event
    pub fn announce_file(&self, folder: &str, name: &str, content: Vec<u8>) -> RemoteFileRef {
        let file = self.add_file(folder, name, content);
        self.push_event(HardwareEvent::FileAdded(file.clone()));
        file
    }

    /// Queue an event for a later poll
    pub fn push_event(&self, event: HardwareEvent) {
        self.lock().script.push_back(ScriptedPoll::Event(event));
    }

    /// Queue a poll failure
    pub fn push_poll_failure(&self) {
        self.lock().script.push_back(ScriptedPoll::Fail);
    }

    /// Once the script runs dry, return this event forever instead of `Timeout`
    pub fn set_endless(&self, event: HardwareEvent) {
        self.lock().endless = Some(event);
    }

    /// Run `hook` every time a preview frame is taken
    pub fn on_preview<F: FnMut() + Send + 'static>(&self, hook: F) {
        self.lock().preview_hook = Some(Box::new(hook));
    }

    /// Whether a file is still stored on the device
    pub fn has_file(&self, file: &RemoteFileRef) -> bool {
        self.lock().files.contains_key(file)
    }

    /// Files deleted so far, in order
    pub fn deleted(&self) -> Vec<RemoteFileRef> {
        self.lock().deleted.clone()
    }

    /// Settings applied so far, in order
    pub fn applied_settings(&self) -> Vec<(String, String)> {
        self.lock().settings.clone()
    }

    /// Number of full captures taken
    pub fn captures_taken(&self) -> u32 {
        self.lock().captures_taken
    }

    /// Number of preview frames taken
    pub fn previews_taken(&self) -> u64 {
        self.lock().previews_taken
    }

    /// Number of polls served
    pub fn polls(&self) -> usize {
        self.lock().polls
    }

    /// Number of times the session was shut down
    pub fn shutdowns(&self) -> usize {
        self.lock().shutdowns
    }

    /// Events still waiting in the script
    pub fn pending_events(&self) -> usize {
        self.lock().script.len()
    }
}

impl DeviceSession for MockCamera {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capture(&mut self, mode: CaptureMode) -> Result<RemoteFileRef, DeviceError> {
        let mut state = self.lock();
        if state.config.fail_capture {
            return Err(DeviceError::Protocol {
                code: -110,
                message: "Simulated capture failure".to_string(),
            });
        }
        if mode != CaptureMode::Image {
            return Err(DeviceError::Unsupported(format!("{:?} capture", mode)));
        }

        state.captures_taken += 1;
        let name = format!("CAPT{:04}.JPG", state.captures_taken);
        let file = RemoteFileRef::new(MOCK_CAPTURE_FOLDER, &name);
        let content = fake_jpeg(u64::from(state.captures_taken), 2048);
        state.files.insert(file.clone(), content);
        Ok(file)
    }

    fn capture_preview(&mut self) -> Result<Vec<u8>, DeviceError> {
        // Run the hook without holding the lock so it may touch the camera
        let hook = self.lock().preview_hook.take();
        if let Some(mut hook) = hook {
            hook();
            self.lock().preview_hook = Some(hook);
        }

        let mut state = self.lock();
        if state.config.fail_preview {
            return Err(DeviceError::Disconnected);
        }
        state.previews_taken += 1;
        if state.config.empty_preview {
            return Ok(Vec::new());
        }
        Ok(fake_jpeg(state.previews_taken, 512))
    }

    fn download<'a>(
        &'a mut self,
        file: &RemoteFileRef,
    ) -> Result<Box<dyn Read + 'a>, DeviceError> {
        let state = self.lock();
        if state.config.refuse_download.contains(&file.name) {
            return Err(DeviceError::Protocol {
                code: -1,
                message: "Simulated download refusal".to_string(),
            });
        }
        let content = state
            .files
            .get(file)
            .cloned()
            .ok_or_else(|| DeviceError::NotFound(file.to_string()))?;

        let break_after = state
            .config
            .break_stream
            .iter()
            .find(|(name, _)| *name == file.name)
            .map(|(_, after)| *after);

        Ok(match break_after {
            Some(after) => Box::new(BreakingReader::new(content, after)),
            None => Box::new(Cursor::new(content)),
        })
    }

    fn delete(&mut self, file: &RemoteFileRef) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.config.fail_delete {
            return Err(DeviceError::Busy);
        }
        state
            .files
            .remove(file)
            .ok_or_else(|| DeviceError::NotFound(file.to_string()))?;
        state.deleted.push(file.clone());
        Ok(())
    }

    fn poll_event(&mut self, _timeout: Duration) -> Result<HardwareEvent, DeviceError> {
        let mut state = self.lock();
        state.polls += 1;
        match state.script.pop_front() {
            Some(ScriptedPoll::Event(event)) => Ok(event),
            Some(ScriptedPoll::Fail) => Err(DeviceError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "Simulated poll failure",
            ))),
            None => Ok(state.endless.clone().unwrap_or(HardwareEvent::Timeout)),
        }
    }

    fn set_setting(&mut self, name: &str, value: &str) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.config.reject_settings.iter().any(|n| n == name) {
            return Err(DeviceError::NotFound(name.to_string()));
        }
        state.settings.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn shutdown(self) {
        self.lock().shutdowns += 1;
    }
}

impl DeviceConnector for MockCamera {
    type Session = MockCamera;

    fn open(&self) -> Result<Self::Session, InitError> {
        if self.lock().config.fail_open {
            return Err(InitError::NoDevice);
        }
        Ok(self.clone())
    }
}

/// A reader that fails after handing out `fail_after` bytes
pub struct BreakingReader {
    cursor: Cursor<Vec<u8>>,
    fail_after: usize,
}

impl BreakingReader {
    pub fn new(content: Vec<u8>, fail_after: usize) -> Self {
        Self {
            cursor: Cursor::new(content),
            fail_after,
        }
    }
}

impl Read for BreakingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let position = self.cursor.position() as usize;
        if position >= self.fail_after {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "Simulated USB disconnect",
            ));
        }
        let room = (self.fail_after - position).min(buf.len());
        self.cursor.read(&mut buf[..room])
    }
}

/// Generate JPEG-shaped bytes with deterministic content based on seed
pub fn fake_jpeg(seed: u64, size: usize) -> Vec<u8> {
    let size = size.max(4);
    let mut data = Vec::with_capacity(size);

    // SOI + APP0 (JFIF)
    data.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
    data.extend_from_slice(b"JFIF\0");

    let mut current = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    while data.len() < size.saturating_sub(2) {
        current = current.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((current >> 33) as u8);
    }

    // EOI
    data.truncate(size - 2);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stores_file() {
        let mut camera = MockCamera::new();
        let file = camera.capture(CaptureMode::Image).unwrap();

        assert_eq!(file.folder, MOCK_CAPTURE_FOLDER);
        assert_eq!(file.name, "CAPT0001.JPG");
        assert!(camera.has_file(&file));
        assert_eq!(camera.captures_taken(), 1);
    }

    #[test]
    fn test_script_then_timeout() {
        let mut camera = MockCamera::new();
        camera.push_event(HardwareEvent::CaptureComplete);
        camera.push_poll_failure();

        let timeout = Duration::from_millis(1);
        assert_eq!(
            camera.poll_event(timeout).unwrap(),
            HardwareEvent::CaptureComplete
        );
        assert!(camera.poll_event(timeout).is_err());
        assert_eq!(camera.poll_event(timeout).unwrap(), HardwareEvent::Timeout);
        assert_eq!(camera.polls(), 3);
    }

    #[test]
    fn test_clones_share_state() {
        let camera = MockCamera::new();
        let mut session = camera.open().unwrap();
        let file = session.capture(CaptureMode::Image).unwrap();
        session.delete(&file).unwrap();
        session.shutdown();

        assert_eq!(camera.deleted(), vec![file]);
        assert_eq!(camera.shutdowns(), 1);
    }

    #[test]
    fn test_breaking_reader() {
        let mut reader = BreakingReader::new(vec![7u8; 100], 10);
        let mut buf = [0u8; 64];

        assert_eq!(reader.read(&mut buf).unwrap(), 10);
        assert!(reader.read(&mut buf).is_err());
    }

    #[test]
    fn test_fake_jpeg_markers() {
        let data = fake_jpeg(42, 256);
        assert_eq!(data.len(), 256);
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
        assert_eq!(&data[254..], &[0xFF, 0xD9]);
        assert_eq!(fake_jpeg(42, 256), data);
        assert_ne!(fake_jpeg(43, 256), data);
    }

    #[test]
    fn test_open_failure() {
        let camera = MockCamera::with_config(MockCameraConfig {
            fail_open: true,
            ..Default::default()
        });
        assert!(matches!(camera.open(), Err(InitError::NoDevice)));
    }
}
