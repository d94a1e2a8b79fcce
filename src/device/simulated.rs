//! Simulated camera backend
//!
//! Stands in for a tethered camera when none is attached. Frames are real
//! JPEGs rendered with the `image` crate, so whatever displays `preview.jpg`
//! works unchanged. Full captures land in an in-memory store until they are
//! downloaded and deleted.
//!
//! Every time the event queue runs dry the simulator may "press the shutter
//! button" (see `hardware_trigger_chance`): it stores a new image and queues a
//! `FileAdded` for the next drain pass. Captures requested through
//! [`DeviceSession::capture`] never produce a `FileAdded`.

use crate::core::config::SimulatorConfig;
use crate::core::error::{DeviceError, InitError};
use crate::device::traits::{
    CaptureMode, DeviceConnector, DeviceInfo, DeviceSession, HardwareEvent, RemoteFileRef,
};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::time::Duration;

/// Folder simulated captures are stored in
pub const SIMULATED_CAPTURE_FOLDER: &str = "/store_00010001/DCIM/100SIMUL";

/// Settings the simulated camera accepts, with their initial values
const KNOWN_SETTINGS: &[(&str, &str)] = &[
    ("aperture", "5.6"),
    ("imageformat", "Large Fine JPEG"),
    ("iso", "Auto"),
    ("shutterspeed", "1/60"),
    ("whitebalance", "Auto"),
];

/// Opens [`SimulatedCamera`] sessions
#[derive(Debug, Clone, Default)]
pub struct SimulatedConnector {
    config: SimulatorConfig,
    seed: Option<u64>,
}

impl SimulatedConnector {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config, seed: None }
    }

    /// Make hardware triggers reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl DeviceConnector for SimulatedConnector {
    type Session = SimulatedCamera;

    fn open(&self) -> Result<Self::Session, InitError> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let camera = SimulatedCamera::new(self.config.clone(), rng);
        info!("Opened simulated camera: {}", camera.info);
        Ok(camera)
    }
}

/// An in-process camera session
pub struct SimulatedCamera {
    info: DeviceInfo,
    config: SimulatorConfig,
    rng: StdRng,
    store: HashMap<RemoteFileRef, Vec<u8>>,
    events: VecDeque<HardwareEvent>,
    settings: BTreeMap<String, String>,
    shots: u32,
    frames: u64,
}

impl SimulatedCamera {
    fn new(config: SimulatorConfig, rng: StdRng) -> Self {
        let settings = KNOWN_SETTINGS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self {
            info: DeviceInfo::new("Simulated", "Photobooth Camera", "sim:0"),
            config,
            rng,
            store: HashMap::new(),
            events: VecDeque::new(),
            settings,
            shots: 0,
            frames: 0,
        }
    }

    /// Current value of a camera setting
    pub fn setting(&self, name: &str) -> Option<&str> {
        self.settings.get(name).map(String::as_str)
    }

    /// Files currently stored on the simulated card
    pub fn stored_files(&self) -> usize {
        self.store.len()
    }

    fn store_shot(&mut self) -> Result<RemoteFileRef, DeviceError> {
        self.shots += 1;
        let (width, height) = (self.config.width, self.config.height);
        let data = render_frame(u64::from(self.shots), width, height, self.config.jpeg_quality)?;
        let file = RemoteFileRef::new(
            SIMULATED_CAPTURE_FOLDER,
            &format!("IMG_{:04}.JPG", self.shots),
        );
        self.store.insert(file.clone(), data);
        Ok(file)
    }

    /// Roll for a shutter press once the queue has gone quiet
    fn maybe_press_shutter(&mut self) -> Result<(), DeviceError> {
        let chance = u32::from(self.config.hardware_trigger_chance.min(100));
        if chance == 0 || self.rng.gen_range(0..100) >= chance {
            return Ok(());
        }

        let file = self.store_shot()?;
        debug!("Simulated shutter button pressed: {}", file);
        self.events.push_back(HardwareEvent::FileAdded(file));
        self.events.push_back(HardwareEvent::CaptureComplete);
        Ok(())
    }
}

impl DeviceSession for SimulatedCamera {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capture(&mut self, mode: CaptureMode) -> Result<RemoteFileRef, DeviceError> {
        if mode != CaptureMode::Image {
            return Err(DeviceError::Unsupported(format!("{:?} capture", mode)));
        }
        let file = self.store_shot()?;
        self.events.push_back(HardwareEvent::CaptureComplete);
        Ok(file)
    }

    fn capture_preview(&mut self) -> Result<Vec<u8>, DeviceError> {
        if let Some(limit) = self.config.fail_preview_after {
            if self.frames >= limit {
                return Err(DeviceError::Disconnected);
            }
        }
        self.frames += 1;
        render_frame(
            self.frames,
            self.config.preview_width,
            self.config.preview_height,
            self.config.jpeg_quality,
        )
    }

    fn download<'a>(
        &'a mut self,
        file: &RemoteFileRef,
    ) -> Result<Box<dyn Read + 'a>, DeviceError> {
        let data = self
            .store
            .get(file)
            .ok_or_else(|| DeviceError::NotFound(file.to_string()))?;
        Ok(Box::new(Cursor::new(data.as_slice())))
    }

    fn delete(&mut self, file: &RemoteFileRef) -> Result<(), DeviceError> {
        self.store
            .remove(file)
            .map(|_| ())
            .ok_or_else(|| DeviceError::NotFound(file.to_string()))
    }

    fn poll_event(&mut self, timeout: Duration) -> Result<HardwareEvent, DeviceError> {
        if let Some(event) = self.events.pop_front() {
            return Ok(event);
        }

        std::thread::sleep(timeout);
        self.maybe_press_shutter()?;
        Ok(HardwareEvent::Timeout)
    }

    fn set_setting(&mut self, name: &str, value: &str) -> Result<(), DeviceError> {
        match self.settings.get_mut(name) {
            Some(current) => {
                *current = value.to_string();
                Ok(())
            }
            None => Err(DeviceError::NotFound(format!("setting '{}'", name))),
        }
    }

    fn shutdown(self) {
        info!(
            "Simulated camera closed ({} frames, {} shots, {} files left on card)",
            self.frames,
            self.shots,
            self.store.len()
        );
    }
}

/// Render a test-card frame and encode it as JPEG
fn render_frame(seed: u64, width: u32, height: u32, quality: u8) -> Result<Vec<u8>, DeviceError> {
    let (width, height) = (width.max(1), height.max(1));
    let shift = (seed.wrapping_mul(7) % 256) as u32;
    let bar = (seed.wrapping_mul(13) % u64::from(width)) as u32;

    let image = RgbImage::from_fn(width, height, |x, y| {
        if x.abs_diff(bar) < 4 {
            return Rgb([255, 255, 255]);
        }
        let r = ((x * 255 / width) + shift) % 256;
        let g = ((y * 255 / height) + shift / 2) % 256;
        let b = (255 - shift) % 256;
        Rgb([r as u8, g as u8, b as u8])
    });

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(&image)
        .map_err(|e| DeviceError::Protocol {
            code: -1,
            message: format!("Failed to encode frame: {}", e),
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulatorConfig {
        SimulatorConfig {
            width: 64,
            height: 48,
            preview_width: 32,
            preview_height: 24,
            ..Default::default()
        }
    }

    fn open(config: SimulatorConfig) -> SimulatedCamera {
        SimulatedConnector::new(config).with_seed(7).open().unwrap()
    }

    fn is_jpeg(data: &[u8]) -> bool {
        data.len() > 4 && data[..2] == [0xFF, 0xD8] && data[data.len() - 2..] == [0xFF, 0xD9]
    }

    #[test]
    fn test_preview_is_jpeg() {
        let mut camera = open(small_config());

        let first = camera.capture_preview().unwrap();
        let second = camera.capture_preview().unwrap();

        assert!(is_jpeg(&first));
        assert_ne!(first, second);
    }

    #[test]
    fn test_capture_download_delete() {
        let mut camera = open(small_config());

        let file = camera.capture(CaptureMode::Image).unwrap();
        assert_eq!(file.folder, SIMULATED_CAPTURE_FOLDER);
        assert_eq!(file.name, "IMG_0001.JPG");

        let mut data = Vec::new();
        camera.download(&file).unwrap().read_to_end(&mut data).unwrap();
        assert!(is_jpeg(&data));

        camera.delete(&file).unwrap();
        assert_eq!(camera.stored_files(), 0);
        assert!(matches!(camera.delete(&file), Err(DeviceError::NotFound(_))));
    }

    #[test]
    fn test_on_demand_capture_has_no_file_added() {
        let mut camera = open(small_config());
        camera.capture(CaptureMode::Image).unwrap();

        let timeout = Duration::from_millis(1);
        assert_eq!(
            camera.poll_event(timeout).unwrap(),
            HardwareEvent::CaptureComplete
        );
        assert_eq!(camera.poll_event(timeout).unwrap(), HardwareEvent::Timeout);
    }

    #[test]
    fn test_movie_capture_unsupported() {
        let mut camera = open(small_config());
        assert!(matches!(
            camera.capture(CaptureMode::Movie),
            Err(DeviceError::Unsupported(_))
        ));
    }

    #[test]
    fn test_shutter_button_announces_file() {
        let mut camera = open(SimulatorConfig {
            hardware_trigger_chance: 100,
            ..small_config()
        });
        let timeout = Duration::from_millis(1);

        assert_eq!(camera.poll_event(timeout).unwrap(), HardwareEvent::Timeout);
        match camera.poll_event(timeout).unwrap() {
            HardwareEvent::FileAdded(file) => {
                assert_eq!(file.name, "IMG_0001.JPG");
                assert_eq!(camera.stored_files(), 1);
            }
            other => panic!("expected FileAdded, got {:?}", other),
        }
        assert_eq!(
            camera.poll_event(timeout).unwrap(),
            HardwareEvent::CaptureComplete
        );
    }

    #[test]
    fn test_quiet_camera_never_triggers() {
        let mut camera = open(small_config());
        for _ in 0..20 {
            assert_eq!(
                camera.poll_event(Duration::from_millis(1)).unwrap(),
                HardwareEvent::Timeout
            );
        }
        assert_eq!(camera.stored_files(), 0);
    }

    #[test]
    fn test_preview_failure_after_limit() {
        let mut camera = open(SimulatorConfig {
            fail_preview_after: Some(2),
            ..small_config()
        });

        assert!(camera.capture_preview().is_ok());
        assert!(camera.capture_preview().is_ok());
        assert!(matches!(
            camera.capture_preview(),
            Err(DeviceError::Disconnected)
        ));
    }

    #[test]
    fn test_settings() {
        let mut camera = open(small_config());

        camera.set_setting("iso", "400").unwrap();
        assert_eq!(camera.setting("iso"), Some("400"));
        assert!(matches!(
            camera.set_setting("flux", "high"),
            Err(DeviceError::NotFound(_))
        ));
    }
}
