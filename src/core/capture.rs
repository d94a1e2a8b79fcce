//! Capture controller
//!
//! Full-resolution captures land on the device and are pulled down through
//! the file sink under a numbered name (`image-000.jpg`, `image-001.jpg`, ...).
//! Preview frames come back as bytes and replace the single preview file.
//!
//! Numbering is shared by on-demand captures and files the camera announces on
//! its own. A number is spent as soon as it is allocated: if the capture or
//! the download then fails, that number is skipped, never reused.

use crate::core::config::OutputConfig;
use crate::core::error::CaptureError;
use crate::core::sink;
use crate::device::traits::{CaptureMode, DeviceSession, RemoteFileRef};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Allocates unique local names for full-resolution images
#[derive(Debug, Clone)]
pub struct CaptureSequence {
    next: u64,
    directory: PathBuf,
    prefix: String,
    extension: String,
    keep_device_extension: bool,
}

impl CaptureSequence {
    /// Start a sequence at 0 writing into `directory`
    pub fn new(directory: &Path, prefix: &str, extension: &str) -> Self {
        Self {
            next: 0,
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            extension: extension.trim_start_matches('.').to_string(),
            keep_device_extension: false,
        }
    }

    /// Build a sequence from the output configuration
    pub fn from_config(output: &OutputConfig) -> Self {
        let mut sequence = Self::new(
            &output.directory,
            &output.image_prefix,
            &output.image_extension,
        );
        sequence.keep_device_extension = output.keep_device_extension;
        sequence
    }

    /// Use the device's extension when naming files that carry one
    pub fn keep_device_extension(mut self, keep: bool) -> Self {
        self.keep_device_extension = keep;
        self
    }

    /// Reserve the next number
    pub fn allocate(&mut self) -> u64 {
        let number = self.next;
        self.next += 1;
        number
    }

    /// Numbers handed out so far (also the next number to be allocated)
    pub fn allocated(&self) -> u64 {
        self.next
    }

    /// Local path for an allocated number
    pub fn path_for(&self, number: u64, remote: Option<&RemoteFileRef>) -> PathBuf {
        let extension = match remote.and_then(RemoteFileRef::extension) {
            Some(ext) if self.keep_device_extension => ext,
            _ => self.extension.clone(),
        };
        self.directory
            .join(format!("{}-{:03}.{}", self.prefix, number, extension))
    }

    /// Allocate a number and return its path
    pub fn next_path(&mut self, remote: Option<&RemoteFileRef>) -> PathBuf {
        let number = self.allocate();
        self.path_for(number, remote)
    }
}

/// A full-resolution image saved locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    /// Where the image was written
    pub path: PathBuf,
    /// Size in bytes
    pub bytes: u64,
}

/// Issues captures against a session and turns them into local files
#[derive(Debug, Clone)]
pub struct CaptureController {
    preview_path: PathBuf,
}

impl CaptureController {
    /// Create a controller writing previews to `preview_path`
    pub fn new(preview_path: &Path) -> Self {
        Self {
            preview_path: preview_path.to_path_buf(),
        }
    }

    /// Path of the live preview file
    pub fn preview_path(&self) -> &Path {
        &self.preview_path
    }

    /// Take a full-resolution image; the file stays on the device
    pub fn capture_full<S: DeviceSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<RemoteFileRef, CaptureError> {
        let remote = session
            .capture(CaptureMode::Image)
            .map_err(CaptureError::Device)?;
        debug!("Camera stored capture as {}", remote);
        Ok(remote)
    }

    /// Take a preview frame and replace the preview file with it
    ///
    /// The previous preview stays intact if anything fails.
    pub fn capture_preview<S: DeviceSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> Result<PathBuf, CaptureError> {
        let frame = session.capture_preview().map_err(CaptureError::Device)?;
        if frame.is_empty() {
            return Err(CaptureError::EmptyPreview);
        }

        sink::save_replacing(&self.preview_path, &frame).map_err(|source| CaptureError::Save {
            path: self.preview_path.clone(),
            source,
        })?;

        Ok(self.preview_path.clone())
    }

    /// Capture a full image and download it under the next sequence name
    pub fn capture_to_file<S: DeviceSession + ?Sized>(
        &self,
        session: &mut S,
        sequence: &mut CaptureSequence,
    ) -> Result<SavedImage, CaptureError> {
        let number = sequence.allocate();
        let remote = self.capture_full(session)?;
        let path = sequence.path_for(number, Some(&remote));

        let bytes = sink::transfer(session, remote, &path).map_err(CaptureError::Transfer)?;
        info!("Captured {}", path.display());

        Ok(SavedImage { path, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{DeviceError, TransferError};
    use crate::testdb::{MockCamera, MockCameraConfig, MOCK_CAPTURE_FOLDER};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sequence_names() {
        let mut sequence = CaptureSequence::new(Path::new("/out"), "image", "jpg");

        assert_eq!(sequence.next_path(None), PathBuf::from("/out/image-000.jpg"));
        assert_eq!(sequence.next_path(None), PathBuf::from("/out/image-001.jpg"));
        assert_eq!(sequence.allocated(), 2);
    }

    #[test]
    fn test_sequence_widens_past_999() {
        let mut sequence = CaptureSequence::new(Path::new("out"), "image", ".jpg");
        sequence.next = 999;

        assert_eq!(sequence.next_path(None), PathBuf::from("out/image-999.jpg"));
        assert_eq!(sequence.next_path(None), PathBuf::from("out/image-1000.jpg"));
    }

    #[test]
    fn test_sequence_device_extension() {
        let raw = RemoteFileRef::new("/store", "IMG_0001.CR2");
        let bare = RemoteFileRef::new("/store", "IMG_0002");

        let sequence = CaptureSequence::new(Path::new("out"), "image", "jpg");
        assert_eq!(
            sequence.path_for(0, Some(&raw)),
            PathBuf::from("out/image-000.jpg")
        );

        let sequence = sequence.keep_device_extension(true);
        assert_eq!(
            sequence.path_for(0, Some(&raw)),
            PathBuf::from("out/image-000.cr2")
        );
        assert_eq!(
            sequence.path_for(1, Some(&bare)),
            PathBuf::from("out/image-001.jpg")
        );
    }

    #[test]
    fn test_sequence_from_config() {
        let output = OutputConfig {
            directory: PathBuf::from("shots"),
            image_prefix: "booth".to_string(),
            image_extension: "jpeg".to_string(),
            ..Default::default()
        };
        let mut sequence = CaptureSequence::from_config(&output);
        assert_eq!(
            sequence.next_path(None),
            PathBuf::from("shots/booth-000.jpeg")
        );
    }

    #[test]
    fn test_capture_full_returns_device_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut camera = MockCamera::new();
        let controller = CaptureController::new(&temp_dir.path().join("preview.jpg"));

        let remote = controller.capture_full(&mut camera).unwrap();

        assert_eq!(remote.folder, MOCK_CAPTURE_FOLDER);
        assert!(camera.has_file(&remote));
    }

    #[test]
    fn test_capture_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut camera = MockCamera::new();
        let controller = CaptureController::new(&temp_dir.path().join("preview.jpg"));
        let mut sequence = CaptureSequence::new(temp_dir.path(), "image", "jpg");

        let saved = controller
            .capture_to_file(&mut camera, &mut sequence)
            .unwrap();

        assert_eq!(saved.path, temp_dir.path().join("image-000.jpg"));
        assert_eq!(saved.bytes, 2048);
        assert!(saved.path.exists());
        assert_eq!(camera.deleted().len(), 1);
    }

    #[test]
    fn test_failed_capture_spends_number() {
        let temp_dir = TempDir::new().unwrap();
        let mut camera = MockCamera::with_config(MockCameraConfig {
            fail_capture: true,
            ..Default::default()
        });
        let controller = CaptureController::new(&temp_dir.path().join("preview.jpg"));
        let mut sequence = CaptureSequence::new(temp_dir.path(), "image", "jpg");

        let err = controller
            .capture_to_file(&mut camera, &mut sequence)
            .unwrap_err();

        assert!(matches!(err, CaptureError::Device(DeviceError::Protocol { .. })));
        assert_eq!(sequence.allocated(), 1);
        assert!(!temp_dir.path().join("image-000.jpg").exists());
    }

    #[test]
    fn test_failed_download_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut camera = MockCamera::with_config(MockCameraConfig {
            break_stream: vec![("CAPT0001.JPG".to_string(), 10)],
            ..Default::default()
        });
        let controller = CaptureController::new(&temp_dir.path().join("preview.jpg"));
        let mut sequence = CaptureSequence::new(temp_dir.path(), "image", "jpg");

        let err = controller
            .capture_to_file(&mut camera, &mut sequence)
            .unwrap_err();

        assert!(matches!(
            err,
            CaptureError::Transfer(TransferError::Stream { .. })
        ));
        assert!(!temp_dir.path().join("image-000.jpg").exists());
        assert!(camera.deleted().is_empty());
    }

    #[test]
    fn test_preview_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let preview = temp_dir.path().join("preview.jpg");
        let mut camera = MockCamera::new();
        let controller = CaptureController::new(&preview);

        controller.capture_preview(&mut camera).unwrap();
        let first = fs::read(&preview).unwrap();
        let written = controller.capture_preview(&mut camera).unwrap();
        let second = fs::read(&preview).unwrap();

        assert_eq!(written, preview);
        assert_eq!(second.len(), 512);
        assert_ne!(first, second);
    }

    #[test]
    fn test_failed_preview_keeps_previous_frame() {
        let temp_dir = TempDir::new().unwrap();
        let preview = temp_dir.path().join("preview.jpg");
        let mut camera = MockCamera::new();
        let controller = CaptureController::new(&preview);

        controller.capture_preview(&mut camera).unwrap();
        let good = fs::read(&preview).unwrap();

        camera.set_config(MockCameraConfig {
            fail_preview: true,
            ..Default::default()
        });
        assert!(controller.capture_preview(&mut camera).is_err());
        assert_eq!(fs::read(&preview).unwrap(), good);

        camera.set_config(MockCameraConfig {
            empty_preview: true,
            ..Default::default()
        });
        assert!(matches!(
            controller.capture_preview(&mut camera),
            Err(CaptureError::EmptyPreview)
        ));
        assert_eq!(fs::read(&preview).unwrap(), good);
    }

    #[test]
    fn test_preview_into_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let preview = temp_dir.path().join("gone").join("preview.jpg");
        let mut camera = MockCamera::new();
        let controller = CaptureController::new(&preview);

        let err = controller.capture_preview(&mut camera).unwrap_err();
        assert!(matches!(err, CaptureError::Save { .. }));
    }
}
