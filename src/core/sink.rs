//! File sink: device file → local artifact
//!
//! [`transfer`] copies a device-resident file into a local path and then
//! reclaims the device-side copy. The local file is owned by a
//! [`PendingArtifact`] guard until the copy is complete and synced; if the
//! guard is dropped before that (any `?`, any early return) the handle is
//! closed and the partial file removed. The device file is only deleted once
//! the local copy has been committed.

use crate::core::error::TransferError;
use crate::device::traits::{DeviceSession, RemoteFileRef};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Copy buffer size for device streams
const COPY_BUFFER_SIZE: usize = 256 * 1024;

/// A local file being written; removed on drop unless committed
#[derive(Debug)]
pub struct PendingArtifact {
    path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl PendingArtifact {
    /// Create (or truncate) `path` for writing
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            committed: false,
        })
    }

    /// Path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write bytes to the artifact
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(data),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "artifact already closed",
            )),
        }
    }

    /// Flush, sync and close the file, keeping it on disk
    pub fn commit(mut self) -> io::Result<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
        }
        self.committed = true;
        Ok(std::mem::take(&mut self.path))
    }
}

impl Drop for PendingArtifact {
    fn drop(&mut self) {
        // Close before unlinking
        self.file.take();
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed partial file: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove partial file '{}': {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Transfer a device file into `local_path`, then delete it from the device
///
/// Returns the number of bytes written. On error nothing is left at
/// `local_path` and the device file is untouched. A failed device-side delete
/// after a successful copy is only logged.
pub fn transfer<S: DeviceSession + ?Sized>(
    session: &mut S,
    remote: RemoteFileRef,
    local_path: &Path,
) -> Result<u64, TransferError> {
    let mut artifact =
        PendingArtifact::create(local_path).map_err(|source| TransferError::Create {
            path: local_path.to_path_buf(),
            source,
        })?;

    let bytes = {
        let mut stream = session
            .download(&remote)
            .map_err(|source| TransferError::Download {
                remote: remote.to_string(),
                source,
            })?;
        copy_stream(&mut stream, &mut artifact, &remote)?
    };

    artifact.commit().map_err(|source| TransferError::Write {
        path: local_path.to_path_buf(),
        source,
    })?;

    info!(
        "Saved {} -> {} ({} bytes)",
        remote,
        local_path.display(),
        bytes
    );

    if let Err(e) = session.delete(&remote) {
        warn!("Failed to delete {} from the camera: {}", remote, e);
    }

    Ok(bytes)
}

/// Copy the device stream into the artifact, keeping read and write failures apart
fn copy_stream<R: Read + ?Sized>(
    stream: &mut R,
    artifact: &mut PendingArtifact,
    remote: &RemoteFileRef,
) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = match stream.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(TransferError::Stream {
                    remote: remote.to_string(),
                    source,
                })
            }
        };

        artifact
            .write_all(&buffer[..read])
            .map_err(|source| TransferError::Write {
                path: artifact.path().to_path_buf(),
                source,
            })?;
        total += read as u64;
    }

    Ok(total)
}

/// Replace `path` with `data` so readers only ever see a complete file
///
/// The bytes go to a hidden sibling first and are renamed over `path` once
/// synced; on failure the previous content of `path` is left alone.
pub fn save_replacing(path: &Path, data: &[u8]) -> io::Result<()> {
    let staging = staging_path(path);
    let mut artifact = PendingArtifact::create(&staging)?;
    artifact.write_all(data)?;

    // Keep the guard armed across the rename
    if let Some(mut file) = artifact.file.take() {
        file.flush()?;
        file.sync_all()?;
    }
    fs::rename(&staging, path)?;

    artifact.committed = true;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.part", name))
}
