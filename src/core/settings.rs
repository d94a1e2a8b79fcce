//! Camera settings reload
//!
//! The settings file is plain text, one `name=value` pair per line. Blank
//! lines and lines starting with `#` are ignored; whitespace around names and
//! values is trimmed. Every setting is applied on its own, so one rejected
//! value does not stop the rest.

use crate::core::error::ReloadError;
use crate::device::traits::DeviceSession;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// A single `name=value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSetting {
    pub name: String,
    pub value: String,
}

/// Parse the settings file format
pub fn parse_settings(path: &Path, text: &str) -> Result<Vec<CameraSetting>, ReloadError> {
    let mut settings = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = line
            .split_once('=')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty());

        match parsed {
            Some((name, value)) => settings.push(CameraSetting {
                name: name.to_string(),
                value: value.to_string(),
            }),
            None => {
                return Err(ReloadError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    text: raw.to_string(),
                })
            }
        }
    }

    Ok(settings)
}

/// Read the settings file and apply every entry to the camera
///
/// Returns how many settings were applied.
pub fn reload_settings<S: DeviceSession + ?Sized>(
    session: &mut S,
    path: &Path,
) -> Result<usize, ReloadError> {
    let text = fs::read_to_string(path).map_err(|source| ReloadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_settings(path, &text)?;

    let mut failed = 0;
    for setting in &settings {
        match session.set_setting(&setting.name, &setting.value) {
            Ok(()) => info!("Camera setting {} = {}", setting.name, setting.value),
            Err(e) => {
                warn!(
                    "Camera rejected {} = {}: {}",
                    setting.name, setting.value, e
                );
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(ReloadError::Rejected {
            failed,
            total: settings.len(),
        });
    }
    Ok(settings.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::{MockCamera, MockCameraConfig};
    use tempfile::TempDir;

    #[test]
    fn test_parse_settings() {
        let text = "# booth settings\n\niso = 400\nshutterspeed=1/125\n  whitebalance =  Daylight  \n";
        let settings = parse_settings(Path::new("config.txt"), text).unwrap();

        assert_eq!(
            settings,
            vec![
                CameraSetting {
                    name: "iso".to_string(),
                    value: "400".to_string()
                },
                CameraSetting {
                    name: "shutterspeed".to_string(),
                    value: "1/125".to_string()
                },
                CameraSetting {
                    name: "whitebalance".to_string(),
                    value: "Daylight".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let settings = parse_settings(Path::new("config.txt"), "artist=A=B\n").unwrap();
        assert_eq!(settings[0].value, "A=B");
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        let err = parse_settings(Path::new("config.txt"), "iso=100\nnonsense\n").unwrap_err();
        match err {
            ReloadError::Parse { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "nonsense");
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(parse_settings(Path::new("config.txt"), "=400\n").is_err());
    }

    #[test]
    fn test_reload_applies_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.txt");
        fs::write(&path, "iso=800\nimageformat=RAW\n").unwrap();
        let mut camera = MockCamera::new();

        let applied = reload_settings(&mut camera, &path).unwrap();

        assert_eq!(applied, 2);
        assert_eq!(
            camera.applied_settings(),
            vec![
                ("iso".to_string(), "800".to_string()),
                ("imageformat".to_string(), "RAW".to_string()),
            ]
        );
    }

    #[test]
    fn test_reload_continues_past_rejected_setting() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.txt");
        fs::write(&path, "focusmode=Manual\niso=100\n").unwrap();
        let mut camera = MockCamera::with_config(MockCameraConfig {
            reject_settings: vec!["focusmode".to_string()],
            ..Default::default()
        });

        let err = reload_settings(&mut camera, &path).unwrap_err();

        assert!(matches!(err, ReloadError::Rejected { failed: 1, total: 2 }));
        assert_eq!(
            camera.applied_settings(),
            vec![("iso".to_string(), "100".to_string())]
        );
    }

    #[test]
    fn test_reload_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut camera = MockCamera::new();

        let err = reload_settings(&mut camera, &temp_dir.path().join("config.txt")).unwrap_err();

        assert!(matches!(err, ReloadError::Read { .. }));
        assert!(camera.applied_settings().is_empty());
    }
}
