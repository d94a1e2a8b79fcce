//! Command handlers
//!
//! Each subcommand maps to one function here. `run` (the default) opens the
//! simulated camera and hands it to the capture loop until a termination
//! signal arrives.

use crate::cli::args::{Args, Commands};
use crate::cli::progress::{print_banner, print_success, StatusLine};
use crate::core::booth::{LoopStats, Photobooth};
use crate::core::config::{get_config_path, Config};
use crate::core::error::BoothError;
use crate::core::summary::{SessionOutcome, SessionSummary};
use crate::core::triggers::TriggerFlags;
use crate::device::{DeviceConnector, DeviceSession, SimulatedConnector};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::path::PathBuf;

/// Dispatch the parsed command
pub fn run_command(args: &Args, config: &Config, flags: TriggerFlags) -> Result<()> {
    match &args.command {
        None | Some(Commands::Run) => {
            if !args.quiet {
                print_banner(std::process::id(), &config.output.directory);
            }
            let connector = SimulatedConnector::new(config.simulator.clone());
            run_booth(&connector, config, flags, args.quiet)?;
        }
        Some(Commands::ShowConfig) => {
            show_config(config)?;
        }
        Some(Commands::GenerateConfig { output }) => {
            generate_config_file(output.clone())?;
        }
    }

    Ok(())
}

/// Open a session and run the capture loop until it stops
///
/// Writes the session summary if one is configured, whichever way the loop
/// ended.
pub fn run_booth<C: DeviceConnector>(
    connector: &C,
    config: &Config,
    flags: TriggerFlags,
    quiet: bool,
) -> Result<LoopStats> {
    let session = connector.open().map_err(BoothError::from)?;
    let camera = session.info().to_string();
    let started_at = Utc::now();

    let booth = Photobooth::new(session, flags, config)?;

    let mut status = if quiet || !config.output.show_status {
        StatusLine::hidden()
    } else {
        StatusLine::new()
    };
    let mut last_stats = LoopStats::default();
    let result = booth.run_with(|stats| {
        status.update(stats);
        last_stats = stats.clone();
    });
    status.finish();

    if let Some(path) = &config.output.session_summary {
        let (outcome, error, stats) = match &result {
            Ok(stats) => (SessionOutcome::Terminated, None, stats.clone()),
            Err(e) => (SessionOutcome::Failed, Some(e.to_string()), last_stats),
        };
        let summary = SessionSummary {
            camera,
            started_at,
            ended_at: Utc::now(),
            outcome,
            error,
            stats,
        };
        match summary.save(path) {
            Ok(()) => info!("Session summary written to {}", path.display()),
            Err(e) => warn!("Failed to write session summary: {}", e),
        }
    }

    let stats = result?;
    if !quiet {
        print_success(&format!("Session ended. {}", stats));
    }
    Ok(stats)
}

/// Write the commented default config
///
/// Without an explicit path the standard location is used, and an existing
/// file there is left alone.
pub fn generate_config_file(output: Option<PathBuf>) -> Result<PathBuf> {
    let output_path = match output {
        Some(path) => path,
        None => {
            let path = get_config_path().context("Could not determine config directory")?;
            if path.exists() {
                info!("Configuration file already exists: {}", path.display());
                return Ok(path);
            }
            path
        }
    };

    Config::write_default_config(&output_path)?;

    info!("Configuration file: {}", output_path.display());
    info!("Edit this file to customize the photobooth.");
    Ok(output_path)
}

/// Show the current configuration settings
pub fn show_config(config: &Config) -> Result<()> {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("Preview: {}", config.output.preview_path().display());
    info!(
        "Event poll: {:?}, drain budget: {:?}",
        config.events.poll_timeout(),
        config.events.max_drain()
    );

    println!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::{fake_jpeg, MockCamera, MockCameraConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::default();
        config.output.directory = dir.to_path_buf();
        config.output.session_summary = Some(dir.join("session.json"));
        config.camera.settings_file = dir.join("config.txt");
        config
    }

    fn stop_after(camera: &MockCamera, flags: &TriggerFlags, previews: u32) {
        let writer = flags.clone();
        let mut seen = 0;
        camera.on_preview(move || {
            seen += 1;
            if seen >= previews {
                writer.request_terminate();
            }
        });
    }

    #[test]
    fn test_run_booth_until_terminated() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let camera = MockCamera::new();
        let flags = TriggerFlags::new();
        camera.announce_file("/store", "IMG1.JPG", fake_jpeg(1, 256));
        flags.request_capture();
        stop_after(&camera, &flags, 3);

        let stats = run_booth(&camera, &config, flags, true).unwrap();

        assert_eq!(stats.captures, 1);
        assert_eq!(stats.downloads, 1);
        assert_eq!(camera.shutdowns(), 1);
        assert!(temp_dir.path().join("preview.jpg").exists());

        let text = fs::read_to_string(temp_dir.path().join("session.json")).unwrap();
        let summary: SessionSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(summary.outcome, SessionOutcome::Terminated);
        assert_eq!(summary.stats, stats);
        assert_eq!(summary.camera, "Mock Cameras Ltd. Mock 1 (mock:0)");
    }

    #[test]
    fn test_run_booth_preview_failure() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let camera = MockCamera::with_config(MockCameraConfig {
            fail_preview: true,
            ..Default::default()
        });

        let err = run_booth(&camera, &config, TriggerFlags::new(), true).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BoothError>(),
            Some(BoothError::Preview(_))
        ));
        let text = fs::read_to_string(temp_dir.path().join("session.json")).unwrap();
        let summary: SessionSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(summary.outcome, SessionOutcome::Failed);
        assert!(summary.error.is_some());
    }

    #[test]
    fn test_run_booth_no_camera() {
        let temp_dir = TempDir::new().unwrap();
        let camera = MockCamera::with_config(MockCameraConfig {
            fail_open: true,
            ..Default::default()
        });

        let err = run_booth(&camera, &config_for(temp_dir.path()), TriggerFlags::new(), true)
            .unwrap_err();

        assert!(err.to_string().contains("No camera detected"));
        assert!(!temp_dir.path().join("session.json").exists());
    }

    #[test]
    fn test_generate_config_file_at_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("booth").join("photobooth.toml");

        let written = generate_config_file(Some(path.clone())).unwrap();

        assert_eq!(written, path);
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.output.preview_filename, "preview.jpg");
    }
}
