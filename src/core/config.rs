//! Configuration module for the photobooth
//!
//! Supports loading configuration from a TOML file.
//! Configuration is looked up in this order:
//! - `./photobooth.toml` (current directory)
//! - the standard location, `<config dir>/photobooth/config.toml`
//!   (e.g. `~/.config/photobooth/config.toml` on Linux)
//!
//! Anything missing from the file falls back to its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory
const APP_NAME: &str = "photobooth";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file name looked up in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "photobooth.toml";

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub output: OutputConfig,

    /// Hardware event handling
    pub events: EventsConfig,

    /// Camera settings reload
    pub camera: CameraConfig,

    /// Simulated camera backend
    pub simulator: SimulatorConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Where and how artifacts are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the preview and the captured images
    pub directory: PathBuf,

    /// File name of the live preview, overwritten every loop
    pub preview_filename: String,

    /// Prefix of numbered capture files (`image` gives `image-000.jpg`)
    pub image_prefix: String,

    /// Extension of numbered capture files
    pub image_extension: String,

    /// Keep the device's own extension for downloaded files (e.g. `.cr2`)
    pub keep_device_extension: bool,

    /// Write a JSON summary of the session here on shutdown
    pub session_summary: Option<PathBuf>,

    /// Show a live status line while running
    pub show_status: bool,
}

/// Hardware event polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// How long a single event poll may wait, in milliseconds
    pub poll_timeout_ms: u64,

    /// Upper bound on one drain pass, in milliseconds
    pub max_drain_ms: u64,
}

/// Camera settings applied on reload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// File of `name=value` lines applied to the camera on reload
    pub settings_file: PathBuf,
}

/// Simulated camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Full capture width in pixels
    pub width: u32,

    /// Full capture height in pixels
    pub height: u32,

    /// Preview frame width in pixels
    pub preview_width: u32,

    /// Preview frame height in pixels
    pub preview_height: u32,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Chance (percent) per drain pass that the shutter button is pressed
    pub hardware_trigger_chance: u8,

    /// Make the preview fail after this many frames (for testing shutdown paths)
    pub fail_preview_after: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            preview_filename: "preview.jpg".to_string(),
            image_prefix: "image".to_string(),
            image_extension: "jpg".to_string(),
            keep_device_extension: false,
            session_summary: None,
            show_status: true,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 1,
            max_drain_ms: 2000,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from("config.txt"),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            preview_width: 320,
            preview_height: 213,
            jpeg_quality: 85,
            hardware_trigger_chance: 0,
            fail_preview_after: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./photobooth.log"),
        }
    }
}

/// Longest poll timeout accepted; polls must stay sub-second
const MAX_POLL_TIMEOUT_MS: u64 = 999;

impl EventsConfig {
    /// Poll timeout, clamped to 1..=999 ms
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms.clamp(1, MAX_POLL_TIMEOUT_MS))
    }

    /// Drain budget; never shorter than one poll
    pub fn max_drain(&self) -> Duration {
        Duration::from_millis(self.max_drain_ms).max(self.poll_timeout())
    }
}

impl OutputConfig {
    /// Full path of the live preview file
    pub fn preview_path(&self) -> PathBuf {
        self.directory.join(&self.preview_filename)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Get the path where the config file is (or would be) located.
    pub fn get_active_config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }

        get_config_path().unwrap_or(local)
    }

    /// Reject values the capture loop cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.preview_filename.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "output.preview_filename".to_string(),
                "must not be empty".to_string(),
            ));
        }
        if self.output.image_prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue(
                "output.image_prefix".to_string(),
                "must not contain path separators".to_string(),
            ));
        }
        if self.events.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue(
                "events.poll_timeout_ms".to_string(),
                format!("must be below 1000 (got {})", self.events.poll_timeout_ms),
            ));
        }
        if self.simulator.hardware_trigger_chance > 100 {
            return Err(ConfigError::InvalidValue(
                "simulator.hardware_trigger_chance".to_string(),
                "is a percentage (0-100)".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }

    /// Write the commented default config to `path`, creating parent folders
    pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteError(parent.to_path_buf(), e.to_string()))?;
            }
        }
        fs::write(path, Self::generate_default_config())
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// A value is out of range
    InvalidValue(String, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::InvalidValue(key, reason) => {
                write!(f, "Invalid configuration value '{}': {}", key, reason)
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
