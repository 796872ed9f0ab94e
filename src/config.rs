//! Configuration file handling for the SuperPico tools.
//!
//! Loads configuration from `~/.config/superpico/config.toml` or a custom path.
//! Command-line flags override values from the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::frame::{CaptureSettings, DEFAULT_CHUNK_SIZE, DEFAULT_OUTPUT};
use crate::monitor::MonitorSettings;
use crate::ports::NamePatterns;
use crate::transport::DEFAULT_BAUD_RATE;

/// Read timeout for the capture connection.
pub const CAPTURE_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Read timeout for the monitor connection.
pub const MONITOR_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration file structure.
/// Loaded from ~/.config/superpico/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub output: PathBuf,
    pub port_patterns: Vec<String>,
    pub settle_ms: u64,
    pub header_timeout_secs: u64,
    pub payload_timeout_secs: u64,
    /// Open the saved image in the system viewer
    pub show: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            output: PathBuf::from(DEFAULT_OUTPUT),
            port_patterns: vec!["usbmodem".to_string()],
            settle_ms: 500,
            header_timeout_secs: 15,
            payload_timeout_secs: 10,
            show: true,
        }
    }
}

impl CaptureConfig {
    pub fn matcher(&self) -> NamePatterns {
        NamePatterns::new(&self.port_patterns)
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            settle: Duration::from_millis(self.settle_ms),
            header_timeout: Duration::from_secs(self.header_timeout_secs),
            payload_timeout: Duration::from_secs(self.payload_timeout_secs),
            chunk_size: DEFAULT_CHUNK_SIZE,
            ..CaptureSettings::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub port_patterns: Vec<String>,
    /// Keep DTR/RTS low so connecting does not reset the board
    pub suppress_reset: bool,
    pub reconnect_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            port_patterns: vec!["usbmodem".to_string(), "acm".to_string()],
            suppress_reset: true,
            reconnect_delay_ms: 1000,
        }
    }
}

impl MonitorConfig {
    pub fn matcher(&self) -> NamePatterns {
        NamePatterns::new(&self.port_patterns)
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            ..MonitorSettings::default()
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("superpico").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/superpico/config.toml")
        })
}
