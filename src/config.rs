//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tokio::time::Duration;

use crate::error::{LinkError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Link protocol configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    #[serde(default = "default_handshake_interval_ms")]
    pub handshake_interval_ms: u64,

    #[serde(default = "default_store_lock_timeout_ms")]
    pub store_lock_timeout_ms: u64,

    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

/// Display consumer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 460800 }
fn default_read_timeout_ms() -> u64 { 20 }

fn default_buffer_capacity() -> usize { 256 }
fn default_handshake_interval_ms() -> u64 { 2500 }
fn default_store_lock_timeout_ms() -> u64 { 10 }
fn default_status_interval_ms() -> u64 { 5000 }

fn default_refresh_interval_ms() -> u64 { 1000 }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            handshake_interval_ms: default_handshake_interval_ms(),
            store_lock_timeout_ms: default_store_lock_timeout_ms(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { refresh_interval_ms: default_refresh_interval_ms() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

impl SerialConfig {
    /// Bound on a single transport read
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl LinkConfig {
    /// Period of the unsolicited handshake response
    pub fn handshake_interval(&self) -> Duration {
        Duration::from_millis(self.handshake_interval_ms)
    }

    /// Bound on telemetry store lock acquisition
    pub fn store_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.store_lock_timeout_ms)
    }

    /// Period of the link status report
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

fn invalid(msg: &str) -> LinkError {
    LinkError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dawn_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![115200, 230400, 460800, 921600].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 115200, 230400, 460800, 921600"));
        }

        if self.serial.read_timeout_ms == 0 || self.serial.read_timeout_ms > 1000 {
            return Err(invalid("read_timeout_ms must be between 1 and 1000"));
        }

        // Must hold at least one Machine Status frame
        if self.link.buffer_capacity < 16 || self.link.buffer_capacity > 4096 {
            return Err(invalid("buffer_capacity must be between 16 and 4096"));
        }

        if self.link.handshake_interval_ms < 100 || self.link.handshake_interval_ms > 60000 {
            return Err(invalid("handshake_interval_ms must be between 100 and 60000"));
        }

        if self.link.store_lock_timeout_ms == 0 || self.link.store_lock_timeout_ms > 1000 {
            return Err(invalid("store_lock_timeout_ms must be between 1 and 1000"));
        }

        if self.link.status_interval_ms == 0 || self.link.status_interval_ms > 60000 {
            return Err(invalid("status_interval_ms must be between 1 and 60000"));
        }

        if self.display.refresh_interval_ms == 0 || self.display.refresh_interval_ms > 60000 {
            return Err(invalid("refresh_interval_ms must be between 1 and 60000"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        if matches!(&self.logging.log_dir, Some(dir) if dir.is_empty()) {
            return Err(invalid("log_dir cannot be empty when set"));
        }

        Ok(())
    }
}
