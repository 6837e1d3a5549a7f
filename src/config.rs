//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BrainbandError, Result};

/// Baud rates the headset firmware can be configured for
const VALID_BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200];

/// Accepted `[logging] level` values
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path; empty means auto-detect
    #[serde(default)]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Per-byte read timeout, 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Frame decoder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DecoderConfig {
    /// Publish a snapshot after this many accepted frames
    #[serde(default = "default_publish_every_frames")]
    pub publish_every_frames: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Application log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file, written through a non-blocking appender
    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_baud_rate() -> u32 { 57600 }
fn default_timeout_ms() -> u64 { 5000 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_publish_every_frames() -> u32 { 1 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 1000 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl SerialConfig {
    /// Read timeout as a `Duration`, or `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            publish_every_frames: default_publish_every_frames(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
            format: default_log_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
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
    /// use brainband::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any value is out of its valid range
    pub fn validate(&self) -> Result<()> {
        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                VALID_BAUD_RATES
            )));
        }

        if self.serial.timeout_ms > 60000 {
            return Err(invalid("timeout_ms must be between 0 and 60000"));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.decoder.publish_every_frames == 0 {
            return Err(invalid("publish_every_frames must be greater than 0"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level must be one of: {}",
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> BrainbandError {
    BrainbandError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.serial.port.is_empty());
        assert_eq!(config.serial.read_timeout(), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/rfcomm0"
timeout_ms = 0

[decoder]
publish_every_frames = 100

[telemetry]
enabled = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/rfcomm0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.serial.read_timeout(), None);
        assert_eq!(config.decoder.publish_every_frames, 100);
        assert!(config.telemetry.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.serial.reconnect_interval_ms, 1000);
        assert_eq!(config.telemetry.format, "jsonl");
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml("[serial\nport = ");
        assert!(matches!(result, Err(BrainbandError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load("/nonexistent/brainband.toml");
        assert!(matches!(result, Err(BrainbandError::Io(_))));
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in VALID_BAUD_RATES {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_timeout_ms_too_high() {
        let mut config = Config::default();
        config.serial.timeout_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_interval_zero() {
        let mut config = Config::default();
        config.serial.reconnect_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_publish_every_zero() {
        let mut config = Config::default();
        config.decoder.publish_every_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = Config::default();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_interval_bounds() {
        let mut config = Config::default();
        config.telemetry.log_interval_ms = 0;
        assert!(config.validate().is_err());
        config.telemetry.log_interval_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_records_and_files_zero() {
        let mut config = Config::default();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.telemetry.format = "csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_baud_rate(), 57600);
        assert_eq!(default_timeout_ms(), 5000);
        assert_eq!(default_reconnect_interval_ms(), 1000);
        assert_eq!(default_publish_every_frames(), 1);
        assert!(!default_telemetry_enabled());
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_max_records_per_file(), 10000);
        assert_eq!(default_max_files_to_keep(), 10);
        assert_eq!(default_log_interval_ms(), 1000);
        assert_eq!(default_log_format(), "jsonl");
        assert_eq!(default_log_level(), "info");
    }
}
