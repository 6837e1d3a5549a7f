//! # Error Types
//!
//! Custom error types for Brainband using `thiserror`.
//!
//! Protocol anomalies (lost sync, oversize lengths, checksum mismatches,
//! truncated payloads) are not errors: the decoder counts them and keeps
//! scanning. Only transport failures end a decode loop.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Brainband
#[derive(Debug, Error)]
pub enum BrainbandError {
    /// The byte source reached end of stream (device gone, pipe closed)
    #[error("Byte source closed")]
    SourceClosed,

    /// No byte arrived within the configured read timeout
    #[error("Byte source read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// Shutdown was requested while waiting on the byte source
    #[error("Decoder cancelled")]
    Cancelled,

    /// Encoder was handed a payload longer than a frame can carry
    #[error("Payload of {0} bytes exceeds the 169 byte frame limit")]
    PayloadTooLarge(usize),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No headset serial port found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration values outside their valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),
}

impl BrainbandError {
    /// Whether this error means the byte source itself is gone.
    ///
    /// Transport errors end the decode loop; the application may reopen
    /// the port and resume.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BrainbandError::SourceClosed
                | BrainbandError::ReadTimeout(_)
                | BrainbandError::Io(_)
                | BrainbandError::Serial(_)
        )
    }
}

/// Result type alias for Brainband
pub type Result<T> = std::result::Result<T, BrainbandError>;
