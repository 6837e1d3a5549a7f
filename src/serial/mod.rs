//! # Serial Communication Module
//!
//! Opens the headset's serial link (Bluetooth RFCOMM or USB dongle).
//!
//! This module handles:
//! - Opening the serial port at the ThinkGear baud rate (57600 8N1 by default)
//! - Auto-detecting the device from common paths
//! - Handing the async stream to the frame decoder

use crate::config::SerialConfig;
use crate::error::{BrainbandError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Default ThinkGear baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Default headset device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/rfcomm0",           // Bluetooth serial binding on Linux
    "/dev/ttyUSB0",           // USB dongle
    "/dev/cu.BrainBand-DevB", // Bluetooth serial on macOS
];

/// Headset serial port handle
pub struct HeadsetSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/rfcomm0)
    device_path: String,
}

impl std::fmt::Debug for HeadsetSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadsetSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl HeadsetSerial {
    /// Open the port named in `config`, or auto-detect when it is empty
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &SerialConfig) -> Result<Self> {
        if config.port.is_empty() {
            Self::open_with_paths(DEFAULT_DEVICE_PATHS, config.baud_rate)
        } else {
            Self::open_with_paths(&[config.port.as_str()], config.baud_rate)
        }
    }

    /// Open the first headset found at the default device paths
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use brainband::serial::{HeadsetSerial, DEFAULT_BAUD_RATE};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = HeadsetSerial::open(DEFAULT_BAUD_RATE)?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(baud_rate: u32) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open the first of `paths` that succeeds
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened headset at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(BrainbandError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BrainbandError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Path of the opened device
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Async byte stream for the frame decoder
    pub fn into_stream(self) -> tokio_serial::SerialStream {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_BAUD_RATE, 57_600);
        assert_eq!(DEFAULT_DEVICE_PATHS[0], "/dev/rfcomm0");
        assert_eq!(DEFAULT_DEVICE_PATHS.len(), 3);
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let err = HeadsetSerial::open_with_paths(invalid_paths, DEFAULT_BAUD_RATE).unwrap_err();

        match err {
            BrainbandError::SerialPortNotFound(msg) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            _ => panic!("Expected SerialPortNotFound error, got: {:?}", err),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        match HeadsetSerial::open_with_paths(empty_paths, DEFAULT_BAUD_RATE).unwrap_err() {
            BrainbandError::SerialPortNotFound(_) => {}
            other => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let err =
            HeadsetSerial::open_port("/dev/nonexistent_serial_device_12345", DEFAULT_BAUD_RATE)
                .unwrap_err();

        match err {
            BrainbandError::Serial(msg) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            _ => panic!("Expected Serial error, got: {:?}", err),
        }
    }

    #[test]
    fn test_from_config_uses_configured_port() {
        let config = SerialConfig {
            port: "/dev/nonexistent_headset".to_string(),
            ..SerialConfig::default()
        };
        match HeadsetSerial::from_config(&config).unwrap_err() {
            BrainbandError::SerialPortNotFound(msg) => {
                assert_eq!(msg, "/dev/nonexistent_headset");
            }
            other => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    // Requires a paired headset
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_decode_from_real_hardware() {
        use crate::thinkgear::FrameDecoder;

        let serial = HeadsetSerial::open(DEFAULT_BAUD_RATE).expect("No headset found");
        println!("Reading from {}", serial.device_path());

        let mut decoder = FrameDecoder::new(serial.into_stream());
        for _ in 0..10 {
            decoder.next_frame().await.expect("Headset link failed");
        }
        println!("{}", decoder.snapshot());
    }
}
