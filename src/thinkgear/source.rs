//! # Byte Source
//!
//! One-byte-at-a-time reads over any async reader (serial port, file, socket,
//! in-memory buffer). The decoder never seeks or pushes bytes back.

use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use crate::error::{BrainbandError, Result};

/// Buffered, ordered byte stream feeding the frame decoder
pub struct ByteSource<R> {
    reader: BufReader<R>,
    read_timeout: Option<Duration>,
    bytes_read: u64,
}

impl<R> std::fmt::Debug for ByteSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("read_timeout", &self.read_timeout)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> ByteSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            read_timeout: None,
            bytes_read: 0,
        }
    }

    /// Fail reads that wait longer than `timeout` for a byte
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Read the next byte of the stream
    ///
    /// # Errors
    ///
    /// - `SourceClosed` at end of stream
    /// - `ReadTimeout` if no byte arrived within the read timeout
    /// - `Io` for any other read failure
    pub async fn read_byte(&mut self) -> Result<u8> {
        let read = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.reader.read_u8())
                .await
                .map_err(|_| BrainbandError::ReadTimeout(limit))?,
            None => self.reader.read_u8().await,
        };

        let byte = read.map_err(map_read_error)?;
        self.bytes_read += 1;
        Ok(byte)
    }

    /// Total bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

fn map_read_error(err: io::Error) -> BrainbandError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => BrainbandError::SourceClosed,
        _ => BrainbandError::Io(err),
    }
}
