//! # Frame Synchronizer
//!
//! Hunts the byte stream for a frame header: two or more SYNC bytes followed
//! by a length byte no greater than [`MAX_PAYLOAD_LEN`].

use tokio::io::AsyncRead;
use tracing::debug;

use super::protocol::{MAX_PAYLOAD_LEN, SYNC};
use super::source::ByteSource;
use crate::error::Result;

/// A located frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Declared payload length
    pub length: u8,

    /// Bytes discarded before the header, including the SYNC and length bytes
    /// of oversize headers
    pub skipped: u64,

    /// Headers dropped for declaring a length above the maximum
    pub oversize: u64,
}

/// Consume bytes until a valid frame header is found
///
/// Never gives up on noise: only a byte source failure ends the search.
/// Bytes are never un-read, so after a false or oversize header scanning
/// resumes wherever the stream currently sits.
///
/// # Errors
///
/// Propagates byte source failures unchanged.
pub async fn find_header<R: AsyncRead + Unpin>(source: &mut ByteSource<R>) -> Result<Header> {
    let mut skipped = 0u64;
    let mut oversize = 0u64;

    loop {
        if source.read_byte().await? != SYNC {
            skipped += 1;
            continue;
        }

        if source.read_byte().await? != SYNC {
            skipped += 2;
            continue;
        }

        // Any number of extra SYNC bytes may pad the header
        let mut sync_run = 2u64;
        let mut length = source.read_byte().await?;
        while length == SYNC {
            sync_run += 1;
            length = source.read_byte().await?;
        }

        if length > MAX_PAYLOAD_LEN {
            oversize += 1;
            skipped += sync_run + 1;
            debug!("Discarding frame with oversize length {}", length);
            continue;
        }

        return Ok(Header {
            length,
            skipped,
            oversize,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrainbandError;

    async fn header_of(bytes: &[u8]) -> Result<Header> {
        let mut source = ByteSource::new(bytes);
        find_header(&mut source).await
    }

    #[tokio::test]
    async fn test_minimal_header() {
        let header = header_of(&[0xAA, 0xAA, 0x02]).await.unwrap();
        assert_eq!(header.length, 2);
        assert_eq!(header.skipped, 0);
        assert_eq!(header.oversize, 0);
    }

    #[tokio::test]
    async fn test_sync_padding() {
        let header = header_of(&[0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x04]).await.unwrap();
        assert_eq!(header.length, 4);
        assert_eq!(header.skipped, 0);
    }

    #[tokio::test]
    async fn test_noise_prefix() {
        let header = header_of(&[0x00, 0x13, 0xFF, 0x55, 0xAA, 0xAA, 0x20]).await.unwrap();
        assert_eq!(header.length, 0x20);
        assert_eq!(header.skipped, 4);
    }

    #[tokio::test]
    async fn test_false_sync() {
        // Lone SYNC followed by a non-SYNC byte is noise
        let header = header_of(&[0xAA, 0x10, 0xAA, 0xAA, 0x05]).await.unwrap();
        assert_eq!(header.length, 5);
        assert_eq!(header.skipped, 2);
    }

    #[tokio::test]
    async fn test_zero_length() {
        let header = header_of(&[0xAA, 0xAA, 0x00]).await.unwrap();
        assert_eq!(header.length, 0);
    }

    #[tokio::test]
    async fn test_max_length_accepted() {
        let header = header_of(&[0xAA, 0xAA, 169]).await.unwrap();
        assert_eq!(header.length, 169);
    }

    #[tokio::test]
    async fn test_oversize_length_restarts() {
        let header = header_of(&[0xAA, 0xAA, 170, 0xAA, 0xAA, 0x02]).await.unwrap();
        assert_eq!(header.length, 2);
        assert_eq!(header.oversize, 1);
        assert_eq!(header.skipped, 3);
    }

    #[tokio::test]
    async fn test_oversize_header_counts_sync_padding() {
        let header = header_of(&[0x00, 0xAA, 0xAA, 0xAA, 0xAA, 200, 0xAA, 0xAA, 0x01])
            .await
            .unwrap();
        assert_eq!(header.length, 1);
        assert_eq!(header.oversize, 1);
        assert_eq!(header.skipped, 6);
    }

    #[tokio::test]
    async fn test_pure_noise_ends_only_with_source() {
        let err = header_of(&[0x01, 0xAA, 0x02, 0x03]).await.unwrap_err();
        assert!(matches!(err, BrainbandError::SourceClosed));
    }
}
