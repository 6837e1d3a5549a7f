//! # Frame Reader
//!
//! Reads a frame body once its header is known and checks its integrity.

use tokio::io::AsyncRead;

use super::checksum::Checksum;
use super::protocol::RawFrame;
use super::source::ByteSource;
use crate::error::Result;

/// Integrity verdict for one frame body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameCheck {
    /// Checksum matched, payload may be decoded
    Accepted(RawFrame),

    /// Checksum did not match; the payload has been dropped
    ChecksumMismatch { expected: u8, received: u8 },
}

/// Read `length` payload bytes plus the checksum byte
///
/// # Errors
///
/// Byte source failures abort the frame and propagate; nothing read so far
/// reaches the payload decoder.
pub async fn read_frame<R: AsyncRead + Unpin>(
    source: &mut ByteSource<R>,
    length: u8,
) -> Result<FrameCheck> {
    let mut payload = Vec::with_capacity(length as usize);
    let mut checksum = Checksum::new();

    for _ in 0..length {
        let byte = source.read_byte().await?;
        checksum.update(byte);
        payload.push(byte);
    }

    let expected = checksum.finish();
    let received = source.read_byte().await?;

    if expected != received {
        return Ok(FrameCheck::ChecksumMismatch { expected, received });
    }

    Ok(FrameCheck::Accepted(RawFrame {
        payload,
        checksum: received,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrainbandError;

    #[tokio::test]
    async fn test_valid_frame() {
        let mut source = ByteSource::new(&[0x04u8, 0x64, 0x97][..]);
        let check = read_frame(&mut source, 2).await.unwrap();
        assert_eq!(
            check,
            FrameCheck::Accepted(RawFrame {
                payload: vec![0x04, 0x64],
                checksum: 0x97,
            })
        );
    }

    #[tokio::test]
    async fn test_checksum_mismatch() {
        let mut source = ByteSource::new(&[0x04u8, 0x64, 0x96][..]);
        let check = read_frame(&mut source, 2).await.unwrap();
        assert_eq!(
            check,
            FrameCheck::ChecksumMismatch {
                expected: 0x97,
                received: 0x96,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let mut source = ByteSource::new(&[0xFFu8][..]);
        match read_frame(&mut source, 0).await.unwrap() {
            FrameCheck::Accepted(frame) => {
                assert!(frame.payload.is_empty());
                assert_eq!(frame.length(), 0);
            }
            other => panic!("Expected accepted frame, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_source_exhausted_mid_payload() {
        let mut source = ByteSource::new(&[0x04u8][..]);
        let err = read_frame(&mut source, 2).await.unwrap_err();
        assert!(matches!(err, BrainbandError::SourceClosed));
    }

    #[tokio::test]
    async fn test_source_exhausted_before_checksum() {
        let mut source = ByteSource::new(&[0x04u8, 0x64][..]);
        let err = read_frame(&mut source, 2).await.unwrap_err();
        assert!(matches!(err, BrainbandError::SourceClosed));
    }
}
