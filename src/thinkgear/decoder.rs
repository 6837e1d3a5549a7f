//! # Frame Decoder
//!
//! Drives the full pipeline for each frame: synchronize, read and verify,
//! decode the payload into the parser state.
//!
//! The decoder is the only writer of its [`ParserState`]. Other tasks see the
//! state through [`Snapshot`] values published on a `tokio::sync::watch`
//! channel, so a reader never observes a half-applied frame.

use chrono::Utc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tracing::{debug, info};

use super::payload::decode_payload;
use super::reader::{read_frame, FrameCheck};
use super::source::ByteSource;
use super::state::{ParserState, Snapshot};
use super::sync::find_header;
use crate::error::{BrainbandError, Result};
use crate::shutdown::wait_for_shutdown;

/// Counters for everything the decoder dropped or applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames_accepted: u64,
    pub checksum_failures: u64,
    pub oversize_frames: u64,
    pub truncated_payloads: u64,
    pub unknown_fields: u64,
    pub malformed_fields: u64,
    /// Bytes discarded while hunting for a frame header
    pub bytes_skipped: u64,
}

/// Result of one accepted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    /// Payload length
    pub length: u8,
    /// Fields that updated the state
    pub fields_updated: usize,
    /// Whether the payload ended inside a field
    pub truncated: bool,
}

/// Streaming ThinkGear decoder over an async byte stream
///
/// # Examples
///
/// ```
/// use brainband::thinkgear::decoder::FrameDecoder;
///
/// # tokio_test::block_on(async {
/// let stream: &[u8] = &[0xAA, 0xAA, 0x02, 0x04, 0x64, 0x97];
/// let mut decoder = FrameDecoder::new(stream);
/// decoder.next_frame().await?;
/// assert_eq!(decoder.state().attention(), 100);
/// # Ok::<(), brainband::error::BrainbandError>(())
/// # }).unwrap();
/// ```
pub struct FrameDecoder<R> {
    source: ByteSource<R>,
    state: ParserState,
    stats: DecoderStats,
}

impl<R: AsyncRead + Unpin> FrameDecoder<R> {
    /// Decoder with a fresh, zeroed state
    pub fn new(reader: R) -> Self {
        Self::resume(reader, ParserState::default())
    }

    /// Decoder that continues from a previous session's state
    pub fn resume(reader: R, state: ParserState) -> Self {
        Self {
            source: ByteSource::new(reader),
            state,
            stats: DecoderStats::default(),
        }
    }

    /// Fail with `ReadTimeout` when the stream stalls for longer than `timeout`
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.source = self.source.with_read_timeout(timeout);
        self
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Total bytes consumed from the stream
    pub fn bytes_read(&self) -> u64 {
        self.source.bytes_read()
    }

    /// Give up the stream, keeping the state for a later `resume`
    pub fn into_state(self) -> ParserState {
        self.state
    }

    /// Block until one frame has been accepted and applied
    ///
    /// Lost sync, oversize lengths and checksum mismatches are counted and
    /// skipped; they never surface here.
    ///
    /// # Errors
    ///
    /// Only byte source failures (`SourceClosed`, `ReadTimeout`, `Io`).
    pub async fn next_frame(&mut self) -> Result<FrameSummary> {
        loop {
            let header = find_header(&mut self.source).await?;
            self.stats.bytes_skipped += header.skipped;
            self.stats.oversize_frames += header.oversize;

            let frame = match read_frame(&mut self.source, header.length).await? {
                FrameCheck::Accepted(frame) => frame,
                FrameCheck::ChecksumMismatch { expected, received } => {
                    self.stats.checksum_failures += 1;
                    debug!(
                        "Invalid frame (checksum 0x{:02X} doesn't match expected 0x{:02X})",
                        received, expected
                    );
                    continue;
                }
            };

            let report = decode_payload(&frame.payload, &mut self.state);
            self.state.mark_frame(Utc::now());

            self.stats.frames_accepted += 1;
            self.stats.unknown_fields += report.unknown as u64;
            self.stats.malformed_fields += report.malformed as u64;
            if report.truncated.is_some() {
                self.stats.truncated_payloads += 1;
            }

            return Ok(FrameSummary {
                length: frame.length(),
                fields_updated: report.updated,
                truncated: report.truncated.is_some(),
            });
        }
    }

    /// [`next_frame`](Self::next_frame), abandoned as soon as shutdown is signalled
    ///
    /// A frame interrupted mid-read is dropped whole; the state only ever
    /// changes after a frame's checksum has been verified.
    ///
    /// # Errors
    ///
    /// `Cancelled` on shutdown, otherwise as `next_frame`.
    pub async fn next_frame_cancellable(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<FrameSummary> {
        if *shutdown.borrow() {
            return Err(BrainbandError::Cancelled);
        }

        tokio::select! {
            result = self.next_frame() => result,
            _ = wait_for_shutdown(shutdown) => Err(BrainbandError::Cancelled),
        }
    }

    /// Decode until shutdown, publishing a snapshot every `publish_every` frames
    ///
    /// Returns `Ok(())` on shutdown. Frames not yet published are published
    /// before returning, on shutdown and on error alike.
    ///
    /// # Errors
    ///
    /// Byte source failures end the loop and are returned as-is.
    pub async fn run(
        &mut self,
        publisher: &watch::Sender<Snapshot>,
        shutdown: &mut watch::Receiver<bool>,
        publish_every: u32,
    ) -> Result<()> {
        let publish_every = publish_every.max(1);
        let mut pending = 0u32;

        loop {
            let result = self.next_frame_cancellable(shutdown).await;
            if result.is_ok() {
                pending += 1;
                if pending < publish_every {
                    continue;
                }
            }
            if pending > 0 {
                publisher.send_replace(self.snapshot());
                pending = 0;
            }

            match result {
                Ok(_) => {}
                Err(BrainbandError::Cancelled) => {
                    info!(
                        "Decoder stopped after {} frames ({} checksum failures)",
                        self.stats.frames_accepted, self.stats.checksum_failures
                    );
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}
