//! # ThinkGear Frame Encoder
//!
//! Builds wire frames from field values; the exact inverse of the decoder.
//! Handy for replaying recorded sessions and for exercising the decoder.

use super::checksum::payload_checksum;
use super::protocol::*;
use super::state::EegPowers;
use crate::error::{BrainbandError, Result};

/// Wrap a payload in a complete frame
///
/// # Returns
///
/// * `Result<Vec<u8>>` - `SYNC SYNC LEN payload CKSUM`
///
/// # Errors
///
/// Returns `PayloadTooLarge` if the payload exceeds [`MAX_PAYLOAD_LEN`] bytes
///
/// # Examples
///
/// ```
/// use brainband::thinkgear::encoder::encode_frame;
///
/// let frame = encode_frame(&[0x04, 0x64])?;
/// assert_eq!(frame, vec![0xAA, 0xAA, 0x02, 0x04, 0x64, 0x97]);
/// # Ok::<(), brainband::error::BrainbandError>(())
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_LEN as usize {
        return Err(BrainbandError::PayloadTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(SYNC);
    frame.push(SYNC);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(payload_checksum(payload));
    Ok(frame)
}

/// Accumulates payload fields in order
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field with `excode_level` EXCODE prefix bytes
    ///
    /// Codes below 0x80 take exactly one value byte; longer values are
    /// truncated to their first byte. Values of multi-byte codes are capped
    /// at 255 bytes.
    pub fn extended_field(mut self, excode_level: usize, code: u8, value: &[u8]) -> Self {
        self.bytes.extend(std::iter::repeat(EXCODE).take(excode_level));
        self.bytes.push(code);
        if has_explicit_len(code) {
            let value = &value[..value.len().min(u8::MAX as usize)];
            self.bytes.push(value.len() as u8);
            self.bytes.extend_from_slice(value);
        } else {
            self.bytes.push(value.first().copied().unwrap_or(0));
        }
        self
    }

    /// Append a field without extension codes
    pub fn field(self, code: u8, value: &[u8]) -> Self {
        self.extended_field(0, code, value)
    }

    /// Poor-signal value as the device sends it (0 best, 200 off head)
    pub fn poor_signal(self, raw: u8) -> Self {
        self.field(FieldCode::PoorSignal as u8, &[raw])
    }

    pub fn attention(self, value: u8) -> Self {
        self.field(FieldCode::Attention as u8, &[value])
    }

    pub fn meditation(self, value: u8) -> Self {
        self.field(FieldCode::Meditation as u8, &[value])
    }

    pub fn blink_strength(self, value: u8) -> Self {
        self.field(FieldCode::BlinkStrength as u8, &[value])
    }

    pub fn raw_wave(self, sample: u16) -> Self {
        self.field(FieldCode::RawWave as u8, &sample.to_be_bytes())
    }

    /// EEG powers, each band clipped to 24 bits
    pub fn eeg_power(self, eeg: &EegPowers) -> Self {
        let mut value = Vec::with_capacity(EEG_POWER_LEN);
        for band in eeg.to_array() {
            value.extend_from_slice(&band.to_be_bytes()[1..]);
        }
        self.field(FieldCode::EegPower as u8, &value)
    }

    /// Payload bytes
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// Complete frame around the payload
    pub fn into_frame(self) -> Result<Vec<u8>> {
        encode_frame(&self.bytes)
    }
}
