//! # ThinkGear Protocol Constants and Types
//!
//! Wire definitions for the NeuroSky ThinkGear serial stream.
//!
//! ```text
//! Frame   := SYNC SYNC (SYNC)* LEN PAYLOAD[LEN] CKSUM
//! Field   := (EXCODE)* CODE [VLEN] VALUE[len]
//! ```
//!
//! Codes below 0x80 carry a one-byte value; codes from 0x80 up are followed
//! by an explicit value length. Multi-byte values are big-endian.

/// Frame header byte, repeated at least twice
pub const SYNC: u8 = 0xAA;

/// Extension code prefix byte
pub const EXCODE: u8 = 0x55;

/// Largest payload length a frame may declare
pub const MAX_PAYLOAD_LEN: u8 = 169;

/// Codes at or above this value carry an explicit length byte
pub const MULTI_BYTE_CODE_MIN: u8 = 0x80;

/// Poor-signal value reported when the sensor is off the head
pub const POOR_SIGNAL_MAX: u8 = 200;

/// Value length of a raw wave sample (16-bit big-endian)
pub const RAW_WAVE_LEN: usize = 2;

/// Number of EEG power bands
pub const EEG_BAND_COUNT: usize = 8;

/// Bytes per EEG band value (24-bit big-endian)
pub const EEG_BAND_WIDTH: usize = 3;

/// Value length of the EEG band power group
pub const EEG_POWER_LEN: usize = EEG_BAND_COUNT * EEG_BAND_WIDTH;

/// Field codes understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldCode {
    /// Poor signal quality, 0 (best) to 200 (off head)
    PoorSignal = 0x02,
    /// eSense attention, 0-100
    Attention = 0x04,
    /// eSense meditation, 0-100
    Meditation = 0x05,
    /// Blink strength, 0-255
    BlinkStrength = 0x16,
    /// Raw wave sample, 16-bit
    RawWave = 0x80,
    /// Eight 24-bit EEG band powers
    EegPower = 0x83,
}

impl FieldCode {
    /// Look up a known field code
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(Self::PoorSignal),
            0x04 => Some(Self::Attention),
            0x05 => Some(Self::Meditation),
            0x16 => Some(Self::BlinkStrength),
            0x80 => Some(Self::RawWave),
            0x83 => Some(Self::EegPower),
            _ => None,
        }
    }

    /// Minimum value length the field needs to be applied
    pub const fn value_len(self) -> usize {
        match self {
            Self::PoorSignal | Self::Attention | Self::Meditation | Self::BlinkStrength => 1,
            Self::RawWave => RAW_WAVE_LEN,
            Self::EegPower => EEG_POWER_LEN,
        }
    }
}

/// Whether `code` is followed by an explicit value length byte
pub const fn has_explicit_len(code: u8) -> bool {
    code >= MULTI_BYTE_CODE_MIN
}

/// A frame lifted off the wire, before its checksum is verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Payload bytes, `len() <= MAX_PAYLOAD_LEN`
    pub payload: Vec<u8>,

    /// Checksum byte as received
    pub checksum: u8,
}

impl RawFrame {
    /// Declared payload length
    pub fn length(&self) -> u8 {
        self.payload.len() as u8
    }
}
