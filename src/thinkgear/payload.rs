//! # Payload Decoder
//!
//! Walks a checksum-verified payload field by field and folds each known
//! field into the [`ParserState`].
//!
//! A payload holds any number of fields back to back. Each field may be
//! prefixed by a run of EXCODE bytes; the run length is parsed and carried
//! on the [`Field`] but does not change how the field is applied.

use bytes::Buf;
use tracing::{debug, trace};

use super::protocol::{
    has_explicit_len, FieldCode, EEG_BAND_COUNT, EEG_BAND_WIDTH, EXCODE, POOR_SIGNAL_MAX,
};
use super::state::{EegPowers, ParserState};

/// One tag/length/value unit of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Number of EXCODE bytes preceding the code
    pub excode_level: usize,
    pub code: u8,
    pub value: &'a [u8],
}

/// A field ran past the end of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncated {
    /// Code of the cut-off field, if it was reached
    pub code: Option<u8>,
    /// Bytes the field still needed
    pub needed: usize,
    /// Bytes left in the payload
    pub remaining: usize,
}

/// Iterator over the fields of a payload
///
/// Yields `Err(Truncated)` at most once, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    buf: &'a [u8],
    done: bool,
}

/// Iterate the fields of `payload`
pub fn fields(payload: &[u8]) -> Fields<'_> {
    Fields {
        buf: payload,
        done: false,
    }
}

impl<'a> Fields<'a> {
    fn truncated(&mut self, code: Option<u8>, needed: usize) -> Truncated {
        self.done = true;
        Truncated {
            code,
            needed,
            remaining: self.buf.remaining(),
        }
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<Field<'a>, Truncated>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.buf.has_remaining() {
            return None;
        }

        let mut excode_level = 0;
        while self.buf.first() == Some(&EXCODE) {
            self.buf.advance(1);
            excode_level += 1;
        }

        if !self.buf.has_remaining() {
            return Some(Err(self.truncated(None, 1)));
        }
        let code = self.buf.get_u8();

        let len = if has_explicit_len(code) {
            if !self.buf.has_remaining() {
                return Some(Err(self.truncated(Some(code), 1)));
            }
            self.buf.get_u8() as usize
        } else {
            1
        };

        if self.buf.remaining() < len {
            return Some(Err(self.truncated(Some(code), len)));
        }

        let buf: &'a [u8] = self.buf;
        let (value, rest) = buf.split_at(len);
        self.buf = rest;

        Some(Ok(Field {
            excode_level,
            code,
            value,
        }))
    }
}

/// What applying one field did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A known field updated the state
    Updated(FieldCode),
    /// Unrecognised code, value skipped
    Unknown(u8),
    /// Known code with a value too short to decode, value skipped
    Malformed(FieldCode),
}

/// Fold one field into the state
pub fn apply_field(state: &mut ParserState, field: &Field<'_>) -> Applied {
    let Some(code) = FieldCode::from_byte(field.code) else {
        trace!(
            "Skipping unknown code 0x{:02X} ({} bytes)",
            field.code,
            field.value.len()
        );
        return Applied::Unknown(field.code);
    };

    let value = field.value;
    if value.len() < code.value_len() {
        return Applied::Malformed(code);
    }

    match code {
        FieldCode::PoorSignal => {
            // Device reports signal weakness; flip it so higher is better
            state.signal_strength = POOR_SIGNAL_MAX.saturating_sub(value[0]);
        }
        FieldCode::Attention => state.attention = value[0],
        FieldCode::Meditation => state.meditation = value[0],
        FieldCode::BlinkStrength => state.blink_strength = Some(value[0]),
        FieldCode::RawWave => {
            state.raw_wave_sample = u16::from_be_bytes([value[0], value[1]]);
        }
        FieldCode::EegPower => {
            let mut bands = [0u32; EEG_BAND_COUNT];
            for (band, chunk) in bands.iter_mut().zip(value.chunks_exact(EEG_BAND_WIDTH)) {
                *band = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]);
            }
            state.eeg = EegPowers::from_array(bands);
        }
    }

    trace!(
        "Applied {:?} (excode level {}, {} bytes)",
        code,
        field.excode_level,
        value.len()
    );
    Applied::Updated(code)
}

/// Outcome of decoding one payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadReport {
    pub updated: usize,
    pub unknown: usize,
    pub malformed: usize,
    /// Set when a field overran the payload; earlier fields still stand
    pub truncated: Option<Truncated>,
}

/// Apply every field of `payload` to `state`, stopping at a truncated field
pub fn decode_payload(payload: &[u8], state: &mut ParserState) -> PayloadReport {
    let mut report = PayloadReport::default();

    for field in fields(payload) {
        match field {
            Ok(field) => match apply_field(state, &field) {
                Applied::Updated(_) => report.updated += 1,
                Applied::Unknown(_) => report.unknown += 1,
                Applied::Malformed(code) => {
                    debug!(
                        "Ignoring {:?} field with short value ({} bytes)",
                        code,
                        field.value.len()
                    );
                    report.malformed += 1;
                }
            },
            Err(truncated) => {
                debug!(
                    "Payload truncated: field needs {} bytes, {} left",
                    truncated.needed, truncated.remaining
                );
                report.truncated = Some(truncated);
            }
        }
    }

    report
}
