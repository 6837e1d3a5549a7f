//! # Parser State
//!
//! Latest decoded value of every headset field. Fields persist across frames:
//! a frame only overwrites the fields it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::protocol::EEG_BAND_COUNT;

/// The eight EEG band powers, always updated together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EegPowers {
    pub delta: u32,
    pub theta: u32,
    pub low_alpha: u32,
    pub high_alpha: u32,
    pub low_beta: u32,
    pub high_beta: u32,
    pub low_gamma: u32,
    pub mid_gamma: u32,
}

impl EegPowers {
    /// Build from values in wire order (delta first, mid gamma last)
    pub fn from_array(bands: [u32; EEG_BAND_COUNT]) -> Self {
        let [delta, theta, low_alpha, high_alpha, low_beta, high_beta, low_gamma, mid_gamma] =
            bands;
        Self {
            delta,
            theta,
            low_alpha,
            high_alpha,
            low_beta,
            high_beta,
            low_gamma,
            mid_gamma,
        }
    }

    /// Values in wire order
    pub fn to_array(&self) -> [u32; EEG_BAND_COUNT] {
        [
            self.delta,
            self.theta,
            self.low_alpha,
            self.high_alpha,
            self.low_beta,
            self.high_beta,
            self.low_gamma,
            self.mid_gamma,
        ]
    }
}

/// Decoder-owned state, written only by the frame decoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserState {
    pub(crate) signal_strength: u8,
    pub(crate) attention: u8,
    pub(crate) meditation: u8,
    pub(crate) blink_strength: Option<u8>,
    pub(crate) raw_wave_sample: u16,
    pub(crate) eeg: EegPowers,
    pub(crate) frames_applied: u64,
    pub(crate) received_at: Option<DateTime<Utc>>,
}

impl ParserState {
    /// Signal strength, 0 (no contact) to 200 (good)
    pub fn signal_strength(&self) -> u8 {
        self.signal_strength
    }

    /// eSense attention, 0-100
    pub fn attention(&self) -> u8 {
        self.attention
    }

    /// eSense meditation, 0-100
    pub fn meditation(&self) -> u8 {
        self.meditation
    }

    /// Last blink strength, `None` until the headset has reported one
    pub fn blink_strength(&self) -> Option<u8> {
        self.blink_strength
    }

    pub fn raw_wave_sample(&self) -> u16 {
        self.raw_wave_sample
    }

    pub fn eeg(&self) -> EegPowers {
        self.eeg
    }

    /// EEG band powers in wire order
    pub fn band_powers(&self) -> [u32; EEG_BAND_COUNT] {
        self.eeg.to_array()
    }

    /// Number of accepted frames applied to this state
    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }

    /// Receipt time of the last applied frame
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Copy every field out as one consistent value
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            received_at: self.received_at,
            frames: self.frames_applied,
            signal_strength: self.signal_strength,
            attention: self.attention,
            meditation: self.meditation,
            blink_strength: self.blink_strength,
            raw_wave_sample: self.raw_wave_sample,
            eeg: self.eeg,
        }
    }

    /// Stamp the state after an accepted frame has been applied
    pub(crate) fn mark_frame(&mut self, at: DateTime<Utc>) {
        self.frames_applied += 1;
        self.received_at = Some(at);
    }
}

/// Immutable copy of the parser state handed to consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub received_at: Option<DateTime<Utc>>,
    pub frames: u64,
    pub signal_strength: u8,
    pub attention: u8,
    pub meditation: u8,
    pub blink_strength: Option<u8>,
    pub raw_wave_sample: u16,
    pub eeg: EegPowers,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal strength: {} Attention: {} Meditation: {}",
            self.signal_strength, self.attention, self.meditation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_is_zeroed() {
        let state = ParserState::default();
        assert_eq!(state.signal_strength(), 0);
        assert_eq!(state.attention(), 0);
        assert_eq!(state.meditation(), 0);
        assert_eq!(state.blink_strength(), None);
        assert_eq!(state.raw_wave_sample(), 0);
        assert_eq!(state.band_powers(), [0; 8]);
        assert_eq!(state.frames_applied(), 0);
        assert!(state.received_at().is_none());
    }

    #[test]
    fn test_eeg_array_order() {
        let eeg = EegPowers::from_array([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(eeg.delta, 1);
        assert_eq!(eeg.high_alpha, 4);
        assert_eq!(eeg.mid_gamma, 8);
        assert_eq!(eeg.to_array(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_snapshot_copies_fields() {
        let mut state = ParserState {
            attention: 61,
            meditation: 40,
            signal_strength: 200,
            blink_strength: Some(90),
            raw_wave_sample: 0x0102,
            ..Default::default()
        };
        let now = Utc::now();
        state.mark_frame(now);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.attention, 61);
        assert_eq!(snapshot.blink_strength, Some(90));
        assert_eq!(snapshot.frames, 1);
        assert_eq!(snapshot.received_at, Some(now));

        // Later writes do not reach an existing snapshot
        state.attention = 10;
        assert_eq!(state.attention(), 10);
        assert_eq!(snapshot.attention, 61);
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = Snapshot {
            signal_strength: 170,
            attention: 100,
            meditation: 50,
            ..Default::default()
        };
        assert_eq!(
            snapshot.to_string(),
            "Signal strength: 170 Attention: 100 Meditation: 50"
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = Snapshot {
            attention: 7,
            eeg: EegPowers::from_array([1, 2, 3, 4, 5, 6, 7, 8]),
            ..Default::default()
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["attention"], 7);
        assert_eq!(json["eeg"]["mid_gamma"], 8);
        assert!(json["blink_strength"].is_null());
    }
}
