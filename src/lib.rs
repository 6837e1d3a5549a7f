//! # Brainband Library
//!
//! Decode the serial byte stream of a NeuroSky ThinkGear EEG headset into
//! named sensor readings: signal quality, attention, meditation, blink
//! strength, raw wave samples and the eight EEG band powers.
//!
//! The [`thinkgear::FrameDecoder`] recovers framing from any stream offset,
//! drops corrupt frames, and publishes consistent [`thinkgear::Snapshot`]s for
//! display, logging or recording.

pub mod config;
pub mod error;
pub mod thinkgear;
pub mod serial;
pub mod shutdown;
pub mod telemetry;
