//! # ThinkGear Protocol Module
//!
//! Streaming decoder for the NeuroSky ThinkGear serial protocol spoken by
//! consumer EEG headsets.
//!
//! This module handles:
//! - Frame synchronization from an arbitrary stream offset
//! - Payload checksum validation
//! - Tag/length/value payload decoding into the latest sensor values
//! - Publishing consistent snapshots of those values

pub mod protocol;
pub mod checksum;
pub mod source;
pub mod sync;
pub mod reader;
pub mod payload;
pub mod state;
pub mod decoder;
pub mod encoder;

pub use decoder::{DecoderStats, FrameDecoder};
pub use state::{EegPowers, ParserState, Snapshot};
