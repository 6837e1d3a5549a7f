//! # Telemetry Module
//!
//! Downstream consumers of decoded headset state.
//!
//! This module handles:
//! - Sampling published snapshots on a fixed cadence
//! - Logging a one-line summary of each new snapshot
//! - Recording snapshots to rotating JSONL files

pub mod recorder;

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::Result;
use crate::shutdown::wait_for_shutdown;
use crate::thinkgear::Snapshot;

pub use recorder::JsonlRecorder;

/// Something that consumes decoded snapshots
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotSink: Send {
    /// Handle one snapshot
    fn record(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Logs the signal, attention and meditation summary of each snapshot
#[derive(Debug, Default)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn record(&mut self, snapshot: &Snapshot) -> Result<()> {
        info!("{}", snapshot);
        Ok(())
    }
}

/// Samples the latest snapshot and feeds it to every sink
pub struct Monitor {
    snapshots: watch::Receiver<Snapshot>,
    sinks: Vec<Box<dyn SnapshotSink>>,
    period: Duration,
    last_frames: u64,
}

impl Monitor {
    pub fn new(snapshots: watch::Receiver<Snapshot>, period: Duration) -> Self {
        let last_frames = snapshots.borrow().frames;
        Self {
            snapshots,
            sinks: Vec::new(),
            period,
            last_frames,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Feed the current snapshot to the sinks if a frame arrived since the last sample
    ///
    /// Returns whether the sinks were fed. Sink failures are logged and do not
    /// stop the other sinks.
    pub fn sample(&mut self) -> bool {
        let snapshot = *self.snapshots.borrow_and_update();
        if snapshot.frames == self.last_frames {
            return false;
        }
        self.last_frames = snapshot.frames;

        for sink in &mut self.sinks {
            if let Err(e) = sink.record(&snapshot) {
                warn!("Snapshot sink failed: {}", e);
            }
        }
        true
    }

    /// Sample every period until shutdown, with a final sample on the way out
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sample();
                }
                _ = wait_for_shutdown(&mut shutdown) => {
                    self.sample();
                    break;
                }
            }
        }
    }
}
