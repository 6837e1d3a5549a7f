//! # JSONL Snapshot Recorder
//!
//! Writes one JSON snapshot per line, rotating files after a fixed number of
//! records and keeping only the newest files.

use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::SnapshotSink;
use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::thinkgear::Snapshot;

const FILE_PREFIX: &str = "brainband_";
const FILE_EXTENSION: &str = "jsonl";

/// Rotating JSONL writer
pub struct JsonlRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_file: Option<PathBuf>,
    records_in_file: usize,
    sequence: u64,
}

impl JsonlRecorder {
    /// Recorder configured from the `[telemetry]` section
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(
            &config.log_dir,
            config.max_records_per_file,
            config.max_files_to_keep,
        )
    }

    /// Recorder writing into `dir`, creating it if needed
    ///
    /// Limits below 1 are raised to 1.
    pub fn new<P: AsRef<Path>>(
        dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Recording snapshots to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_file: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// File currently being written, if any record has been written yet
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:08}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence += 1;

        let path = self.dir.join(name);
        let file = File::create(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_file = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest recordings beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_recording(path))
            .collect();

        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names embed a timestamp and sequence, so name order is age order
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old telemetry file {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn is_recording(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(FILE_PREFIX));
    named && path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION)
}

impl SnapshotSink for JsonlRecorder {
    fn record(&mut self, snapshot: &Snapshot) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, snapshot)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }
        Ok(())
    }
}
