//! # Brainband
//!
//! Read a NeuroSky ThinkGear headset over serial and report its readings.
//!
//! Usage: `brainband [CONFIG]` (defaults to `config/default.toml`, falling back
//! to built-in defaults when that file does not exist).

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brainband::config::{Config, LoggingConfig};
use brainband::serial::HeadsetSerial;
use brainband::telemetry::{JsonlRecorder, LogSink, Monitor};
use brainband::shutdown::wait_for_shutdown;
use brainband::thinkgear::{FrameDecoder, ParserState, Snapshot};

/// Config file read when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point
///
/// # Control Flow
///
/// 1. Load configuration and set up logging
/// 2. Spawn the snapshot monitor (log summary, optional JSONL recording)
/// 3. Open the headset and decode frames until Ctrl+C; on link loss keep the
///    last known values, wait `reconnect_interval_ms`, and reopen the port
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Brainband v{} starting...", env!("CARGO_PKG_VERSION"));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!("Ctrl+C handler unavailable: {}", e),
        }
    });

    let mut monitor = Monitor::new(
        snapshot_rx,
        Duration::from_millis(config.telemetry.log_interval_ms),
    )
    .with_sink(Box::new(LogSink));
    if config.telemetry.enabled {
        let recorder = JsonlRecorder::from_config(&config.telemetry)
            .context("Failed to start telemetry recorder")?;
        monitor = monitor.with_sink(Box::new(recorder));
    }
    let monitor_task = tokio::spawn(monitor.run(shutdown_rx.clone()));

    decode_until_shutdown(&config, &snapshot_tx, shutdown_rx).await?;

    monitor_task.await?;
    Ok(())
}

/// Decode loop with reconnect on transport failure
async fn decode_until_shutdown(
    config: &Config,
    publisher: &watch::Sender<Snapshot>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let reconnect = Duration::from_millis(config.serial.reconnect_interval_ms);
    let mut state = ParserState::default();

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        let serial = match HeadsetSerial::from_config(&config.serial) {
            Ok(serial) => serial,
            Err(e) => {
                warn!("{}; retrying in {:?}", e, reconnect);
                if sleep_or_shutdown(reconnect, &mut shutdown).await {
                    return Ok(());
                }
                continue;
            }
        };
        info!("Decoding headset stream from {}", serial.device_path());

        let mut decoder = FrameDecoder::resume(serial.into_stream(), state)
            .with_read_timeout(config.serial.read_timeout());
        let result = decoder
            .run(publisher, &mut shutdown, config.decoder.publish_every_frames)
            .await;

        let stats = *decoder.stats();
        info!(
            "Session: {} frames, {} checksum failures, {} oversize, {} truncated, {} bytes skipped",
            stats.frames_accepted,
            stats.checksum_failures,
            stats.oversize_frames,
            stats.truncated_payloads,
            stats.bytes_skipped
        );
        state = decoder.into_state();

        match result {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transport() => {
                warn!("Headset link lost: {}; reconnecting in {:?}", e, reconnect);
                if sleep_or_shutdown(reconnect, &mut shutdown).await {
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Wait `period`; returns `true` if shutdown was requested meanwhile
async fn sleep_or_shutdown(period: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(period) => false,
        _ = wait_for_shutdown(shutdown) => true,
    }
}

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("Failed to load config from {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Console logging, plus a non-blocking file layer when configured
///
/// `RUST_LOG` overrides the configured level. The returned guard must live
/// until exit so buffered file output gets flushed.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    match &config.file {
        Some(file) => {
            let appender = log_file_appender(file)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            registry.init();
            Ok(None)
        }
    }
}

/// Non-rotating appender for `file`, creating its directory if needed
fn log_file_appender(file: &str) -> Result<RollingFileAppender> {
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name().unwrap_or_else(|| OsStr::new("brainband.log"));

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", file))
}
