//! Detection frame sources.
//!
//! This module provides the sources a deployment can point the arbiter at:
//! - TCP stream of line-delimited JSON frames from a live detector process
//! - Local JSONL files (replaying a recorded detector session)
//! - Stub source (synthetic scripted player for demos and tests)
//!
//! All sources produce `DetectionFrame` instances that flow into the game
//! machine's tracker. The ingestion layer is responsible for:
//! - Parsing and validating the wire format
//! - Pacing frame delivery where the medium has no natural rate
//! - Reporting per-source statistics and health
//!
//! A malformed frame is not an error to the game: sources log it and move
//! on, and the frame contributes nothing.

mod file;
mod stub;
mod tcp;

use anyhow::{anyhow, Context, Result};

use crate::config::SourceSettings;
use crate::track::DetectionFrame;

pub use file::FileSource;
pub use stub::{StubConfig, StubSource};
pub use tcp::TcpSource;

/// Statistics for a detection source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// A stream of detector frames.
pub trait DetectorSource: Send {
    /// Prepare the source. Called once before the first `next_frame`.
    fn connect(&mut self) -> Result<()>;

    /// Block until the next frame is available. `Ok(None)` means the stream
    /// is exhausted and no further frames will ever arrive.
    fn next_frame(&mut self) -> Result<Option<DetectionFrame>>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Parse one wire line into a frame.
pub(crate) fn parse_frame_line(line: &str) -> Result<DetectionFrame> {
    serde_json::from_str(line.trim()).context("malformed detection frame")
}

/// Build the configured source for the daemon.
pub fn build_source(settings: &SourceSettings) -> Result<Box<dyn DetectorSource>> {
    match settings.kind.as_str() {
        "stub" => Ok(Box::new(StubSource::new(StubConfig {
            person_class: settings.person_class.clone(),
            target_fps: settings.fps,
            ..StubConfig::default()
        }))),
        "file" => {
            let path = settings
                .path
                .as_deref()
                .ok_or_else(|| anyhow!("file source requires a path"))?;
            Ok(Box::new(FileSource::new(path, settings.fps)))
        }
        "tcp" => {
            let addr = settings
                .addr
                .as_deref()
                .ok_or_else(|| anyhow!("tcp source requires an addr"))?;
            Ok(Box::new(TcpSource::new(addr)))
        }
        other => Err(anyhow!("unknown detection source kind '{}'", other)),
    }
}
