//! JSONL replay source.
//!
//! Reads a recorded detector session, one JSON frame per line, and replays
//! it at a configurable rate. Malformed lines are logged and skipped; blank
//! lines are ignored. End of file ends the stream.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Duration;

use anyhow::{Context, Result};

use super::{parse_frame_line, DetectorSource, SourceStats};
use crate::track::DetectionFrame;

pub struct FileSource {
    path: String,
    /// Replay rate; 0 replays as fast as the caller consumes.
    fps: u32,
    reader: Option<BufReader<File>>,
    frames_read: u64,
    lines_skipped: u64,
}

impl FileSource {
    pub fn new(path: &str, fps: u32) -> Self {
        Self {
            path: path.to_string(),
            fps,
            reader: None,
            frames_read: 0,
            lines_skipped: 0,
        }
    }
}

impl DetectorSource for FileSource {
    fn connect(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening detection log {}", self.path))?;
        self.reader = Some(BufReader::new(file));
        log::info!("FileSource: replaying {}", self.path);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<DetectionFrame>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        loop {
            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .with_context(|| format!("reading detection log {}", self.path))?;
            if read == 0 {
                log::info!(
                    "FileSource: {} exhausted after {} frames ({} lines skipped)",
                    self.path,
                    self.frames_read,
                    self.lines_skipped
                );
                self.reader = None;
                return Ok(None);
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_frame_line(&line) {
                Ok(frame) => {
                    self.frames_read += 1;
                    if self.fps > 0 {
                        std::thread::sleep(Duration::from_secs_f64(1.0 / f64::from(self.fps)));
                    }
                    return Ok(Some(frame));
                }
                Err(e) => {
                    self.lines_skipped += 1;
                    log::warn!("FileSource: skipping bad line in {}: {}", self.path, e);
                }
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.reader.is_some()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_read,
            source: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn replays_frames_and_skips_bad_lines() -> Result<()> {
        let mut log = tempfile::NamedTempFile::new()?;
        writeln!(
            log,
            r#"{{"detections":[{{"class_id":"15","score":0.9,"bbox":{{"center_x":100.0,"center_y":100.0,"size_x":40.0,"size_y":90.0}}}}]}}"#
        )?;
        writeln!(log, "this line is garbage")?;
        writeln!(log)?;
        writeln!(log, r#"{{"detections":[]}}"#)?;

        let mut source = FileSource::new(&log.path().display().to_string(), 0);
        source.connect()?;

        let first = source.next_frame()?.expect("first frame");
        assert_eq!(first.detections[0].bbox.size_y, 90.0);

        let second = source.next_frame()?.expect("second frame");
        assert!(second.detections.is_empty());

        assert_eq!(source.next_frame()?, None);
        assert!(!source.is_healthy());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn missing_file_fails_at_connect() {
        let mut source = FileSource::new("/nonexistent/frames.jsonl", 0);
        assert!(source.connect().is_err());
    }
}
