//! Phase and result publication.
//!
//! The machine announces each phase change through a `PhaseSink`; the final
//! update carries the game result alongside `GameOver`. Sinks are observers
//! only: publication failures are logged and never feed back into game
//! logic.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;

use crate::game::{GameResult, Phase};

/// One published state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseUpdate {
    pub phase: Phase,
    pub result: GameResult,
}

pub trait PhaseSink: Send {
    fn publish(&mut self, update: PhaseUpdate) -> Result<()>;
}

/// Announces phase changes at info level.
pub struct LogSink;

impl PhaseSink for LogSink {
    fn publish(&mut self, update: PhaseUpdate) -> Result<()> {
        match update.result {
            GameResult::Unset => log::info!("phase: {}", update.phase),
            result => log::info!("phase: {} result: {}", update.phase, result),
        }
        Ok(())
    }
}

/// Writes one JSON object per phase change, newline-delimited.
pub struct JsonlSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> PhaseSink for JsonlSink<W> {
    fn publish(&mut self, update: PhaseUpdate) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &update)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Captures updates for inspection in tests and the demo binary.
#[derive(Clone, Default)]
pub struct RecordingSink {
    updates: Arc<Mutex<Vec<PhaseUpdate>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<PhaseUpdate> {
        self.updates.lock().expect("sink lock poisoned").clone()
    }
}

impl PhaseSink for RecordingSink {
    fn publish(&mut self, update: PhaseUpdate) -> Result<()> {
        self.updates
            .lock()
            .expect("sink lock poisoned")
            .push(update);
        Ok(())
    }
}

/// Fans one update out to several sinks. A failing sink is logged and does
/// not stop the others.
pub struct FanoutSink {
    sinks: Vec<Box<dyn PhaseSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn PhaseSink>>) -> Self {
        Self { sinks }
    }
}

impl PhaseSink for FanoutSink {
    fn publish(&mut self, update: PhaseUpdate) -> Result<()> {
        for sink in &mut self.sinks {
            if let Err(e) = sink.publish(update) {
                log::warn!("phase sink failed: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_sink_writes_one_line_per_update() -> Result<()> {
        let mut buf = Vec::new();
        {
            let mut sink = JsonlSink::new(&mut buf);
            sink.publish(PhaseUpdate {
                phase: Phase::GreenLight,
                result: GameResult::Unset,
            })?;
            sink.publish(PhaseUpdate {
                phase: Phase::GameOver,
                result: GameResult::Win,
            })?;
        }

        let text = String::from_utf8(buf)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"GREEN_LIGHT\""));
        assert!(lines[1].contains("\"WIN\""));
        Ok(())
    }

    #[test]
    fn recording_sink_preserves_order() -> Result<()> {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.publish(PhaseUpdate {
            phase: Phase::RedLight,
            result: GameResult::Unset,
        })?;
        writer.publish(PhaseUpdate {
            phase: Phase::GameOver,
            result: GameResult::Lose,
        })?;

        let updates = sink.updates();
        assert_eq!(updates[0].phase, Phase::RedLight);
        assert_eq!(updates[1].result, GameResult::Lose);
        Ok(())
    }
}
