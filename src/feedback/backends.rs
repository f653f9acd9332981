//! Built-in feedback backends.
//!
//! `Console*` backends log what a real robot would say, play or drive; they
//! are the daemon's default when no hardware bridge is wired in.
//! `Recording*` backends capture calls for tests and the demo binary.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::backend::{AudioBackend, MotorBackend, SpeechBackend, VelocityCommand};

/// Logs spoken lines instead of synthesizing them.
pub struct ConsoleSpeech;

impl SpeechBackend for ConsoleSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        log::info!("speech: {}", text);
        Ok(())
    }
}

/// Logs clip triggers instead of playing audio.
pub struct ConsoleAudio;

impl AudioBackend for ConsoleAudio {
    fn play(&mut self, clip_id: &str) -> Result<()> {
        log::info!("audio: {}", clip_id);
        Ok(())
    }
}

/// Logs velocity commands instead of driving a motor.
pub struct ConsoleMotor;

impl MotorBackend for ConsoleMotor {
    fn send(&mut self, command: VelocityCommand) -> Result<()> {
        log::info!(
            "cmd_vel: linear_x={:.2} angular_z={:.2}",
            command.linear_x,
            command.angular_z
        );
        Ok(())
    }
}

/// Everything a feedback backend was asked to do, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedbackCall {
    Spoke(String),
    Played(String),
    Drove(VelocityCommand),
}

type CallLog = Arc<Mutex<Vec<FeedbackCall>>>;

/// Shared handle to a recorded call log.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: CallLog,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<FeedbackCall> {
        self.calls.lock().expect("recorder lock poisoned").clone()
    }

    fn push(&self, call: FeedbackCall) {
        self.calls.lock().expect("recorder lock poisoned").push(call);
    }

    pub fn speech(&self) -> RecordingSpeech {
        RecordingSpeech {
            recorder: self.clone(),
        }
    }

    pub fn audio(&self) -> RecordingAudio {
        RecordingAudio {
            recorder: self.clone(),
        }
    }

    pub fn motor(&self) -> RecordingMotor {
        RecordingMotor {
            recorder: self.clone(),
        }
    }
}

pub struct RecordingSpeech {
    recorder: Recorder,
}

impl SpeechBackend for RecordingSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.recorder.push(FeedbackCall::Spoke(text.to_string()));
        Ok(())
    }
}

pub struct RecordingAudio {
    recorder: Recorder,
}

impl AudioBackend for RecordingAudio {
    fn play(&mut self, clip_id: &str) -> Result<()> {
        self.recorder.push(FeedbackCall::Played(clip_id.to_string()));
        Ok(())
    }
}

pub struct RecordingMotor {
    recorder: Recorder,
}

impl MotorBackend for RecordingMotor {
    fn send(&mut self, command: VelocityCommand) -> Result<()> {
        self.recorder.push(FeedbackCall::Drove(command));
        Ok(())
    }
}
