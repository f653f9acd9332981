//! Feedback actions: speech, audio cues, and the 180° rotation maneuver.
//!
//! The game machine sequences these at defined transition points; this
//! module owns the call contract:
//! - Every action is synchronous on the caller's thread and may block for
//!   its full duration. Detections arriving meanwhile buffer upstream; game
//!   time keeps advancing underneath (it is derived from the monotonic
//!   clock, never from wall time spent in here).
//! - Backend failures are logged and swallowed at this boundary. A dead
//!   speaker degrades feedback, never game outcome logic.
//! - No cancellation: once a spoken line or the rotation starts, it runs to
//!   completion.

mod backend;
mod backends;

use std::f64::consts::PI;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::clock::Sleeper;

pub use backend::{AudioBackend, MotorBackend, SpeechBackend, VelocityCommand};
pub use backends::{
    ConsoleAudio, ConsoleMotor, ConsoleSpeech, FeedbackCall, Recorder, RecordingAudio,
    RecordingMotor, RecordingSpeech,
};

/// Sound cues the game triggers. The mapping to concrete clip ids lives in
/// `ClipMap` so deployments can rename clips without touching game logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundClip {
    GreenLight,
    RedLight,
    Lose,
}

/// A conforming clip id is a local identifier for the audio subsystem, not
/// a file path. Positive allowlist, same discipline as every external-facing
/// id in this crate.
///
/// Allowed: "clip:green_light", "clip:lose", "clip:alarm-2"
pub fn validate_clip_id(clip_id: &str) -> Result<()> {
    static CLIP_ID_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = CLIP_ID_RE.get_or_init(|| regex::Regex::new(r"^clip:[a-z0-9_-]{1,64}$").unwrap());

    if !re.is_match(clip_id) {
        return Err(anyhow!("clip id must match ^clip:[a-z0-9_-]{{1,64}}$"));
    }
    Ok(())
}

/// Clip ids for the three game cues.
#[derive(Clone, Debug)]
pub struct ClipMap {
    pub green_light: String,
    pub red_light: String,
    pub lose: String,
}

impl Default for ClipMap {
    fn default() -> Self {
        Self {
            green_light: "clip:green_light".to_string(),
            red_light: "clip:red_light".to_string(),
            lose: "clip:lose".to_string(),
        }
    }
}

impl ClipMap {
    pub fn validate(&self) -> Result<()> {
        validate_clip_id(&self.green_light)?;
        validate_clip_id(&self.red_light)?;
        validate_clip_id(&self.lose)?;
        Ok(())
    }

    fn resolve(&self, clip: SoundClip) -> &str {
        match clip {
            SoundClip::GreenLight => &self.green_light,
            SoundClip::RedLight => &self.red_light,
            SoundClip::Lose => &self.lose,
        }
    }
}

/// The feedback surface the game machine drives.
///
/// Wraps the three backend traits plus a `Sleeper` for scripted pauses and
/// the timed rotation. All public methods absorb backend errors.
pub struct Feedback {
    speech: Box<dyn SpeechBackend>,
    audio: Box<dyn AudioBackend>,
    motor: Box<dyn MotorBackend>,
    sleeper: Box<dyn Sleeper>,
    clips: ClipMap,
    /// Angular speed of the rotation maneuver, rad/s. Must be positive.
    rotation_speed: f64,
}

impl Feedback {
    pub fn new(
        speech: Box<dyn SpeechBackend>,
        audio: Box<dyn AudioBackend>,
        motor: Box<dyn MotorBackend>,
        sleeper: Box<dyn Sleeper>,
        clips: ClipMap,
        rotation_speed: f64,
    ) -> Self {
        Self {
            speech,
            audio,
            motor,
            sleeper,
            clips,
            rotation_speed,
        }
    }

    /// Console-backed feedback for the daemon's default wiring.
    pub fn console(clips: ClipMap, rotation_speed: f64) -> Self {
        Self::new(
            Box::new(ConsoleSpeech),
            Box::new(ConsoleAudio),
            Box::new(ConsoleMotor),
            Box::new(crate::clock::ThreadSleeper),
            clips,
            rotation_speed,
        )
    }

    pub fn speak(&mut self, text: &str) {
        if let Err(e) = self.speech.speak(text) {
            log::warn!("speech backend failed: {}", e);
        }
    }

    /// Speak each line, pausing after it. Blocks for the whole script.
    pub fn say_lines<S: AsRef<str>>(&mut self, lines: &[S], pause: Duration) {
        for line in lines {
            self.speak(line.as_ref());
            self.sleeper.sleep(pause);
        }
    }

    pub fn play(&mut self, clip: SoundClip) {
        let clip_id = self.clips.resolve(clip).to_string();
        if let Err(e) = self.audio.play(&clip_id) {
            log::warn!("audio backend failed for {}: {}", clip_id, e);
        }
    }

    /// Timed open-loop half turn: spin at the configured angular speed for
    /// π / speed seconds, then command a stop. The stop is always attempted,
    /// even when the spin command failed.
    pub fn rotate180(&mut self) {
        let duration = Duration::from_secs_f64(PI / self.rotation_speed);
        log::info!(
            "rotating 180 degrees at {:.2} rad/s ({:.2}s)",
            self.rotation_speed,
            duration.as_secs_f64()
        );
        if let Err(e) = self.motor.send(VelocityCommand::spin(self.rotation_speed)) {
            log::warn!("motor backend failed to start rotation: {}", e);
        }
        self.sleeper.sleep(duration);
        if let Err(e) = self.motor.send(VelocityCommand::stop()) {
            log::warn!("motor backend failed to stop rotation: {}", e);
        }
        log::info!("rotation complete");
    }
}
