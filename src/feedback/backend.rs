use anyhow::Result;

/// Velocity command for the motor actuator. The arbiter only ever commands
/// rotation in place; linear velocity stays zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityCommand {
    pub linear_x: f64,
    pub angular_z: f64,
}

impl VelocityCommand {
    pub fn spin(angular_z: f64) -> Self {
        Self {
            linear_x: 0.0,
            angular_z,
        }
    }

    pub fn stop() -> Self {
        Self::default()
    }
}

/// Text-to-speech boundary.
///
/// `speak` is synchronous and may block for the full utterance; the caller
/// accepts that latency. Implementations must not be relied on for timing:
/// game time is derived from the monotonic clock, never from how long a
/// speech call took.
pub trait SpeechBackend: Send {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Sound-clip playback boundary. Blocking or fire-and-forget are both
/// acceptable.
pub trait AudioBackend: Send {
    fn play(&mut self, clip_id: &str) -> Result<()>;
}

/// Motor actuator boundary. Receives velocity commands only; the rotation
/// maneuver is timed open-loop above this trait.
pub trait MotorBackend: Send {
    fn send(&mut self, command: VelocityCommand) -> Result<()>;
}
