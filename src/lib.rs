//! Red Light, Green Light game arbiter.
//!
//! This crate arbitrates a turn-based "Red Light, Green Light" game for a
//! mobile robot: it tracks one player through a vision detector's
//! bounding-box stream, drives the light-phase state machine on a periodic
//! control tick, and triggers elimination or victory from motion observed
//! during forbidden phases.
//!
//! # Architecture
//!
//! Two independent time sources feed one machine:
//!
//! 1. **Control tick**: a fixed-cadence loop calls `GameMachine::tick`,
//!    which recomputes elapsed time, enforces the global limit, evaluates
//!    phase rules and rolls light phases over at their deadlines.
//! 2. **Detection stream**: frames arrive whenever the detector produces
//!    them and enter through `GameMachine::ingest`. Both entry points run
//!    on the daemon's single event-loop thread, so phase, result and
//!    tracker state are never observed half-updated; frames arriving while
//!    a blocking feedback action runs buffer in the channel and are
//!    evaluated when the loop resumes.
//!
//! Game time is always derived from the monotonic clock and the
//! `Init`-phase start stamp, never from tick counts or wall time spent in
//! feedback calls.
//!
//! # Module Structure
//!
//! - `clock`: monotonic time and blocking pauses (`Clock`, `Sleeper`)
//! - `track`: frame wire types and the per-frame player tracker
//! - `light`: light-phase choice and duration scheduling
//! - `game`: the phase state machine
//! - `feedback`: speech/audio/motor boundary, including the 180° maneuver
//! - `publish`: phase/result publication sinks
//! - `ingest`: detection sources (TCP, JSONL replay, synthetic stub)
//! - `config`: startup tunables (JSON file + `ARBITER_*` env overrides)

pub mod clock;
pub mod config;
pub mod feedback;
pub mod game;
pub mod ingest;
pub mod light;
pub mod publish;
pub mod track;

pub use clock::{Clock, ManualClock, MonotonicClock, Sleeper, ThreadSleeper};
pub use config::{ArbiterConfig, GameSettings, SourceSettings};
pub use feedback::{
    AudioBackend, ClipMap, Feedback, MotorBackend, SoundClip, SpeechBackend, VelocityCommand,
};
pub use game::{GameMachine, GameResult, Phase, TickOutcome};
pub use ingest::{DetectorSource, FileSource, SourceStats, StubConfig, StubSource, TcpSource};
pub use light::{LightPhase, LightScheduler};
pub use publish::{FanoutSink, JsonlSink, LogSink, PhaseSink, PhaseUpdate, RecordingSink};
pub use track::{
    BoundingBox, Detection, DetectionFrame, DetectionTracker, MovementDeltas, RawDetection,
};

/// Wire a `GameMachine` from loaded configuration with the given feedback
/// surface and sink. The daemon and the demo binary share this assembly.
pub fn build_machine(
    cfg: &ArbiterConfig,
    feedback: Feedback,
    sink: Box<dyn PhaseSink>,
    clock: Box<dyn Clock>,
) -> GameMachine {
    let scheduler = LightScheduler::new(
        cfg.game.interval_min,
        cfg.game.interval_max,
        cfg.game.rng_seed,
    );
    let tracker = DetectionTracker::new(
        &cfg.game.person_class,
        cfg.game.movement_threshold,
        cfg.game.finish_line_size_y,
    );
    GameMachine::new(
        cfg.game.time_limit,
        clock,
        scheduler,
        tracker,
        feedback,
        sink,
    )
}
