//! The game state machine.
//!
//! One `GameMachine` arbitrates one game, single-shot: a fresh process per
//! round. The control loop calls `tick()` at a fixed cadence and `ingest()`
//! whenever a detector frame arrives; both run on the same thread of
//! execution, so phase, result and tracker state are never observed
//! half-updated.
//!
//! Timeline: `Instructions` and `Countdown` are blocking scripted sequences
//! that complete before the timed game. `Init` stamps the game clock and
//! asks the scheduler for the first light. `GreenLight`/`RedLight` alternate
//! under scheduler control until the player wins (finish line during
//! green), loses (movement during red, or the global time limit), and the
//! machine parks in the terminal `GameOver` phase.
//!
//! Per-tick evaluation order in a light phase is fixed and short-circuits:
//! elapsed-time recompute, global timeout, phase-specific win/lose
//! condition, phase deadline. A timeout always wins over a simultaneous
//! finish-line or movement event.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::clock::Clock;
use crate::feedback::{Feedback, SoundClip};
use crate::light::{LightPhase, LightScheduler};
use crate::publish::{PhaseSink, PhaseUpdate};
use crate::track::{DetectionFrame, DetectionTracker};

/// Spoken before the game starts. The robot then turns its back on the
/// player (the 180° maneuver) and counts down.
pub const INSTRUCTION_SCRIPT: [&str; 3] = [
    "Welcome to red light, green light.",
    "Cross the field and reach me before the timer runs out.",
    "When you hear red light, freeze. If I see you move, you are out.",
];

const WIN_LINE: &str = "You reached the finish line. You win!";
const LOSE_LINE: &str = "You are eliminated. Game over.";

const INSTRUCTION_PAUSE: Duration = Duration::from_millis(1500);
const COUNTDOWN_PAUSE: Duration = Duration::from_secs(1);

/// Game timeline phase. Exactly one is current; `GameOver` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Instructions,
    Countdown,
    Init,
    GreenLight,
    RedLight,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Instructions => "INSTRUCTIONS",
            Phase::Countdown => "COUNTDOWN",
            Phase::Init => "INIT",
            Phase::GreenLight => "GREEN_LIGHT",
            Phase::RedLight => "RED_LIGHT",
            Phase::GameOver => "GAME_OVER",
        };
        f.write_str(name)
    }
}

/// Written exactly once, at the tick that transitions into `GameOver`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameResult {
    #[default]
    Unset,
    Win,
    Lose,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameResult::Unset => "UNSET",
            GameResult::Win => "WIN",
            GameResult::Lose => "LOSE",
        };
        f.write_str(name)
    }
}

/// What the control loop should do after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The game is over; stop scheduling further ticks.
    Finished(GameResult),
}

pub struct GameMachine {
    time_limit: Duration,
    clock: Box<dyn Clock>,
    scheduler: LightScheduler,
    tracker: DetectionTracker,
    feedback: Feedback,
    sink: Box<dyn PhaseSink>,
    phase: Phase,
    result: GameResult,
    /// Stamped when `Init` runs; the sole basis for elapsed time.
    game_start: Duration,
    elapsed: Duration,
    /// Absolute end of the current light phase.
    deadline: Duration,
}

impl GameMachine {
    pub fn new(
        time_limit: Duration,
        clock: Box<dyn Clock>,
        scheduler: LightScheduler,
        tracker: DetectionTracker,
        feedback: Feedback,
        sink: Box<dyn PhaseSink>,
    ) -> Self {
        Self {
            time_limit,
            clock,
            scheduler,
            tracker,
            feedback,
            sink,
            phase: Phase::Instructions,
            result: GameResult::Unset,
            game_start: Duration::ZERO,
            elapsed: Duration::ZERO,
            deadline: Duration::ZERO,
        }
    }

    /// Feed one detector frame into the tracker, stamped with the arbiter
    /// clock. Safe to call in any phase; the scripted phases simply never
    /// consult the tracker.
    pub fn ingest(&mut self, frame: &DetectionFrame) {
        let stamp = self.clock.now();
        self.tracker
            .ingest(frame, stamp, self.phase == Phase::RedLight);
    }

    /// One control-loop invocation.
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            Phase::Instructions => {
                self.run_instructions();
                TickOutcome::Continue
            }
            Phase::Countdown => {
                self.run_countdown();
                TickOutcome::Continue
            }
            Phase::Init => {
                self.start_game();
                TickOutcome::Continue
            }
            Phase::GreenLight => self.light_tick(LightPhase::Green),
            Phase::RedLight => self.light_tick(LightPhase::Red),
            // Terminal: nothing left to do, nothing is re-published.
            Phase::GameOver => TickOutcome::Finished(self.result),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Elapsed game time as of the last tick in a light phase.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn tracker(&self) -> &DetectionTracker {
        &self.tracker
    }

    /// Blocking: speaks the whole script, then turns away from the player.
    fn run_instructions(&mut self) {
        self.feedback
            .say_lines(&INSTRUCTION_SCRIPT, INSTRUCTION_PAUSE);
        self.feedback.rotate180();
        self.set_phase(Phase::Countdown);
    }

    /// Blocking: 3, 2, 1 with one-second pauses.
    fn run_countdown(&mut self) {
        self.feedback.say_lines(&["3", "2", "1"], COUNTDOWN_PAUSE);
        self.set_phase(Phase::Init);
    }

    fn start_game(&mut self) {
        self.game_start = self.clock.now();
        self.elapsed = Duration::ZERO;
        log::info!(
            "game starting, time limit {:.0}s",
            self.time_limit.as_secs_f64()
        );
        let first = self.scheduler.first();
        self.enter_light(first);
    }

    /// Atomic light-phase entry: phase, timing, audio cue, publication and
    /// (red only) tracker interval reset all happen within this tick.
    fn enter_light(&mut self, light: LightPhase) {
        let duration = self.scheduler.draw_duration();
        self.deadline = self.clock.now() + duration;
        match light {
            LightPhase::Green => {
                self.phase = Phase::GreenLight;
                self.feedback.play(SoundClip::GreenLight);
            }
            LightPhase::Red => {
                self.phase = Phase::RedLight;
                self.feedback.play(SoundClip::RedLight);
            }
        }
        log::info!(
            "{} start, duration {:.2}s",
            self.phase,
            duration.as_secs_f64()
        );
        self.publish();
        if light == LightPhase::Red {
            self.tracker.begin_red_light();
        }
    }

    fn light_tick(&mut self, light: LightPhase) -> TickOutcome {
        let now = self.clock.now();
        self.elapsed = now.saturating_sub(self.game_start);

        if self.elapsed >= self.time_limit {
            log::info!("time limit reached, player loses");
            return self.finish(GameResult::Lose);
        }

        match light {
            LightPhase::Green => {
                if self.tracker.finish_line_reached() {
                    log::info!("player reached the finish line, player wins");
                    return self.finish(GameResult::Win);
                }
            }
            LightPhase::Red => {
                if self.tracker.player_moved() {
                    log::info!("player moved during {}, player loses", self.phase);
                    // Rotation and elimination feedback precede the
                    // transition; the game clock keeps running underneath.
                    self.feedback.rotate180();
                    return self.finish(GameResult::Lose);
                }
            }
        }

        if now >= self.deadline {
            log::info!("{} end", self.phase);
            let next = self.scheduler.after(light);
            self.enter_light(next);
        }
        TickOutcome::Continue
    }

    /// Transition into the terminal phase. The result is written here,
    /// exactly once; the final update is published exactly once.
    fn finish(&mut self, result: GameResult) -> TickOutcome {
        self.result = result;
        match result {
            GameResult::Win => self.feedback.speak(WIN_LINE),
            _ => {
                self.feedback.play(SoundClip::Lose);
                self.feedback.speak(LOSE_LINE);
            }
        }
        self.set_phase(Phase::GameOver);
        TickOutcome::Finished(result)
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.publish();
    }

    fn publish(&mut self) {
        let update = PhaseUpdate {
            phase: self.phase,
            result: self.result,
        };
        if let Err(e) = self.sink.publish(update) {
            log::warn!("phase publication failed: {}", e);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
