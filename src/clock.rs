//! Monotonic time for the game loop.
//!
//! All elapsed-time and deadline arithmetic in the arbiter runs on a
//! `Clock`, never on wall time. Blocking feedback calls (speech, rotation)
//! therefore cannot skew the game timer: elapsed time is recomputed from the
//! game-start instant on every tick, regardless of how long a tick took.
//!
//! `ManualClock` exists so tests can drive time explicitly. It also
//! implements `Sleeper`, advancing itself instead of blocking, which keeps
//! scripted sequences (instruction pauses, the rotation maneuver) both fast
//! and deterministic under test.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time provider. `now()` is an offset from an arbitrary origin
/// fixed at construction; only differences between readings are meaningful.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Blocking pause used by scripted feedback sequences.
pub trait Sleeper: Send {
    fn sleep(&self, duration: Duration);
}

/// Production clock backed by `Instant`.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Production sleeper backed by `std::thread::sleep`.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hand-driven clock for tests.
///
/// Clones share the same underlying time, so one handle can advance the
/// clock while the machine under test reads it. As a `Sleeper` it advances
/// itself by the requested duration, preserving game-time semantics for
/// blocking sequences without real waiting.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock lock poisoned");
        *now += by;
    }

    pub fn set(&self, to: Duration) {
        let mut now = self.now.lock().expect("manual clock lock poisoned");
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().expect("manual clock lock poisoned")
    }
}

impl Sleeper for ManualClock {
    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
