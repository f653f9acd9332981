//! demo - end-to-end synthetic game for the Red Light, Green Light arbiter
//!
//! Runs a full game against the stub detector on a hand-driven clock, so a
//! complete round finishes instantly and reproducibly. A cautious player
//! (small per-frame growth) survives red lights and wins at the finish
//! line; a reckless one (growth above the movement threshold) is eliminated
//! at the first red-light comparison.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use redlight_arbiter::feedback::Recorder;
use redlight_arbiter::{
    ClipMap, DetectionTracker, DetectorSource, Feedback, GameMachine, LightScheduler, ManualClock,
    Phase, RecordingSink, StubConfig, StubSource, TickOutcome,
};

const DEFAULT_PERSON_CLASS: &str = "15";
const MOVEMENT_THRESHOLD: f64 = 10.0;
const FINISH_LINE_SIZE_Y: f64 = 400.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Deterministic scheduler seed.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Game time limit in seconds.
    #[arg(long, default_value_t = 120.0)]
    time_limit: f64,
    /// Bounding-box growth per frame. Keep it at or below the movement
    /// threshold (10.0) to survive red lights; exceed it to get eliminated.
    #[arg(long, default_value_t = 4.0)]
    growth: f64,
    /// Control tick period in milliseconds.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.time_limit <= 0.0 {
        return Err(anyhow!("time limit must be positive"));
    }
    if args.tick_ms == 0 {
        return Err(anyhow!("tick period must be positive"));
    }

    stage("build machine + stub detector");
    let clock = ManualClock::new();
    let recorder = Recorder::new();
    let sink = RecordingSink::new();
    let feedback = Feedback::new(
        Box::new(recorder.speech()),
        Box::new(recorder.audio()),
        Box::new(recorder.motor()),
        Box::new(clock.clone()),
        ClipMap::default(),
        0.5,
    );
    let scheduler = LightScheduler::new(
        Duration::from_secs(2),
        Duration::from_secs(5),
        Some(args.seed),
    );
    let tracker = DetectionTracker::new(DEFAULT_PERSON_CLASS, MOVEMENT_THRESHOLD, FINISH_LINE_SIZE_Y);
    let mut machine = GameMachine::new(
        Duration::from_secs_f64(args.time_limit),
        Box::new(clock.clone()),
        scheduler,
        tracker,
        feedback,
        Box::new(sink.clone()),
    );

    let mut source = StubSource::new(StubConfig {
        person_class: DEFAULT_PERSON_CLASS.to_string(),
        target_fps: 0,
        growth_per_frame: args.growth,
        ..StubConfig::default()
    });
    source.connect()?;

    stage("run game");
    let tick_period = Duration::from_millis(args.tick_ms);
    let mut ticks = 0u64;
    let mut frames = 0u64;
    let result = loop {
        // One synthetic frame per tick, like a detector matching the loop
        // rate.
        if let Some(frame) = source.next_frame()? {
            machine.ingest(&frame);
            frames += 1;
        }
        match machine.tick() {
            TickOutcome::Finished(result) => break result,
            TickOutcome::Continue => {}
        }
        clock.advance(tick_period);
        ticks += 1;
        if ticks > 10_000_000 {
            return Err(anyhow!("demo did not terminate"));
        }
    };

    let updates = sink.updates();
    let lights = updates
        .iter()
        .filter(|u| matches!(u.phase, Phase::GreenLight | Phase::RedLight))
        .count();

    println!("demo summary:");
    println!("  result: {}", result);
    println!("  game time: {:.1}s", machine.elapsed().as_secs_f64());
    println!("  ticks: {}", ticks);
    println!("  frames ingested: {}", frames);
    println!("  light phases entered: {}", lights);
    println!("  phase updates: {}", updates.len());
    println!("  feedback calls: {}", recorder.calls().len());
    println!("next steps:");
    println!("  cargo run --bin demo -- --growth 12    # reckless player");
    println!("  cargo run --bin arbiterd               # live daemon");

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
