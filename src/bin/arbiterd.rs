//! arbiterd - Red Light, Green Light arbiter daemon
//!
//! This daemon:
//! 1. Loads configuration (JSON file + ARBITER_* env overrides)
//! 2. Spawns the configured detection source on its own thread, feeding a
//!    channel
//! 3. Ticks the game machine at the configured cadence, draining buffered
//!    frames before each tick
//! 4. Publishes phase changes as JSON lines on stdout (and to the log)
//! 5. Stops when the game ends or on Ctrl-C

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Result;

use redlight_arbiter::{
    build_machine, ingest, ArbiterConfig, FanoutSink, Feedback, JsonlSink, LogSink,
    MonotonicClock, TickOutcome,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = ArbiterConfig::load()?;
    log::info!(
        "arbiterd starting: time limit {:.0}s, tick {}ms, source {}",
        cfg.game.time_limit.as_secs_f64(),
        cfg.game.tick_period.as_millis(),
        cfg.source.kind
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let mut source = ingest::build_source(&cfg.source)?;
    source.connect()?;

    // Frames buffer here while the machine is inside a blocking feedback
    // action; they drain in arrival order before the next tick.
    let (frame_tx, frame_rx) = mpsc::channel();
    let source_running = running.clone();
    thread::spawn(move || {
        while source_running.load(Ordering::SeqCst) {
            match source.next_frame() {
                Ok(Some(frame)) => {
                    if frame_tx.send(frame).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("detection source exhausted");
                    break;
                }
                Err(e) => {
                    log::error!("detection source failed: {}", e);
                    break;
                }
            }
        }
        let stats = source.stats();
        log::info!(
            "source {} delivered {} frames",
            stats.source,
            stats.frames_captured
        );
    });

    let feedback = Feedback::console(cfg.clips.clone(), cfg.game.rotation_speed);
    let sink = FanoutSink::new(vec![
        Box::new(LogSink),
        Box::new(JsonlSink::new(std::io::stdout())),
    ]);
    let mut machine = build_machine(
        &cfg,
        feedback,
        Box::new(sink),
        Box::new(MonotonicClock::new()),
    );

    while running.load(Ordering::SeqCst) {
        while let Ok(frame) = frame_rx.try_recv() {
            machine.ingest(&frame);
        }

        match machine.tick() {
            TickOutcome::Finished(result) => {
                log::info!(
                    "game over: {} after {:.1}s",
                    result,
                    machine.elapsed().as_secs_f64()
                );
                break;
            }
            TickOutcome::Continue => {}
        }

        thread::sleep(cfg.game.tick_period);
    }

    running.store(false, Ordering::SeqCst);
    Ok(())
}
