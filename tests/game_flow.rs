//! End-to-end game scenarios through the public crate surface: a scripted
//! detector stream, a hand-driven clock, recording feedback and sink.

use std::time::Duration;

use redlight_arbiter::feedback::{FeedbackCall, Recorder};
use redlight_arbiter::{
    build_machine, ArbiterConfig, BoundingBox, ClipMap, DetectionFrame, DetectorSource, Feedback,
    GameMachine, GameResult, GameSettings, ManualClock, Phase, RawDetection, RecordingSink,
    SourceSettings, StubConfig, StubSource, TickOutcome,
};

const TICK: Duration = Duration::from_millis(100);

fn reference_config(seed: u64) -> ArbiterConfig {
    ArbiterConfig {
        game: GameSettings {
            time_limit: Duration::from_secs(120),
            movement_threshold: 10.0,
            finish_line_size_y: 400.0,
            interval_min: Duration::from_secs(2),
            interval_max: Duration::from_secs(5),
            rotation_speed: 0.5,
            tick_period: TICK,
            person_class: "15".to_string(),
            rng_seed: Some(seed),
        },
        source: SourceSettings::default(),
        clips: ClipMap::default(),
    }
}

struct Rig {
    machine: GameMachine,
    clock: ManualClock,
    recorder: Recorder,
    sink: RecordingSink,
}

fn rig(seed: u64) -> Rig {
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
    let machine = build_machine(
        &reference_config(seed),
        feedback,
        Box::new(sink.clone()),
        Box::new(clock.clone()),
    );
    Rig {
        machine,
        clock,
        recorder,
        sink,
    }
}

fn person_frame(center_x: f64, center_y: f64, size_x: f64, size_y: f64) -> DetectionFrame {
    DetectionFrame {
        detections: vec![RawDetection {
            class_id: "15".to_string(),
            score: 0.9,
            bbox: BoundingBox {
                center_x,
                center_y,
                size_x,
                size_y,
            },
        }],
    }
}

fn run_pregame(rig: &mut Rig) {
    for _ in 0..3 {
        assert_eq!(rig.machine.tick(), TickOutcome::Continue);
    }
    assert!(matches!(
        rig.machine.phase(),
        Phase::GreenLight | Phase::RedLight
    ));
}

fn reach_phase(rig: &mut Rig, phase: Phase) {
    for _ in 0..1000 {
        if rig.machine.phase() == phase {
            return;
        }
        rig.clock.advance(TICK);
        assert_eq!(rig.machine.tick(), TickOutcome::Continue);
    }
    panic!("never reached {}", phase);
}

/// Run a full game against the stub detector, one frame per tick, until it
/// finishes. Returns the result and the number of ticks taken.
fn run_stub_game(seed: u64, growth: f64, sway: f64) -> (Rig, GameResult, u64) {
    let mut r = rig(seed);
    let mut source = StubSource::new(StubConfig {
        target_fps: 0,
        growth_per_frame: growth,
        sway,
        ..StubConfig::default()
    });
    source.connect().expect("stub connect");

    let mut ticks = 0u64;
    loop {
        if let Some(frame) = source.next_frame().expect("stub frame") {
            r.machine.ingest(&frame);
        }
        match r.machine.tick() {
            TickOutcome::Finished(result) => return (r, result, ticks),
            TickOutcome::Continue => {}
        }
        r.clock.advance(TICK);
        ticks += 1;
        assert!(ticks < 100_000, "game must terminate");
    }
}

#[test]
fn cautious_player_wins_at_the_finish_line() {
    // Growth 4.0 stays under the movement threshold, so red lights pass
    // harmlessly and the box reaches the finish-line height.
    let (r, result, _) = run_stub_game(7, 4.0, 0.0);
    assert_eq!(result, GameResult::Win);
    assert!(r.machine.tracker().finish_line_reached());

    let updates = r.sink.updates();
    let last = updates.last().expect("final update");
    assert_eq!(last.phase, Phase::GameOver);
    assert_eq!(last.result, GameResult::Win);
}

#[test]
fn reckless_player_is_eliminated_at_a_red_light() {
    // Sway 8.0 flips center_x by 16 between consecutive frames, beyond the
    // movement threshold, while the slow approach keeps the finish line out
    // of reach. Whatever the schedule, the first red light (at the latest
    // after the first green) eliminates.
    let (r, result, _) = run_stub_game(7, 2.0, 8.0);
    assert_eq!(result, GameResult::Lose);
    assert!(r.machine.tracker().player_moved());

    // Elimination drives the rotation maneuver before the lose cue.
    let calls = r.recorder.calls();
    let lose_cue = calls
        .iter()
        .position(|c| matches!(c, FeedbackCall::Played(id) if id == "clip:lose"))
        .expect("lose cue played");
    let last_drive = calls
        .iter()
        .rposition(|c| matches!(c, FeedbackCall::Drove(_)))
        .expect("rotation commanded");
    assert!(last_drive < lose_cue);
}

#[test]
fn absent_player_times_out_and_loses() {
    let mut r = rig(3);
    run_pregame(&mut r);

    let mut outcome = TickOutcome::Continue;
    for _ in 0..2000 {
        r.machine.ingest(&DetectionFrame::default());
        r.clock.advance(TICK);
        outcome = r.machine.tick();
        if outcome != TickOutcome::Continue {
            break;
        }
    }
    assert_eq!(outcome, TickOutcome::Finished(GameResult::Lose));
    assert!(r.machine.elapsed() >= Duration::from_secs(120));
}

#[test]
fn finish_line_scenario_from_reference_tuning() {
    // size_y 450 >= threshold 400 during green: the very next tick wins.
    let mut r = rig(3);
    run_pregame(&mut r);
    reach_phase(&mut r, Phase::GreenLight);

    r.machine.ingest(&person_frame(320.0, 240.0, 150.0, 450.0));
    r.clock.advance(TICK);
    assert_eq!(r.machine.tick(), TickOutcome::Finished(GameResult::Win));
}

#[test]
fn movement_scenario_from_reference_tuning() {
    // prev (100,100) 50x80 -> curr (100,100) 50x95: delta_size_y 15 > 10,
    // so the next tick loses.
    let mut r = rig(3);
    run_pregame(&mut r);
    reach_phase(&mut r, Phase::RedLight);

    r.machine.ingest(&person_frame(100.0, 100.0, 50.0, 80.0));
    r.clock.advance(TICK);
    assert_eq!(r.machine.tick(), TickOutcome::Continue);

    r.machine.ingest(&person_frame(100.0, 100.0, 50.0, 95.0));
    r.clock.advance(TICK);
    assert_eq!(r.machine.tick(), TickOutcome::Finished(GameResult::Lose));
}

#[test]
fn game_over_is_terminal_through_the_public_surface() {
    let (mut r, result, _) = run_stub_game(11, 4.0, 0.0);
    let published = r.sink.updates().len();

    for _ in 0..20 {
        r.clock.advance(Duration::from_secs(1));
        r.machine.ingest(&person_frame(0.0, 0.0, 999.0, 999.0));
        assert_eq!(r.machine.tick(), TickOutcome::Finished(result));
        assert_eq!(r.machine.phase(), Phase::GameOver);
    }
    assert_eq!(r.sink.updates().len(), published);
}

#[test]
fn publication_sequence_covers_the_timeline() {
    let (r, _, _) = run_stub_game(5, 4.0, 0.0);
    let phases: Vec<Phase> = r.sink.updates().iter().map(|u| u.phase).collect();

    assert_eq!(phases[0], Phase::Countdown);
    assert_eq!(phases[1], Phase::Init);
    assert!(matches!(phases[2], Phase::GreenLight | Phase::RedLight));
    assert_eq!(*phases.last().expect("final"), Phase::GameOver);
    // Exactly one terminal publication.
    assert_eq!(
        phases.iter().filter(|p| **p == Phase::GameOver).count(),
        1
    );
}
