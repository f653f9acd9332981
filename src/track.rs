//! Player tracking from per-frame detections.
//!
//! This module turns the detector's raw frame stream into the two signals
//! the game machine consumes:
//! - a sticky finish-line flag (bounding box tall enough = player arrived)
//! - a sticky per-red-light movement flag (frame-to-frame displacement)
//!
//! The tracker is responsible for:
//! - Selecting one candidate per frame (person class, tallest box)
//! - Stamping the selection with a monotonic capture timestamp
//! - Comparing consecutive selections while a red light is active
//!
//! The tracker MUST NOT:
//! - Treat an empty or person-free frame as "target lost" (the previous
//!   selection is retained)
//! - Carry a movement baseline across red-light intervals (entry into
//!   red light clears it, so motion inherited from a green phase can never
//!   eliminate the player on the first red-light frame)

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Wire types
// ----------------------------------------------------------------------------

/// Axis-aligned bounding box as reported by the detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center_x: f64,
    pub center_y: f64,
    pub size_x: f64,
    pub size_y: f64,
}

/// One raw detection inside a frame: a class hypothesis plus its box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: String,
    #[serde(default)]
    pub score: f32,
    pub bbox: BoundingBox,
}

/// One detector frame. Frames may be empty; only arrival order is
/// guaranteed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// The frame's selected candidate, stamped at ingest. Immutable once
/// produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: String,
    pub bbox: BoundingBox,
    /// Monotonic capture timestamp (arbiter clock, not detector time).
    pub stamp: Duration,
}

/// Absolute frame-to-frame displacement, kept for diagnostics after a
/// movement trip.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementDeltas {
    pub center_x: f64,
    pub center_y: f64,
    pub size_x: f64,
    pub size_y: f64,
}

impl MovementDeltas {
    pub fn between(prev: &BoundingBox, curr: &BoundingBox) -> Self {
        Self {
            center_x: (curr.center_x - prev.center_x).abs(),
            center_y: (curr.center_y - prev.center_y).abs(),
            size_x: (curr.size_x - prev.size_x).abs(),
            size_y: (curr.size_y - prev.size_y).abs(),
        }
    }

    /// True when any single delta strictly exceeds the threshold.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.center_x > threshold
            || self.center_y > threshold
            || self.size_x > threshold
            || self.size_y > threshold
    }
}

// ----------------------------------------------------------------------------
// Tracker
// ----------------------------------------------------------------------------

/// Frame-to-frame tracker for the single monitored player.
pub struct DetectionTracker {
    person_class: String,
    movement_threshold: f64,
    finish_line_size_y: f64,
    current: Option<Detection>,
    previous: Option<Detection>,
    player_moved: bool,
    finish_line_reached: bool,
    last_deltas: Option<MovementDeltas>,
}

impl DetectionTracker {
    pub fn new(person_class: &str, movement_threshold: f64, finish_line_size_y: f64) -> Self {
        Self {
            person_class: person_class.to_string(),
            movement_threshold,
            finish_line_size_y,
            current: None,
            previous: None,
            player_moved: false,
            finish_line_reached: false,
            last_deltas: None,
        }
    }

    /// Ingest one frame. `red_light_active` gates the movement comparison;
    /// the finish-line check runs in every phase.
    ///
    /// Candidate selection: person-class detections only, largest `size_y`
    /// wins, ties keep the first seen (strict greater-than).
    pub fn ingest(&mut self, frame: &DetectionFrame, stamp: Duration, red_light_active: bool) {
        let mut best: Option<&RawDetection> = None;
        let mut best_size_y = 0.0f64;
        for det in &frame.detections {
            if det.class_id != self.person_class {
                continue;
            }
            if det.bbox.size_y > best_size_y {
                best_size_y = det.bbox.size_y;
                best = Some(det);
            }
        }

        // No person in this frame: not an error, not "target lost".
        let Some(selected) = best else {
            return;
        };

        let detection = Detection {
            class_id: selected.class_id.clone(),
            bbox: selected.bbox,
            stamp,
        };

        if detection.bbox.size_y >= self.finish_line_size_y {
            self.finish_line_reached = true;
        }

        if red_light_active {
            if let Some(prev) = &self.previous {
                let deltas = MovementDeltas::between(&prev.bbox, &detection.bbox);
                if deltas.exceeds(self.movement_threshold) {
                    self.player_moved = true;
                    self.last_deltas = Some(deltas);
                    log::info!(
                        "movement detected: dx={:.1} dy={:.1} dsize_x={:.1} dsize_y={:.1}",
                        deltas.center_x,
                        deltas.center_y,
                        deltas.size_x,
                        deltas.size_y
                    );
                }
            }
            // The baseline only exists inside a red-light interval; it is
            // cleared on entry and only read here, so tracking it in other
            // phases would be unobservable.
            self.previous = Some(detection.clone());
        }

        self.current = Some(detection);
    }

    /// Reset per-interval state. Called on every entry into red light.
    pub fn begin_red_light(&mut self) {
        self.previous = None;
        self.player_moved = false;
        self.last_deltas = None;
    }

    /// Latest selected detection, if any frame has produced one.
    pub fn snapshot(&self) -> Option<&Detection> {
        self.current.as_ref()
    }

    /// Sticky within the current red-light interval.
    pub fn player_moved(&self) -> bool {
        self.player_moved
    }

    /// Sticky for the lifetime of the game.
    pub fn finish_line_reached(&self) -> bool {
        self.finish_line_reached
    }

    /// Deltas recorded when the movement flag tripped.
    pub fn last_deltas(&self) -> Option<MovementDeltas> {
        self.last_deltas
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
