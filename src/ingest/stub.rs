//! Synthetic detection source.
//!
//! Simulates a single player walking toward the camera: the bounding box
//! grows by a fixed amount per frame, with an optional side-to-side sway.
//! With a small growth the player survives red lights and eventually fills
//! the finish-line threshold; with a growth above the movement threshold the
//! first red-light comparison eliminates them. Useful for the demo binary
//! and for exercising the full pipeline without a detector.

use std::time::Duration;

use anyhow::Result;

use super::{DetectorSource, SourceStats};
use crate::track::{BoundingBox, DetectionFrame, RawDetection};

#[derive(Clone, Debug)]
pub struct StubConfig {
    pub person_class: String,
    /// Frames per second; 0 disables pacing (tests).
    pub target_fps: u32,
    /// Bounding-box height of the first frame.
    pub start_size_y: f64,
    /// Height gained per frame as the player approaches.
    pub growth_per_frame: f64,
    /// Horizontal sway amplitude; alternates sign each frame.
    pub sway: f64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            person_class: "15".to_string(),
            target_fps: 10,
            start_size_y: 80.0,
            growth_per_frame: 2.0,
            sway: 0.0,
        }
    }
}

pub struct StubSource {
    config: StubConfig,
    frame_count: u64,
}

impl StubSource {
    pub fn new(config: StubConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }
}

impl DetectorSource for StubSource {
    fn connect(&mut self) -> Result<()> {
        log::info!(
            "StubSource: synthetic player, growth {:.1}/frame at {} fps",
            self.config.growth_per_frame,
            self.config.target_fps
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<DetectionFrame>> {
        if self.config.target_fps > 0 {
            std::thread::sleep(Duration::from_secs_f64(
                1.0 / f64::from(self.config.target_fps),
            ));
        }

        let n = self.frame_count;
        self.frame_count += 1;

        let size_y = self.config.start_size_y + self.config.growth_per_frame * n as f64;
        let sway = if n % 2 == 0 {
            self.config.sway
        } else {
            -self.config.sway
        };

        Ok(Some(DetectionFrame {
            detections: vec![RawDetection {
                class_id: self.config.person_class.clone(),
                score: 0.9,
                bbox: BoundingBox {
                    center_x: 320.0 + sway,
                    center_y: 240.0,
                    size_x: size_y * 0.4,
                    size_y,
                },
            }],
        }))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: "stub://player".to_string(),
        }
    }
}
