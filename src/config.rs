use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::feedback::ClipMap;

const DEFAULT_TIME_LIMIT_SECS: f64 = 120.0;
const DEFAULT_MOVEMENT_THRESHOLD: f64 = 10.0;
const DEFAULT_FINISH_LINE_SIZE_Y: f64 = 400.0;
const DEFAULT_INTERVAL_MIN_SECS: f64 = 2.0;
const DEFAULT_INTERVAL_MAX_SECS: f64 = 5.0;
const DEFAULT_ROTATION_SPEED: f64 = 0.5;
const DEFAULT_TICK_PERIOD_MS: u64 = 100;
const DEFAULT_PERSON_CLASS: &str = "15";
const DEFAULT_SOURCE_KIND: &str = "stub";
const DEFAULT_SOURCE_FPS: u32 = 10;

#[derive(Debug, Deserialize, Default)]
struct ArbiterConfigFile {
    game: Option<GameConfigFile>,
    source: Option<SourceConfigFile>,
    clips: Option<ClipConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct GameConfigFile {
    time_limit_secs: Option<f64>,
    movement_threshold: Option<f64>,
    finish_line_size_y: Option<f64>,
    interval_min_secs: Option<f64>,
    interval_max_secs: Option<f64>,
    rotation_speed: Option<f64>,
    tick_period_ms: Option<u64>,
    person_class: Option<String>,
    rng_seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    kind: Option<String>,
    path: Option<String>,
    addr: Option<String>,
    fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClipConfigFile {
    green_light: Option<String>,
    red_light: Option<String>,
    lose: Option<String>,
}

/// Everything the arbiter can be tuned with. Loaded once at startup, never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct ArbiterConfig {
    pub game: GameSettings,
    pub source: SourceSettings,
    pub clips: ClipMap,
}

#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Global game duration limit.
    pub time_limit: Duration,
    /// Max per-axis bbox displacement tolerated during red light.
    pub movement_threshold: f64,
    /// Bbox height that counts as reaching the finish line.
    pub finish_line_size_y: f64,
    /// Bounds for each light phase's random duration.
    pub interval_min: Duration,
    pub interval_max: Duration,
    /// Angular speed of the rotation maneuver, rad/s.
    pub rotation_speed: f64,
    /// Control-loop cadence.
    pub tick_period: Duration,
    /// Detector class id treated as the player.
    pub person_class: String,
    /// Fixed scheduler seed; `None` uses OS entropy.
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// "stub", "file" or "tcp".
    pub kind: String,
    pub path: Option<String>,
    pub addr: Option<String>,
    pub fps: u32,
    pub person_class: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: DEFAULT_SOURCE_KIND.to_string(),
            path: None,
            addr: None,
            fps: DEFAULT_SOURCE_FPS,
            person_class: DEFAULT_PERSON_CLASS.to_string(),
        }
    }
}

impl ArbiterConfig {
    /// Load from the JSON file named by `ARBITER_CONFIG` (if set), apply
    /// env overrides, validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ARBITER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ArbiterConfigFile) -> Result<Self> {
        let game_file = file.game.unwrap_or_default();
        let person_class = game_file
            .person_class
            .unwrap_or_else(|| DEFAULT_PERSON_CLASS.to_string());
        let game = GameSettings {
            time_limit: positive_secs(
                "time limit",
                game_file.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS),
            )?,
            movement_threshold: game_file
                .movement_threshold
                .unwrap_or(DEFAULT_MOVEMENT_THRESHOLD),
            finish_line_size_y: game_file
                .finish_line_size_y
                .unwrap_or(DEFAULT_FINISH_LINE_SIZE_Y),
            interval_min: positive_secs(
                "interval minimum",
                game_file
                    .interval_min_secs
                    .unwrap_or(DEFAULT_INTERVAL_MIN_SECS),
            )?,
            interval_max: positive_secs(
                "interval maximum",
                game_file
                    .interval_max_secs
                    .unwrap_or(DEFAULT_INTERVAL_MAX_SECS),
            )?,
            rotation_speed: game_file.rotation_speed.unwrap_or(DEFAULT_ROTATION_SPEED),
            tick_period: Duration::from_millis(
                game_file.tick_period_ms.unwrap_or(DEFAULT_TICK_PERIOD_MS),
            ),
            person_class: person_class.clone(),
            rng_seed: game_file.rng_seed,
        };
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            kind: source_file
                .kind
                .unwrap_or_else(|| DEFAULT_SOURCE_KIND.to_string()),
            path: source_file.path,
            addr: source_file.addr,
            fps: source_file.fps.unwrap_or(DEFAULT_SOURCE_FPS),
            person_class,
        };
        let clip_file = file.clips.unwrap_or_default();
        let defaults = ClipMap::default();
        let clips = ClipMap {
            green_light: clip_file.green_light.unwrap_or(defaults.green_light),
            red_light: clip_file.red_light.unwrap_or(defaults.red_light),
            lose: clip_file.lose.unwrap_or(defaults.lose),
        };
        Ok(Self {
            game,
            source,
            clips,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(secs) = std::env::var("ARBITER_TIME_LIMIT_SECS") {
            let secs: f64 = secs
                .parse()
                .map_err(|_| anyhow!("ARBITER_TIME_LIMIT_SECS must be a number of seconds"))?;
            self.game.time_limit = positive_secs("ARBITER_TIME_LIMIT_SECS", secs)?;
        }
        if let Ok(ms) = std::env::var("ARBITER_TICK_PERIOD_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| anyhow!("ARBITER_TICK_PERIOD_MS must be an integer"))?;
            self.game.tick_period = Duration::from_millis(ms);
        }
        if let Ok(seed) = std::env::var("ARBITER_RNG_SEED") {
            let seed: u64 = seed
                .parse()
                .map_err(|_| anyhow!("ARBITER_RNG_SEED must be an integer"))?;
            self.game.rng_seed = Some(seed);
        }
        if let Ok(class) = std::env::var("ARBITER_PERSON_CLASS") {
            if !class.trim().is_empty() {
                self.game.person_class = class.clone();
                self.source.person_class = class;
            }
        }
        if let Ok(kind) = std::env::var("ARBITER_SOURCE") {
            if !kind.trim().is_empty() {
                self.source.kind = kind;
            }
        }
        if let Ok(path) = std::env::var("ARBITER_SOURCE_PATH") {
            if !path.trim().is_empty() {
                self.source.path = Some(path);
            }
        }
        if let Ok(addr) = std::env::var("ARBITER_SOURCE_ADDR") {
            if !addr.trim().is_empty() {
                self.source.addr = Some(addr);
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.game.movement_threshold <= 0.0 {
            return Err(anyhow!("movement threshold must be greater than zero"));
        }
        if self.game.finish_line_size_y <= 0.0 {
            return Err(anyhow!("finish line size must be greater than zero"));
        }
        if self.game.interval_max < self.game.interval_min {
            return Err(anyhow!("interval maximum must not be below the minimum"));
        }
        if self.game.rotation_speed <= 0.0 {
            return Err(anyhow!("rotation speed must be greater than zero"));
        }
        if self.game.tick_period.is_zero() {
            return Err(anyhow!("tick period must be greater than zero"));
        }
        if self.game.person_class.trim().is_empty() {
            return Err(anyhow!("person class must not be empty"));
        }
        match self.source.kind.as_str() {
            "stub" | "file" | "tcp" => {}
            other => return Err(anyhow!("unknown detection source kind '{}'", other)),
        }
        self.clips.validate()?;
        Ok(())
    }
}

fn positive_secs(name: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(anyhow!("{} must be a positive number of seconds", name));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn read_config_file(path: &Path) -> Result<ArbiterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
