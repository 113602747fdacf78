use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MIN_DURATION_SECS: u32 = 10;
pub const MAX_DURATION_SECS: u32 = 120;
pub const DURATION_STEP_SECS: u32 = 5;
pub const DEFAULT_DURATION_SECS: u32 = 30;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Posture {
    #[default]
    Standing,
    Sitting,
}

impl Posture {
    /// Multiplier applied to the horizontal ball offset.
    pub fn scale(self) -> f64 {
        match self {
            Posture::Standing => 1.0,
            Posture::Sitting => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    /// Vertical lift of the ball above the hip line, in pixels.
    pub fn offset(self) -> f64 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Medium => 15.0,
            Difficulty::Hard => 30.0,
        }
    }

    /// Maps any level onto 1..=3, clamping out-of-range values.
    pub fn from_level_clamped(level: i64) -> Self {
        match level {
            1 => Difficulty::Easy,
            2 => Difficulty::Medium,
            3 => Difficulty::Hard,
            i64::MIN..=0 => {
                warn!(level, "difficulty below range, clamped to 1");
                Difficulty::Easy
            }
            _ => {
                warn!(level, "difficulty above range, clamped to 3");
                Difficulty::Hard
            }
        }
    }
}

impl From<i64> for Difficulty {
    fn from(level: i64) -> Self {
        Difficulty::from_level_clamped(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.level()
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Clamps a session length into the supported range and snaps it to the
/// nearest 5-second step.
pub fn clamp_duration(secs: i64) -> u32 {
    let step = i64::from(DURATION_STEP_SECS);
    let clamped = secs.clamp(i64::from(MIN_DURATION_SECS), i64::from(MAX_DURATION_SECS));
    let snapped = (clamped + step / 2) / step * step;
    if snapped != secs {
        warn!(requested = secs, clamped = snapped, "session duration out of range");
    }
    // bounds are multiples of the step, so this stays within 10..=120
    snapped as u32
}

fn clamped_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    i64::deserialize(deserializer).map(clamp_duration)
}

/// Next longer duration on the 5-second ladder.
pub fn step_up(secs: u32) -> u32 {
    (secs + DURATION_STEP_SECS).min(MAX_DURATION_SECS)
}

/// Next shorter duration on the 5-second ladder.
pub fn step_down(secs: u32) -> u32 {
    secs.saturating_sub(DURATION_STEP_SECS).max(MIN_DURATION_SECS)
}

/// Immutable per-session settings handed to the session controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub posture: Posture,
    pub difficulty: Difficulty,
    pub duration_secs: u32,
    pub tuning: EngineTuning,
}

impl SessionConfig {
    pub fn new(posture: Posture, difficulty: Difficulty, duration_secs: u32) -> Self {
        Self {
            posture,
            difficulty,
            duration_secs: clamp_duration(duration_secs.into()),
            tuning: EngineTuning::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: EngineTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Posture::Standing, Difficulty::Easy, DEFAULT_DURATION_SECS)
    }
}

/// Hit-zone geometry and timing for kick detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub hit_radius: f64,
    pub hold_time: f64,
    pub min_kick_interval: f64,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            hit_radius: crate::ball::BALL_RADIUS,
            hold_time: 0.5,
            min_kick_interval: 0.3,
        }
    }
}

/// Settings persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub posture: Posture,
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "clamped_duration")]
    pub duration_secs: u32,
    pub mirror: bool,
    pub tuning: EngineTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            posture: Posture::Standing,
            difficulty: Difficulty::Easy,
            duration_secs: DEFAULT_DURATION_SECS,
            mirror: true,
            tuning: EngineTuning::default(),
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.posture, self.difficulty, self.duration_secs)
            .with_tuning(self.tuning)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "kickr") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("kickr_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(path = %self.path.display(), error = %e, "ignoring unreadable config"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
