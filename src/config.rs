use crate::error::{GameError, GameResult};
use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;

// Judging
pub const HIT_WINDOW: f32 = 0.25; // seconds on either side of the beat

// Schedule
pub const SCHEDULE_START_DELAY: f32 = 2.5;
pub const SCHEDULE_TAIL_BUFFER: f32 = 1.5;
pub const DEFAULT_TRACK_DURATION: f32 = 60.0;
pub const DEFAULT_BEAT_INTERVAL: f32 = 0.5;
pub const MAX_SCHEDULE_STEPS: usize = 200_000;

// Calibration
pub const CALIBRATION_SAMPLE_COUNT: usize = 120;
pub const CALIBRATION_SPREAD_FACTOR: f32 = 1.8;
pub const MIN_SPREAD_X: f32 = 0.06;
pub const MIN_SPREAD_Y: f32 = 0.05;
pub const DEFAULT_CENTER: f32 = 0.5;
pub const DEFAULT_SPREAD_X: f32 = 0.12;
pub const DEFAULT_SPREAD_Y: f32 = 0.08;

// Face input
pub const NOSE_TIP_LANDMARK: usize = 1;
pub const FACE_SMOOTHING: f32 = 0.35;
pub const LANE_THRESHOLD: f32 = 0.85;
pub const HIGH_THRESHOLD: f32 = 0.8;
pub const LOW_THRESHOLD: f32 = -0.6;
pub const DEFAULT_FACE_RECENCY_MS: u64 = 1500;

// Avatar motion
pub const LERP_RATE_X: f32 = 8.0;
pub const LERP_RATE_Y: f32 = 6.0;
pub const BOUNCE_LAUNCH_VELOCITY: f32 = 2.4;
pub const BOUNCE_GRAVITY: f32 = 5.0;
pub const WOBBLE_FREQUENCY: f32 = 6.0;
pub const WOBBLE_AMPLITUDE: f32 = 0.05;

// World layout
pub const LANE_X_LEFT: f32 = -3.5;
pub const LANE_X_CENTER: f32 = 0.0;
pub const LANE_X_RIGHT: f32 = 3.5;
pub const LEVEL_Y_LOW: f32 = 1.0;
pub const LEVEL_Y_HIGH: f32 = 2.35;
pub const TRACK_SPEED: f32 = 14.0; // world units per second to sweep the platforms
pub const PLATFORM_OFFSET_Z: f32 = -4.0;
pub const PLATFORM_SINK: f32 = 0.4;
pub const PLATFORM_VISIBLE_AHEAD: f32 = 40.0;
pub const PLATFORM_VISIBLE_BEHIND: f32 = -20.0;

// Countdown
pub const COUNTDOWN_STEPS: u8 = 3;
pub const COUNTDOWN_STEP_SECONDS: f32 = 1.0;

// Misc
pub const MAX_DELTA_TIME: f32 = 0.1;

pub const DEFAULT_CONFIG_PATH: &str = "save/headsync.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub track_path: String,
    pub track_duration: f32,
    pub beat_interval: f32,
    pub face_recency_ms: u64,
    pub sim_realtime: bool,
    pub sim_seed: u64,
    pub sim_sensor_hz: f32,
    pub sim_tick_hz: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            track_path: "track.mp3".to_string(),
            track_duration: DEFAULT_TRACK_DURATION,
            beat_interval: DEFAULT_BEAT_INTERVAL,
            face_recency_ms: DEFAULT_FACE_RECENCY_MS,
            sim_realtime: false,
            sim_seed: 7,
            sim_sensor_hz: 30.0,
            sim_tick_hz: 60.0,
        }
    }
}

static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

fn parse_or<T: std::str::FromStr>(ini: &Ini, section: &str, key: &str, default: T) -> T {
    match ini.get(section, key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("Invalid value '{}' for [{}] {}, using default.", raw, section, key);
                default
            }
        },
        None => default,
    }
}

fn parse_flag(ini: &Ini, section: &str, key: &str, default: bool) -> bool {
    ini.get(section, key)
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map_or(default, |v| v != 0)
}

impl Config {
    fn from_ini(ini: &Ini) -> GameResult<Self> {
        let d = Config::default();
        let config = Config {
            track_path: ini.get("track", "Path").unwrap_or(d.track_path),
            track_duration: parse_or(ini, "track", "Duration", d.track_duration),
            beat_interval: parse_or(ini, "track", "Interval", d.beat_interval),
            face_recency_ms: parse_or(ini, "input", "FaceRecencyMs", d.face_recency_ms),
            sim_realtime: parse_flag(ini, "sim", "Realtime", d.sim_realtime),
            sim_seed: parse_or(ini, "sim", "Seed", d.sim_seed),
            sim_sensor_hz: parse_or(ini, "sim", "SensorHz", d.sim_sensor_hz),
            sim_tick_hz: parse_or(ini, "sim", "TickHz", d.sim_tick_hz),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_ini_str(text: &str) -> GameResult<Self> {
        let mut ini = Ini::new();
        ini.read(text.to_string()).map_err(GameError::Config)?;
        Self::from_ini(&ini)
    }

    pub fn validate(&self) -> GameResult<()> {
        if !(self.beat_interval.is_finite() && self.beat_interval > 0.0) {
            return Err(GameError::Config(format!(
                "beat interval must be positive, got {}",
                self.beat_interval
            )));
        }
        if !self.track_duration.is_finite() || self.track_duration < 0.0 {
            return Err(GameError::Config(format!(
                "track duration must be non-negative, got {}",
                self.track_duration
            )));
        }
        let steps = (f64::from(self.track_duration)
            - f64::from(SCHEDULE_TAIL_BUFFER)
            - f64::from(SCHEDULE_START_DELAY))
            / f64::from(self.beat_interval);
        if steps > MAX_SCHEDULE_STEPS as f64 {
            return Err(GameError::Config(format!(
                "track of {}s at {}s per beat exceeds {} beats",
                self.track_duration, self.beat_interval, MAX_SCHEDULE_STEPS
            )));
        }
        let rate_ok = |hz: f32| hz.is_finite() && hz > 0.0;
        if !rate_ok(self.sim_sensor_hz) || !rate_ok(self.sim_tick_hz) {
            return Err(GameError::Config(format!(
                "sim rates must be positive (tick {}, sensor {})",
                self.sim_tick_hz, self.sim_sensor_hz
            )));
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> GameResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let mut ini = Ini::new();
        ini.set("track", "Path", Some(self.track_path.clone()));
        ini.set("track", "Duration", Some(self.track_duration.to_string()));
        ini.set("track", "Interval", Some(self.beat_interval.to_string()));
        ini.set("input", "FaceRecencyMs", Some(self.face_recency_ms.to_string()));
        ini.set("sim", "Realtime", Some((self.sim_realtime as u8).to_string()));
        ini.set("sim", "Seed", Some(self.sim_seed.to_string()));
        ini.set("sim", "SensorHz", Some(self.sim_sensor_hz.to_string()));
        ini.set("sim", "TickHz", Some(self.sim_tick_hz.to_string()));
        ini.write(path)?;
        Ok(())
    }
}

/// Loads the config at `path` into the global slot, writing defaults first if the
/// file does not exist. Unreadable files fall back to defaults.
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        info!("Config not found, creating defaults at '{}'.", path.display());
        if let Err(e) = Config::default().write(path) {
            warn!("Failed to write default config: {}", e);
        }
    }

    let mut ini = Ini::new();
    let loaded = match ini.load(path) {
        Ok(_) => match Config::from_ini(&ini) {
            Ok(config) => config,
            Err(e) => {
                warn!("Rejected '{}': {}. Using defaults.", path.display(), e);
                Config::default()
            }
        },
        Err(e) => {
            warn!("Failed to load '{}': {}. Using defaults.", path.display(), e);
            Config::default()
        }
    };

    info!(
        "Config: track '{}' ({:.1}s, beat every {:.2}s), face recency {}ms",
        loaded.track_path, loaded.track_duration, loaded.beat_interval, loaded.face_recency_ms
    );
    *lock() = loaded.clone();
    loaded
}

/// Returns a copy of the currently loaded config.
pub fn get() -> Config {
    lock().clone()
}

fn lock() -> std::sync::MutexGuard<'static, Config> {
    CONFIG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
