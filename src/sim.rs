use crate::config::Config;
use crate::core::audio::{AudioClock, ManualClock, WallClock};
use crate::core::input::{Lane, Level};
use crate::core::sensor::{FaceFrame, Landmark, SensorFeed, SensorSender};
use crate::error::GameResult;
use crate::game::calibration::CalibrationFrame;
use crate::game::gameplay::{self, GameEvent, GamePhase, Snapshot, State};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

// How far past each threshold the bot leans, in units of calibrated spread.
const AIM_REACH: f32 = 1.6;
const JITTER: f32 = 0.01;
const MAX_START_ATTEMPTS: u32 = 3;
const OVERRUN_SECONDS: f32 = 30.0;

/// Result of one headless run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SimReport {
    pub hits: usize,
    pub misses: usize,
    pub simulated_seconds: f32,
    pub snapshot: Snapshot,
}

/// Stands in for a player in front of a camera: wiggles for calibration, then
/// leans toward whichever platform is due next.
struct AutoplayBot {
    rng: StdRng,
}

impl AutoplayBot {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn jitter(&mut self) -> f32 {
        self.rng.random_range(-JITTER..JITTER)
    }

    fn calibration_pose(&mut self, t: f32) -> Landmark {
        Landmark {
            x: 0.5 + 0.1 * (TAU * 0.7 * t).sin() + self.jitter(),
            y: 0.5 + 0.07 * (TAU * 0.45 * t).sin() + self.jitter(),
        }
    }

    fn aim(&mut self, lane: Lane, level: Level, frame: &CalibrationFrame) -> Landmark {
        let nx = match lane {
            Lane::Left => -AIM_REACH,
            Lane::Center => 0.0,
            Lane::Right => AIM_REACH,
        };
        let ny = match level {
            Level::Low => -AIM_REACH,
            Level::High => AIM_REACH,
        };
        Landmark {
            x: frame.center_x + nx * frame.spread_x + self.jitter(),
            y: frame.center_y - ny * frame.spread_y + self.jitter(),
        }
    }

    fn next_pose(&mut self, state: &State, t: f32) -> Landmark {
        if state.calibrator().is_collecting() || !state.calibrator().is_ready() {
            return self.calibration_pose(t);
        }
        let judge = state.judge();
        let due = judge
            .events()
            .iter()
            .zip(judge.states())
            .find(|(_, js)| !js.resolved);
        let (lane, level) = due.map_or((Lane::Center, Level::Low), |(e, _)| (e.lane, e.level));
        let frame = state.calibrator().frame();
        self.aim(lane, level, &frame)
    }
}

/// Runs a full session without a window: camera start, calibration, countdown and
/// the track itself, fed by a bot through the same sensor channel a camera would use.
pub fn run(config: &Config) -> GameResult<SimReport> {
    config.validate()?;
    if config.sim_realtime {
        let mut clock = WallClock::new(config.track_duration);
        drive(config, &mut clock)
    } else {
        let mut clock = ManualClock::new(config.track_duration);
        drive(config, &mut clock)
    }
}

fn drive(config: &Config, clock: &mut dyn AudioClock) -> GameResult<SimReport> {
    let mut state = gameplay::init(config);
    let (sender, feed) = SensorFeed::channel();
    gameplay::attach_sensor_feed(&mut state, feed);
    let mut bot = AutoplayBot::new(config.sim_seed);

    let tick = 1.0 / config.sim_tick_hz;
    let sensor_period = 1.0 / config.sim_sensor_hz;
    let limit = config.track_duration + OVERRUN_SECONDS;
    let origin = Instant::now();

    let mut sim_time = 0.0f32;
    let mut sensor_accum = sensor_period;
    let mut start_attempts = 0u32;
    let mut hits = 0usize;
    let mut misses = 0usize;

    gameplay::camera_started(&mut state);

    while sim_time < limit {
        sim_time += tick;
        let now = if config.sim_realtime {
            std::thread::sleep(Duration::from_secs_f32(tick));
            Instant::now()
        } else {
            origin + Duration::from_secs_f32(sim_time)
        };
        clock.tick(tick);

        sensor_accum += tick;
        if sensor_accum >= sensor_period {
            sensor_accum -= sensor_period;
            send_frame(&sender, &mut bot, &state, sim_time, now);
        }

        for event in gameplay::update(&mut state, clock, tick, now) {
            match event {
                GameEvent::Hit { .. } => hits += 1,
                GameEvent::Missed { index, time } => {
                    misses += 1;
                    debug!("Bot missed #{} at {:.2}s", index, time);
                }
                GameEvent::CalibrationComplete(frame) => {
                    info!(
                        "Calibrated: center ({:.3}, {:.3}) spread ({:.3}, {:.3})",
                        frame.center_x, frame.center_y, frame.spread_x, frame.spread_y
                    );
                }
                GameEvent::Warning(e) => warn!("{}", e),
                _ => {}
            }
        }

        match state.phase() {
            GamePhase::Ready if start_attempts < MAX_START_ATTEMPTS => {
                start_attempts += 1;
                gameplay::press_start(&mut state, clock)?;
            }
            GamePhase::Ready => {
                warn!("Gave up after {} start attempts.", start_attempts);
                break;
            }
            GamePhase::GameOver | GamePhase::Victory => break,
            _ => {}
        }
    }

    info!(
        "Simulation finished in {:?} after {:.1}s: {} hits, {} misses",
        state.phase(),
        sim_time,
        hits,
        misses
    );
    Ok(SimReport {
        hits,
        misses,
        simulated_seconds: sim_time,
        snapshot: gameplay::snapshot(&state),
    })
}

fn send_frame(sender: &SensorSender, bot: &mut AutoplayBot, state: &State, t: f32, now: Instant) {
    let point = bot.next_pose(state, t);
    if sender.send(FaceFrame::single(point, now)).is_err() {
        warn!("Sensor channel closed; dropping frame.");
    }
}
