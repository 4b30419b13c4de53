// ===== PROJECT: headsync FILE: src/game/gameplay.rs =====
use crate::config::{COUNTDOWN_STEPS, COUNTDOWN_STEP_SECONDS, Config, MAX_DELTA_TIME};
use crate::core::audio::{AudioClock, AudioEvent};
use crate::core::input::{KeyAction, PlayerTarget};
use crate::core::sensor::{nose_tip, FaceFrame, RawSample, SampleSmoother, SensorFeed};
use crate::error::{GameError, GameResult};
use crate::game::arbiter::{InputMode, InputModeArbiter};
use crate::game::calibration::{CalibrationFrame, Calibrator};
use crate::game::judgment::{HitJudge, ScoreState};
use crate::game::motion::{AvatarMotionModel, AvatarPose};
use crate::game::normalizer;
use crate::game::schedule;
use crate::game::track::{platform_views, PlatformView};
use log::{debug, info, warn};
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    Init,
    Calibrating,
    Ready,
    Countdown,
    Running,
    Paused,
    GameOver,
    Victory,
}

/// What the host UI should show over the scene.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Overlay {
    pub visible: bool,
    pub message: String,
    pub show_start: bool,
    pub show_calibrate: bool,
}

impl Overlay {
    fn show(message: impl Into<String>, show_start: bool, show_calibrate: bool) -> Self {
        Self {
            visible: true,
            message: message.into(),
            show_start,
            show_calibrate,
        }
    }

    fn hidden() -> Self {
        Self {
            visible: false,
            message: String::new(),
            show_start: false,
            show_calibrate: false,
        }
    }
}

const MSG_WARMING_UP: &str = "Hold tight… we're warming up the track.";
const MSG_CALIBRATING: &str =
    "Let's calibrate! Gently move your head left/right and up/down for a moment.";
const MSG_CALIBRATED: &str =
    "Calibration complete! When you are ready, start the track and follow the beat.";
const MSG_AUDIO_MISSING: &str = "Audio track missing. Add your song next to the game and retry.";
const MSG_AUTOPLAY_BLOCKED: &str =
    "Tap the Start button again after interacting with the page to unlock audio.";
const MSG_STOPPED: &str = "Playback stopped. Ready when you are!";
const MSG_PAUSED: &str = "Paused. The run was reset; press Start to play again.";
const MSG_VICTORY: &str = "You nailed it! Ready to spin the track again?";
const MSG_MISSED: &str = "You missed a platform. Let's try that section again!";
const MSG_CAMERA_REQUIRED: &str =
    "Camera access is required to play. Please enable your webcam and reload.";

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    CountdownStep(u8),
    Hit { index: usize },
    Missed { index: usize, time: f32 },
    CalibrationComplete(CalibrationFrame),
    Warning(GameError),
}

#[derive(Clone, Copy, Debug)]
struct Countdown {
    remaining: u8,
    step_elapsed: f32,
}

pub struct State {
    phase: GamePhase,
    judge: HitJudge,
    calibrator: Calibrator,
    smoother: SampleSmoother,
    arbiter: InputModeArbiter,
    target: PlayerTarget,
    motion: AvatarMotionModel,
    countdown: Option<Countdown>,
    overlay: Overlay,
    track_available: bool,
    audio_time: f32,
    next_index: Option<usize>,
    sensor_feed: Option<SensorFeed>,
    // Transitions raised outside `update` (player actions, sensor callbacks).
    pending_events: Vec<GameEvent>,
    log_timer: f32,
}

/// Everything a renderer or UI layer reads from the engine.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u32,
    pub streak: u32,
    pub pose: AvatarPose,
    pub avatar_position: [f32; 3],
    pub target: PlayerTarget,
    pub input_mode: InputMode,
    pub countdown: Option<u8>,
    pub overlay: Overlay,
    pub calibrated: bool,
    pub calibration: CalibrationFrame,
    pub audio_time: f32,
    pub next_index: Option<usize>,
    pub platforms: Vec<PlatformView>,
}

impl State {
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> ScoreState {
        self.judge.score()
    }

    pub fn target(&self) -> PlayerTarget {
        self.target
    }

    pub fn pose(&self) -> AvatarPose {
        self.motion.pose()
    }

    pub fn input_mode(&self) -> InputMode {
        self.arbiter.mode()
    }

    pub fn judge(&self) -> &HitJudge {
        &self.judge
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn countdown_step(&self) -> Option<u8> {
        self.countdown.map(|c| c.remaining)
    }

    pub fn track_available(&self) -> bool {
        self.track_available
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next_index
    }
}

pub fn init(config: &Config) -> State {
    info!("Initializing gameplay state...");
    let events = schedule::generate(config.track_duration, config.beat_interval);
    State {
        phase: GamePhase::Init,
        judge: HitJudge::new(events),
        calibrator: Calibrator::default(),
        smoother: SampleSmoother::default(),
        arbiter: InputModeArbiter::new(Duration::from_millis(config.face_recency_ms)),
        target: PlayerTarget::default(),
        motion: AvatarMotionModel::default(),
        countdown: None,
        overlay: Overlay::show(MSG_WARMING_UP, false, false),
        track_available: true,
        audio_time: 0.0,
        next_index: None,
        sensor_feed: None,
        pending_events: Vec::new(),
        log_timer: 0.0,
    }
}

/// Routes frames from a sensor thread into the tick loop.
pub fn attach_sensor_feed(state: &mut State, feed: SensorFeed) {
    state.sensor_feed = Some(feed);
}

fn set_phase(state: &mut State, to: GamePhase) {
    let from = state.phase;
    if from == to {
        return;
    }
    info!("Game state {:?} -> {:?}", from, to);
    state.phase = to;
    state.pending_events.push(GameEvent::PhaseChanged { from, to });
}

fn reset_game(state: &mut State) {
    state.judge.reset();
    state.target = PlayerTarget::default();
    state.motion.reset();
    state.next_index = None;
    state.audio_time = 0.0;
    state.log_timer = 0.0;
}

fn halt_audio(clock: &mut dyn AudioClock) {
    clock.pause();
    clock.seek(0.0);
}

fn begin_calibration(state: &mut State) {
    state.countdown = None;
    state.calibrator.begin();
    state.arbiter.reset();
    state.overlay = Overlay::show(MSG_CALIBRATING, false, false);
    set_phase(state, GamePhase::Calibrating);
}

fn begin_countdown(state: &mut State) -> GameResult<()> {
    if !state.track_available {
        warn!("Cannot start: {}", GameError::AudioUnavailable);
        state.overlay = Overlay::show(MSG_AUDIO_MISSING, false, true);
        return Err(GameError::AudioUnavailable);
    }
    state.countdown = Some(Countdown {
        remaining: COUNTDOWN_STEPS,
        step_elapsed: 0.0,
    });
    state.overlay = Overlay::show(countdown_message(COUNTDOWN_STEPS), false, false);
    set_phase(state, GamePhase::Countdown);
    Ok(())
}

fn countdown_message(remaining: u8) -> String {
    format!("Starting in {}…", remaining)
}

fn launch(state: &mut State, clock: &mut dyn AudioClock) {
    state.countdown = None;
    reset_game(state);
    state.overlay = Overlay::hidden();
    set_phase(state, GamePhase::Running);

    clock.seek(0.0);
    if let Err(e) = clock.play() {
        warn!("Unable to start audio automatically: {}", e);
        state.overlay = Overlay::show(MSG_AUTOPLAY_BLOCKED, true, true);
        state.pending_events.push(GameEvent::Warning(e));
        set_phase(state, GamePhase::Ready);
    }
}

fn stop(state: &mut State, clock: &mut dyn AudioClock) {
    halt_audio(clock);
    state.countdown = None;
    state.calibrator.cancel();
    reset_game(state);
    state.overlay = Overlay::show(MSG_STOPPED, true, true);
    set_phase(state, GamePhase::Ready);
}

fn game_over(state: &mut State, clock: &mut dyn AudioClock) {
    if state.phase != GamePhase::Running {
        return;
    }
    halt_audio(clock);
    let score = state.judge.score().score;
    state.overlay = Overlay::show(format!("{}\nScore: {}", MSG_MISSED, score), true, true);
    set_phase(state, GamePhase::GameOver);
}

/// The start button. Ignored during the countdown; calibrates first when needed;
/// stops a running game.
pub fn press_start(state: &mut State, clock: &mut dyn AudioClock) -> GameResult<()> {
    if state.phase == GamePhase::Countdown {
        debug!("Start ignored during countdown.");
        return Ok(());
    }
    if !state.calibrator.is_ready() {
        begin_calibration(state);
        return Ok(());
    }
    if state.phase == GamePhase::Running {
        stop(state, clock);
        return Ok(());
    }
    begin_countdown(state)
}

pub fn press_calibrate(state: &mut State, clock: &mut dyn AudioClock) {
    if state.phase == GamePhase::Running {
        stop(state, clock);
    }
    begin_calibration(state);
}

/// Forces the machine back to Ready from anywhere.
pub fn press_stop(state: &mut State, clock: &mut dyn AudioClock) {
    stop(state, clock);
}

/// Losing focus mid-run is a full stop, parked in `Paused`. There is no resume.
pub fn focus_lost(state: &mut State, clock: &mut dyn AudioClock) {
    if state.phase != GamePhase::Running {
        return;
    }
    stop(state, clock);
    state.overlay = Overlay::show(MSG_PAUSED, true, true);
    set_phase(state, GamePhase::Paused);
}

pub fn camera_started(state: &mut State) {
    info!("Camera started.");
    if !state.calibrator.is_collecting() && !state.calibrator.is_ready() {
        begin_calibration(state);
    }
}

pub fn camera_failed(state: &mut State, reason: &str) {
    warn!("Unable to start camera: {}", reason);
    state.arbiter.on_face_lost();
    state.overlay = Overlay::show(MSG_CAMERA_REQUIRED, false, false);
}

pub fn handle_key(state: &mut State, action: KeyAction, clock: &mut dyn AudioClock) {
    match action {
        KeyAction::Lane(lane) => {
            state.target.lane = lane;
            state.arbiter.on_key();
        }
        KeyAction::Level(level) => {
            state.target.level = level;
            state.arbiter.on_key();
        }
        KeyAction::Recalibrate => press_calibrate(state, clock),
    }
}

fn apply_face_target(state: &mut State, sample: RawSample) {
    if let Some(target) = normalizer::target_from_sample(
        sample,
        &state.calibrator.frame(),
        state.calibrator.is_ready(),
        state.target,
    ) {
        state.target = target;
    }
}

/// Processes one camera frame to completion: smoothing, calibration, target.
pub fn handle_face_frame(state: &mut State, frame: &FaceFrame) {
    let raw = match nose_tip(&frame.faces) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("{}", e);
            state.arbiter.on_face_lost();
            return;
        }
    };

    let smoothed = state.smoother.push(raw);
    state.arbiter.on_face_sample(frame.captured_at);

    if state.calibrator.is_collecting() {
        if let Some(calibration) = state.calibrator.push(smoothed) {
            state.overlay = Overlay::show(MSG_CALIBRATED, true, true);
            state
                .pending_events
                .push(GameEvent::CalibrationComplete(calibration));
            set_phase(state, GamePhase::Ready);
        }
    }

    if !state.calibrator.is_collecting() && state.arbiter.face_drives_target() {
        apply_face_target(state, smoothed);
    }
}

pub fn on_audio_event(state: &mut State, event: AudioEvent) {
    match event {
        AudioEvent::Loaded => {
            if !state.track_available {
                info!("Audio track loaded.");
            }
            state.track_available = true;
        }
        AudioEvent::LoadFailed => {
            warn!("{}", GameError::AudioUnavailable);
            state.track_available = false;
            state.overlay = Overlay::show(MSG_AUDIO_MISSING, false, true);
        }
        AudioEvent::Ended => {
            if state.phase == GamePhase::Running {
                let score = state.judge.score();
                info!("Track finished. Score {}, streak {}", score.score, score.streak);
                state.overlay = Overlay::show(MSG_VICTORY, true, true);
                set_phase(state, GamePhase::Victory);
            }
        }
    }
}

#[inline(always)]
fn advance_countdown(state: &mut State, clock: &mut dyn AudioClock, delta_time: f32) {
    let Some(mut countdown) = state.countdown else {
        return;
    };
    countdown.step_elapsed += delta_time;
    while countdown.step_elapsed >= COUNTDOWN_STEP_SECONDS {
        countdown.step_elapsed -= COUNTDOWN_STEP_SECONDS;
        countdown.remaining = countdown.remaining.saturating_sub(1);
        if countdown.remaining == 0 {
            launch(state, clock);
            return;
        }
        state.overlay = Overlay::show(countdown_message(countdown.remaining), false, false);
        state
            .pending_events
            .push(GameEvent::CountdownStep(countdown.remaining));
    }
    state.countdown = Some(countdown);
}

#[inline(always)]
fn judge_running(state: &mut State, clock: &mut dyn AudioClock, now: Instant, delta_time: f32) {
    let audio_time = clock.current_time();
    state.audio_time = audio_time;

    match state.judge.update(audio_time, state.target) {
        Ok(tick) => {
            for index in tick.hits {
                state.motion.trigger_bounce();
                state.pending_events.push(GameEvent::Hit { index });
            }
            state.next_index = tick.next_index;
        }
        Err(GameError::MissedBeat { index, time }) => {
            state.pending_events.push(GameEvent::Missed { index, time });
            game_over(state, clock);
            return;
        }
        Err(e) => {
            warn!("Unexpected judge error: {}", e);
            return;
        }
    }

    state.arbiter.evaluate(now);
    if state.arbiter.face_drives_target() && state.arbiter.face_available() {
        if let Some(smoothed) = state.smoother.current() {
            apply_face_target(state, smoothed);
        }
    }

    state.log_timer += delta_time;
    if state.log_timer >= 1.0 {
        let score = state.judge.score();
        info!(
            "Time: {:.2}, Score: {}, Streak: {}, Mode: {}",
            audio_time,
            score.score,
            score.streak,
            state.arbiter.mode().label()
        );
        state.log_timer -= 1.0;
    }
}

/// One frame. Order: audio notifications, queued sensor frames, countdown,
/// judging (Running only), then avatar motion.
pub fn update(
    state: &mut State,
    clock: &mut dyn AudioClock,
    delta_time: f32,
    now: Instant,
) -> Vec<GameEvent> {
    let delta_time = delta_time.clamp(0.0, MAX_DELTA_TIME);

    while let Some(event) = clock.poll_event() {
        on_audio_event(state, event);
    }

    if let Some(mut feed) = state.sensor_feed.take() {
        for frame in feed.drain() {
            handle_face_frame(state, &frame);
        }
        state.sensor_feed = Some(feed);
    }

    if state.phase == GamePhase::Countdown {
        advance_countdown(state, clock, delta_time);
    }

    if state.phase == GamePhase::Running {
        judge_running(state, clock, now, delta_time);
    }

    state.motion.update(state.target, delta_time);

    std::mem::take(&mut state.pending_events)
}

pub fn snapshot(state: &State) -> Snapshot {
    let score = state.judge.score();
    let position = state.motion.display_position();
    Snapshot {
        phase: state.phase,
        score: score.score,
        streak: score.streak,
        pose: state.motion.pose(),
        avatar_position: [position.x, position.y, position.z],
        target: state.target,
        input_mode: state.arbiter.mode(),
        countdown: state.countdown_step(),
        overlay: state.overlay.clone(),
        calibrated: state.calibrator.is_ready(),
        calibration: state.calibrator.frame(),
        audio_time: state.audio_time,
        next_index: state.next_index,
        platforms: platform_views(&state.judge, state.audio_time, state.next_index),
    }
}
