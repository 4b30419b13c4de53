// FILE: src/core/audio.rs
use crate::error::{GameError, GameResult};
use log::{info, warn};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

// --- Public API Structs ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioEvent {
    Loaded,
    Ended,
    LoadFailed,
}

/// The playback subsystem as seen by the game: a readable clock plus transport
/// controls. The clock is authoritative for judging even when it drifts from
/// wall time.
pub trait AudioClock {
    /// Seconds since the start of the track.
    fn current_time(&self) -> f32;
    fn play(&mut self) -> GameResult<()>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f32);
    fn poll_event(&mut self) -> Option<AudioEvent>;
    /// Drives clocks that do not follow wall time. Real playback ignores it.
    fn tick(&mut self, _delta: f32) {}
}

/// A clock that only moves when told to. Used by the headless driver and tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    time: f32,
    length: f32,
    playing: bool,
    ended_sent: bool,
    autoplay_blocked: bool,
    events: VecDeque<AudioEvent>,
}

impl ManualClock {
    pub fn new(length: f32) -> Self {
        Self {
            time: 0.0,
            length,
            playing: false,
            ended_sent: false,
            autoplay_blocked: false,
            events: VecDeque::from([AudioEvent::Loaded]),
        }
    }

    /// A track that never loads.
    pub fn missing() -> Self {
        let mut clock = Self::new(0.0);
        clock.events = VecDeque::from([AudioEvent::LoadFailed]);
        clock
    }

    pub fn set_autoplay_blocked(&mut self, blocked: bool) {
        self.autoplay_blocked = blocked;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn push_event(&mut self, event: AudioEvent) {
        self.events.push_back(event);
    }

    /// Moves the playhead forward while playing, emitting `Ended` once at the end.
    pub fn advance(&mut self, delta: f32) {
        if !self.playing {
            return;
        }
        self.time = (self.time + delta).min(self.length);
        if self.time >= self.length && !self.ended_sent {
            self.ended_sent = true;
            self.playing = false;
            self.events.push_back(AudioEvent::Ended);
        }
    }

    /// Jumps the playhead without ending the track. Lets tests pin exact times.
    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds.clamp(0.0, self.length);
    }
}

impl AudioClock for ManualClock {
    fn current_time(&self) -> f32 {
        self.time
    }

    fn play(&mut self) -> GameResult<()> {
        if self.autoplay_blocked {
            return Err(GameError::AutoplayBlocked(
                "host requires a user gesture before playback".to_string(),
            ));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, seconds: f32) {
        self.set_time(seconds);
        if self.time < self.length {
            self.ended_sent = false;
        }
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        self.events.pop_front()
    }

    fn tick(&mut self, delta: f32) {
        self.advance(delta);
    }
}

/// Measures music time from the instant playback started, the same way the
/// gameplay screen derives music time from its song start instant.
#[derive(Debug)]
pub struct WallClock {
    length: Duration,
    started_at: Option<Instant>,
    offset: Duration,
    ended_sent: bool,
    events: VecDeque<AudioEvent>,
}

impl WallClock {
    pub fn new(length_sec: f32) -> Self {
        info!("Wall clock track length {:.2}s", length_sec);
        Self {
            length: Duration::from_secs_f32(length_sec.max(0.0)),
            started_at: None,
            offset: Duration::ZERO,
            ended_sent: false,
            events: VecDeque::from([AudioEvent::Loaded]),
        }
    }

    fn elapsed(&self) -> Duration {
        let running = self
            .started_at
            .map_or(Duration::ZERO, |start| start.elapsed());
        (self.offset + running).min(self.length)
    }
}

impl AudioClock for WallClock {
    fn current_time(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    fn play(&mut self) -> GameResult<()> {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.offset = self.elapsed();
        self.started_at = None;
    }

    fn seek(&mut self, seconds: f32) {
        if !seconds.is_finite() || seconds < 0.0 {
            warn!("Ignoring seek to {}", seconds);
            return;
        }
        self.offset = Duration::from_secs_f32(seconds).min(self.length);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.ended_sent = self.offset >= self.length;
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        if !self.ended_sent && self.started_at.is_some() && self.elapsed() >= self.length {
            self.ended_sent = true;
            self.events.push_back(AudioEvent::Ended);
        }
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_while_playing() {
        let mut clock = ManualClock::new(10.0);
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.play().unwrap();
        clock.advance(1.5);
        assert_eq!(clock.current_time(), 1.5);
        clock.pause();
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 1.5);
    }

    #[test]
    fn manual_clock_emits_ended_once() {
        let mut clock = ManualClock::new(2.0);
        assert_eq!(clock.poll_event(), Some(AudioEvent::Loaded));
        clock.play().unwrap();
        clock.advance(5.0);
        clock.advance(5.0);
        assert_eq!(clock.current_time(), 2.0);
        assert_eq!(clock.poll_event(), Some(AudioEvent::Ended));
        assert_eq!(clock.poll_event(), None);
    }

    #[test]
    fn blocked_autoplay_is_reported() {
        let mut clock = ManualClock::new(5.0);
        clock.set_autoplay_blocked(true);
        assert!(matches!(clock.play(), Err(GameError::AutoplayBlocked(_))));
        assert!(!clock.is_playing());
    }

    #[test]
    fn wall_clock_seek_and_pause() {
        let mut clock = WallClock::new(30.0);
        clock.seek(4.0);
        assert!((clock.current_time() - 4.0).abs() < 1e-4);
        clock.play().unwrap();
        clock.pause();
        assert!(clock.current_time() >= 4.0);
        clock.seek(0.0);
        assert!(clock.current_time() < 0.01);
    }
}
