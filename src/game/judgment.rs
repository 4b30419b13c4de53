use crate::config::HIT_WINDOW;
use crate::core::input::PlayerTarget;
use crate::error::GameError;
use crate::game::schedule::BeatEvent;
use log::{debug, info};
use serde::Serialize;

/// Per-event judging progress. `resolved` implies `window_opened`, and neither
/// flag goes back to false until the next reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JudgeState {
    pub window_opened: bool,
    pub resolved: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreState {
    pub score: u32,
    pub streak: u32,
}

/// What one judging pass produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JudgeTick {
    /// Events resolved as hits this pass, in schedule order.
    pub hits: Vec<usize>,
    /// First unresolved event at or after the current time. Cosmetic only.
    pub next_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HitJudge {
    events: Vec<BeatEvent>,
    states: Vec<JudgeState>,
    score: ScoreState,
    // Everything before this index is resolved.
    cursor: usize,
}

impl HitJudge {
    pub fn new(events: Vec<BeatEvent>) -> Self {
        let states = vec![JudgeState::default(); events.len()];
        Self {
            events,
            states,
            score: ScoreState::default(),
            cursor: 0,
        }
    }

    pub fn events(&self) -> &[BeatEvent] {
        &self.events
    }

    pub fn states(&self) -> &[JudgeState] {
        &self.states
    }

    pub fn score(&self) -> ScoreState {
        self.score
    }

    pub fn all_resolved(&self) -> bool {
        self.cursor >= self.events.len()
    }

    pub fn reset(&mut self) {
        self.states.iter_mut().for_each(|s| *s = JudgeState::default());
        self.score = ScoreState::default();
        self.cursor = 0;
    }

    /// One judging pass at audio time `t`. Returns the hits of this pass, or
    /// `MissedBeat` for the first event whose window closed without a match; the
    /// pass stops there.
    pub fn update(&mut self, t: f32, target: PlayerTarget) -> Result<JudgeTick, GameError> {
        let mut tick = JudgeTick::default();

        while self.cursor < self.states.len() && self.states[self.cursor].resolved {
            self.cursor += 1;
        }

        for index in self.cursor..self.events.len() {
            let event = self.events[index];
            let state = &mut self.states[index];

            if state.resolved {
                continue;
            }

            if !state.window_opened {
                if t >= event.time - HIT_WINDOW {
                    state.window_opened = true;
                    debug!("Window open #{} ({:?}/{:?}) at {:.3}s", index, event.lane, event.level, t);
                } else {
                    // Sorted by time: nothing further along can be open yet.
                    if tick.next_index.is_none() {
                        tick.next_index = Some(index);
                    }
                    break;
                }
            }

            if t <= event.time + HIT_WINDOW {
                if target.lane == event.lane && target.level == event.level {
                    state.resolved = true;
                    self.score.score += 1;
                    self.score.streak += 1;
                    tick.hits.push(index);
                    info!(
                        "HIT #{} ({:?}/{:?}) at {:.3}s, error {:+.0}ms, streak {}",
                        index,
                        event.lane,
                        event.level,
                        t,
                        (t - event.time) * 1000.0,
                        self.score.streak
                    );
                }
            } else {
                state.resolved = true;
                self.score.streak = 0;
                info!(
                    "MISS #{} ({:?}/{:?}) scheduled {:.3}s, judged at {:.3}s",
                    index, event.lane, event.level, event.time, t
                );
                return Err(GameError::MissedBeat {
                    index,
                    time: event.time,
                });
            }

            if !self.states[index].resolved && tick.next_index.is_none() && event.time >= t {
                tick.next_index = Some(index);
            }
        }

        Ok(tick)
    }
}
