use crate::config::{MAX_SCHEDULE_STEPS, SCHEDULE_START_DELAY, SCHEDULE_TAIL_BUFFER};
use crate::core::input::{Lane, Level};
use log::{info, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BeatEvent {
    pub time: f32,
    pub lane: Lane,
    pub level: Level,
}

const PATTERN: [(Lane, Level); 6] = [
    (Lane::Center, Level::Low),
    (Lane::Center, Level::High),
    (Lane::Left, Level::Low),
    (Lane::Right, Level::Low),
    (Lane::Left, Level::High),
    (Lane::Right, Level::High),
];

/// Builds the beat schedule for a track. Pure: the same `duration` and `interval`
/// always give the same events, sorted by time with ties kept in generation order.
pub fn generate(duration: f32, interval: f32) -> Vec<BeatEvent> {
    if !(interval.is_finite() && interval > 0.0) || !duration.is_finite() {
        warn!(
            "Refusing to build a schedule for duration {} / interval {}",
            duration, interval
        );
        return Vec::new();
    }

    let start = f64::from(SCHEDULE_START_DELAY);
    let step = f64::from(interval);
    let end = f64::from(duration) - f64::from(SCHEDULE_TAIL_BUFFER);
    if (end - start) / step > MAX_SCHEDULE_STEPS as f64 {
        warn!(
            "Refusing to build a schedule of more than {} steps (duration {} / interval {})",
            MAX_SCHEDULE_STEPS, duration, interval
        );
        return Vec::new();
    }

    // Each beat time is derived from its index, never accumulated.
    let mut events = Vec::new();
    let mut index: usize = 0;
    loop {
        let time = start + index as f64 * step;
        if time >= end {
            break;
        }
        let (lane, level) = PATTERN[index % PATTERN.len()];
        events.push(BeatEvent {
            time: time as f32,
            lane,
            level,
        });

        // Center accent on the off-beat after every fourth step.
        if index % 4 == 1 {
            events.push(BeatEvent {
                time: (time + step * 0.5) as f32,
                lane: Lane::Center,
                level: if index % 8 == 1 { Level::Low } else { Level::High },
            });
        }

        index += 1;
    }

    // Accents can land after the next primary beat when the interval is tiny.
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    info!(
        "Built schedule: {} events over {:.1}s (interval {:.3}s)",
        events.len(),
        duration,
        interval
    );
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_steps_follow_the_pattern_with_accent() {
        let events = generate(10.0, 0.5);
        assert_eq!(events[0], BeatEvent { time: 2.5, lane: Lane::Center, level: Level::Low });
        assert_eq!(events[1], BeatEvent { time: 3.0, lane: Lane::Center, level: Level::High });
        // Accent of step 1 lands halfway to step 2.
        assert_eq!(events[2], BeatEvent { time: 3.25, lane: Lane::Center, level: Level::Low });
        assert_eq!(events[3], BeatEvent { time: 3.5, lane: Lane::Left, level: Level::Low });
    }

    #[test]
    fn accent_levels_alternate_every_eight_steps() {
        let events = generate(60.0, 0.5);
        let accents: Vec<_> = events
            .iter()
            .filter(|e| {
                let phase = ((e.time - 2.5) / 0.5).fract();
                phase > 0.25 && phase < 0.75
            })
            .collect();
        assert!(accents.len() >= 4);
        assert_eq!(accents[0].level, Level::Low);
        assert_eq!(accents[1].level, Level::High);
        assert_eq!(accents[2].level, Level::Low);
        assert_eq!(accents[3].level, Level::High);
        assert!(accents.iter().all(|e| e.lane == Lane::Center));
    }

    #[test]
    fn nothing_inside_the_tail_buffer() {
        let events = generate(10.0, 0.5);
        let last_primary = events.iter().map(|e| e.time).fold(0.0_f32, f32::max);
        assert!(last_primary < 10.0 - SCHEDULE_TAIL_BUFFER + 0.5);
        assert!(events.iter().filter(|e| e.time >= 8.5).all(|e| e.lane == Lane::Center));
    }

    #[test]
    fn short_track_yields_empty_schedule() {
        assert!(generate(3.0, 0.5).is_empty());
        assert!(generate(60.0, 0.0).is_empty());
        assert!(generate(f32::NAN, 0.5).is_empty());
    }
}
