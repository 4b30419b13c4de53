use crate::config::{HIGH_THRESHOLD, LANE_THRESHOLD, LOW_THRESHOLD};
use crate::core::input::{Lane, Level, PlayerTarget};
use crate::core::sensor::RawSample;
use crate::game::calibration::CalibrationFrame;

/// Head offset from the calibrated neutral, in units of spread. Positive y is up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedHead {
    pub x: f32,
    pub y: f32,
}

#[inline(always)]
pub fn normalize(sample: RawSample, frame: &CalibrationFrame) -> NormalizedHead {
    NormalizedHead {
        x: (sample.x - frame.center_x) / frame.spread_x,
        // Image y grows downward.
        y: (frame.center_y - sample.y) / frame.spread_y,
    }
}

#[inline(always)]
pub fn lane_for(x: f32) -> Lane {
    if x < -LANE_THRESHOLD {
        Lane::Left
    } else if x > LANE_THRESHOLD {
        Lane::Right
    } else {
        Lane::Center
    }
}

/// Level has a dead zone between the two thresholds where the previous level sticks.
#[inline(always)]
pub fn level_for(y: f32, previous: Level) -> Level {
    if y > HIGH_THRESHOLD {
        Level::High
    } else if y < LOW_THRESHOLD {
        Level::Low
    } else {
        previous
    }
}

pub fn target_for(head: NormalizedHead, previous: PlayerTarget) -> PlayerTarget {
    PlayerTarget {
        lane: lane_for(head.x),
        level: level_for(head.y, previous.level),
    }
}

/// Maps a smoothed sample onto a target. Returns `None` until calibration is ready,
/// in which case the caller keeps its current target.
pub fn target_from_sample(
    sample: RawSample,
    frame: &CalibrationFrame,
    calibrated: bool,
    previous: PlayerTarget,
) -> Option<PlayerTarget> {
    if !calibrated {
        return None;
    }
    Some(target_for(normalize(sample, frame), previous))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-2.0, Lane::Left)]
    #[case(-0.86, Lane::Left)]
    #[case(-0.85, Lane::Center)]
    #[case(0.0, Lane::Center)]
    #[case(0.85, Lane::Center)]
    #[case(0.86, Lane::Right)]
    fn lane_thresholds(#[case] x: f32, #[case] expected: Lane) {
        assert_eq!(lane_for(x), expected);
    }

    #[rstest]
    #[case(0.81, Level::Low, Level::High)]
    #[case(0.8, Level::Low, Level::Low)]
    #[case(0.0, Level::High, Level::High)]
    #[case(0.0, Level::Low, Level::Low)]
    #[case(-0.6, Level::High, Level::High)]
    #[case(-0.61, Level::High, Level::Low)]
    fn level_dead_zone(#[case] y: f32, #[case] previous: Level, #[case] expected: Level) {
        assert_eq!(level_for(y, previous), expected);
    }

    #[test]
    fn vertical_axis_is_inverted() {
        let frame = CalibrationFrame {
            center_x: 0.5,
            center_y: 0.5,
            spread_x: 0.1,
            spread_y: 0.1,
        };
        let head = normalize(RawSample { x: 0.6, y: 0.4 }, &frame);
        assert!((head.x - 1.0).abs() < 1e-5);
        assert!((head.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn uncalibrated_input_is_ignored() {
        let frame = CalibrationFrame::default();
        let sample = RawSample { x: 0.0, y: 0.0 };
        assert_eq!(target_from_sample(sample, &frame, false, PlayerTarget::default()), None);
        assert_eq!(
            target_from_sample(sample, &frame, true, PlayerTarget::default()),
            Some(PlayerTarget { lane: Lane::Left, level: Level::High })
        );
    }
}
