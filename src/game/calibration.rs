use crate::config::{
    CALIBRATION_SAMPLE_COUNT, CALIBRATION_SPREAD_FACTOR, DEFAULT_CENTER, DEFAULT_SPREAD_X,
    DEFAULT_SPREAD_Y, MIN_SPREAD_X, MIN_SPREAD_Y,
};
use crate::core::sensor::RawSample;
use crate::error::GameError;
use log::{info, warn};
use serde::Serialize;

/// Center and spread of the player's neutral head position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CalibrationFrame {
    pub center_x: f32,
    pub center_y: f32,
    pub spread_x: f32,
    pub spread_y: f32,
}

impl Default for CalibrationFrame {
    fn default() -> Self {
        Self {
            center_x: DEFAULT_CENTER,
            center_y: DEFAULT_CENTER,
            spread_x: DEFAULT_SPREAD_X,
            spread_y: DEFAULT_SPREAD_Y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CalibrationPhase {
    Idle,
    Collecting,
    Ready,
}

#[derive(Debug, Clone)]
pub struct Calibrator {
    phase: CalibrationPhase,
    samples: Vec<RawSample>,
    frame: CalibrationFrame,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            samples: Vec::with_capacity(CALIBRATION_SAMPLE_COUNT),
            frame: CalibrationFrame::default(),
        }
    }
}

fn mean_and_std(values: impl Iterator<Item = f32> + Clone, count: usize) -> (f32, f32) {
    let n = count as f32;
    let mean = values.clone().sum::<f32>() / n;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    (mean, variance.sqrt())
}

impl Calibrator {
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == CalibrationPhase::Ready
    }

    pub fn is_collecting(&self) -> bool {
        self.phase == CalibrationPhase::Collecting
    }

    pub fn frame(&self) -> CalibrationFrame {
        self.frame
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Starts a fresh session. Any previous frame stops being authoritative.
    pub fn begin(&mut self) {
        info!("Calibration started; collecting {} samples.", CALIBRATION_SAMPLE_COUNT);
        self.phase = CalibrationPhase::Collecting;
        self.samples.clear();
    }

    /// Drops an unfinished session. A finished frame is kept.
    pub fn cancel(&mut self) {
        if self.phase == CalibrationPhase::Collecting {
            info!("Calibration cancelled after {} samples.", self.samples.len());
            self.phase = CalibrationPhase::Idle;
            self.samples.clear();
        }
    }

    /// Feeds one smoothed sample. Returns the new frame when this sample completed
    /// the session.
    pub fn push(&mut self, sample: RawSample) -> Option<CalibrationFrame> {
        if self.phase != CalibrationPhase::Collecting {
            return None;
        }
        self.samples.push(sample);
        if self.samples.len() >= CALIBRATION_SAMPLE_COUNT {
            self.finalize()
        } else {
            None
        }
    }

    /// Derives the frame from the collected samples. No-op without samples.
    pub fn finalize(&mut self) -> Option<CalibrationFrame> {
        if self.phase != CalibrationPhase::Collecting || self.samples.is_empty() {
            return None;
        }

        let n = self.samples.len();
        let (center_x, std_x) = mean_and_std(self.samples.iter().map(|s| s.x), n);
        let (center_y, std_y) = mean_and_std(self.samples.iter().map(|s| s.y), n);

        let raw_spread_x = std_x * CALIBRATION_SPREAD_FACTOR;
        let raw_spread_y = std_y * CALIBRATION_SPREAD_FACTOR;
        if raw_spread_x < MIN_SPREAD_X {
            warn!("{}", GameError::DegenerateCalibration { axis: 'x' });
        }
        if raw_spread_y < MIN_SPREAD_Y {
            warn!("{}", GameError::DegenerateCalibration { axis: 'y' });
        }

        self.frame = CalibrationFrame {
            center_x,
            center_y,
            spread_x: raw_spread_x.max(MIN_SPREAD_X),
            spread_y: raw_spread_y.max(MIN_SPREAD_Y),
        };
        self.samples.clear();
        self.phase = CalibrationPhase::Ready;
        info!(
            "Calibration complete from {} samples: center ({:.3}, {:.3}), spread ({:.3}, {:.3})",
            n, self.frame.center_x, self.frame.center_y, self.frame.spread_x, self.frame.spread_y
        );
        Some(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_samples_floor_the_spread() {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        let mut finished = None;
        for _ in 0..CALIBRATION_SAMPLE_COUNT {
            finished = calibrator.push(RawSample { x: 0.5, y: 0.5 });
        }
        let frame = finished.expect("120th sample finalizes");
        assert_eq!(frame.center_x, 0.5);
        assert_eq!(frame.center_y, 0.5);
        assert_eq!(frame.spread_x, MIN_SPREAD_X);
        assert_eq!(frame.spread_y, MIN_SPREAD_Y);
        assert!(calibrator.is_ready());
        assert_eq!(calibrator.sample_count(), 0);
    }

    #[test]
    fn spread_is_scaled_population_std() {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        // Half at 0.3, half at 0.7: mean 0.5, population std 0.2.
        for i in 0..CALIBRATION_SAMPLE_COUNT {
            let x = if i % 2 == 0 { 0.3 } else { 0.7 };
            calibrator.push(RawSample { x, y: 0.4 });
        }
        let frame = calibrator.frame();
        assert!((frame.center_x - 0.5).abs() < 1e-5);
        assert!((frame.spread_x - 0.36).abs() < 1e-4);
        assert!((frame.center_y - 0.4).abs() < 1e-5);
        assert_eq!(frame.spread_y, MIN_SPREAD_Y);
    }

    #[test]
    fn finalize_without_samples_is_a_no_op() {
        let mut calibrator = Calibrator::default();
        assert_eq!(calibrator.finalize(), None);
        calibrator.begin();
        assert_eq!(calibrator.finalize(), None);
        assert_eq!(calibrator.phase(), CalibrationPhase::Collecting);
        assert_eq!(calibrator.frame(), CalibrationFrame::default());
    }

    #[test]
    fn early_finalize_uses_what_was_collected() {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        calibrator.push(RawSample { x: 0.2, y: 0.6 });
        let frame = calibrator.finalize().unwrap();
        assert_eq!(frame.center_x, 0.2);
        assert_eq!(frame.center_y, 0.6);
    }

    #[test]
    fn samples_outside_a_session_are_ignored() {
        let mut calibrator = Calibrator::default();
        assert_eq!(calibrator.push(RawSample { x: 0.1, y: 0.1 }), None);
        assert_eq!(calibrator.sample_count(), 0);
        assert_eq!(calibrator.phase(), CalibrationPhase::Idle);
    }
}
