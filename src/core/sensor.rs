use crate::config::{FACE_SMOOTHING, NOSE_TIP_LANDMARK};
use crate::error::{GameError, GameResult};
use log::{debug, warn};
use serde::Serialize;
use std::sync::mpsc::{channel, Receiver, SendError, Sender, TryRecvError};
use std::time::Instant;

/// One landmark point in normalized image space, both axes in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// A single head position reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RawSample {
    pub x: f32,
    pub y: f32,
}

/// Picks the nose tip of the first detected face.
pub fn nose_tip(faces: &[Vec<Landmark>]) -> GameResult<RawSample> {
    let Some(face) = faces.first() else {
        return Err(GameError::SensorUnavailable);
    };
    if face.is_empty() {
        return Err(GameError::SensorUnavailable);
    }
    // A short landmark list still counts as a face; park the head at the middle.
    let point = face.get(NOSE_TIP_LANDMARK).copied().unwrap_or(Landmark { x: 0.5, y: 0.5 });
    if !(point.x.is_finite() && point.y.is_finite()) {
        debug!("Discarding non-finite landmark ({}, {})", point.x, point.y);
        return Err(GameError::SensorUnavailable);
    }
    Ok(RawSample {
        x: point.x,
        y: point.y,
    })
}

/// Exponential smoothing, seeded by the first sample it sees.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleSmoother {
    current: Option<RawSample>,
}

impl SampleSmoother {
    pub fn push(&mut self, raw: RawSample) -> RawSample {
        let next = match self.current {
            None => raw,
            Some(prev) => RawSample {
                x: prev.x + (raw.x - prev.x) * FACE_SMOOTHING,
                y: prev.y + (raw.y - prev.y) * FACE_SMOOTHING,
            },
        };
        self.current = Some(next);
        next
    }

    pub fn current(&self) -> Option<RawSample> {
        self.current
    }
}

/// What the landmark pipeline hands over for one camera frame.
#[derive(Clone, Debug)]
pub struct FaceFrame {
    pub faces: Vec<Vec<Landmark>>,
    pub captured_at: Instant,
}

impl FaceFrame {
    pub fn single(point: Landmark, captured_at: Instant) -> Self {
        // Index 0 is a placeholder; only the nose tip at index 1 is read.
        Self {
            faces: vec![vec![point, point]],
            captured_at,
        }
    }

    pub fn empty(captured_at: Instant) -> Self {
        Self {
            faces: Vec::new(),
            captured_at,
        }
    }
}

/// Producer half of the sensor handoff. Safe to move to the inference thread.
#[derive(Clone, Debug)]
pub struct SensorSender {
    tx: Sender<FaceFrame>,
}

impl SensorSender {
    pub fn send(&self, frame: FaceFrame) -> Result<(), SendError<FaceFrame>> {
        self.tx.send(frame)
    }
}

/// Consumer half, drained by the tick loop before it reads the player target.
#[derive(Debug)]
pub struct SensorFeed {
    rx: Receiver<FaceFrame>,
    disconnected: bool,
}

impl SensorFeed {
    pub fn channel() -> (SensorSender, SensorFeed) {
        let (tx, rx) = channel();
        (
            SensorSender { tx },
            SensorFeed {
                rx,
                disconnected: false,
            },
        )
    }

    /// Returns every frame that arrived since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<FaceFrame> {
        let mut frames = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(frame) => frames.push(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("Sensor producer disconnected.");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        if !frames.is_empty() {
            debug!("Drained {} sensor frames", frames.len());
        }
        frames
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nose_tip_reads_index_one_of_first_face() {
        let faces = vec![
            vec![Landmark { x: 0.1, y: 0.1 }, Landmark { x: 0.4, y: 0.6 }],
            vec![Landmark { x: 0.9, y: 0.9 }, Landmark { x: 0.9, y: 0.9 }],
        ];
        assert_eq!(nose_tip(&faces).unwrap(), RawSample { x: 0.4, y: 0.6 });
    }

    #[test]
    fn missing_face_is_sensor_unavailable() {
        assert_eq!(nose_tip(&[]), Err(GameError::SensorUnavailable));
        assert_eq!(nose_tip(&[vec![]]), Err(GameError::SensorUnavailable));
    }

    #[test]
    fn non_finite_point_is_sensor_unavailable() {
        let nan = vec![vec![Landmark { x: 0.1, y: 0.1 }, Landmark { x: f32::NAN, y: 0.5 }]];
        assert_eq!(nose_tip(&nan), Err(GameError::SensorUnavailable));
        let inf = vec![vec![Landmark { x: 0.1, y: 0.1 }, Landmark { x: 0.5, y: f32::INFINITY }]];
        assert_eq!(nose_tip(&inf), Err(GameError::SensorUnavailable));
    }

    #[test]
    fn short_face_falls_back_to_center() {
        let faces = vec![vec![Landmark { x: 0.2, y: 0.2 }]];
        assert_eq!(nose_tip(&faces).unwrap(), RawSample { x: 0.5, y: 0.5 });
    }

    #[test]
    fn smoother_seeds_then_blends() {
        let mut smoother = SampleSmoother::default();
        assert_eq!(smoother.push(RawSample { x: 0.2, y: 0.8 }), RawSample { x: 0.2, y: 0.8 });
        let next = smoother.push(RawSample { x: 1.2, y: 0.8 });
        assert!((next.x - 0.55).abs() < 1e-6);
        assert!((next.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn feed_drains_in_arrival_order_across_threads() {
        let (tx, mut feed) = SensorFeed::channel();
        let producer = std::thread::spawn(move || {
            for i in 0..5 {
                let p = Landmark { x: i as f32 / 10.0, y: 0.5 };
                tx.send(FaceFrame::single(p, Instant::now())).unwrap();
            }
        });
        producer.join().unwrap();
        let frames = feed.drain();
        assert_eq!(frames.len(), 5);
        assert_eq!(nose_tip(&frames[3].faces).unwrap().x, 0.3);
        assert!(feed.drain().is_empty());
        assert!(feed.is_disconnected());
    }
}
