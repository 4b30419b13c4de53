use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// No face was detected in the latest sensor frame. The last target is kept.
    #[error("no face detected in sensor frame")]
    SensorUnavailable,

    #[error("audio track is unavailable")]
    AudioUnavailable,

    #[error("playback start was rejected: {0}")]
    AutoplayBlocked(String),

    #[error("missed beat #{index} at {time:.3}s")]
    MissedBeat { index: usize, time: f32 },

    #[error("calibration had no usable {axis} motion; spread floored")]
    DegenerateCalibration { axis: char },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        GameError::Io(e.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;
