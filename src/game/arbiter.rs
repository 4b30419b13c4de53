use log::info;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InputMode {
    Face,
    Keyboard,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            InputMode::Face => "Face",
            InputMode::Keyboard => "Keyboard",
        }
    }
}

/// Decides whether face tracking or the keyboard owns the player target.
/// Keyboard is a temporary override: recent face activity takes control back.
#[derive(Debug, Clone)]
pub struct InputModeArbiter {
    mode: InputMode,
    face_available: bool,
    last_face_at: Option<Instant>,
    recency: Duration,
}

impl InputModeArbiter {
    pub fn new(recency: Duration) -> Self {
        Self {
            mode: InputMode::Face,
            face_available: false,
            last_face_at: None,
            recency,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn face_available(&self) -> bool {
        self.face_available
    }

    pub fn face_drives_target(&self) -> bool {
        self.mode == InputMode::Face
    }

    pub fn on_key(&mut self) {
        if self.mode != InputMode::Keyboard {
            info!("Input mode -> Keyboard");
        }
        self.mode = InputMode::Keyboard;
    }

    pub fn on_face_sample(&mut self, at: Instant) {
        self.face_available = true;
        self.last_face_at = Some(at);
    }

    pub fn on_face_lost(&mut self) {
        self.face_available = false;
    }

    /// Hands control back to the face, e.g. when a calibration starts.
    pub fn reset(&mut self) {
        self.mode = InputMode::Face;
    }

    /// Per-tick check. Reverts to face input if a face was seen within the
    /// recency window.
    pub fn evaluate(&mut self, now: Instant) -> InputMode {
        if self.mode == InputMode::Keyboard && self.face_available {
            if let Some(last) = self.last_face_at {
                if now.saturating_duration_since(last) < self.recency {
                    info!("Input mode -> Face");
                    self.mode = InputMode::Face;
                }
            }
        }
        self.mode
    }
}
