use serde::Serialize;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Lane {
    Left = 0,
    Center = 1,
    Right = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Level {
    Low = 0,
    High = 1,
}

/// The discrete position the player intends to occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerTarget {
    pub lane: Lane,
    pub level: Level,
}

impl Default for PlayerTarget {
    fn default() -> Self {
        Self {
            lane: Lane::Center,
            level: Level::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Lane(Lane),
    Level(Level),
    Recalibrate,
}

#[inline(always)]
pub fn action_from_keycode(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(KeyAction::Lane(Lane::Left)),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(KeyAction::Lane(Lane::Right)),
        KeyCode::ArrowUp | KeyCode::KeyW => Some(KeyAction::Level(Level::High)),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(KeyAction::Level(Level::Low)),
        KeyCode::KeyR => Some(KeyAction::Recalibrate),
        _ => None,
    }
}

/// Only fresh key-downs count; auto-repeat and releases are dropped.
pub fn action_from_key_event(event: &KeyEvent) -> Option<KeyAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match event.physical_key {
        PhysicalKey::Code(code) => action_from_keycode(code),
        PhysicalKey::Unidentified(_) => None,
    }
}
