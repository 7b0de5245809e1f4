// src/host.rs

//! What the backend reports back to its host.

use crate::canvas::Point;
use serde::{Deserialize, Serialize};

/// Navigation keys the control stream can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
    ZoomIn,
    ZoomOut,
}

impl NavKey {
    /// Single-byte key code understood by the navigation host.
    pub fn code(self) -> u8 {
        match self {
            NavKey::Left => 0x02,
            NavKey::Right => 0x06,
            NavKey::Up => 0x10,
            NavKey::Down => 0x0e,
            NavKey::ZoomIn => 0x15,
            NavKey::ZoomOut => 0x11,
        }
    }
}

/// Mouse button injected by `press=` / `release=` lines.
pub const PRIMARY_BUTTON: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    /// The root surface now has this size.
    Resized { width: u32, height: u32 },
    PointerButton {
        pressed: bool,
        button: u8,
        point: Point,
    },
    PointerMoved(Point),
    KeyPressed(NavKey),
    /// The peer asked the host to terminate.
    Quit,
    /// A resize could not allocate; the host session cannot continue.
    ResizeFailed { width: u32, height: u32 },
}

/// Window-level handle exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowHandle {
    fullscreen: bool,
}

impl WindowHandle {
    /// Accepted and always reported as successful; there is no real window.
    pub fn set_fullscreen(&mut self, on: bool) -> bool {
        self.fullscreen = on;
        true
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_key_codes() {
        let codes: Vec<u8> = [
            NavKey::Left,
            NavKey::Right,
            NavKey::Up,
            NavKey::Down,
            NavKey::ZoomIn,
            NavKey::ZoomOut,
        ]
        .iter()
        .map(|k| k.code())
        .collect();
        assert_eq!(codes, vec![0x02, 0x06, 0x10, 0x0e, 0x15, 0x11]);
    }
}
