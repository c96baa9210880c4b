pub mod keyboard;
pub mod monitor;
pub mod window;

pub use keyboard::{KeyCode, KeyState};
pub use monitor::{
    DetectionResult, IndicatorColors, MonitorEvent, MonitorState, PresencePhase, COLOR_GREEN, COLOR_RED,
    COLOR_YELLOW,
};
pub use window::{Display, ScreenRect, WindowGeometry, WindowHandle, WindowInfo};

/// События для виртуальной клавиатуры
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
}

impl VirtualKeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState) -> Self {
        Self { key_code, state }
    }

    pub fn press(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Pressed)
    }

    pub fn release(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Released)
    }
}
