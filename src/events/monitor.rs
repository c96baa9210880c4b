use serde::{Deserialize, Serialize};
use std::fmt;

pub const COLOR_GREEN: &str = "#22c55e";
pub const COLOR_RED: &str = "#ef4444";
pub const COLOR_YELLOW: &str = "#eab308";

/// Снимок состояния монитора. Пишет только поток монитора,
/// `pending_refresh` может выставить кто угодно.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub is_running: bool,
    pub is_active: bool,
    pub in_target_screen: bool,
    pub pending_refresh: bool,
}

impl MonitorState {
    pub fn phase(&self) -> PresencePhase {
        match (self.is_running, self.is_active, self.in_target_screen) {
            (false, _, _) => PresencePhase::Idle,
            (true, false, _) => PresencePhase::RunningInactive,
            (true, true, false) => PresencePhase::RunningActive,
            (true, true, true) => PresencePhase::InTargetScreen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresencePhase {
    Idle,
    RunningInactive,
    RunningActive,
    InTargetScreen,
}

impl fmt::Display for PresencePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresencePhase::Idle => "idle",
            PresencePhase::RunningInactive => "running (inactive)",
            PresencePhase::RunningActive => "running (active)",
            PresencePhase::InTargetScreen => "in target screen",
        };
        f.write_str(name)
    }
}

/// Цвета индикаторов присутствия игры в интерфейсе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IndicatorColors {
    pub running_color: &'static str,
    pub active_color: &'static str,
}

impl IndicatorColors {
    pub fn for_presence(running: bool, active: bool) -> Self {
        Self {
            running_color: if running { COLOR_GREEN } else { COLOR_RED },
            active_color: if active { COLOR_GREEN } else { COLOR_YELLOW },
        }
    }
}

/// Событие от потока монитора к потоку интерфейса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorEvent {
    /// Изменилось присутствие игры (только по фронту)
    Presence {
        running: bool,
        active: bool,
        indicators: IndicatorColors,
    },
    /// Вход/выход из режима боковой панели поверх игры
    InGameMode { enabled: bool },
    /// Отправлен сигнал перезагрузки модов в игру
    RefreshSent { success: bool },
}

impl MonitorEvent {
    pub fn presence(running: bool, active: bool) -> Self {
        MonitorEvent::Presence {
            running,
            active,
            indicators: IndicatorColors::for_presence(running, active),
        }
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::Presence { running, active, .. } => {
                write!(f, "Presence(running={}, active={})", running, active)
            }
            MonitorEvent::InGameMode { enabled } => write!(f, "InGameMode({})", enabled),
            MonitorEvent::RefreshSent { success } => write!(f, "RefreshSent({})", success),
        }
    }
}

/// Результат одной попытки сопоставления с шаблоном. Не хранится.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detected: bool,
    pub score: f32,
}

impl DetectionResult {
    pub fn not_detected() -> Self {
        Self {
            detected: false,
            score: 0.0,
        }
    }

    /// Оценка зажимается в [0, 1], `detected` определяется уже по зажатой оценке
    pub fn from_score(score: f32, threshold: f32) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            detected: score >= threshold,
            score,
        }
    }
}
