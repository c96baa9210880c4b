use crate::events::{MonitorEvent, COLOR_RED, COLOR_YELLOW};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Состояние интерфейса, собранное из событий монитора.
/// Меняется только в задаче, читающей канал.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub running_color: &'static str,
    pub active_color: &'static str,
    pub in_game_mode: bool,
    pub last_refresh: Option<bool>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            running_color: COLOR_RED,
            active_color: COLOR_YELLOW,
            in_game_mode: false,
            last_refresh: None,
        }
    }
}

impl UiState {
    pub fn apply(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Presence { indicators, .. } => {
                self.running_color = indicators.running_color;
                self.active_color = indicators.active_color;
            }
            MonitorEvent::InGameMode { enabled } => self.in_game_mode = enabled,
            MonitorEvent::RefreshSent { success } => self.last_refresh = Some(success),
        }
    }
}

/// Читать события до закрытия канала. Возвращает итоговое состояние интерфейса.
pub async fn run_event_loop(mut events: UnboundedReceiver<MonitorEvent>) -> UiState {
    let mut state = UiState::default();

    while let Some(event) = events.recv().await {
        state.apply(event);
        match event {
            MonitorEvent::Presence { running, active, .. } => {
                info!(
                    "Индикаторы: запущена {} ({}), активна {} ({})",
                    running, state.running_color, active, state.active_color
                );
            }
            MonitorEvent::InGameMode { enabled } => {
                info!("Режим боковой панели: {}", if enabled { "включён" } else { "выключен" });
            }
            MonitorEvent::RefreshSent { success: true } => info!("Моды перезагружены в игре"),
            MonitorEvent::RefreshSent { success: false } => warn!("Не удалось перезагрузить моды в игре"),
        }
    }

    info!("Канал событий монитора закрыт");
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::COLOR_GREEN;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_ui_state_follows_events() {
        let mut state = UiState::default();
        state.apply(MonitorEvent::presence(true, false));
        assert_eq!(state.running_color, COLOR_GREEN);
        assert_eq!(state.active_color, COLOR_YELLOW);

        state.apply(MonitorEvent::InGameMode { enabled: true });
        state.apply(MonitorEvent::RefreshSent { success: true });
        assert!(state.in_game_mode);
        assert_eq!(state.last_refresh, Some(true));
    }

    #[tokio::test]
    async fn test_event_loop_drains_until_closed() {
        let (tx, rx) = unbounded_channel();
        tx.send(MonitorEvent::presence(true, true)).unwrap();
        tx.send(MonitorEvent::InGameMode { enabled: true }).unwrap();
        tx.send(MonitorEvent::InGameMode { enabled: false }).unwrap();
        drop(tx);

        let state = run_event_loop(rx).await;
        assert_eq!(state.active_color, COLOR_GREEN);
        assert!(!state.in_game_mode);
    }
}
