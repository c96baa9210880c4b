use crate::error::{MonitorError, Result};
use crate::events::{ScreenRect, WindowHandle, WindowInfo};
use tracing::info;

use super::process::ProcessInfo;
use super::r#trait::WindowBackend;

/// Бэкенд для dry-run: игра никогда не запущена, окон нет
pub struct DryRunBackend;

impl DryRunBackend {
    pub fn new() -> Self {
        info!("Dry-run режим - WindowProbe работает в режиме эмуляции");
        Self
    }
}

impl WindowBackend for DryRunBackend {
    fn list_windows(&mut self) -> Result<Vec<WindowInfo>> {
        Ok(Vec::new())
    }

    fn foreground_window(&mut self) -> Result<Option<WindowHandle>> {
        Ok(None)
    }

    fn window_rect(&mut self, handle: WindowHandle) -> Result<ScreenRect> {
        Err(MonitorError::Internal(format!("[DRY RUN] окно {} не существует", handle)))
    }

    fn activate(&mut self, handle: WindowHandle) -> Result<()> {
        info!("[DRY RUN] Активация окна {}", handle);
        Ok(())
    }

    fn processes(&mut self) -> Result<Vec<ProcessInfo>> {
        Ok(Vec::new())
    }
}
