use crate::error::Result;
use crate::events::{ScreenRect, WindowHandle};
use tracing::{debug, info, warn};

use super::r#trait::WindowBackend;

/// Locates the game window and answers presence queries about it.
///
/// Owns the only cached [`WindowHandle`]. Any failed query against the handle
/// drops it; callers re-resolve with [`WindowProbe::resolve`] on the next tick.
pub struct WindowProbe {
    backend: Box<dyn WindowBackend>,
    cached_handle: Option<WindowHandle>,
}

impl WindowProbe {
    pub fn new(backend: Box<dyn WindowBackend>) -> Self {
        Self {
            backend,
            cached_handle: None,
        }
    }

    /// First visible top-level window whose title contains `title_substring`.
    /// Which window wins among several matches is up to the window manager.
    pub fn find_window(&mut self, title_substring: &str) -> Result<Option<WindowHandle>> {
        let windows = self.backend.list_windows()?;
        let found = windows
            .into_iter()
            .find(|window| window.title_contains(title_substring));

        match &found {
            Some(window) if self.cached_handle != Some(window.handle) => {
                info!("Найдено окно игры: {}", window);
            }
            None if self.cached_handle.is_some() => {
                info!("Окно игры '{}' больше не найдено", title_substring);
            }
            _ => {}
        }

        self.cached_handle = found.map(|window| window.handle);
        Ok(self.cached_handle)
    }

    /// Cached handle, or a fresh lookup if the cache was invalidated
    pub fn resolve(&mut self, title_substring: &str) -> Result<Option<WindowHandle>> {
        match self.cached_handle {
            Some(handle) => Ok(Some(handle)),
            None => self.find_window(title_substring),
        }
    }

    pub fn is_running(&mut self, process_name: &str) -> Result<bool> {
        let processes = self.backend.processes()?;
        match processes.iter().find(|process| process.matches(process_name)) {
            Some(process) => {
                crate::debug_if_enabled!("Процесс игры {}: pid {}", process_name, process.pid);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fail-safe: any query error invalidates the cache and reports "not active"
    pub fn is_active(&mut self, handle: WindowHandle) -> bool {
        match self.backend.foreground_window() {
            Ok(foreground) => foreground == Some(handle),
            Err(e) => {
                debug!("Не удалось получить активное окно: {}", e);
                self.invalidate();
                false
            }
        }
    }

    pub fn get_rect(&mut self, handle: WindowHandle) -> Option<ScreenRect> {
        if self.cached_handle != Some(handle) {
            return None;
        }

        match self.backend.window_rect(handle) {
            Ok(rect) => Some(rect),
            Err(e) => {
                warn!("Не удалось получить геометрию окна {}: {}", handle, e);
                self.invalidate();
                None
            }
        }
    }

    /// Bring the game window to the foreground before injecting input
    pub fn focus(&mut self, handle: WindowHandle) -> bool {
        match self.backend.activate(handle) {
            Ok(()) => true,
            Err(e) => {
                warn!("Не удалось активировать окно {}: {}", handle, e);
                self.invalidate();
                false
            }
        }
    }

    pub fn invalidate(&mut self) {
        if let Some(handle) = self.cached_handle.take() {
            debug!("Кэш окна {} сброшен", handle);
        }
    }

    pub fn cached_handle(&self) -> Option<WindowHandle> {
        self.cached_handle
    }
}
