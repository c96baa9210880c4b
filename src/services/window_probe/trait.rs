use crate::error::Result;
use crate::events::{ScreenRect, WindowHandle, WindowInfo};

use super::process::ProcessInfo;

/// Raw OS queries behind [`super::WindowProbe`]
pub trait WindowBackend: Send {
    /// All visible top-level windows, in the order the window manager reports them.
    /// Fails only with `MonitorError::Enumeration`.
    fn list_windows(&mut self) -> Result<Vec<WindowInfo>>;

    /// Currently focused top-level window, if any
    fn foreground_window(&mut self) -> Result<Option<WindowHandle>>;

    fn window_rect(&mut self, handle: WindowHandle) -> Result<ScreenRect>;

    /// Bring the window to the foreground so synthetic input lands in it
    fn activate(&mut self, handle: WindowHandle) -> Result<()>;

    /// Running processes. Fails only with `MonitorError::Enumeration`.
    fn processes(&mut self) -> Result<Vec<ProcessInfo>>;
}

/// Factory function to create an appropriate window backend based on the dry_run flag
pub fn create_window_backend(dry_run: bool) -> Box<dyn WindowBackend> {
    if dry_run {
        Box::new(super::dry_run::DryRunBackend::new())
    } else {
        Box::new(super::x11::X11Backend::new())
    }
}
