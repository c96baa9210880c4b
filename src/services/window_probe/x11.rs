use crate::error::{MonitorError, Result};
use crate::events::{ScreenRect, WindowHandle, WindowInfo};
use crate::utils::shell;
use std::path::Path;
use tracing::debug;

use super::process::{scan_processes, ProcessInfo};
use super::r#trait::WindowBackend;

/// X11 реализация: перечисление через wmctrl, фокус и геометрия через xdotool
pub struct X11Backend;

impl X11Backend {
    pub fn new() -> Self {
        Self
    }
}

/// Разбор строки `wmctrl -l`: `0x03a00007  0 host Заголовок окна`.
/// Заголовок сохраняется как есть, включая внутренние пробелы.
pub(crate) fn parse_wmctrl_line(line: &str) -> Option<WindowInfo> {
    let mut rest = line.trim_start();
    let mut fields = [""; 3];
    for field in fields.iter_mut() {
        let end = rest.find(char::is_whitespace)?;
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }

    let id = u64::from_str_radix(fields[0].trim_start_matches("0x"), 16).ok()?;
    Some(WindowInfo::new(WindowHandle(id), rest.to_string()))
}

impl WindowBackend for X11Backend {
    fn list_windows(&mut self) -> Result<Vec<WindowInfo>> {
        let stdout = shell::run("wmctrl", &["-l"])
            .map_err(|e| MonitorError::Enumeration(e.to_string()))?;

        let windows: Vec<WindowInfo> = stdout.lines().filter_map(parse_wmctrl_line).collect();
        crate::debug_if_enabled!("wmctrl: {} окон", windows.len());
        Ok(windows)
    }

    fn foreground_window(&mut self) -> Result<Option<WindowHandle>> {
        let stdout = shell::run("xdotool", &["getactivewindow"])?;
        Ok(shell::parse_window_id(&stdout))
    }

    fn window_rect(&mut self, handle: WindowHandle) -> Result<ScreenRect> {
        let id = handle.0.to_string();
        let stdout = shell::run("xdotool", &["getwindowgeometry", "--shell", &id])?;
        let geometry = shell::parse_shell_geometry(&stdout).ok_or_else(|| {
            MonitorError::Internal(format!("Не удалось разобрать геометрию окна {}", handle))
        })?;
        Ok(ScreenRect::from_geometry(geometry))
    }

    fn activate(&mut self, handle: WindowHandle) -> Result<()> {
        let id = handle.0.to_string();
        shell::run("xdotool", &["windowactivate", "--sync", &id])?;
        debug!("Окно {} активировано", handle);
        Ok(())
    }

    fn processes(&mut self) -> Result<Vec<ProcessInfo>> {
        scan_processes(Path::new("/proc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wmctrl_line() {
        let window = parse_wmctrl_line("0x03a00007  0 archbox Wuthering Waves  ").unwrap();
        assert_eq!(window.handle, WindowHandle(0x03a00007));
        assert_eq!(window.title, "Wuthering Waves  ");

        let sticky = parse_wmctrl_line("0x01e00003 -1 archbox WuWa Mod Manager").unwrap();
        assert_eq!(sticky.title, "WuWa Mod Manager");
    }

    #[test]
    fn test_parse_wmctrl_line_rejects_garbage() {
        assert!(parse_wmctrl_line("").is_none());
        assert!(parse_wmctrl_line("zzz 0 host Title").is_none());
        assert!(parse_wmctrl_line("0x0100000a 0 host").is_none());
    }
}
