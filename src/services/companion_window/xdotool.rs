use crate::error::{MonitorError, Result};
use crate::events::{Display, WindowGeometry, WindowHandle};
use crate::utils::shell;
use tracing::{debug, info};

use super::r#trait::{Displays, WindowController};

/// _NET_WM_WINDOW_OPACITY для режима боковой панели (~85%)
const OVERLAY_OPACITY: &str = "0xd8000000";

/// Окно-компаньон, найденное по заголовку и управляемое через xdotool/wmctrl/xprop
pub struct XdotoolCompanionWindow {
    title: String,
    handle: Option<WindowHandle>,
}

impl XdotoolCompanionWindow {
    pub fn new(title: String) -> Self {
        info!("Окно-компаньон будет найдено по заголовку '{}'", title);
        Self {
            title,
            handle: None,
        }
    }

    fn resolve(&mut self) -> Result<WindowHandle> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }

        let pattern = shell::escape_regex(&self.title);
        let stdout = shell::run("xdotool", &["search", "--onlyvisible", "--name", &pattern])?;
        let handle = shell::parse_window_id(&stdout)
            .ok_or_else(|| crate::monitor_error!(window, "Окно '{}' не найдено", self.title))?;

        debug!("Окно-компаньон: {}", handle);
        self.handle = Some(handle);
        Ok(handle)
    }

    /// Выполнить команду над окном; при ошибке сбросить кэш идентификатора
    fn with_window(
        &mut self,
        program: &str,
        build_args: impl FnOnce(String) -> Vec<String>,
    ) -> Result<String> {
        let handle = self.resolve()?;
        let args = build_args(handle.0.to_string());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        shell::run(program, &args).map_err(|e| {
            self.handle = None;
            MonitorError::Window(e.to_string())
        })
    }
}

/// Разбор `xprop -id <id> _NET_WM_STATE`:
/// `_NET_WM_STATE(ATOM) = _NET_WM_STATE_ABOVE, _NET_WM_STATE_STICKY`
pub(crate) fn has_above_state(text: &str) -> bool {
    text.split_once('=')
        .map(|(_, atoms)| atoms.split(',').any(|atom| atom.trim() == "_NET_WM_STATE_ABOVE"))
        .unwrap_or(false)
}

/// Разбор `xrandr --listmonitors`:
/// ```text
/// Monitors: 2
///  0: +*eDP-1 1920/344x1080/194+0+0  eDP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
pub(crate) fn parse_xrandr_monitors(text: &str) -> Displays {
    text.lines()
        .filter_map(|line| line.split_whitespace().nth(2))
        .filter_map(parse_monitor_geometry)
        .collect()
}

fn parse_monitor_geometry(token: &str) -> Option<Display> {
    let (width_part, rest) = token.split_once('x')?;
    let width = width_part.split('/').next()?.parse().ok()?;

    let mut parts = rest.split('+');
    let height = parts.next()?.split('/').next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;

    Some(Display::new(x, y, width, height))
}

impl WindowController for XdotoolCompanionWindow {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.with_window("xdotool", |id| {
            vec!["windowsize".into(), id, width.to_string(), height.to_string()]
        })?;
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.with_window("xdotool", |id| {
            vec!["windowmove".into(), id, x.to_string(), y.to_string()]
        })?;
        Ok(())
    }

    fn set_always_on_top(&mut self, on_top: bool) -> Result<()> {
        let action = if on_top { "add,above" } else { "remove,above" };
        let handle = self.resolve()?;
        self.with_window("wmctrl", |_| {
            vec!["-i".into(), "-r".into(), handle.to_string(), "-b".into(), action.into()]
        })?;
        Ok(())
    }

    /// Состояние читается у оконного менеджера: его может менять и сам интерфейс
    fn is_always_on_top(&mut self) -> bool {
        match self.with_window("xprop", |id| vec!["-id".into(), id, "_NET_WM_STATE".into()]) {
            Ok(stdout) => has_above_state(&stdout),
            Err(e) => {
                debug!("Не удалось прочитать _NET_WM_STATE: {}", e);
                false
            }
        }
    }

    fn set_transparent(&mut self, transparent: bool) -> Result<()> {
        self.with_window("xprop", |id| {
            if transparent {
                vec![
                    "-id".into(),
                    id,
                    "-f".into(),
                    "_NET_WM_WINDOW_OPACITY".into(),
                    "32c".into(),
                    "-set".into(),
                    "_NET_WM_WINDOW_OPACITY".into(),
                    OVERLAY_OPACITY.into(),
                ]
            } else {
                vec![
                    "-id".into(),
                    id,
                    "-remove".into(),
                    "_NET_WM_WINDOW_OPACITY".into(),
                ]
            }
        })?;
        Ok(())
    }

    fn has_focus(&mut self) -> bool {
        let Ok(handle) = self.resolve() else {
            return false;
        };
        shell::run("xdotool", &["getactivewindow"])
            .ok()
            .and_then(|stdout| shell::parse_window_id(&stdout))
            == Some(handle)
    }

    fn current_geometry(&mut self) -> Result<WindowGeometry> {
        let stdout = self.with_window("xdotool", |id| {
            vec!["getwindowgeometry".into(), "--shell".into(), id]
        })?;
        shell::parse_shell_geometry(&stdout)
            .ok_or_else(|| MonitorError::Window("Не удалось разобрать геометрию окна-компаньона".into()))
    }

    fn list_displays(&mut self) -> Result<Displays> {
        let stdout = shell::run("xrandr", &["--listmonitors"])?;
        let displays = parse_xrandr_monitors(&stdout);
        if displays.is_empty() {
            return Err(MonitorError::Window("xrandr не вернул ни одного монитора".into()));
        }
        Ok(displays)
    }
}
