//! Запуск внешних X11 утилит (xdotool, wmctrl, xprop, xrandr) и разбор их вывода.

use crate::error::{MonitorError, Result};
use crate::events::{WindowGeometry, WindowHandle};
use std::process::Command;

/// Выполнить команду и вернуть stdout. Ненулевой код возврата считается ошибкой.
pub fn run(program: &str, args: &[&str]) -> Result<String> {
    crate::trace_if_enabled!("exec: {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| crate::monitor_error!(internal, "{} не найден или не запускается: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MonitorError::Internal(format!(
            "{} вернул ошибку ({}): {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Разбор `xdotool getwindowgeometry --shell`:
/// ```text
/// WINDOW=60817415
/// X=100
/// Y=100
/// WIDTH=1000
/// HEIGHT=700
/// SCREEN=0
/// ```
pub fn parse_shell_geometry(text: &str) -> Option<WindowGeometry> {
    let mut x = None;
    let mut y = None;
    let mut width = None;
    let mut height = None;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "X" => x = value.parse::<i32>().ok(),
            "Y" => y = value.parse::<i32>().ok(),
            "WIDTH" => width = value.parse::<u32>().ok(),
            "HEIGHT" => height = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    Some(WindowGeometry::new(x?, y?, width?, height?))
}

/// Первый десятичный идентификатор окна в выводе xdotool
pub fn parse_window_id(text: &str) -> Option<WindowHandle> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<u64>().ok())
        .map(WindowHandle)
}

/// Экранирование подстроки для `xdotool search --name`, который принимает регулярное выражение
pub fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
