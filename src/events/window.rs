use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор окна верхнего уровня (X11 window id).
/// Не переживает перезапуск игры: после сбоя запроса кэш сбрасывается.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Информация об окне, полученная при перечислении
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
}

impl WindowInfo {
    pub fn new(handle: WindowHandle, title: String) -> Self {
        Self { handle, title }
    }

    /// Регистрозависимое вхождение подстроки в заголовок
    pub fn title_contains(&self, needle: &str) -> bool {
        self.title.contains(needle)
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.title, self.handle)
    }
}

/// Прямоугольник окна в экранных координатах. Никогда не кэшируется.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn from_geometry(geometry: WindowGeometry) -> Self {
        Self {
            left: geometry.x,
            top: geometry.y,
            right: geometry.x + geometry.width as i32,
            bottom: geometry.y + geometry.height as i32,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

impl fmt::Display for ScreenRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.top, self.right, self.bottom)
    }
}

/// Геометрия окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

impl fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Физический монитор в общем координатном пространстве рабочего стола
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Display {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Display {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Границы включительные: точка на правом/нижнем краю тоже принадлежит монитору
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.x <= x && x <= self.right() && self.y <= y && y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_geometry() {
        let rect = ScreenRect::from_geometry(WindowGeometry::new(100, 50, 1000, 700));
        assert_eq!(rect, ScreenRect::new(100, 50, 1100, 750));
        assert_eq!(rect.width(), 1000);
        assert_eq!(rect.height(), 700);
        assert!(!rect.is_empty());
        assert!(ScreenRect::new(10, 10, 10, 20).is_empty());
    }

    #[test]
    fn test_display_contains_is_inclusive() {
        let display = Display::new(0, 0, 1920, 1080);
        assert!(display.contains(0, 0));
        assert!(display.contains(1920, 1080));
        assert!(!display.contains(1921, 0));
        assert!(!display.contains(-1, 10));
    }

    #[test]
    fn test_title_match_is_case_sensitive() {
        let window = WindowInfo::new(WindowHandle(0x3a00007), "Wuthering Waves  ".to_string());
        assert!(window.title_contains("Wuthering"));
        assert!(!window.title_contains("wuthering"));
        assert_eq!(window.to_string(), "\"Wuthering Waves  \" (0x03a00007)");
    }
}
