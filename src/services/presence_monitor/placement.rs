use crate::events::{Display, ScreenRect, WindowGeometry};

/// Display holding the game window's top-left corner (bounds inclusive)
pub fn owning_display(displays: &[Display], game: ScreenRect) -> Option<Display> {
    displays
        .iter()
        .copied()
        .find(|display| display.contains(game.left, game.top))
}

/// Sidebar geometry: `width_fraction` of the game width, full game height,
/// anchored to the game's right edge and kept inside the owning display.
pub fn sidebar_geometry(game: ScreenRect, display: Display, width_fraction: f32) -> WindowGeometry {
    let width = ((f64::from(game.width()) * f64::from(width_fraction)) as i32).max(1);
    let height = game.height().max(1);

    let mut x = game.right;
    let mut y = game.top;

    if x + width > display.right() {
        x = display.right() - width - 1;
    }
    if x < display.x {
        x = display.x;
    }

    if y + height > display.bottom() {
        y = display.bottom() - height;
    }
    if y < display.y {
        y = display.y;
    }

    WindowGeometry::new(x, y, width as u32, height as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME: ScreenRect = ScreenRect {
        left: 100,
        top: 100,
        right: 1100,
        bottom: 800,
    };

    #[test]
    fn test_sidebar_fits_without_clamp() {
        let display = Display::new(0, 0, 1280, 1024);
        assert_eq!(
            sidebar_geometry(GAME, display, 0.15),
            WindowGeometry::new(1100, 100, 150, 700)
        );
    }

    #[test]
    fn test_sidebar_slides_left_to_display_edge() {
        let display = Display::new(0, 0, 1200, 1024);
        assert_eq!(
            sidebar_geometry(GAME, display, 0.15),
            WindowGeometry::new(1049, 100, 150, 700)
        );
    }

    #[test]
    fn test_sidebar_clamped_to_left_edge() {
        // Игра шире монитора: панель не может уйти левее монитора
        let game = ScreenRect::new(1920, 0, 3920, 1080);
        let display = Display::new(1920, 0, 200, 1080);
        let placement = sidebar_geometry(game, display, 0.15);
        assert_eq!(placement.x, 1920);
        assert_eq!(placement.width, 300);
    }

    #[test]
    fn test_sidebar_clamped_vertically() {
        let game = ScreenRect::new(0, 500, 800, 1300);
        let display = Display::new(0, 0, 1920, 1080);
        let placement = sidebar_geometry(game, display, 0.15);
        assert_eq!(placement.y, 280);
        assert_eq!(placement.height, 800);

        let game = ScreenRect::new(0, -40, 800, 600);
        let placement = sidebar_geometry(game, display, 0.15);
        assert_eq!(placement.y, 0);
    }

    #[test]
    fn test_owning_display() {
        let displays = [Display::new(0, 0, 1920, 1080), Display::new(1920, 0, 2560, 1440)];
        assert_eq!(owning_display(&displays, GAME), Some(displays[0]));
        assert_eq!(
            owning_display(&displays, ScreenRect::new(2000, 10, 3000, 800)),
            Some(displays[1])
        );
        assert_eq!(owning_display(&displays, ScreenRect::new(-500, 10, 0, 800)), None);
    }
}
