use crate::error::Result;
use crate::events::{Display, WindowGeometry};
use smallvec::smallvec;
use tracing::info;

use super::r#trait::{Displays, WindowController};

/// Окно-компаньон в памяти: только логирует команды
pub struct DryRunWindow {
    geometry: WindowGeometry,
    on_top: bool,
    transparent: bool,
}

impl DryRunWindow {
    pub fn new() -> Self {
        info!("Dry-run режим - окно-компаньон эмулируется в памяти");
        Self {
            geometry: WindowGeometry::new(200, 150, 1280, 800),
            on_top: false,
            transparent: false,
        }
    }
}

impl WindowController for DryRunWindow {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        info!("[DRY RUN] resize {}x{}", width, height);
        self.geometry.width = width;
        self.geometry.height = height;
        Ok(())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        info!("[DRY RUN] move {}, {}", x, y);
        self.geometry.x = x;
        self.geometry.y = y;
        Ok(())
    }

    fn set_always_on_top(&mut self, on_top: bool) -> Result<()> {
        info!("[DRY RUN] always-on-top = {}", on_top);
        self.on_top = on_top;
        Ok(())
    }

    fn is_always_on_top(&mut self) -> bool {
        self.on_top
    }

    fn set_transparent(&mut self, transparent: bool) -> Result<()> {
        if self.transparent != transparent {
            info!("[DRY RUN] transparent = {}", transparent);
        }
        self.transparent = transparent;
        Ok(())
    }

    fn has_focus(&mut self) -> bool {
        false
    }

    fn current_geometry(&mut self) -> Result<WindowGeometry> {
        Ok(self.geometry)
    }

    fn list_displays(&mut self) -> Result<Displays> {
        Ok(smallvec![Display::new(0, 0, 1920, 1080)])
    }
}
