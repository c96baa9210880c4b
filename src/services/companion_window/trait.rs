use crate::config::Config;
use crate::error::Result;
use crate::events::{Display, WindowGeometry};
use smallvec::SmallVec;

/// Physical displays; almost always four or fewer
pub type Displays = SmallVec<[Display; 4]>;

/// Operations the presence monitor performs on the companion window.
///
/// Owned by the monitor thread for its whole lifetime, so implementations
/// need to be `Send` but not `Sync`.
pub trait WindowController: Send {
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn set_always_on_top(&mut self, on_top: bool) -> Result<()>;
    /// Live stacking state; `false` when it cannot be read
    fn is_always_on_top(&mut self) -> bool;
    fn set_transparent(&mut self, transparent: bool) -> Result<()>;
    /// Whether the companion window itself holds keyboard focus
    fn has_focus(&mut self) -> bool;
    fn current_geometry(&mut self) -> Result<WindowGeometry>;
    fn list_displays(&mut self) -> Result<Displays>;
}

/// Factory function to create an appropriate window controller based on the dry_run flag
pub fn create_companion_window(config: &Config, dry_run: bool) -> Box<dyn WindowController> {
    if dry_run {
        Box::new(super::dry_run::DryRunWindow::new())
    } else {
        Box::new(super::xdotool::XdotoolCompanionWindow::new(
            config.companion.window_title.clone(),
        ))
    }
}
