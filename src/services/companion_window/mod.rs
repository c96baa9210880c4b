//! Companion window: the mod manager's own top-level window.
//!
//! The presence monitor drives its geometry, stacking and opacity, but never
//! owns its UI state; UI-side updates travel as `MonitorEvent`s instead.

mod dry_run;
mod r#trait;
mod xdotool;

pub use self::dry_run::DryRunWindow;
pub use self::r#trait::{create_companion_window, Displays, WindowController};
pub use self::xdotool::XdotoolCompanionWindow;
