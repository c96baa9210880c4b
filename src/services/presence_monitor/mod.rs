//! Presence monitor: the background loop that watches the game.
//!
//! Every tick it asks [`WindowProbe`](crate::services::window_probe::WindowProbe)
//! whether the game runs and has focus, reports edges of that pair as
//! [`MonitorEvent`](crate::events::MonitorEvent)s, delivers a pending mod refresh
//! once the game can receive it, and every Nth tick runs template detection to
//! switch the companion window in and out of its sidebar layout.
//!
//! The loop lives on its own OS thread and owns all collaborators. Other
//! threads only see a [`MonitorHandle`].

mod clock;
mod monitor;
mod placement;

pub use self::clock::{Clock, SystemClock};
pub use self::monitor::{MonitorHandle, MonitorSettings, MonitorThread, PresenceMonitor};
pub use self::placement::{owning_display, sidebar_geometry};
