//! WindowProbe: responsibility and boundaries
//!
//! This module is responsible ONLY for answering presence questions about the game:
//! is its process running, which top-level window is it, is that window in the
//! foreground and where is it on screen. It caches the resolved window handle and
//! drops it whenever a query against it fails, so the next call re-resolves lazily.
//! Enumeration failures (window list, process list) are the only errors that leave
//! this module; everything else degrades to "unknown/false/None".

mod dry_run;
mod probe;
mod process;
mod r#trait;
mod x11;

pub use self::probe::WindowProbe;
pub use self::process::ProcessInfo;
pub use self::r#trait::{create_window_backend, WindowBackend};
