pub mod companion_window;
pub mod presence_monitor;
pub mod screen_capture;
pub mod screen_detector;
pub mod template_matcher;
pub mod ui_bridge;
pub mod virtual_device;
pub mod window_probe;

pub use companion_window::create_companion_window;
pub use presence_monitor::{MonitorSettings, PresenceMonitor, SystemClock};
pub use screen_capture::create_screen_capturer;
pub use screen_detector::TemplateDetector;
pub use template_matcher::TemplateMatcher;
pub use virtual_device::VirtualDevice;
pub use window_probe::{create_window_backend, WindowProbe};
