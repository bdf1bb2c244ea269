// Oshirase - Desktop Notification Daemon
// Notification state engine, image resolution, popup layout and D-Bus service

pub mod config;
pub mod error;
pub mod notify;

pub use config::Config;
pub use error::{ConfigError, DaemonError, EngineError, ImageError, RenderError};
pub use notify::{CloseReason, Engine, EngineSettings, NotifyRequest, Signal};
