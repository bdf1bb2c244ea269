//! Desktop notification daemon for the freedesktop.org notification protocol.
//!
//! Architecture:
//! - D-Bus interface exposes `org.freedesktop.Notifications`
//! - Calls, popup interaction and timer expiry become events on one serial loop
//! - The engine owns the notification store, which owns the expiry timers
//! - After every change popups are restacked per monitor, right-aligned

pub mod daemon;
pub mod dbus;
pub mod engine;
pub mod image;
pub mod layout;
pub mod render;
pub mod state;
pub mod timeout;
pub mod value;

pub use engine::{CloseReason, Engine, EngineSettings, NotifyRequest, Signal};
pub use state::{NotificationId, NotificationRecord, NotificationStore};
