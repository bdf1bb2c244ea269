//! D-Bus interface for the notification daemon.
//!
//! Bus name: `org.freedesktop.Notifications`
//! Object path: `/org/freedesktop/Notifications`
//!
//! Method calls are normalized here and forwarded to the engine's event loop;
//! the interface itself holds no notification state.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};
use zbus::interface;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::OwnedValue;

use super::daemon::Event;
use super::engine::{NotifyRequest, Signal, SERVER_INFORMATION};
use super::value;
use crate::error::EngineError;

pub const BUS_NAME: &str = "org.freedesktop.Notifications";
pub const OBJECT_PATH: &str = "/org/freedesktop/Notifications";
pub const INTERFACE: &str = "org.freedesktop.Notifications";

/// D-Bus interface implementation.
pub struct NotificationsInterface {
    events: mpsc::UnboundedSender<Event>,
    capabilities: Vec<String>,
}

impl NotificationsInterface {
    pub fn new(events: mpsc::UnboundedSender<Event>, capabilities: Vec<String>) -> Self {
        Self {
            events,
            capabilities,
        }
    }

    fn send(&self, event: Event) -> zbus::fdo::Result<()> {
        self.events.send(event).map_err(|_| {
            error!("Event loop is gone, rejecting call");
            zbus::fdo::Error::Failed(EngineError::Stopped.to_string())
        })
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl NotificationsInterface {
    #[zbus(out_args("name", "vendor", "version", "spec_version"))]
    async fn get_server_information(&self) -> (String, String, String, String) {
        let info = SERVER_INFORMATION;
        (
            info.name.to_string(),
            info.vendor.to_string(),
            info.version.to_string(),
            info.spec_version.to_string(),
        )
    }

    async fn get_capabilities(&self) -> Vec<String> {
        self.capabilities.clone()
    }

    /// Show a notification or replace an existing one. Returns its id.
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        actions: Vec<String>,
        hints: HashMap<String, OwnedValue>,
        expire_timeout: i32,
    ) -> zbus::fdo::Result<u32> {
        debug!("Notify from {app_name:?}: {summary:?} (replaces {replaces_id})");
        let request = NotifyRequest {
            app_name,
            replaces_id,
            app_icon,
            summary,
            body,
            actions,
            hints: value::normalize_hints(&hints),
            expire_timeout,
        };

        let (reply, answer) = oneshot::channel();
        self.send(Event::Notify { request, reply })?;

        match answer.await {
            Ok(Ok(id)) => Ok(id),
            Ok(Err(e)) => {
                error!("Notify failed: {e}");
                Err(zbus::fdo::Error::Failed(e.to_string()))
            }
            Err(_) => Err(zbus::fdo::Error::Failed(EngineError::Stopped.to_string())),
        }
    }

    /// Close a notification. Unknown ids are not an error.
    async fn close_notification(&self, id: u32) -> zbus::fdo::Result<()> {
        let (reply, answer) = oneshot::channel();
        self.send(Event::Close { id, reply })?;
        answer
            .await
            .map_err(|_| zbus::fdo::Error::Failed(EngineError::Stopped.to_string()))
    }

    #[zbus(signal)]
    async fn notification_closed(
        emitter: &SignalEmitter<'_>,
        id: u32,
        reason: u32,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn action_invoked(
        emitter: &SignalEmitter<'_>,
        id: u32,
        action_key: &str,
    ) -> zbus::Result<()>;
}

/// Emit engine signals on the bus, in order, until the channel closes.
pub async fn forward_signals(conn: zbus::Connection, mut signals: mpsc::UnboundedReceiver<Signal>) {
    let emitter = match SignalEmitter::new(&conn, OBJECT_PATH) {
        Ok(emitter) => emitter,
        Err(e) => {
            error!("Cannot emit signals on {OBJECT_PATH}: {e}");
            return;
        }
    };

    while let Some(signal) = signals.recv().await {
        let result = match &signal {
            Signal::NotificationClosed { id, reason } => {
                NotificationsInterface::notification_closed(&emitter, *id, reason.code()).await
            }
            Signal::ActionInvoked { id, action_key } => {
                NotificationsInterface::action_invoked(&emitter, *id, action_key).await
            }
        };
        if let Err(e) = result {
            warn!("Failed to emit {signal:?}: {e}");
        }
    }
}
