//! The notification engine: turns protocol calls, UI events and timer expiry
//! into store changes, popup updates and outgoing signals.
//!
//! Every method runs to completion without awaiting anything. The event loop
//! calls them one at a time, so the store is never observed half-updated.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::image::{self, IMAGE_SIZE};
use super::layout;
use super::render::{ActionButton, Affordance, DisplayData, MonitorEnumerator, Renderer, UiEvent};
use super::state::{NotificationId, NotificationStore, PopupBuilder};
use super::timeout::{TimeoutPolicy, Urgency};
use super::value::{HintBag, HintValue};
use crate::error::{EngineError, RenderError};

/// Why a notification went away (`NotificationClosed` reason codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Expired = 1,
    Dismissed = 2,
    Closed = 3,
    Undefined = 4,
}

impl CloseReason {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Outgoing bus signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    NotificationClosed {
        id: NotificationId,
        reason: CloseReason,
    },
    ActionInvoked {
        id: NotificationId,
        action_key: String,
    },
}

/// Answer to `GetServerInformation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInformation {
    pub name: &'static str,
    pub vendor: &'static str,
    pub version: &'static str,
    pub spec_version: &'static str,
}

pub const SERVER_INFORMATION: ServerInformation = ServerInformation {
    name: "Oshirase",
    vendor: "Kyuuhachi",
    version: env!("CARGO_PKG_VERSION"),
    spec_version: "1.1",
};

/// Arguments of a `Notify` call, already normalized.
#[derive(Debug, Default)]
pub struct NotifyRequest {
    pub app_name: String,
    /// 0 asks for a new id
    pub replaces_id: NotificationId,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    /// Flattened `(key, label)` pairs
    pub actions: Vec<String>,
    pub hints: HintBag,
    pub expire_timeout: i32,
}

/// Tunables from the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub image_size: u32,
    pub timeouts: TimeoutPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE,
            timeouts: TimeoutPolicy::default(),
        }
    }
}

/// Owns the store and the rendering collaborators.
pub struct Engine<R: Renderer, M> {
    store: NotificationStore<R::Popup>,
    renderer: R,
    monitors: M,
    settings: EngineSettings,
    outbox: Vec<Signal>,
}

/// Routes store creation/updates to the renderer with one notification's data.
struct Paint<'a, R> {
    renderer: &'a mut R,
    data: &'a DisplayData,
}

impl<R: Renderer> PopupBuilder<R::Popup> for Paint<'_, R> {
    type Error = RenderError;

    fn create(&mut self, id: NotificationId) -> Result<R::Popup, RenderError> {
        self.renderer.create(id, self.data)
    }

    fn update(&mut self, popup: &mut R::Popup) -> Result<(), RenderError> {
        self.renderer.update(popup, self.data)
    }
}

impl<R, M> Engine<R, M>
where
    R: Renderer,
    M: MonitorEnumerator<R::Popup>,
{
    pub fn new(renderer: R, monitors: M, settings: EngineSettings) -> Self {
        Self {
            store: NotificationStore::new(),
            renderer,
            monitors,
            settings,
            outbox: Vec::new(),
        }
    }

    pub fn store(&self) -> &NotificationStore<R::Popup> {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn server_information(&self) -> ServerInformation {
        SERVER_INFORMATION
    }

    pub fn capabilities(&self) -> Vec<String> {
        self.renderer.capabilities()
    }

    /// Handle `Notify`: create or update the record, arm its timer, reflow.
    pub fn notify(
        &mut self,
        request: NotifyRequest,
        now: Instant,
    ) -> Result<NotificationId, EngineError> {
        let id = match request.replaces_id {
            0 => self.store.allocate_id(),
            id => id,
        };

        let urgency = Urgency::from_hint(request.hints.get("urgency"));
        let timeout = self
            .settings
            .timeouts
            .effective(request.expire_timeout, urgency);

        let (data, action_keys) = self.display_data(request);

        let mut paint = Paint {
            renderer: &mut self.renderer,
            data: &data,
        };
        let record = self.store.upsert(id, &mut paint)?;
        record.actions = action_keys;
        self.store.set_timeout(id, timeout, now);

        debug!(
            "Notify #{id}: urgency {:?}, timeout {:?}",
            urgency,
            timeout.map(|t: Duration| t.as_millis())
        );

        self.reflow();
        Ok(id)
    }

    /// Build the renderer's view of a request and the record's action keys.
    fn display_data(&self, request: NotifyRequest) -> (DisplayData, Vec<String>) {
        let NotifyRequest {
            app_name,
            app_icon,
            summary,
            body,
            actions,
            mut hints,
            ..
        } = request;

        if actions.len() % 2 != 0 {
            warn!(
                "Odd-length action list ({} entries), ignoring the last one",
                actions.len()
            );
        }
        let (keys, buttons): (Vec<String>, Vec<ActionButton>) = actions
            .chunks_exact(2)
            .enumerate()
            .map(|(index, pair)| {
                (
                    pair[0].clone(),
                    ActionButton {
                        label: pair[1].clone(),
                        affordance: Affordance::Action(index),
                    },
                )
            })
            .unzip();

        hints.insert("icon".to_string(), HintValue::Str(app_icon));
        let image = image::resolve(&hints, self.settings.image_size);
        image::strip_imagery(&mut hints);

        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        let data = DisplayData {
            app_name: non_empty(app_name),
            title: non_empty(summary),
            body: non_empty(body),
            image,
            actions: buttons,
            close: Affordance::Close,
            hints,
        };
        (data, keys)
    }

    /// Handle `CloseNotification`. Always reports reason 3, even for unknown ids.
    pub fn close_notification(&mut self, id: NotificationId) {
        self.close(id, CloseReason::Closed);
    }

    /// Emit `NotificationClosed` and drop the record if it still exists.
    pub fn close(&mut self, id: NotificationId, reason: CloseReason) {
        self.outbox.push(Signal::NotificationClosed { id, reason });
        self.on_closed(id);
    }

    /// Removal half of `NotificationClosed`, whatever the reason.
    fn on_closed(&mut self, id: NotificationId) {
        if let Some(record) = self.store.remove(id) {
            debug!("Removed #{id}");
            self.renderer.destroy(record.popup);
            self.reflow();
        }
    }

    /// Handle interaction reported by the renderer. Events for notifications
    /// that are already gone are ignored.
    pub fn handle_ui(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::HoverEnter(id) => self.store.hover_enter(id),
            UiEvent::HoverLeave(id) => self.store.hover_leave(id, now),
            UiEvent::Activated(id, Affordance::Close) => {
                if self.store.contains(id) {
                    self.close(id, CloseReason::Dismissed);
                }
            }
            UiEvent::Activated(id, Affordance::Action(index)) => {
                let key = self
                    .store
                    .get(id)
                    .and_then(|record| record.action_key(index))
                    .map(str::to_string);
                match key {
                    Some(action_key) => self.outbox.push(Signal::ActionInvoked { id, action_key }),
                    None => debug!("Ignoring action {index} for #{id}"),
                }
            }
        }
    }

    /// Close every notification whose timer ran out.
    pub fn expire(&mut self, now: Instant) {
        for id in self.store.expire(now) {
            self.close(id, CloseReason::Expired);
        }
    }

    /// Earliest pending expiry, for the event loop to sleep until.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.store.next_deadline()
    }

    /// Signals produced since the last call, in order.
    pub fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.outbox)
    }

    /// Recompute every popup position.
    pub fn reflow(&mut self) {
        layout::reflow(&mut self.store, &mut self.renderer, &self.monitors);
    }

    /// Release all popups without emitting signals.
    pub fn shutdown(&mut self) {
        for record in self.store.drain() {
            self.renderer.destroy(record.popup);
        }
    }
}
