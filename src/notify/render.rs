//! Popup renderer and display enumerator interfaces.
//!
//! The engine never draws anything itself. It hands [`DisplayData`] to a
//! [`Renderer`], asks it for popup sizes and tells it where to put them.
//! User interaction flows back as [`UiEvent`]s on the engine's event channel.
//!
//! [`HeadlessRenderer`] is the renderer the daemon ships with: it lays popups
//! out from text metrics and logs what it would show.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::image::Image;
use super::layout::{Monitor, Position, Size};
use super::state::NotificationId;
use super::value::HintBag;
use crate::error::RenderError;

/// Something the user can activate on a popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// Caller-registered action, by index into the record's action keys
    Action(usize),
    /// The close button every popup carries
    Close,
}

/// An action button: label shown to the user plus what it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub affordance: Affordance,
}

/// Everything a renderer needs to paint one popup.
#[derive(Debug, PartialEq)]
pub struct DisplayData {
    pub app_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<Image>,
    pub actions: Vec<ActionButton>,
    pub close: Affordance,
    /// Remaining display hints, imagery keys removed
    pub hints: HintBag,
}

impl Default for DisplayData {
    fn default() -> Self {
        Self {
            app_name: None,
            title: None,
            body: None,
            image: None,
            actions: Vec::new(),
            close: Affordance::Close,
            hints: HintBag::new(),
        }
    }
}

/// User interaction with a popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    HoverEnter(NotificationId),
    HoverLeave(NotificationId),
    Activated(NotificationId, Affordance),
}

/// Creates, repaints, measures and places popups.
pub trait Renderer {
    /// On-screen popup resource
    type Popup;

    /// Capability tokens advertised through `GetCapabilities`.
    fn capabilities(&self) -> Vec<String>;

    fn create(&mut self, id: NotificationId, data: &DisplayData)
        -> Result<Self::Popup, RenderError>;

    /// Repaint in place and shrink to the natural size of the new content.
    fn update(&mut self, popup: &mut Self::Popup, data: &DisplayData) -> Result<(), RenderError>;

    fn size(&self, popup: &Self::Popup) -> Size;

    fn place(&mut self, popup: &mut Self::Popup, position: Position);

    fn destroy(&mut self, popup: Self::Popup);
}

/// Tells which display a popup is on.
pub trait MonitorEnumerator<P> {
    fn monitor_for(&self, popup: &P) -> Monitor;
}

// ── Headless implementation ──────────────────────────────────────────

/// Geometry used by [`HeadlessRenderer`] to size popups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub width: i32,
    pub line_height: i32,
    pub padding: i32,
    pub image_gap: i32,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            width: 300,
            line_height: 18,
            padding: 12,
            image_gap: 8,
        }
    }
}

/// A popup tracked by [`HeadlessRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessPopup {
    pub id: NotificationId,
    pub size: Size,
    pub position: Option<Position>,
    /// Index into the monitor list
    pub output: usize,
}

/// Renderer without a display server. Sizes popups from their text content
/// and logs every change.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    config: PopupConfig,
}

pub const HEADLESS_CAPABILITIES: [&str; 3] = ["body", "actions", "icon-static"];

impl HeadlessRenderer {
    pub fn new(config: PopupConfig) -> Self {
        Self { config }
    }

    /// Natural size of a popup showing `data`.
    pub fn measure(&self, data: &DisplayData) -> Size {
        let c = &self.config;
        let lines = data.title.iter().count() as i32
            + data
                .body
                .as_deref()
                .map_or(0, |body| body.lines().count().max(1) as i32)
            + i32::from(!data.actions.is_empty());
        let text_height = lines * c.line_height;
        let image_height = data
            .image
            .as_ref()
            .and_then(Image::dimensions)
            .map_or(0, |(_, h)| h as i32);
        Size::new(c.width, text_height.max(image_height) + 2 * c.padding)
    }

    fn log(&self, verb: &str, id: NotificationId, data: &DisplayData) {
        info!(
            "{verb} #{id}: [{}] {}",
            data.app_name.as_deref().unwrap_or("-"),
            data.title.as_deref().unwrap_or("")
        );
        if let Some(body) = &data.body {
            debug!("  body: {body}");
        }
        for button in &data.actions {
            debug!("  action: {} ({:?})", button.label, button.affordance);
        }
        if let Some(image) = &data.image {
            debug!("  image: {image:?}");
        }
    }
}

impl Renderer for HeadlessRenderer {
    type Popup = HeadlessPopup;

    fn capabilities(&self) -> Vec<String> {
        HEADLESS_CAPABILITIES.iter().map(|s| s.to_string()).collect()
    }

    fn create(&mut self, id: NotificationId, data: &DisplayData) -> Result<HeadlessPopup, RenderError> {
        self.log("show", id, data);
        Ok(HeadlessPopup {
            id,
            size: self.measure(data),
            position: None,
            output: 0,
        })
    }

    fn update(&mut self, popup: &mut HeadlessPopup, data: &DisplayData) -> Result<(), RenderError> {
        self.log("update", popup.id, data);
        popup.size = self.measure(data);
        Ok(())
    }

    fn size(&self, popup: &HeadlessPopup) -> Size {
        popup.size
    }

    fn place(&mut self, popup: &mut HeadlessPopup, position: Position) {
        if popup.position != Some(position) {
            debug!(
                "place #{} at ({}, {}) size {}x{}",
                popup.id, position.x, position.y, popup.size.width, popup.size.height
            );
            popup.position = Some(position);
        }
    }

    fn destroy(&mut self, popup: HeadlessPopup) {
        info!("hide #{}", popup.id);
    }
}

/// Fixed monitor list from the configuration.
#[derive(Debug, Clone)]
pub struct StaticMonitors {
    monitors: Vec<Monitor>,
}

impl StaticMonitors {
    /// An empty list falls back to a single 1920-wide display.
    pub fn new(monitors: Vec<Monitor>) -> Self {
        let monitors = if monitors.is_empty() {
            vec![Monitor::new("default", 1920, 1)]
        } else {
            monitors
        };
        Self { monitors }
    }
}

impl MonitorEnumerator<HeadlessPopup> for StaticMonitors {
    fn monitor_for(&self, popup: &HeadlessPopup) -> Monitor {
        self.monitors
            .get(popup.output)
            .unwrap_or(&self.monitors[0])
            .clone()
    }
}
