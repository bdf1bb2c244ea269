//! Recording collaborators shared by the integration tests.

#![allow(dead_code)]

use oshirase::error::RenderError;
use oshirase::notify::layout::{Monitor, Position, Size};
use oshirase::notify::render::{DisplayData, MonitorEnumerator, Renderer};
use oshirase::notify::value::HintValue;
use oshirase::notify::timeout::DEFAULT_EXPIRE_TIMEOUT;
use oshirase::notify::{Engine, EngineSettings, NotifyRequest};

/// Hint read by [`RecordingRenderer`] to pick a popup height.
pub const HEIGHT_HINT: &str = "x-test-height";
/// Hint read by [`RecordingRenderer`] to pick a monitor index.
pub const MONITOR_HINT: &str = "x-test-monitor";
/// Summary that makes [`RecordingRenderer`] refuse to paint.
pub const FAIL_SUMMARY: &str = "fail-to-render";

#[derive(Debug, Clone, PartialEq)]
pub struct TestPopup {
    /// Unique per created popup; survives updates
    pub serial: u32,
    pub id: u32,
    pub size: Size,
    pub monitor: usize,
    pub position: Option<Position>,
    pub title: Option<String>,
    pub has_image: bool,
    pub image_dimensions: Option<(u32, u32)>,
    pub hint_keys: Vec<String>,
    pub action_labels: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub created: u32,
    pub updated: u32,
    pub destroyed: Vec<u32>,
}

fn apply(popup: &mut TestPopup, data: &DisplayData) {
    let height = data
        .hints
        .get(HEIGHT_HINT)
        .and_then(HintValue::as_int)
        .unwrap_or(50);
    popup.size = Size::new(200, height as i32);
    popup.monitor = data
        .hints
        .get(MONITOR_HINT)
        .and_then(HintValue::as_int)
        .unwrap_or(0) as usize;
    popup.title = data.title.clone();
    popup.has_image = data.image.is_some();
    popup.image_dimensions = data.image.as_ref().and_then(|i| i.dimensions());
    popup.hint_keys = data.hints.keys().cloned().collect();
    popup.action_labels = data.actions.iter().map(|a| a.label.clone()).collect();
}

impl Renderer for RecordingRenderer {
    type Popup = TestPopup;

    fn capabilities(&self) -> Vec<String> {
        vec!["body".into(), "actions".into()]
    }

    fn create(&mut self, id: u32, data: &DisplayData) -> Result<TestPopup, RenderError> {
        if data.title.as_deref() == Some(FAIL_SUMMARY) {
            return Err(RenderError::Create {
                id,
                reason: "refused".into(),
            });
        }
        self.created += 1;
        let mut popup = TestPopup {
            serial: self.created,
            id,
            size: Size::default(),
            monitor: 0,
            position: None,
            title: None,
            has_image: false,
            image_dimensions: None,
            hint_keys: Vec::new(),
            action_labels: Vec::new(),
        };
        apply(&mut popup, data);
        Ok(popup)
    }

    fn update(&mut self, popup: &mut TestPopup, data: &DisplayData) -> Result<(), RenderError> {
        if data.title.as_deref() == Some(FAIL_SUMMARY) {
            return Err(RenderError::Update {
                id: popup.id,
                reason: "refused".into(),
            });
        }
        self.updated += 1;
        apply(popup, data);
        Ok(())
    }

    fn size(&self, popup: &TestPopup) -> Size {
        popup.size
    }

    fn place(&mut self, popup: &mut TestPopup, position: Position) {
        popup.position = Some(position);
    }

    fn destroy(&mut self, popup: TestPopup) {
        self.destroyed.push(popup.id);
    }
}

pub struct TestMonitors(pub Vec<Monitor>);

impl MonitorEnumerator<TestPopup> for TestMonitors {
    fn monitor_for(&self, popup: &TestPopup) -> Monitor {
        self.0[popup.monitor].clone()
    }
}

pub type TestEngine = Engine<RecordingRenderer, TestMonitors>;

pub fn engine_with(monitors: Vec<Monitor>) -> TestEngine {
    Engine::new(
        RecordingRenderer::default(),
        TestMonitors(monitors),
        EngineSettings::default(),
    )
}

pub fn engine() -> TestEngine {
    engine_with(vec![Monitor::new("DP-1", 800, 1)])
}

pub fn request(summary: &str) -> NotifyRequest {
    NotifyRequest {
        app_name: "tests".into(),
        summary: summary.into(),
        expire_timeout: DEFAULT_EXPIRE_TIMEOUT,
        ..Default::default()
    }
}

pub fn request_with_height(summary: &str, height: i64) -> NotifyRequest {
    let mut req = request(summary);
    req.hints.insert(HEIGHT_HINT.into(), HintValue::Int(height));
    req
}

pub fn popup(engine: &TestEngine, id: u32) -> &TestPopup {
    &engine.store().get(id).expect("live notification").popup
}
