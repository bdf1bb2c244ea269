//! Per-monitor popup stacking.
//!
//! Popups on one monitor are stacked top to bottom in store order, flush with
//! the monitor's right edge. Running offsets only live for one pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::render::{MonitorEnumerator, Renderer};
use super::state::NotificationStore;

/// Popup size in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Absolute popup position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A physical display as seen by the layout pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub name: String,
    /// Logical width of the visible area
    pub width: i32,
    #[serde(default = "default_scale")]
    pub scale: i32,
}

fn default_scale() -> i32 {
    1
}

impl Monitor {
    pub fn new(name: impl Into<String>, width: i32, scale: i32) -> Self {
        Self {
            name: name.into(),
            width,
            scale,
        }
    }

    /// Right edge popups align against.
    pub fn right_edge(&self) -> i32 {
        self.width * self.scale
    }
}

/// Compute positions for popups given in stacking order.
pub fn stack<'a, I>(popups: I) -> Vec<Position>
where
    I: IntoIterator<Item = (&'a Monitor, Size)>,
{
    let mut offsets: HashMap<&str, i32> = HashMap::new();
    popups
        .into_iter()
        .map(|(monitor, size)| {
            let y = offsets.entry(monitor.name.as_str()).or_insert(0);
            let position = Position {
                x: monitor.right_edge() - size.width,
                y: *y,
            };
            *y += size.height;
            position
        })
        .collect()
}

/// Reposition every live popup.
pub fn reflow<R, M>(store: &mut NotificationStore<R::Popup>, renderer: &mut R, monitors: &M)
where
    R: Renderer,
    M: MonitorEnumerator<R::Popup>,
{
    let mut geometry: Vec<(Monitor, Size)> = Vec::with_capacity(store.len());
    store.for_each(|record| {
        geometry.push((
            monitors.monitor_for(&record.popup),
            renderer.size(&record.popup),
        ))
    });

    let positions = stack(geometry.iter().map(|(monitor, size)| (monitor, *size)));

    for (record, position) in store.iter_mut().zip(positions) {
        renderer.place(&mut record.popup, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_single_monitor() {
        let mon = Monitor::new("DP-1", 800, 1);
        let positions = stack([
            (&mon, Size::new(300, 40)),
            (&mon, Size::new(250, 60)),
            (&mon, Size::new(300, 20)),
        ]);
        assert_eq!(
            positions,
            vec![
                Position { x: 500, y: 0 },
                Position { x: 550, y: 40 },
                Position { x: 500, y: 100 },
            ]
        );
    }

    #[test]
    fn test_stack_per_monitor_offsets() {
        let left = Monitor::new("HDMI-1", 1920, 1);
        let right = Monitor::new("DP-1", 1280, 2);
        let positions = stack([
            (&left, Size::new(300, 50)),
            (&right, Size::new(300, 70)),
            (&left, Size::new(300, 30)),
            (&right, Size::new(100, 10)),
        ]);
        assert_eq!(positions[0], Position { x: 1620, y: 0 });
        assert_eq!(positions[1], Position { x: 2260, y: 0 });
        assert_eq!(positions[2], Position { x: 1620, y: 50 });
        assert_eq!(positions[3], Position { x: 2460, y: 70 });
    }

    #[test]
    fn test_stack_is_idempotent() {
        let mon = Monitor::new("eDP-1", 1366, 1);
        let input = [(&mon, Size::new(200, 80)), (&mon, Size::new(200, 90))];
        assert_eq!(stack(input), stack(input));
    }

    #[test]
    fn test_stack_empty() {
        assert!(stack(std::iter::empty::<(&Monitor, Size)>()).is_empty());
    }
}
