//! Pointer-driven selection and drag state machine.
//!
//! Events arrive in screen space; the render context converts them to world
//! space before they reach [`Interaction`], so drags are independent of pan
//! and zoom.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { node: String, last: Point },
}

/// Position write-back sent to the host on every drag move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    #[serde(rename = "nodeUUID")]
    pub node_uuid: String,
    pub inputs: PositionInputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInputs {
    pub position_x: f32,
    pub position_y: f32,
}

impl ChangeNotification {
    pub fn position(node_uuid: impl Into<String>, position: Point) -> Self {
        Self {
            node_uuid: node_uuid.into(),
            inputs: PositionInputs {
                position_x: position.x,
                position_y: position.y,
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Single selection plus the drag state.
#[derive(Debug, Default)]
pub struct Interaction {
    selection: Option<String>,
    state: DragState,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Pointer pressed on `node`: select it and start dragging.
    pub fn pointer_down(&mut self, node: &str, world: Point) {
        self.selection = Some(node.to_string());
        self.state = DragState::Dragging {
            node: node.to_string(),
            last: world,
        };
    }

    /// Pointer moved. Returns the dragged node and the world delta since the
    /// previous event, or `None` when idle or when the drag target is no
    /// longer the selection.
    pub fn pointer_move(&mut self, world: Point) -> Option<(String, Point)> {
        let DragState::Dragging { node, last } = &mut self.state else {
            return None;
        };
        if self.selection.as_deref() != Some(node.as_str()) {
            log::debug!("Ignoring move for stale drag target {node}");
            return None;
        }
        let delta = world - *last;
        *last = world;
        Some((node.clone(), delta))
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    /// Replace the selection without starting a drag.
    pub fn select(&mut self, node: impl Into<String>) {
        let node = node.into();
        if let DragState::Dragging { node: dragged, .. } = &self.state {
            if *dragged != node {
                self.state = DragState::Idle;
            }
        }
        self.selection = Some(node);
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_reports_world_delta() {
        let mut interaction = Interaction::new();
        interaction.pointer_down("b", Point::new(10.0, 10.0));
        assert_eq!(interaction.selection(), Some("b"));

        let (node, delta) = interaction.pointer_move(Point::new(15.0, 18.0)).unwrap();
        assert_eq!(node, "b");
        assert_eq!(delta, Point::new(5.0, 8.0));

        // Deltas are relative to the previous move, not the press.
        let (_, delta) = interaction.pointer_move(Point::new(16.0, 18.0)).unwrap();
        assert_eq!(delta, Point::new(1.0, 0.0));

        interaction.pointer_up();
        assert_eq!(interaction.state(), &DragState::Idle);
        assert!(interaction.pointer_move(Point::new(30.0, 30.0)).is_none());
        assert_eq!(interaction.selection(), Some("b"));
    }

    #[test]
    fn test_stale_target_is_ignored() {
        let mut interaction = Interaction::new();
        interaction.pointer_down("a", Point::ZERO);
        interaction.selection = Some("other".into());
        assert!(interaction.pointer_move(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_select_replaces_and_clear_resets() {
        let mut interaction = Interaction::new();
        interaction.pointer_down("a", Point::ZERO);
        interaction.select("b");
        assert_eq!(interaction.selection(), Some("b"));
        assert_eq!(interaction.state(), &DragState::Idle);

        interaction.clear();
        assert_eq!(interaction.selection(), None);
    }

    #[test]
    fn test_notification_wire_shape() {
        let json = ChangeNotification::position("b", Point::new(105.0, 58.0))
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"nodeUUID":"b","inputs":{"positionX":105.0,"positionY":58.0}}"#
        );
    }
}
