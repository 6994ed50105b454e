//! Selection outline and handle hit-targets, in screen space.

use crate::geometry::{Color, Point, Rect};
use crate::render::commands::DrawCommand;
use crate::transform::Matrix;
use crate::transform_origin::OriginPoint;
use crate::viewport::Viewport;

pub const BOX_CORNER_DOT_SIZE: f32 = 5.0;
pub const BOX_EDGE_DOT_SIZE: f32 = 4.0;
pub const BOX_LINE_WIDTH: f32 = 2.0;
pub const BOX_COLOR: Color = Color::from_hex(0xf43e5c);
const BOX_LINE_ALPHA: f32 = 0.5;

/// Pointer cursor a handle asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    NwseResize,
    NeswResize,
    EwResize,
    NsResize,
}

impl Cursor {
    /// CSS cursor name.
    pub fn as_css(&self) -> &'static str {
        match self {
            Cursor::NwseResize => "nwse-resize",
            Cursor::NeswResize => "nesw-resize",
            Cursor::EwResize => "ew-resize",
            Cursor::NsResize => "ns-resize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Corner,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub center: Point,
    pub radius: f32,
    pub cursor: Cursor,
}

impl Handle {
    pub fn contains(&self, point: Point) -> bool {
        self.center.distance(point) <= self.radius
    }
}

const CORNER_CURSORS: [Cursor; 4] = [
    Cursor::NwseResize,
    Cursor::NeswResize,
    Cursor::NwseResize,
    Cursor::NeswResize,
];
/// Indexed by the edge's second corner.
const EDGE_CURSORS: [Cursor; 4] = [
    Cursor::EwResize,
    Cursor::NsResize,
    Cursor::EwResize,
    Cursor::NsResize,
];

/// The projected outline of one selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub node: String,
    /// Top-left, top-right, bottom-right, bottom-left.
    pub corners: [Point; 4],
    /// The node's transform origin.
    pub pivot: Point,
    /// Corner and edge-midpoint handles, alternating, starting at top-left.
    pub handles: Vec<Handle>,
}

impl BoundingBox {
    /// Project `bounds` (local space) through `world` and the viewport.
    pub fn new(
        node: impl Into<String>,
        world: &Matrix,
        bounds: Rect,
        origin: OriginPoint,
        viewport: &Viewport,
    ) -> Self {
        let corners = world
            .transform_corners(bounds)
            .map(|p| viewport.to_screen(p));
        let pivot = viewport.to_screen(world.transform_point(origin.resolve(bounds)));

        let mut handles = Vec::with_capacity(8);
        for c in 0..4 {
            let c2 = (c + 1) % 4;
            handles.push(Handle {
                kind: HandleKind::Corner,
                center: corners[c],
                radius: BOX_CORNER_DOT_SIZE,
                cursor: CORNER_CURSORS[c],
            });
            handles.push(Handle {
                kind: HandleKind::Edge,
                center: corners[c].midpoint(corners[c2]),
                radius: BOX_EDGE_DOT_SIZE,
                cursor: EDGE_CURSORS[c2],
            });
        }

        Self {
            node: node.into(),
            corners,
            pivot,
            handles,
        }
    }

    /// The four outline segments, each from a corner to the next.
    pub fn edges(&self) -> [(Point, Point); 4] {
        std::array::from_fn(|c| (self.corners[c], self.corners[(c + 1) % 4]))
    }

    /// Top-most handle under a screen point. Handles drawn later win.
    pub fn handle_at(&self, point: Point) -> Option<&Handle> {
        self.handles.iter().rev().find(|h| h.contains(point))
    }

    /// Screen-space draw commands: outline first, then the dots.
    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        let line_color = BOX_COLOR.with_alpha(BOX_LINE_ALPHA);
        let mut commands: Vec<DrawCommand> = self
            .edges()
            .iter()
            .map(|&(from, to)| DrawCommand::line(from, to, BOX_LINE_WIDTH, line_color))
            .collect();
        commands.extend(
            self.handles
                .iter()
                .map(|h| DrawCommand::circle(h.center, h.radius, BOX_COLOR)),
        );
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity_projection() {
        let bbox = BoundingBox::new(
            "n",
            &Matrix::IDENTITY,
            Rect::new(0.0, 0.0, 100.0, 50.0),
            OriginPoint::Center,
            &Viewport::default(),
        );
        assert_eq!(
            bbox.corners,
            [
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.0, 50.0),
            ]
        );
        assert_eq!(bbox.pivot, Point::new(50.0, 25.0));
        assert_eq!(bbox.handles.len(), 8);
        assert_eq!(bbox.edges()[3], (Point::new(0.0, 50.0), Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_handle_cursors() {
        let bbox = BoundingBox::new(
            "n",
            &Matrix::IDENTITY,
            Rect::new(0.0, 0.0, 100.0, 50.0),
            OriginPoint::TopLeft,
            &Viewport::default(),
        );
        let cursors: Vec<&str> = bbox.handles.iter().map(|h| h.cursor.as_css()).collect();
        assert_eq!(
            cursors,
            [
                "nwse-resize", // top-left
                "ns-resize",   // top
                "nesw-resize", // top-right
                "ew-resize",   // right
                "nwse-resize", // bottom-right
                "ns-resize",   // bottom
                "nesw-resize", // bottom-left
                "ew-resize",   // left
            ]
        );
        assert_eq!(bbox.handles[1].center, Point::new(50.0, 0.0));
        assert_eq!(bbox.handles[1].kind, HandleKind::Edge);
    }

    #[test]
    fn test_rotation_and_viewport() {
        let world = Matrix::translate(10.0, 0.0).then(&Matrix::rotate_degrees(90.0));
        let viewport = Viewport::new(Point::new(5.0, 5.0), 2.0);
        let bbox = BoundingBox::new(
            "n",
            &world,
            Rect::new(0.0, 0.0, 10.0, 20.0),
            OriginPoint::Center,
            &viewport,
        );
        // (10, 0) local -> rotate (0, 10) -> translate (10, 10) -> screen (25, 25)
        let tr = bbox.corners[1];
        assert!(approx_eq(tr.x, 25.0) && approx_eq(tr.y, 25.0), "{tr:?}");
    }

    #[test]
    fn test_handle_hit_and_commands() {
        let bbox = BoundingBox::new(
            "n",
            &Matrix::IDENTITY,
            Rect::new(0.0, 0.0, 100.0, 50.0),
            OriginPoint::Center,
            &Viewport::default(),
        );
        let handle = bbox.handle_at(Point::new(98.0, 2.0)).unwrap();
        assert_eq!(handle.cursor, Cursor::NeswResize);
        assert!(bbox.handle_at(Point::new(50.0, 25.0)).is_none());
        assert_eq!(bbox.draw_commands().len(), 12);
    }
}
