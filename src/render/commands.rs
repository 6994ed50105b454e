//! Vector draw commands carried by graphics nodes.

use crate::geometry::{Color, Point, Rect};
use crate::model::TextAlign;

/// Outline applied to a shape, centred on its edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    /// `None` for zero-width or fully transparent strokes.
    pub fn visible(width: f32, color: Color) -> Option<Self> {
        (width > 0.0 && color.a > 0.0).then_some(Self { width, color })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
}

/// A single draw operation in the node's local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        fill: Color,
        stroke: Option<Stroke>,
    },
    Ellipse {
        center: Point,
        radius_x: f32,
        radius_y: f32,
        fill: Color,
        stroke: Option<Stroke>,
    },
    /// Closed polygon.
    Polygon {
        points: Vec<Point>,
        fill: Color,
        stroke: Option<Stroke>,
    },
    Path {
        segments: Vec<PathSegment>,
        fill: Color,
        stroke: Option<Stroke>,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Color,
    },
    /// Text laid out inside `rect`, outline behind the fill.
    Text {
        text: String,
        rect: Rect,
        color: Color,
        stroke: Option<Stroke>,
        font_size: f32,
        font_family: String,
        italic: bool,
        bold: bool,
        align: TextAlign,
    },
}

impl DrawCommand {
    pub fn circle(center: Point, radius: f32, fill: Color) -> Self {
        Self::Circle {
            center,
            radius,
            fill,
        }
    }

    pub fn line(from: Point, to: Point, width: f32, color: Color) -> Self {
        Self::Line {
            from,
            to,
            stroke: Stroke { width, color },
        }
    }

    /// Local bounds including half the stroke width on every side.
    pub fn bounds(&self) -> Option<Rect> {
        let half = |stroke: &Option<Stroke>| stroke.map_or(0.0, |s| s.width / 2.0);
        match self {
            DrawCommand::Rect { rect, stroke, .. } => Some(rect.outset(half(stroke))),
            DrawCommand::Ellipse {
                center,
                radius_x,
                radius_y,
                stroke,
                ..
            } => Some(
                Rect::new(
                    center.x - radius_x,
                    center.y - radius_y,
                    radius_x * 2.0,
                    radius_y * 2.0,
                )
                .outset(half(stroke)),
            ),
            DrawCommand::Polygon { points, stroke, .. } => {
                Rect::from_points(points).map(|r| r.outset(half(stroke)))
            }
            DrawCommand::Path {
                segments, stroke, ..
            } => {
                let points: Vec<Point> = segments
                    .iter()
                    .flat_map(|s| match *s {
                        PathSegment::MoveTo(p) => vec![p],
                        PathSegment::CubicTo { c1, c2, to } => vec![c1, c2, to],
                    })
                    .collect();
                Rect::from_points(&points).map(|r| r.outset(half(stroke)))
            }
            DrawCommand::Line { from, to, stroke } => {
                Rect::from_points(&[*from, *to]).map(|r| r.outset(stroke.width / 2.0))
            }
            DrawCommand::Circle { center, radius, .. } => Some(Rect::new(
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
            )),
            DrawCommand::Text { rect, .. } => Some(*rect),
        }
    }
}

/// Union of the bounds of every command.
pub fn commands_bounds(commands: &[DrawCommand]) -> Option<Rect> {
    commands
        .iter()
        .filter_map(DrawCommand::bounds)
        .reduce(|a, b| a.union(&b))
}
