use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Anchor of a clump's transform, one of the nine points of its bounds.
///
/// Serialized with the two-letter codes the host uses: the first letter is
/// the row (`t`op, `m`iddle, `b`ottom), the second the column (`l`eft,
/// `m`iddle, `r`ight).
///
/// The matrix composition never reads the origin; it locates the pivot marker
/// drawn by the selection overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OriginPoint {
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "tm")]
    Top,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "ml")]
    Left,
    #[default]
    #[serde(rename = "mm")]
    Center,
    #[serde(rename = "mr")]
    Right,
    #[serde(rename = "bl")]
    BottomLeft,
    #[serde(rename = "bm")]
    Bottom,
    #[serde(rename = "br")]
    BottomRight,
}

impl OriginPoint {
    /// Horizontal and vertical fractions of the bounds, `0.0` = left/top.
    pub fn fractions(self) -> (f32, f32) {
        match self {
            OriginPoint::TopLeft => (0.0, 0.0),
            OriginPoint::Top => (0.5, 0.0),
            OriginPoint::TopRight => (1.0, 0.0),
            OriginPoint::Left => (0.0, 0.5),
            OriginPoint::Center => (0.5, 0.5),
            OriginPoint::Right => (1.0, 0.5),
            OriginPoint::BottomLeft => (0.0, 1.0),
            OriginPoint::Bottom => (0.5, 1.0),
            OriginPoint::BottomRight => (1.0, 1.0),
        }
    }

    /// Resolve the anchor to a point in the same coordinate system as `bounds`.
    pub fn resolve(self, bounds: Rect) -> Point {
        let (fx, fy) = self.fractions();
        Point::new(bounds.x + bounds.width * fx, bounds.y + bounds.height * fy)
    }
}
