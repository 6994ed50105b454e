use crate::geometry::Point;

const MIN_ZOOM: f32 = 0.01;
const MAX_ZOOM: f32 = 100.0;

/// Pan/zoom mapping between world coordinates and screen pixels.
///
/// `screen = world * zoom + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the world origin.
    pub offset: Point,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(offset: Point, zoom: f32) -> Self {
        Self {
            offset,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    pub fn to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.offset.x,
            world.y * self.zoom + self.offset.y,
        )
    }

    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    /// Move the view by a screen-space delta.
    pub fn pan(&mut self, delta: Point) {
        self.offset = self.offset + delta;
    }

    /// Multiply the zoom by `factor`, keeping the world point under
    /// `anchor` (screen space) fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        let world = self.to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset = Point::new(
            anchor.x - world.x * self.zoom,
            anchor.y - world.y * self.zoom,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_round_trip() {
        let vp = Viewport::new(Point::new(40.0, -10.0), 2.5);
        let world = Point::new(3.0, 7.0);
        let back = vp.to_world(vp.to_screen(world));
        assert!(approx_eq(back.x, 3.0) && approx_eq(back.y, 7.0));
        assert_eq!(vp.to_screen(Point::ZERO), Point::new(40.0, -10.0));
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::default();
        vp.pan(Point::new(10.0, 10.0));
        let anchor = Point::new(110.0, 60.0);
        let before = vp.to_world(anchor);
        vp.zoom_at(anchor, 4.0);
        let after = vp.to_world(anchor);
        assert!(approx_eq(before.x, after.x) && approx_eq(before.y, after.y));
        assert_eq!(vp.zoom, 4.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = Viewport::default();
        vp.zoom_at(Point::ZERO, 0.0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
