use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::transform_origin::OriginPoint;

/// A 2D affine matrix.
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`. Composition with
/// [`Matrix::then`] follows the usual column-vector convention, so
/// `t.then(&r).then(&s)` applies `s` first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::IDENTITY
        }
    }

    /// Rotation around the origin; positive angles turn +x towards +y.
    pub fn rotate(angle_radians: f32) -> Self {
        let (sin, cos) = angle_radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn rotate_degrees(angle_degrees: f32) -> Self {
        Self::rotate(angle_degrees.to_radians())
    }

    pub fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// `self * other`: applies `other` first, then `self`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            tx: self.a * other.tx + self.c * other.ty + self.tx,
            ty: self.b * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Inverse matrix. Degenerate (zero-determinant) matrices invert to identity.
    pub fn inverse(&self) -> Matrix {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return Self::IDENTITY;
        }
        let inv = 1.0 / det;
        Matrix {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            tx: (self.c * self.ty - self.d * self.tx) * inv,
            ty: (self.b * self.tx - self.a * self.ty) * inv,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// The four corners of `rect` mapped through this matrix, in
    /// top-left, top-right, bottom-right, bottom-left order.
    pub fn transform_corners(&self, rect: Rect) -> [Point; 4] {
        rect.corners().map(|p| self.transform_point(p))
    }

    /// Axis-aligned bounds of `rect` after transformation.
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        let corners = self.transform_corners(rect);
        Rect::from_points(&corners).unwrap_or(rect)
    }

    pub fn translation(&self) -> Point {
        Point::new(self.tx, self.ty)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Declarative transform of a clump as delivered in the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Point,
    /// Degrees.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "unit_scale")]
    pub scale: Point,
    #[serde(default)]
    pub origin: OriginPoint,
}

fn unit_scale() -> Point {
    Point::new(1.0, 1.0)
}

impl Transform {
    /// Local matrix `T·R·S`: scale, then rotate, then translate.
    pub fn matrix(&self) -> Matrix {
        Matrix::translate(self.position.x, self.position.y)
            .then(&Matrix::rotate_degrees(self.rotation))
            .then(&Matrix::scale_xy(self.scale.x, self.scale.y))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            rotation: 0.0,
            scale: unit_scale(),
            origin: OriginPoint::default(),
        }
    }
}
