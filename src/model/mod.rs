//! Snapshot value types exchanged with the host.
//!
//! A [`Canvas`] owns its [`Asset`]s and one optional content tree of
//! [`Clump`]s and [`Atom`]s. Atoms reference assets by id only. The JSON wire
//! shape (`class`/`type` tags, camelCase fields, `nodeUUID`) is kept exactly,
//! so snapshots deserialize straight from what the host sends.

mod atom;
mod canvas;
mod clump;

pub use atom::{
    Atom, AtomKind, CurveAtom, FontStyle, FontWeight, ImageAtom, PaintAtom, ShapeAtom, ShapeKind,
    TextAlign, TextAtom, TextBaseline,
};
pub use canvas::{Asset, AssetKind, Canvas, CanvasConfig, CurvePoint, Dims};
pub use clump::{Clump, Element, Filter, FilterKind, FilterParam};

pub use crate::geometry::Point as Vec2;
pub use crate::transform::Transform;
pub use crate::transform_origin::OriginPoint;
