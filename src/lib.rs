//! Incremental 2D scene-graph reconciliation and rendering.
//!
//! The host hands over complete [`Canvas`] snapshots. A [`RenderContext`]
//! keeps a live display tree in step with them, rebuilding only what changed
//! between snapshots, baking filtered subtrees into textures, and turning
//! pointer drags into position write-backs for the host.
//!
//! ```no_run
//! use blink::prelude::*;
//!
//! # fn main() -> blink::Result<()> {
//! let canvas = Canvas::from_json(&std::fs::read_to_string("canvas.json")?)?;
//! let mut ctx = RenderContext::new(SoftwareBackend::new());
//! let outcome = pollster::block_on(ctx.update(&canvas, &FsLoader::new(".")));
//! if let RenderOutcome::Rendered(stats) = outcome {
//!     println!("{stats:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod backend;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod geometry;
pub mod interaction;
pub mod model;
pub mod overlay;
pub mod render;
pub mod scene;
pub mod transform;
pub mod transform_origin;
pub mod viewport;

pub use assets::{AssetLoader, DecodedImage, FsLoader, MemoryLoader};
pub use backend::{Backend, SoftwareBackend, TextureId};
pub use config::EngineConfig;
pub use error::{BlinkError, Result};
pub use fingerprint::FingerprintMode;
pub use interaction::{ChangeNotification, PointerEvent};
pub use model::Canvas;
pub use render::{PassStats, RenderContext, RenderOutcome};

pub mod prelude {
    pub use crate::assets::{AssetLoader, FsLoader, MemoryLoader};
    pub use crate::backend::{Backend, SoftwareBackend, TextureId};
    pub use crate::config::EngineConfig;
    pub use crate::fingerprint::FingerprintMode;
    pub use crate::geometry::{Color, Point, Rect};
    pub use crate::interaction::{ChangeNotification, PointerEvent};
    pub use crate::model::{
        Asset, Atom, AtomKind, Canvas, CanvasConfig, Clump, Dims, Element, Filter, FilterKind,
        ImageAtom, ShapeAtom, ShapeKind, TextAtom, Transform,
    };
    pub use crate::overlay::{BoundingBox, Cursor};
    pub use crate::render::{PassStats, RenderContext, RenderOutcome};
    pub use crate::viewport::Viewport;
}
