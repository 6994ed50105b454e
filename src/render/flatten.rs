//! Baking a subtree and its filter chain into a single texture.
//!
//! Filters must see the subtree's own pixel layout, not the layout after the
//! clump's transform has warped it, so the content is rendered offscreen
//! first and the resulting sprite is what the transform applies to.

use crate::backend::{Backend, TextureId};
use crate::filter::PixelFilter;
use crate::geometry::Point;
use crate::scene::{DisplayId, DisplayKind, DisplayNode, Scene};
use crate::transform::Matrix;

/// Sprite standing in for a flattened subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flattened {
    pub sprite: DisplayId,
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Render `content` with `filters` into a texture padded by `padding` on
/// every side and return a new detached sprite covering the same local
/// footprint, grown by the padding.
///
/// `content` is left as it was found: matrix reset to identity, filters
/// cleared and its alpha restored. Returns `None` if the content draws
/// nothing or the backend cannot allocate the texture.
pub fn flatten<B: Backend + ?Sized>(
    scene: &mut Scene,
    backend: &mut B,
    content: DisplayId,
    filters: Vec<PixelFilter>,
    padding: f32,
) -> Option<Flattened> {
    let bounds = scene.local_bounds(content).filter(|b| !b.is_empty())?;
    let width = (bounds.width + 2.0 * padding).ceil().max(1.0) as u32;
    let height = (bounds.height + 2.0 * padding).ceil().max(1.0) as u32;

    let node = scene.get_mut(content)?;
    // Opacity is applied to the sprite, not baked into the texture.
    let alpha = node.alpha;
    let visible = node.visible;
    node.alpha = 1.0;
    node.visible = true;
    node.matrix = Matrix::translate(padding - bounds.x, padding - bounds.y);
    node.filters = filters;

    let rendered = backend.render_to_texture(scene, content, width, height);

    if let Some(node) = scene.get_mut(content) {
        node.filters.clear();
        node.matrix = Matrix::IDENTITY;
        node.alpha = alpha;
        node.visible = visible;
    }

    let texture = match rendered {
        Ok(texture) => texture,
        Err(err) => {
            log::warn!("Failed to flatten {width}x{height} subtree: {err}");
            return None;
        }
    };
    log::debug!("Flattened subtree into {width}x{height} texture {texture:?}");

    let mut sprite = DisplayNode::new(
        "Flattened",
        DisplayKind::Sprite {
            texture,
            width: width as f32,
            height: height as f32,
            anchor: Point::ZERO,
            owned: true,
        },
    );
    sprite.matrix = Matrix::translate(bounds.x - padding, bounds.y - padding);

    Some(Flattened {
        sprite: scene.insert(sprite),
        texture,
        width,
        height,
    })
}
