//! The rendering capability the reconciler draws through.

pub(crate) mod effects;
mod software;

pub use software::SoftwareBackend;

use crate::assets::DecodedImage;
use crate::error::Result;
use crate::scene::{DisplayId, Scene};

/// Handle to a texture owned by a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// A 2D renderer able to upload images, rasterise a display subtree into an
/// offscreen texture and free textures again.
pub trait Backend {
    /// Upload straight-alpha RGBA pixels.
    fn create_texture(&mut self, image: &DecodedImage) -> Result<TextureId>;

    /// Rasterise `root` and its descendants into a new `width`x`height`
    /// texture. The root's own matrix, alpha and filters apply; its ancestors
    /// are ignored.
    fn render_to_texture(
        &mut self,
        scene: &Scene,
        root: DisplayId,
        width: u32,
        height: u32,
    ) -> Result<TextureId>;

    fn release_texture(&mut self, texture: TextureId);

    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)>;
}
