use thiserror::Error;

use crate::backend::TextureId;

/// Errors surfaced by host-facing helpers: canvas parsing, asset loading and
/// texture export. The render pass itself degrades instead of failing.
#[derive(Debug, Error)]
pub enum BlinkError {
    #[error("failed to load asset {uri}: {reason}")]
    AssetLoad { uri: String, reason: String },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to parse SVG: {0}")]
    Svg(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid canvas JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot allocate a {width}x{height} texture")]
    TextureAllocation { width: u32, height: u32 },

    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
}

pub type Result<T> = std::result::Result<T, BlinkError>;
