//! Asset fetching and decoding.
//!
//! Image assets carry an opaque source string. An [`AssetLoader`] turns it
//! into bytes asynchronously; [`decode_image`] turns bytes into pixels.
//! Raster formats go through `image`, SVG documents are rasterised by `resvg`.

use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{BlinkError, Result};

/// Fetches the raw bytes behind an image asset's source reference.
pub trait AssetLoader {
    fn load(&self, source: &str) -> BoxFuture<'static, Result<Vec<u8>>>;
}

/// Resolves sources as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsLoader {
    fn load(&self, source: &str) -> BoxFuture<'static, Result<Vec<u8>>> {
        let path = self.root.join(source);
        let uri = source.to_string();
        async move {
            std::fs::read(&path).map_err(|err| BlinkError::AssetLoad {
                uri,
                reason: err.to_string(),
            })
        }
        .boxed()
    }
}

/// Serves sources from an in-memory table, e.g. a host-side blob cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(source.into(), bytes);
    }

    pub fn with(mut self, source: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(source, bytes);
        self
    }
}

impl AssetLoader for MemoryLoader {
    fn load(&self, source: &str) -> BoxFuture<'static, Result<Vec<u8>>> {
        let result = self
            .entries
            .get(source)
            .cloned()
            .ok_or_else(|| BlinkError::AssetLoad {
                uri: source.to_string(),
                reason: "not found".to_string(),
            });
        future::ready(result).boxed()
    }
}

/// Straight-alpha RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

fn looks_like_svg(source: &str, bytes: &[u8]) -> bool {
    if source.to_ascii_lowercase().ends_with(".svg") {
        return true;
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Decode fetched bytes. `source` is only used to recognise SVG documents.
pub fn decode_image(source: &str, bytes: &[u8]) -> Result<DecodedImage> {
    if looks_like_svg(source, bytes) {
        return decode_svg(bytes);
    }
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

fn decode_svg(bytes: &[u8]) -> Result<DecodedImage> {
    let tree = resvg::usvg::Tree::from_data(bytes, &resvg::usvg::Options::default())
        .map_err(|err| BlinkError::Svg(err.to_string()))?;
    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or(BlinkError::TextureAllocation { width, height })?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let mut pixels = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(DecodedImage {
        width,
        height,
        pixels,
    })
}
