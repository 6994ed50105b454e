//! Decoded image textures, cached per source with LRU eviction.

use std::collections::{HashMap, HashSet};

use crate::backend::TextureId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTexture {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

struct CachedImage {
    texture: ImageTexture,
    last_used_pass: u64,
}

pub struct TextureCache {
    cache: HashMap<String, CachedImage>,
    current_pass: u64,
    max_cache_size: usize,
}

impl TextureCache {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            cache: HashMap::new(),
            current_pass: 0,
            max_cache_size,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.cache.contains_key(source)
    }

    /// Advance the pass counter (call once per render pass).
    pub fn begin_pass(&mut self) {
        self.current_pass += 1;
    }

    /// Look up a texture and mark it used in this pass.
    pub fn get(&mut self, source: &str) -> Option<ImageTexture> {
        let entry = self.cache.get_mut(source)?;
        entry.last_used_pass = self.current_pass;
        Some(entry.texture)
    }

    /// Store a texture. Returns the one it replaced, if any.
    pub fn insert(&mut self, source: impl Into<String>, texture: ImageTexture) -> Option<TextureId> {
        self.cache
            .insert(
                source.into(),
                CachedImage {
                    texture,
                    last_used_pass: self.current_pass,
                },
            )
            .map(|old| old.texture.texture)
    }

    /// Once over the limit, evict least recently used entries down to half
    /// the limit. Sources in `keep` are never evicted. Returns the evicted
    /// textures for the caller to release.
    pub fn evict(&mut self, keep: &HashSet<&str>) -> Vec<TextureId> {
        let mut evicted = Vec::new();
        if self.cache.len() <= self.max_cache_size {
            return evicted;
        }
        let target_size = self.max_cache_size / 2;
        while self.cache.len() > target_size {
            let oldest = self
                .cache
                .iter()
                .filter(|(k, _)| !keep.contains(k.as_str()))
                .min_by_key(|(_, v)| v.last_used_pass)
                .map(|(k, _)| k.clone());

            match oldest.and_then(|key| self.cache.remove(&key)) {
                Some(entry) => evicted.push(entry.texture.texture),
                None => break,
            }
        }
        evicted
    }

    /// Remove every entry, returning their textures.
    pub fn drain(&mut self) -> Vec<TextureId> {
        self.cache
            .drain()
            .map(|(_, entry)| entry.texture.texture)
            .collect()
    }
}
