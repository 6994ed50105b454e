use crate::fingerprint::FingerprintMode;

/// Padding, in world units, around a filtered subtree before it is rendered
/// offscreen. Large enough for the widest supported filter spread.
pub const FLATTEN_PADDING: f32 = 100.0;

/// Engine tuning. Built with chained setters:
///
/// ```
/// use blink::{EngineConfig, FingerprintMode};
///
/// let config = EngineConfig::default()
///     .fingerprint(FingerprintMode::Topology)
///     .texture_cache_size(16);
/// assert_eq!(config.texture_cache_size, 16);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub flatten_padding: f32,
    pub mask_padding: f32,
    pub fingerprint: FingerprintMode,
    /// Decoded image textures kept alive beyond those the current canvas uses.
    pub texture_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flatten_padding: FLATTEN_PADDING,
            mask_padding: 0.0,
            fingerprint: FingerprintMode::Content,
            texture_cache_size: 64,
        }
    }
}

impl EngineConfig {
    pub fn flatten_padding(mut self, padding: f32) -> Self {
        self.flatten_padding = padding.max(0.0);
        self
    }

    pub fn mask_padding(mut self, padding: f32) -> Self {
        self.mask_padding = padding.max(0.0);
        self
    }

    pub fn fingerprint(mut self, mode: FingerprintMode) -> Self {
        self.fingerprint = mode;
        self
    }

    pub fn texture_cache_size(mut self, size: usize) -> Self {
        self.texture_cache_size = size;
        self
    }
}
