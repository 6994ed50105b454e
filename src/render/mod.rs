//! The render context: one live display tree kept in step with a stream of
//! canvas snapshots.
//!
//! A canvas update runs in two halves. [`RenderContext::preload`] starts
//! fetching every image the canvas needs and is the only asynchronous step;
//! [`RenderContext::apply`] then reconciles the display tree synchronously.
//! Each preload is stamped with a generation so that a slow batch finishing
//! after a newer one has started is discarded instead of applied.

pub mod commands;
pub mod flatten;
pub mod hierarchy;
pub mod text;
pub mod texture;

mod clump;

use std::collections::{HashMap, HashSet};

use futures::future::{join_all, BoxFuture};

use crate::assets::{decode_image, AssetLoader, DecodedImage};
use crate::backend::{Backend, TextureId};
use crate::config::EngineConfig;
use crate::diff::{diff_canvas_config, CanvasConfigDiff};
use crate::error::Result;
use crate::fingerprint::canvas_fingerprint;
use crate::geometry::{Color, Rect};
use crate::interaction::{ChangeNotification, Interaction, PointerEvent};
use crate::model::{Canvas, CanvasConfig};
use crate::overlay::BoundingBox;
use crate::scene::{DisplayId, DisplayKind, DisplayNode, Scene};
use crate::viewport::Viewport;

use self::clump::Reconciler;
use self::commands::DrawCommand;
use self::hierarchy::{HierarchyCanvas, HierarchyClump, HierarchyElement};
use self::texture::{ImageTexture, TextureCache};

const CANVAS_BLOCK_Z: i32 = 0;
const CONTENT_Z: i32 = 1;

/// What one render pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub clumps_built: usize,
    pub clumps_reused: usize,
    pub atoms_built: usize,
    pub atoms_reused: usize,
    /// Atoms that resolved to nothing: missing or mistyped assets, paint
    /// references and unknown kinds.
    pub atoms_absent: usize,
    pub flattened: usize,
    pub disposed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The canvas has no content; the display tree was left untouched.
    NoContent,
    /// The fingerprint matched the previous pass.
    Unchanged,
    /// The preload was superseded by a newer one before it was applied.
    Stale { generation: u64 },
    Rendered(PassStats),
}

/// Image fetches in flight for one canvas update.
pub struct Preload {
    generation: u64,
    pending: Vec<(String, BoxFuture<'static, Result<Vec<u8>>>)>,
}

impl Preload {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for every fetch and decode the results. Failed sources are
    /// logged and left out; atoms using them render as absent.
    pub async fn resolve(self) -> LoadedAssets {
        let Preload {
            generation,
            pending,
        } = self;
        let (sources, fetches): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        let results = join_all(fetches).await;

        let mut images = Vec::with_capacity(sources.len());
        for (source, result) in sources.into_iter().zip(results) {
            match result.and_then(|bytes| decode_image(&source, &bytes)) {
                Ok(image) => images.push((source, image)),
                Err(err) => log::warn!("Failed to load image asset {source}: {err}"),
            }
        }
        LoadedAssets { generation, images }
    }
}

/// Decoded images ready to be uploaded by [`RenderContext::apply`].
pub struct LoadedAssets {
    generation: u64,
    images: Vec<(String, DecodedImage)>,
}

impl LoadedAssets {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

pub struct RenderContext<B: Backend> {
    config: EngineConfig,
    backend: B,
    scene: Scene,
    /// Parent of the canvas block and the content root.
    root: DisplayId,
    canvas_block: Option<DisplayId>,
    hierarchy: Option<HierarchyCanvas>,
    fingerprint: Option<String>,
    textures: TextureCache,
    /// Clump containers of the last pass, by `nodeUUID`.
    nodes: HashMap<String, DisplayId>,
    interaction: Interaction,
    viewport: Viewport,
    overlay: Option<BoundingBox>,
    generation: u64,
}

impl<B: Backend> RenderContext<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        let mut scene = Scene::new();
        let root = scene.insert(DisplayNode::container("Blink Scene"));
        Self {
            textures: TextureCache::new(config.texture_cache_size),
            config,
            backend,
            scene,
            root,
            canvas_block: None,
            hierarchy: None,
            fingerprint: None,
            nodes: HashMap::new(),
            interaction: Interaction::new(),
            viewport: Viewport::default(),
            overlay: None,
            generation: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Canvas updates
    // -------------------------------------------------------------------------

    /// Preload, wait, and apply in one go.
    pub async fn update(&mut self, canvas: &Canvas, loader: &dyn AssetLoader) -> RenderOutcome {
        let preload = self.preload(canvas, loader);
        let loaded = preload.resolve().await;
        self.apply(canvas, loaded)
    }

    /// Start fetching every image source of `canvas` that is not cached yet.
    /// Supersedes any earlier preload.
    pub fn preload(&mut self, canvas: &Canvas, loader: &dyn AssetLoader) -> Preload {
        self.generation += 1;
        let pending: Vec<_> = canvas
            .image_sources()
            .into_iter()
            .filter(|source| !self.textures.contains(source))
            .map(|source| (source.to_string(), loader.load(source)))
            .collect();
        log::debug!(
            "Preload {} fetching {} image(s)",
            self.generation,
            pending.len()
        );
        Preload {
            generation: self.generation,
            pending,
        }
    }

    /// Reconcile the display tree with `canvas`.
    pub fn apply(&mut self, canvas: &Canvas, loaded: LoadedAssets) -> RenderOutcome {
        if loaded.generation != self.generation {
            log::info!(
                "Discarding stale preload {} (current is {})",
                loaded.generation,
                self.generation
            );
            return RenderOutcome::Stale {
                generation: loaded.generation,
            };
        }
        let Some(content) = canvas.content.as_ref() else {
            log::debug!("Canvas has no content, nothing to render");
            return RenderOutcome::NoContent;
        };

        self.upload(loaded.images);

        let fingerprint = canvas_fingerprint(canvas, self.config.fingerprint);
        if fingerprint.is_some() && fingerprint == self.fingerprint {
            log::debug!("Fingerprint unchanged, skipping pass");
            return RenderOutcome::Unchanged;
        }

        log::debug!("Render pass for {}", content.node_uuid);
        self.textures.begin_pass();
        let mut stats = PassStats::default();

        let (prev_assets, prev_config, prev_root) = match self.hierarchy.take() {
            Some(h) => (Some(h.assets), h.config, h.content),
            None => (None, None, None),
        };
        self.update_canvas_block(canvas.config.as_ref(), prev_config.as_ref());

        let old_nodes = std::mem::take(&mut self.nodes);
        let root_clump = {
            let mut reconciler = Reconciler {
                scene: &mut self.scene,
                backend: &mut self.backend,
                textures: &mut self.textures,
                nodes: &mut self.nodes,
                stats: &mut stats,
                assets: &canvas.assets,
                prev_assets: prev_assets.as_ref(),
                config: &self.config,
            };
            let prev_root = match prev_root {
                Some(prev) if prev.source.node_uuid == content.node_uuid => Some(prev),
                Some(replaced) => {
                    reconciler.dispose(HierarchyElement::Clump(replaced));
                    None
                }
                None => None,
            };
            reconciler.render_clump(content, prev_root).0
        };

        if let Some(node) = self.scene.get_mut(root_clump.container) {
            node.z_index = CONTENT_Z;
        }
        let attached = self
            .scene
            .get(root_clump.container)
            .and_then(|n| n.parent())
            == Some(self.root);
        if !attached {
            self.scene.add_child(self.root, root_clump.container);
        }
        self.scene.sort_children(self.root);

        self.sweep(old_nodes, &mut stats);

        let keep: HashSet<&str> = canvas.image_sources().into_iter().collect();
        for texture in self.textures.evict(&keep) {
            self.backend.release_texture(texture);
        }

        self.hierarchy = Some(HierarchyCanvas {
            assets: canvas.assets.clone(),
            config: canvas.config.clone(),
            content: Some(root_clump),
        });
        self.fingerprint = fingerprint;

        let selection_gone = self
            .interaction
            .selection()
            .is_some_and(|uuid| !self.nodes.contains_key(uuid));
        if selection_gone {
            self.interaction.clear();
        }
        self.refresh_overlay();

        log::debug!("Pass done: {stats:?}");
        RenderOutcome::Rendered(stats)
    }

    fn upload(&mut self, images: Vec<(String, DecodedImage)>) {
        for (source, image) in images {
            match self.backend.create_texture(&image) {
                Ok(texture) => {
                    let cached = ImageTexture {
                        texture,
                        width: image.width,
                        height: image.height,
                    };
                    if let Some(replaced) = self.textures.insert(source, cached) {
                        self.backend.release_texture(replaced);
                    }
                }
                Err(err) => log::warn!("Failed to upload image {source}: {err}"),
            }
        }
    }

    /// Replace the background rectangle when the canvas settings change.
    fn update_canvas_block(&mut self, config: Option<&CanvasConfig>, prev: Option<&CanvasConfig>) {
        let diffs = diff_canvas_config(config, prev);
        if !diffs.contains(CanvasConfigDiff::CANVAS_BLOCK) {
            return;
        }
        if let Some(old) = self.canvas_block.take() {
            self.scene.destroy(old);
        }
        let Some(config) = config else {
            return;
        };

        let mut block = DisplayNode::new(
            "Canvas Block",
            DisplayKind::Graphics(vec![DrawCommand::Rect {
                rect: Rect::new(0.0, 0.0, config.canvas_dims.w, config.canvas_dims.h),
                fill: Color::from_hex(config.canvas_color).with_alpha(config.canvas_alpha),
                stroke: None,
            }]),
        );
        block.z_index = CANVAS_BLOCK_Z;
        let block = self.scene.insert(block);
        self.scene.add_child(self.root, block);
        self.scene.sort_children(self.root);
        self.canvas_block = Some(block);
    }

    /// Release clump containers from the previous pass that no clump of this
    /// pass claimed.
    fn sweep(&mut self, old_nodes: HashMap<String, DisplayId>, stats: &mut PassStats) {
        let live: HashSet<DisplayId> = self.nodes.values().copied().collect();
        for (uuid, id) in old_nodes {
            if live.contains(&id) || !self.scene.contains(id) {
                continue;
            }
            log::debug!("Releasing orphaned clump {uuid}");
            for texture in self.scene.destroy(id) {
                self.backend.release_texture(texture);
            }
            stats.disposed += 1;
        }
    }

    /// Tear down everything rendered so far, cached images included. The
    /// next canvas renders from scratch.
    pub fn reset(&mut self) {
        for child in self.scene.remove_children(self.root) {
            for texture in self.scene.destroy(child) {
                self.backend.release_texture(texture);
            }
        }
        for texture in self.textures.drain() {
            self.backend.release_texture(texture);
        }
        self.canvas_block = None;
        self.hierarchy = None;
        self.fingerprint = None;
        self.nodes.clear();
        self.interaction.clear();
        self.overlay = None;
        log::debug!("Render context reset");
    }

    // -------------------------------------------------------------------------
    // Interaction
    // -------------------------------------------------------------------------

    /// Feed a screen-space pointer event. Returns the position write-back
    /// for every drag move.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<ChangeNotification> {
        match event {
            PointerEvent::Down(screen) => {
                let world = self.viewport.to_world(screen);
                let hit = self
                    .scene
                    .hit_test(self.root, world)
                    .and_then(|id| self.scene.get(id))
                    .and_then(|node| node.interactive.clone());
                if let Some(uuid) = hit {
                    log::debug!("Selected {uuid}");
                    self.interaction.pointer_down(&uuid, world);
                    self.refresh_overlay();
                }
                None
            }
            PointerEvent::Move(screen) => {
                let world = self.viewport.to_world(screen);
                let (uuid, delta) = self.interaction.pointer_move(world)?;
                let container = *self.nodes.get(&uuid)?;
                let node = self.scene.get_mut(container)?;
                node.matrix.tx += delta.x;
                node.matrix.ty += delta.y;
                let mut position = node.matrix.translation();

                // Keep the hierarchy in step so an echo of this position from
                // the host is not seen as a transform change.
                if let Some(clump) = self.hierarchy_clump_mut(&uuid) {
                    clump.source.transform.position = clump.source.transform.position + delta;
                    position = clump.source.transform.position;
                }
                self.refresh_overlay();
                Some(ChangeNotification::position(uuid, position))
            }
            PointerEvent::Up(_) => {
                self.interaction.pointer_up();
                None
            }
        }
    }

    /// Select a clump by `nodeUUID`. Returns false if no such clump is
    /// rendered.
    pub fn select(&mut self, node_uuid: &str) -> bool {
        if !self.nodes.contains_key(node_uuid) {
            return false;
        }
        self.interaction.select(node_uuid);
        self.refresh_overlay();
        true
    }

    pub fn clear_selection(&mut self) {
        self.interaction.clear();
        self.overlay = None;
    }

    pub fn selection(&self) -> Option<&str> {
        self.interaction.selection()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Rebuild the selection overlay from the live display tree.
    pub fn refresh_overlay(&mut self) {
        self.overlay = self.interaction.selection().and_then(|uuid| {
            let container = *self.nodes.get(uuid)?;
            let bounds = self.scene.local_bounds(container)?;
            let origin = self
                .hierarchy_clump(uuid)
                .map(|c| c.source.transform.origin)
                .unwrap_or_default();
            Some(BoundingBox::new(
                uuid,
                &self.scene.world_matrix(container),
                bounds,
                origin,
                &self.viewport,
            ))
        });
    }

    pub fn overlay(&self) -> Option<&BoundingBox> {
        self.overlay.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.refresh_overlay();
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The container rendered for a clump.
    pub fn node(&self, node_uuid: &str) -> Option<DisplayId> {
        self.nodes.get(node_uuid).copied()
    }

    pub fn hierarchy(&self) -> Option<&HierarchyCanvas> {
        self.hierarchy.as_ref()
    }

    fn hierarchy_clump(&self, node_uuid: &str) -> Option<&HierarchyClump> {
        self.hierarchy.as_ref()?.content.as_ref()?.find(node_uuid)
    }

    fn hierarchy_clump_mut(&mut self, node_uuid: &str) -> Option<&mut HierarchyClump> {
        self.hierarchy.as_mut()?.content.as_mut()?.find_mut(node_uuid)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn root(&self) -> DisplayId {
        self.root
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Name the host gave the exported image, if the canvas has settings.
    pub fn export_name(&self) -> Option<&str> {
        self.hierarchy
            .as_ref()?
            .config
            .as_ref()
            .map(|c| c.export_name.as_str())
    }

    /// Render the whole scene into a texture the size of the canvas block.
    /// `None` if the last rendered canvas had no settings.
    pub fn export(&mut self) -> Result<Option<TextureId>> {
        let Some(config) = self.hierarchy.as_ref().and_then(|h| h.config.as_ref()) else {
            return Ok(None);
        };
        let width = config.canvas_dims.w.ceil().max(1.0) as u32;
        let height = config.canvas_dims.h.ceil().max(1.0) as u32;
        log::info!("Exporting {} at {width}x{height}", config.export_name);
        self.backend
            .render_to_texture(&self.scene, self.root, width, height)
            .map(Some)
    }
}
