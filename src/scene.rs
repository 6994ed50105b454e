//! Arena-based storage for the live display tree.
//!
//! Display nodes live in a dense `Vec` with a sparse map from stable
//! [`DisplayId`]s to dense slots. Ids carry a generation so that a handle to
//! a destroyed node never aliases the node later allocated in the same slot.
//! Removal is swap-remove, so the dense storage never has holes.

use crate::backend::TextureId;
use crate::filter::PixelFilter;
use crate::geometry::{Point, Rect};
use crate::render::commands::{commands_bounds, DrawCommand};
use crate::transform::Matrix;

/// Handle to a node in a [`Scene`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DisplayId {
    index: u32,
    generation: u32,
}

impl DisplayId {
    /// Combines generation (high bits) with index (low bits).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayKind {
    /// Groups children, draws nothing itself.
    Container,
    /// A textured quad. `anchor` is the fraction of the size that sits at
    /// the local origin.
    Sprite {
        texture: TextureId,
        width: f32,
        height: f32,
        anchor: Point,
        /// Owned textures are released with the sprite; shared ones (cached
        /// images) are not.
        owned: bool,
    },
    Graphics(Vec<DrawCommand>),
}

/// A renderable: a kind plus the properties every node carries.
#[derive(Debug, Clone)]
pub struct DisplayNode {
    pub name: String,
    pub kind: DisplayKind,
    pub matrix: Matrix,
    pub alpha: f32,
    pub visible: bool,
    pub z_index: i32,
    pub filters: Vec<PixelFilter>,
    /// Node whose alpha channel clips this one. Masks are not children.
    pub mask: Option<DisplayId>,
    /// `nodeUUID` reported when the pointer lands on this node.
    pub interactive: Option<String>,
    parent: Option<DisplayId>,
    children: Vec<DisplayId>,
}

impl DisplayNode {
    pub fn new(name: impl Into<String>, kind: DisplayKind) -> Self {
        Self {
            name: name.into(),
            kind,
            matrix: Matrix::IDENTITY,
            alpha: 1.0,
            visible: true,
            z_index: 0,
            filters: Vec::new(),
            mask: None,
            interactive: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, DisplayKind::Container)
    }

    pub fn parent(&self) -> Option<DisplayId> {
        self.parent
    }

    pub fn children(&self) -> &[DisplayId] {
        &self.children
    }

    /// Bounds of what this node draws itself, ignoring children.
    pub fn content_bounds(&self) -> Option<Rect> {
        match &self.kind {
            DisplayKind::Container => None,
            DisplayKind::Sprite {
                width,
                height,
                anchor,
                ..
            } => Some(Rect::new(
                -anchor.x * width,
                -anchor.y * height,
                *width,
                *height,
            )),
            DisplayKind::Graphics(commands) => commands_bounds(commands),
        }
    }
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

struct Slot {
    node: DisplayNode,
    sparse_index: u32,
}

/// The display tree. Any number of roots may coexist.
#[derive(Default)]
pub struct Scene {
    dense: Vec<Slot>,
    sparse: Vec<Option<SparseEntry>>,
    /// Generation to hand out next for each freed sparse index.
    free_indices: Vec<(u32, u32)>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Store a detached node and return its id.
    pub fn insert(&mut self, mut node: DisplayNode) -> DisplayId {
        node.parent = None;
        node.children.clear();

        let (sparse_index, generation) = match self.free_indices.pop() {
            Some(reused) => reused,
            None => {
                let idx = self.sparse.len() as u32;
                self.sparse.push(None);
                (idx, 0)
            }
        };

        let dense_index = self.dense.len();
        self.dense.push(Slot { node, sparse_index });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        DisplayId {
            index: sparse_index,
            generation,
        }
    }

    fn dense_index(&self, id: DisplayId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: DisplayId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn get(&self, id: DisplayId) -> Option<&DisplayNode> {
        self.dense_index(id).map(|idx| &self.dense[idx].node)
    }

    pub fn get_mut(&mut self, id: DisplayId) -> Option<&mut DisplayNode> {
        self.dense_index(id).map(|idx| &mut self.dense[idx].node)
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: DisplayId, child: DisplayId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Remove `child` from its parent without destroying it.
    pub fn detach(&mut self, child: DisplayId) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = None;
        }
    }

    /// Detach every child of `parent` and return them in their previous order.
    pub fn remove_children(&mut self, parent: DisplayId) -> Vec<DisplayId> {
        let children = match self.get_mut(parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return Vec::new(),
        };
        for &child in &children {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
            }
        }
        children
    }

    /// Stable ascending sort by z-index; the last child draws on top.
    pub fn sort_children(&mut self, parent: DisplayId) {
        let Some(idx) = self.dense_index(parent) else {
            return;
        };
        let mut children = std::mem::take(&mut self.dense[idx].node.children);
        children.sort_by_key(|&c| self.get(c).map_or(0, |n| n.z_index));
        self.dense[idx].node.children = children;
    }

    /// Destroy a node, its descendants and its mask. Returns the owned
    /// textures that were held by the destroyed sprites.
    pub fn destroy(&mut self, id: DisplayId) -> Vec<TextureId> {
        let mut released = Vec::new();
        if self.contains(id) {
            self.detach(id);
            self.destroy_recursive(id, &mut released);
        }
        released
    }

    fn destroy_recursive(&mut self, id: DisplayId, released: &mut Vec<TextureId>) {
        let Some(dense_index) = self.dense_index(id) else {
            return;
        };
        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(entry) = self.sparse[moved_sparse_idx as usize].as_mut() {
                entry.dense_index = dense_index;
            }
        }
        self.sparse[id.index as usize] = None;
        self.free_indices
            .push((id.index, id.generation.wrapping_add(1)));

        if let DisplayKind::Sprite {
            texture,
            owned: true,
            ..
        } = removed.node.kind
        {
            released.push(texture);
        }
        for child in removed.node.children {
            self.destroy_recursive(child, released);
        }
        if let Some(mask) = removed.node.mask {
            self.destroy_recursive(mask, released);
        }
    }

    /// Bounds of a node's own content and visible descendants, in the
    /// node's local space (its own matrix is not applied).
    pub fn local_bounds(&self, id: DisplayId) -> Option<Rect> {
        let node = self.get(id)?;
        let mut bounds = node.content_bounds();
        for &child in &node.children {
            let Some(child_node) = self.get(child) else {
                continue;
            };
            if !child_node.visible {
                continue;
            }
            if let Some(child_bounds) = self.local_bounds(child) {
                let mapped = child_node.matrix.transform_rect(child_bounds);
                bounds = Some(match bounds {
                    Some(b) => b.union(&mapped),
                    None => mapped,
                });
            }
        }
        bounds
    }

    /// Composition of every matrix from the top-most ancestor down to `id`.
    pub fn world_matrix(&self, id: DisplayId) -> Matrix {
        let mut matrix = Matrix::IDENTITY;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.get(c)) {
            matrix = node.matrix.then(&matrix);
            current = node.parent;
        }
        matrix
    }

    /// Nearest interactive node under `point` (in `root`'s parent space),
    /// top-most first. Invisible subtrees are skipped.
    pub fn hit_test(&self, root: DisplayId, point: Point) -> Option<DisplayId> {
        let leaf = self.hit_leaf(root, Matrix::IDENTITY, point)?;
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get(id)?;
            if node.interactive.is_some() {
                return Some(id);
            }
            if id == root {
                return None;
            }
            current = node.parent;
        }
        None
    }

    fn hit_leaf(&self, id: DisplayId, parent: Matrix, point: Point) -> Option<DisplayId> {
        let node = self.get(id)?;
        if !node.visible {
            return None;
        }
        let world = parent.then(&node.matrix);
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_leaf(child, world, point) {
                return Some(hit);
            }
        }
        let local = world.inverse().transform_point(point);
        node.content_bounds()
            .filter(|b| b.contains(local))
            .map(|_| id)
    }
}
