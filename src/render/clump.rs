//! Post-order reconciliation of a clump tree against the previous pass.
//!
//! Each clump owns two display nodes: a container carrying its transform
//! and pointer identity, and a content node holding its children. When the
//! clump has filters the content is flattened into a sprite that sits next
//! to it in the container, and the content itself is hidden.

use std::collections::{BTreeMap, HashMap};

use super::commands::{DrawCommand, PathSegment, Stroke};
use super::flatten::flatten;
use super::hierarchy::{ElementClass, HierarchyAtom, HierarchyClump, HierarchyElement};
use super::text::text_rect;
use super::texture::{ImageTexture, TextureCache};
use super::PassStats;
use crate::backend::Backend;
use crate::config::EngineConfig;
use crate::diff::{self, ClumpDiff};
use crate::filter::build_chain;
use crate::geometry::{Color, Point, Rect};
use crate::model::{
    Asset, Atom, AtomKind, Clump, CurveAtom, Element, FontStyle, FontWeight, ImageAtom, ShapeAtom,
    ShapeKind, TextAtom,
};
use crate::scene::{DisplayId, DisplayKind, DisplayNode, Scene};

/// Z-index of the flattened sprite, above the (hidden) content.
const FLATTENED_Z: i32 = 1;

pub(crate) struct Reconciler<'a, B: Backend + ?Sized> {
    pub scene: &'a mut Scene,
    pub backend: &'a mut B,
    pub textures: &'a mut TextureCache,
    /// Clump containers by `nodeUUID`, filled in as the pass goes.
    pub nodes: &'a mut HashMap<String, DisplayId>,
    pub stats: &'a mut PassStats,
    pub assets: &'a BTreeMap<String, Asset>,
    /// `None` on the first pass.
    pub prev_assets: Option<&'a BTreeMap<String, Asset>>,
    pub config: &'a EngineConfig,
}

impl<B: Backend + ?Sized> Reconciler<'_, B> {
    /// Build or update the displays for `clump`, reusing what `prev` holds.
    /// Returns the new hierarchy node and whether anything it draws changed.
    pub fn render_clump(
        &mut self,
        clump: &Clump,
        prev: Option<HierarchyClump>,
    ) -> (HierarchyClump, bool) {
        let prev = match prev {
            Some(p) if self.scene.contains(p.container) && self.scene.contains(p.content) => Some(p),
            Some(stale) => {
                log::debug!("Clump {} lost its displays, rebuilding", clump.node_uuid);
                self.dispose(HierarchyElement::Clump(stale));
                None
            }
            None => None,
        };
        let new_container = prev.is_none();
        let diffs = match &prev {
            Some(p) => diff::diff_clump(Some(clump), Some(&p.source)),
            None => ClumpDiff::all(),
        };

        let (container, content, mut flattened, mut mask, prev_elements) = match prev {
            Some(p) => {
                log::trace!("Reusing clump {} ({diffs:?})", clump.node_uuid);
                self.stats.clumps_reused += 1;
                (p.container, p.content, p.flattened, p.mask, p.elements)
            }
            None => {
                log::debug!("Building clump {}", clump.node_uuid);
                self.stats.clumps_built += 1;
                let container = self.scene.insert(DisplayNode::container(""));
                let content = self.scene.insert(DisplayNode::container("Content"));
                self.scene.add_child(container, content);
                (container, content, None, None, Vec::new())
            }
        };

        // Children, matched to the previous pass by class and nodeUUID.
        let mut previous: HashMap<(ElementClass, String), HierarchyElement> = HashMap::new();
        for element in prev_elements {
            let key = (element.class(), element.node_uuid().to_string());
            if let Some(duplicate) = previous.insert(key, element) {
                self.dispose(duplicate);
            }
        }

        let mut child_changed = false;
        let mut elements = Vec::with_capacity(clump.elements.len());
        for element in &clump.elements {
            let key = match element {
                Element::Clump(c) => (ElementClass::Clump, c.node_uuid.clone()),
                Element::Atom(a) => (ElementClass::Atom, a.node_uuid.clone()),
            };
            let matched = previous.remove(&key);
            match (element, matched) {
                (Element::Clump(child), Some(HierarchyElement::Clump(prev_child))) => {
                    let (rendered, changed) = self.render_clump(child, Some(prev_child));
                    child_changed |= changed;
                    elements.push(HierarchyElement::Clump(rendered));
                }
                (Element::Clump(child), _) => {
                    let (rendered, changed) = self.render_clump(child, None);
                    child_changed |= changed;
                    elements.push(HierarchyElement::Clump(rendered));
                }
                (Element::Atom(atom), Some(HierarchyElement::Atom(prev_atom))) => {
                    let (rendered, changed) = self.render_atom(atom, Some(prev_atom));
                    child_changed |= changed;
                    elements.push(HierarchyElement::Atom(rendered));
                }
                (Element::Atom(atom), _) => {
                    let (rendered, changed) = self.render_atom(atom, None);
                    child_changed |= changed;
                    elements.push(HierarchyElement::Atom(rendered));
                }
            }
        }
        for (_, leftover) in previous.drain() {
            self.dispose(leftover);
            child_changed = true;
        }

        let structure_changed = self.rebuild_content(content, &elements);

        // Filters see the content before the clump's transform applies.
        let refilter = clump.has_filters()
            && (new_container
                || child_changed
                || structure_changed
                || diffs.contains(ClumpDiff::FILTERS));
        if refilter || !clump.has_filters() {
            if let Some(old) = flattened.take() {
                self.release(old.sprite);
            }
        }
        if refilter {
            let filters = clump.filters.as_deref().map(build_chain).unwrap_or_default();
            flattened = flatten(
                &mut *self.scene,
                &mut *self.backend,
                content,
                filters,
                self.config.flatten_padding,
            );
            if let Some(flat) = &flattened {
                if let Some(node) = self.scene.get_mut(flat.sprite) {
                    node.z_index = FLATTENED_Z;
                }
                self.scene.add_child(container, flat.sprite);
                self.scene.sort_children(container);
                self.stats.flattened += 1;
            }
        }
        if let Some(node) = self.scene.get_mut(content) {
            node.visible = flattened.is_none();
        }

        if new_container || diffs.contains(ClumpDiff::TRANSFORM) {
            if let Some(node) = self.scene.get_mut(container) {
                node.matrix = clump.transform.matrix();
            }
        }

        // Opacity goes on the untransformed content (or its stand-in).
        if new_container || refilter || diffs.contains(ClumpDiff::OPACITY) {
            let alpha = clump.alpha();
            for id in std::iter::once(content).chain(flattened.map(|f| f.sprite)) {
                if let Some(node) = self.scene.get_mut(id) {
                    node.alpha = alpha;
                }
            }
        }

        if new_container || diffs.contains(ClumpDiff::MASK) {
            if let Some(old) = mask.take() {
                self.release(old);
            }
            mask = clump.mask.as_deref().and_then(|m| self.render_mask(m));
            if let Some(node) = self.scene.get_mut(container) {
                node.mask = mask;
            }
        }

        if new_container || diffs.contains(ClumpDiff::NAME) {
            if let Some(node) = self.scene.get_mut(container) {
                node.name = clump
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Clump({})", clump.node_uuid));
            }
        }
        if let Some(node) = self.scene.get_mut(container) {
            node.interactive = Some(clump.node_uuid.clone());
        }
        self.nodes.insert(clump.node_uuid.clone(), container);

        let changed = new_container || !diffs.is_empty() || child_changed || structure_changed;
        (
            HierarchyClump {
                source: clump.shallow(),
                container,
                content,
                flattened,
                mask,
                elements,
            },
            changed,
        )
    }

    /// Give each child display its z-index (first declared on top) and put
    /// them under `content` if they are not already there in that order.
    /// Returns whether the child list changed.
    fn rebuild_content(&mut self, content: DisplayId, elements: &[HierarchyElement]) -> bool {
        let count = elements.len() as i32;
        let mut displays = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let Some(id) = element.display() else {
                continue;
            };
            if let Some(node) = self.scene.get_mut(id) {
                node.z_index = count - index as i32;
            }
            displays.push(id);
        }
        displays.reverse();

        let current = self.scene.get(content).map(|n| n.children());
        if current == Some(displays.as_slice()) {
            return false;
        }

        for old in self.scene.remove_children(content) {
            if !displays.contains(&old) && self.scene.contains(old) {
                log::debug!("Releasing detached child {:#x}", old.as_u64());
                self.release(old);
            }
        }
        for &id in &displays {
            self.scene.add_child(content, id);
        }
        self.scene.sort_children(content);
        true
    }

    /// Render a mask clump on its own and bake it, transform included, into
    /// a detached sprite in the masked clump's space.
    fn render_mask(&mut self, mask: &Clump) -> Option<DisplayId> {
        let mut scratch_nodes = HashMap::new();
        let mut scratch_stats = PassStats::default();
        let rendered = {
            let mut sub = Reconciler {
                scene: &mut *self.scene,
                backend: &mut *self.backend,
                textures: &mut *self.textures,
                nodes: &mut scratch_nodes,
                stats: &mut scratch_stats,
                assets: self.assets,
                prev_assets: self.prev_assets,
                config: self.config,
            };
            sub.render_clump(mask, None).0
        };

        let wrapper = self.scene.insert(DisplayNode::container("Mask"));
        self.scene.add_child(wrapper, rendered.container);
        let flat = flatten(
            &mut *self.scene,
            &mut *self.backend,
            wrapper,
            Vec::new(),
            self.config.mask_padding,
        );
        self.release(wrapper);

        if flat.is_none() {
            log::debug!("Mask {} draws nothing", mask.node_uuid);
        }
        flat.map(|f| f.sprite)
    }

    pub fn render_atom(&mut self, atom: &Atom, prev: Option<HierarchyAtom>) -> (HierarchyAtom, bool) {
        let prev_display = prev.as_ref().and_then(|p| p.display);
        let differs = prev.as_ref().map_or(true, |p| self.atom_differs(atom, &p.source));

        if let Some(display) = prev_display {
            if !differs && self.scene.contains(display) && self.display_current(atom, display) {
                self.stats.atoms_reused += 1;
                return (
                    HierarchyAtom {
                        source: atom.clone(),
                        display: Some(display),
                    },
                    false,
                );
            }
            self.release(display);
        }

        let display = self.build_atom(atom).map(|node| self.scene.insert(node));
        match display {
            Some(_) => self.stats.atoms_built += 1,
            None => {
                log::debug!(
                    "Atom {} ({}) renders as absent",
                    atom.node_uuid,
                    atom.kind.type_name()
                );
                self.stats.atoms_absent += 1;
            }
        }

        let changed = differs || prev_display.is_some() || display.is_some();
        (
            HierarchyAtom {
                source: atom.clone(),
                display,
            },
            changed,
        )
    }

    fn atom_differs(&self, new: &Atom, old: &Atom) -> bool {
        if diff::diff_atom(Some(new), Some(old)) {
            return true;
        }
        match (&new.kind, &old.kind) {
            (AtomKind::Image(a), AtomKind::Image(b)) => self
                .prev_assets
                .map_or(true, |prev| diff::diff_image_atom(a, b, self.assets, prev)),
            (AtomKind::Curve(a), AtomKind::Curve(b)) => self
                .prev_assets
                .map_or(true, |prev| diff::diff_curve_atom(a, b, self.assets, prev)),
            (AtomKind::Shape(a), AtomKind::Shape(b)) => diff::diff_shape_atom(a, b),
            (AtomKind::Text(a), AtomKind::Text(b)) => diff::diff_text_atom(a, b),
            (AtomKind::Paint(a), AtomKind::Paint(b)) => diff::diff_paint_atom(a, b),
            (AtomKind::Unknown, AtomKind::Unknown) => false,
            _ => true,
        }
    }

    /// An image sprite goes stale when its source was re-uploaded.
    fn display_current(&mut self, atom: &Atom, display: DisplayId) -> bool {
        let AtomKind::Image(image) = &atom.kind else {
            return true;
        };
        let current = self.image_texture(image).map(|t| t.texture);
        match self.scene.get(display).map(|n| &n.kind) {
            Some(DisplayKind::Sprite { texture, .. }) => current == Some(*texture),
            _ => false,
        }
    }

    fn image_texture(&mut self, image: &ImageAtom) -> Option<ImageTexture> {
        match self.assets.get(&image.asset_id) {
            Some(Asset::Image { data }) => self.textures.get(data),
            Some(_) => {
                log::debug!("Asset {} is not an image", image.asset_id);
                None
            }
            None => None,
        }
    }

    fn build_atom(&mut self, atom: &Atom) -> Option<DisplayNode> {
        let name = format!("{}({})", atom.kind.type_name(), atom.node_uuid);
        match &atom.kind {
            AtomKind::Image(image) => {
                let texture = self.image_texture(image)?;
                Some(DisplayNode::new(
                    name,
                    DisplayKind::Sprite {
                        texture: texture.texture,
                        width: texture.width as f32,
                        height: texture.height as f32,
                        anchor: Point::new(0.5, 0.5),
                        owned: false,
                    },
                ))
            }
            AtomKind::Shape(shape) => Some(DisplayNode::new(
                name,
                DisplayKind::Graphics(vec![shape_command(shape)]),
            )),
            AtomKind::Text(text) => {
                let mut node = DisplayNode::new(name, DisplayKind::Graphics(vec![text_command(text)]));
                node.alpha = text.alpha.clamp(0.0, 1.0);
                Some(node)
            }
            AtomKind::Curve(curve) => {
                let command = curve_command(curve, self.assets)?;
                Some(DisplayNode::new(name, DisplayKind::Graphics(vec![command])))
            }
            AtomKind::Paint(_) | AtomKind::Unknown => None,
        }
    }

    /// Drop a previous-pass element and everything it displayed.
    pub fn dispose(&mut self, element: HierarchyElement) {
        self.stats.disposed += 1;
        match element {
            HierarchyElement::Clump(clump) => {
                log::debug!("Disposing clump {}", clump.source.node_uuid);
                self.release(clump.container);
            }
            HierarchyElement::Atom(atom) => {
                if let Some(display) = atom.display {
                    self.release(display);
                }
            }
        }
    }

    /// Destroy a display subtree and free the textures it owned.
    pub fn release(&mut self, id: DisplayId) {
        for texture in self.scene.destroy(id) {
            self.backend.release_texture(texture);
        }
    }
}

fn color(hex: u32, alpha: f32) -> Color {
    Color::from_hex(hex).with_alpha(alpha)
}

/// Shapes are centred on the local origin.
fn shape_command(shape: &ShapeAtom) -> DrawCommand {
    let (w, h) = (shape.bounds.w, shape.bounds.h);
    let (hw, hh) = (w / 2.0, h / 2.0);
    let fill = color(shape.fill, shape.fill_alpha);
    let stroke = Stroke::visible(shape.stroke_width, color(shape.stroke, shape.stroke_alpha));
    match shape.shape {
        ShapeKind::Rectangle => DrawCommand::Rect {
            rect: Rect::new(-hw, -hh, w, h),
            fill,
            stroke,
        },
        ShapeKind::Ellipse => DrawCommand::Ellipse {
            center: Point::ZERO,
            radius_x: hw,
            radius_y: hh,
            fill,
            stroke,
        },
        ShapeKind::Triangle => DrawCommand::Polygon {
            points: vec![Point::new(-hw, hh), Point::new(hw, hh), Point::new(0.0, -hh)],
            fill,
            stroke,
        },
    }
}

/// Text is laid out from the local origin at its top-left corner.
fn text_command(text: &TextAtom) -> DrawCommand {
    DrawCommand::Text {
        text: text.text.clone(),
        rect: text_rect(text),
        color: Color::from_hex(text.fill),
        stroke: Stroke::visible(text.stroke_width, Color::from_hex(text.stroke)),
        font_size: text.font_size,
        font_family: text.font_family.clone(),
        italic: text.font_style == FontStyle::Italic,
        bold: text.font_weight == FontWeight::Bold,
        align: text.text_align,
    }
}

fn curve_command(curve: &CurveAtom, assets: &BTreeMap<String, Asset>) -> Option<DrawCommand> {
    let points = match assets.get(&curve.asset_id) {
        Some(Asset::Curve { data }) => data,
        Some(_) => {
            log::debug!("Asset {} is not a curve", curve.asset_id);
            return None;
        }
        None => return None,
    };
    let (first, rest) = points.split_first()?;
    let mut segments = Vec::with_capacity(points.len());
    segments.push(PathSegment::MoveTo(first.point));
    segments.extend(rest.iter().map(|p| PathSegment::CubicTo {
        c1: p.control1,
        c2: p.control2,
        to: p.point,
    }));
    Some(DrawCommand::Path {
        segments,
        fill: color(curve.fill, curve.fill_alpha),
        stroke: Stroke::visible(
            curve.stroke_width,
            color(curve.stroke, curve.stroke_alpha),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::model::{Dims, Filter, FilterKind};

    struct Harness {
        scene: Scene,
        backend: SoftwareBackend,
        textures: TextureCache,
        config: EngineConfig,
        assets: BTreeMap<String, Asset>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                backend: SoftwareBackend::new(),
                textures: TextureCache::new(8),
                config: EngineConfig::default(),
                assets: BTreeMap::new(),
            }
        }

        fn render(
            &mut self,
            clump: &Clump,
            prev: Option<HierarchyClump>,
        ) -> (HierarchyClump, bool, PassStats) {
            let mut nodes = HashMap::new();
            let mut stats = PassStats::default();
            let mut reconciler = Reconciler {
                scene: &mut self.scene,
                backend: &mut self.backend,
                textures: &mut self.textures,
                nodes: &mut nodes,
                stats: &mut stats,
                assets: &self.assets,
                prev_assets: Some(&self.assets),
                config: &self.config,
            };
            let (rendered, changed) = reconciler.render_clump(clump, prev);
            (rendered, changed, stats)
        }
    }

    fn rect_atom(uuid: &str, w: f32, h: f32, fill: u32) -> Element {
        Element::Atom(Atom::new(
            uuid,
            AtomKind::Shape(ShapeAtom {
                shape: ShapeKind::Rectangle,
                bounds: Dims { w, h },
                fill,
                fill_alpha: 1.0,
                stroke: 0,
                stroke_alpha: 1.0,
                stroke_width: 0.0,
            }),
        ))
    }

    #[test]
    fn test_first_declared_child_is_on_top() {
        let mut h = Harness::new();
        let mut clump = Clump::new("root");
        clump.elements.push(rect_atom("a", 10.0, 10.0, 0xff0000));
        clump.elements.push(rect_atom("b", 10.0, 10.0, 0x00ff00));

        let (rendered, changed, stats) = h.render(&clump, None);
        assert!(changed);
        assert_eq!(stats.clumps_built, 1);
        assert_eq!(stats.atoms_built, 2);

        let a = rendered.elements[0].display().unwrap();
        let b = rendered.elements[1].display().unwrap();
        assert_eq!(h.scene.get(a).unwrap().z_index, 2);
        assert_eq!(h.scene.get(b).unwrap().z_index, 1);
        assert_eq!(h.scene.get(rendered.content).unwrap().children(), &[b, a]);
    }

    #[test]
    fn test_unchanged_clump_is_reused() {
        let mut h = Harness::new();
        let mut clump = Clump::new("root");
        clump.elements.push(rect_atom("a", 10.0, 10.0, 0xff0000));

        let (first, _, _) = h.render(&clump, None);
        let container = first.container;
        let atom = first.elements[0].display();

        let (second, changed, stats) = h.render(&clump, Some(first));
        assert!(!changed);
        assert_eq!(second.container, container);
        assert_eq!(second.elements[0].display(), atom);
        assert_eq!(stats.clumps_reused, 1);
        assert_eq!(stats.atoms_reused, 1);
    }

    #[test]
    fn test_changed_atom_is_rebuilt_and_old_display_released() {
        let mut h = Harness::new();
        let mut clump = Clump::new("root");
        clump.elements.push(rect_atom("a", 10.0, 10.0, 0xff0000));
        let (first, _, _) = h.render(&clump, None);
        let old = first.elements[0].display().unwrap();

        clump.elements[0] = rect_atom("a", 10.0, 10.0, 0x0000ff);
        let (second, changed, stats) = h.render(&clump, Some(first));
        assert!(changed);
        assert_eq!(stats.atoms_built, 1);
        assert!(!h.scene.contains(old));
        let new = second.elements[0].display().unwrap();
        assert_eq!(h.scene.get(second.content).unwrap().children(), &[new]);
    }

    #[test]
    fn test_removed_child_clump_is_disposed() {
        let mut h = Harness::new();
        let mut child = Clump::new("child");
        child.elements.push(rect_atom("a", 10.0, 10.0, 0xff0000));
        let mut root = Clump::new("root");
        root.elements.push(Element::Clump(child));

        let (first, _, _) = h.render(&root, None);
        let HierarchyElement::Clump(child_h) = &first.elements[0] else {
            panic!("expected clump");
        };
        let child_container = child_h.container;

        root.elements.clear();
        let (second, changed, stats) = h.render(&root, Some(first));
        assert!(changed);
        assert_eq!(stats.disposed, 1);
        assert!(!h.scene.contains(child_container));
        assert!(h.scene.get(second.content).unwrap().children().is_empty());
    }

    #[test]
    fn test_filters_flatten_and_hide_content() {
        let mut h = Harness::new();
        let mut clump = Clump::new("root");
        clump.elements.push(rect_atom("a", 200.0, 100.0, 0xff0000));
        clump.filters = Some(vec![
            Filter::new(FilterKind::Blur, [100.0, 25.0]),
            Filter::new(FilterKind::Grayscale, []),
        ]);

        let (first, _, stats) = h.render(&clump, None);
        assert_eq!(stats.flattened, 1);
        let flat = first.flattened.unwrap();
        assert_eq!((flat.width, flat.height), (400, 300));
        assert!(!h.scene.get(first.content).unwrap().visible);
        assert_eq!(
            h.scene.get(flat.sprite).unwrap().matrix.translation(),
            Point::new(-200.0, -150.0)
        );

        // Moving the clump does not re-render its filters.
        clump.transform.position = Point::new(30.0, 0.0);
        let (second, _, stats) = h.render(&clump, Some(first));
        assert_eq!(stats.flattened, 0);
        assert_eq!(second.flattened.map(|f| f.texture), Some(flat.texture));

        // Dropping the filters frees the texture and shows the content again.
        clump.filters = None;
        let (third, _, _) = h.render(&clump, Some(second));
        assert!(third.flattened.is_none());
        assert!(h.scene.get(third.content).unwrap().visible);
        assert_eq!(h.backend.texture_size(flat.texture), None);
    }

    #[test]
    fn test_transform_and_opacity() {
        let mut h = Harness::new();
        let mut clump = Clump::new("root");
        clump.elements.push(rect_atom("a", 10.0, 10.0, 0xff0000));
        clump.transform.position = Point::new(5.0, 6.0);
        clump.opacity = Some(150.0);

        let (rendered, _, _) = h.render(&clump, None);
        let container = h.scene.get(rendered.container).unwrap();
        assert_eq!(container.matrix.translation(), Point::new(5.0, 6.0));
        assert_eq!(container.alpha, 1.0);
        assert_eq!(container.interactive.as_deref(), Some("root"));
        assert_eq!(h.scene.get(rendered.content).unwrap().alpha, 1.0);

        clump.opacity = Some(25.0);
        let (rendered, _, _) = h.render(&clump, Some(rendered));
        assert_eq!(h.scene.get(rendered.content).unwrap().alpha, 0.25);

        clump.opacity = Some(-20.0);
        let (rendered, _, _) = h.render(&clump, Some(rendered));
        assert_eq!(h.scene.get(rendered.content).unwrap().alpha, 0.0);
        assert_eq!(h.scene.get(rendered.container).unwrap().alpha, 1.0);
    }

    #[test]
    fn test_missing_assets_render_as_absent() {
        let mut h = Harness::new();
        let mut clump = Clump::new("root");
        clump.elements.push(Element::Atom(Atom::new(
            "img",
            AtomKind::Image(ImageAtom {
                asset_id: "nope".into(),
            }),
        )));
        clump.elements.push(Element::Atom(Atom::new("mystery", AtomKind::Unknown)));
        clump.elements.push(rect_atom("a", 10.0, 10.0, 0xff0000));

        let (rendered, _, stats) = h.render(&clump, None);
        assert_eq!(stats.atoms_absent, 2);
        assert_eq!(stats.atoms_built, 1);
        assert!(rendered.elements[0].display().is_none());
        assert_eq!(h.scene.get(rendered.content).unwrap().children().len(), 1);
    }

    #[test]
    fn test_mask_is_attached_not_parented() {
        let mut h = Harness::new();
        let mut mask = Clump::new("mask");
        mask.elements.push(rect_atom("m", 20.0, 20.0, 0xffffff));
        let mut clump = Clump::new("root");
        clump.elements.push(rect_atom("a", 40.0, 40.0, 0xff0000));
        clump.mask = Some(Box::new(mask));

        let (rendered, _, _) = h.render(&clump, None);
        let mask_id = rendered.mask.unwrap();
        assert_eq!(h.scene.get(rendered.container).unwrap().mask, Some(mask_id));
        let sprite = h.scene.get(mask_id).unwrap();
        assert!(sprite.parent().is_none());
        assert_eq!(sprite.matrix.translation(), Point::new(-10.0, -10.0));
        // Only the two containers, the content's atom, and the mask sprite remain.
        assert_eq!(h.scene.len(), 4);

        clump.mask = None;
        let (rendered, _, _) = h.render(&clump, Some(rendered));
        assert!(rendered.mask.is_none());
        assert!(!h.scene.contains(mask_id));
    }

    #[test]
    fn test_curve_path_follows_asset_points() {
        use crate::model::CurvePoint;

        let mut h = Harness::new();
        let p = |x, y| Point::new(x, y);
        h.assets.insert(
            "path".into(),
            Asset::Curve {
                data: vec![
                    CurvePoint {
                        control1: p(0.0, 0.0),
                        control2: p(0.0, 0.0),
                        point: p(0.0, 0.0),
                    },
                    CurvePoint {
                        control1: p(10.0, 0.0),
                        control2: p(20.0, 10.0),
                        point: p(20.0, 20.0),
                    },
                ],
            },
        );
        let mut clump = Clump::new("root");
        clump.elements.push(Element::Atom(Atom::new(
            "c",
            AtomKind::Curve(CurveAtom {
                asset_id: "path".into(),
                fill: 0,
                fill_alpha: 0.0,
                stroke: 0xffffff,
                stroke_alpha: 1.0,
                stroke_width: 2.0,
            }),
        )));

        let (rendered, _, _) = h.render(&clump, None);
        let display = rendered.elements[0].display().unwrap();
        let DisplayKind::Graphics(commands) = &h.scene.get(display).unwrap().kind else {
            panic!("expected graphics");
        };
        let DrawCommand::Path { segments, .. } = &commands[0] else {
            panic!("expected path");
        };
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], PathSegment::MoveTo(Point::ZERO));
    }
}
