//! Per-aspect comparison of a new snapshot node against the previously
//! rendered one.
//!
//! Every function is pure and total. Clump comparisons return the set of
//! aspects that changed so the reconciler can react to each one separately;
//! atom comparisons return whether a rebuild is needed. [`diff_atom`] only
//! compares variant tags, payload changes are caught by the per-type
//! functions.

use std::collections::BTreeMap;

use bitflags::bitflags;

use crate::model::{
    Asset, Atom, CanvasConfig, Clump, CurveAtom, Filter, ImageAtom, PaintAtom, ShapeAtom, TextAtom,
    Transform,
};

bitflags! {
    /// Aspects of a clump that differ between two snapshots.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClumpDiff: u8 {
        const NAME = 1 << 0;
        const TRANSFORM = 1 << 1;
        const OPACITY = 1 << 2;
        const FILTERS = 1 << 3;
        const MASK = 1 << 4;
    }

    /// Transform components that differ.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransformDiff: u8 {
        const POSITION = 1 << 0;
        const ROTATION = 1 << 1;
        const SCALE = 1 << 2;
    }

    /// Canvas settings that differ.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CanvasConfigDiff: u8 {
        const CANVAS_BLOCK = 1 << 0;
        const EXPORT_NAME = 1 << 1;
    }
}

/// Compare a clump's own properties. Children are not inspected.
///
/// Absent on both sides is an empty diff; absent on exactly one side is a
/// full diff (creation or deletion).
pub fn diff_clump(new: Option<&Clump>, old: Option<&Clump>) -> ClumpDiff {
    let (new, old) = match (new, old) {
        (None, None) => return ClumpDiff::empty(),
        (Some(new), Some(old)) => (new, old),
        _ => return ClumpDiff::all(),
    };

    let mut diffs = ClumpDiff::empty();
    if new.name != old.name {
        diffs |= ClumpDiff::NAME;
    }
    if !diff_transform(&new.transform, &old.transform).is_empty() {
        diffs |= ClumpDiff::TRANSFORM;
    }
    if new.opacity != old.opacity {
        diffs |= ClumpDiff::OPACITY;
    }
    if diff_filters(new.filters.as_deref(), old.filters.as_deref()) {
        diffs |= ClumpDiff::FILTERS;
    }
    if !diff_clump(new.mask.as_deref(), old.mask.as_deref()).is_empty() {
        diffs |= ClumpDiff::MASK;
    }
    diffs
}

pub fn diff_transform(a: &Transform, b: &Transform) -> TransformDiff {
    let mut diffs = TransformDiff::empty();
    if a.position.x != b.position.x || a.position.y != b.position.y {
        diffs |= TransformDiff::POSITION;
    }
    if a.rotation != b.rotation {
        diffs |= TransformDiff::ROTATION;
    }
    if a.scale.x != b.scale.x || a.scale.y != b.scale.y {
        diffs |= TransformDiff::SCALE;
    }
    diffs
}

/// Returns true if the filter chains differ in length, kind or any parameter.
pub fn diff_filters(a: Option<&[Filter]>, b: Option<&[Filter]>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return false,
        (Some(a), Some(b)) => (a, b),
        _ => return true,
    };

    let max_len = a.len().max(b.len());
    for i in 0..max_len {
        let (Some(fa), Some(fb)) = (a.get(i), b.get(i)) else {
            return true;
        };
        if fa.kind != fb.kind {
            return true;
        }
        let max_params = fa.params.len().max(fb.params.len());
        for p in 0..max_params {
            if fa.params.get(p) != fb.params.get(p) {
                return true;
            }
        }
    }
    false
}

/// Returns true if exactly one side is absent or the atom variants differ.
pub fn diff_atom(a: Option<&Atom>, b: Option<&Atom>) -> bool {
    match (a, b) {
        (None, None) => false,
        (Some(a), Some(b)) => std::mem::discriminant(&a.kind) != std::mem::discriminant(&b.kind),
        _ => true,
    }
}

/// Compares the referenced asset's kind and payload, not its decoded content.
fn diff_asset_ref(
    id_a: &str,
    id_b: &str,
    assets_a: &BTreeMap<String, Asset>,
    assets_b: &BTreeMap<String, Asset>,
) -> bool {
    if id_a != id_b {
        return true;
    }
    match (assets_a.get(id_a), assets_b.get(id_b)) {
        (None, None) => false,
        (Some(x), Some(y)) => x.kind() != y.kind() || x != y,
        _ => true,
    }
}

pub fn diff_image_atom(
    a: &ImageAtom,
    b: &ImageAtom,
    assets_a: &BTreeMap<String, Asset>,
    assets_b: &BTreeMap<String, Asset>,
) -> bool {
    diff_asset_ref(&a.asset_id, &b.asset_id, assets_a, assets_b)
}

pub fn diff_curve_atom(
    a: &CurveAtom,
    b: &CurveAtom,
    assets_a: &BTreeMap<String, Asset>,
    assets_b: &BTreeMap<String, Asset>,
) -> bool {
    diff_asset_ref(&a.asset_id, &b.asset_id, assets_a, assets_b)
        || a.fill != b.fill
        || a.fill_alpha != b.fill_alpha
        || a.stroke != b.stroke
        || a.stroke_alpha != b.stroke_alpha
        || a.stroke_width != b.stroke_width
}

pub fn diff_shape_atom(a: &ShapeAtom, b: &ShapeAtom) -> bool {
    a.shape != b.shape
        || a.bounds.w != b.bounds.w
        || a.bounds.h != b.bounds.h
        || a.fill != b.fill
        || a.fill_alpha != b.fill_alpha
        || a.stroke != b.stroke
        || a.stroke_alpha != b.stroke_alpha
        || a.stroke_width != b.stroke_width
}

pub fn diff_text_atom(a: &TextAtom, b: &TextAtom) -> bool {
    a.text != b.text
        || a.fill != b.fill
        || a.stroke != b.stroke
        || a.alpha != b.alpha
        || a.stroke_width != b.stroke_width
        || a.font_size != b.font_size
        || a.font_family != b.font_family
        || a.font_style != b.font_style
        || a.font_weight != b.font_weight
        || a.text_align != b.text_align
        || a.text_baseline != b.text_baseline
}

pub fn diff_paint_atom(a: &PaintAtom, b: &PaintAtom) -> bool {
    a.uuid != b.uuid
}

pub fn diff_canvas_config(a: Option<&CanvasConfig>, b: Option<&CanvasConfig>) -> CanvasConfigDiff {
    let (a, b) = match (a, b) {
        (None, None) => return CanvasConfigDiff::empty(),
        (Some(a), Some(b)) => (a, b),
        _ => return CanvasConfigDiff::all(),
    };

    let mut diffs = CanvasConfigDiff::empty();
    if a.canvas_dims != b.canvas_dims
        || a.canvas_color != b.canvas_color
        || a.canvas_alpha != b.canvas_alpha
    {
        diffs |= CanvasConfigDiff::CANVAS_BLOCK;
    }
    if a.export_name != b.export_name {
        diffs |= CanvasConfigDiff::EXPORT_NAME;
    }
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{AtomKind, Dims, FilterKind, FilterParam, ShapeKind};

    fn shape() -> ShapeAtom {
        ShapeAtom {
            shape: ShapeKind::Rectangle,
            bounds: Dims { w: 100.0, h: 100.0 },
            fill: 0xff0000,
            fill_alpha: 1.0,
            stroke: 0x00ff00,
            stroke_alpha: 1.0,
            stroke_width: 5.0,
        }
    }

    fn blur(strength: f32, quality: f32) -> Filter {
        Filter::new(FilterKind::Blur, [strength, quality])
    }

    #[test]
    fn test_clump_vacuous_and_full() {
        let x = Clump::new("x");
        assert!(diff_clump(None, None).is_empty());
        assert_eq!(diff_clump(None, Some(&x)), ClumpDiff::all());
        assert_eq!(diff_clump(Some(&x), None), ClumpDiff::all());
        assert_eq!(
            ClumpDiff::all(),
            ClumpDiff::NAME
                | ClumpDiff::TRANSFORM
                | ClumpDiff::OPACITY
                | ClumpDiff::FILTERS
                | ClumpDiff::MASK
        );
    }

    #[test]
    fn test_clump_per_aspect() {
        let old = Clump::new("x");
        assert!(diff_clump(Some(&old), Some(&old.clone())).is_empty());

        let mut new = old.clone();
        new.name = Some("renamed".into());
        new.opacity = Some(50.0);
        assert_eq!(
            diff_clump(Some(&new), Some(&old)),
            ClumpDiff::NAME | ClumpDiff::OPACITY
        );

        let mut new = old.clone();
        new.transform.rotation = 10.0;
        assert_eq!(diff_clump(Some(&new), Some(&old)), ClumpDiff::TRANSFORM);

        let mut new = old.clone();
        new.filters = Some(vec![blur(1.0, 1.0)]);
        assert_eq!(diff_clump(Some(&new), Some(&old)), ClumpDiff::FILTERS);

        let mut new = old.clone();
        new.mask = Some(Box::new(Clump::new("m")));
        assert_eq!(diff_clump(Some(&new), Some(&old)), ClumpDiff::MASK);
    }

    #[test]
    fn test_transform_subsets() {
        let a = Transform::default();
        assert!(diff_transform(&a, &a.clone()).is_empty());

        let mut b = a.clone();
        b.position = Point::new(1.0, 0.0);
        assert_eq!(diff_transform(&a, &b), TransformDiff::POSITION);

        b.scale.y = 2.0;
        assert_eq!(
            diff_transform(&a, &b),
            TransformDiff::POSITION | TransformDiff::SCALE
        );

        let mut c = a.clone();
        c.rotation = 45.0;
        assert_eq!(diff_transform(&a, &c), TransformDiff::ROTATION);
    }

    fn chain(filters: &[Filter]) -> Option<&[Filter]> {
        Some(filters)
    }

    #[test]
    fn test_filters() {
        assert!(!diff_filters(None, None));
        assert!(diff_filters(chain(&[]), None));
        assert!(!diff_filters(chain(&[blur(100.0, 25.0)]), chain(&[blur(100.0, 25.0)])));
        assert!(diff_filters(chain(&[blur(100.0, 25.0)]), chain(&[blur(100.0, 26.0)])));
        assert!(diff_filters(chain(&[]), chain(&[blur(1.0, 1.0)])));
        assert!(diff_filters(
            chain(&[blur(1.0, 1.0)]),
            chain(&[Filter::new(FilterKind::Noise, [1.0, 1.0])])
        ));

        let mut longer = blur(1.0, 1.0);
        longer.params.push(FilterParam::Number(3.0));
        assert!(diff_filters(chain(&[blur(1.0, 1.0)]), chain(&[longer])));
    }

    #[test]
    fn test_atom_tags_only() {
        let a = Atom::new("a", AtomKind::Shape(shape()));
        let mut recoloured = shape();
        recoloured.fill = 0x0000ff;
        let b = Atom::new("a", AtomKind::Shape(recoloured));
        let c = Atom::new(
            "a",
            AtomKind::Paint(PaintAtom {
                uuid: "p".into(),
            }),
        );

        assert!(!diff_atom(None, None));
        assert!(diff_atom(Some(&a), None));
        assert!(!diff_atom(Some(&a), Some(&b)));
        assert!(diff_atom(Some(&a), Some(&c)));
    }

    #[test]
    fn test_shape_fields() {
        assert!(!diff_shape_atom(&shape(), &shape()));

        let mut other = shape();
        other.fill = 0x123456;
        assert!(diff_shape_atom(&shape(), &other));

        let mut other = shape();
        other.bounds.h = 101.0;
        assert!(diff_shape_atom(&shape(), &other));

        let mut other = shape();
        other.shape = ShapeKind::Ellipse;
        assert!(diff_shape_atom(&shape(), &other));
    }

    #[test]
    fn test_image_asset_identity() {
        let mut assets_a = BTreeMap::new();
        assets_a.insert("1".to_string(), Asset::Image { data: "bird.png".into() });
        assets_a.insert("2".to_string(), Asset::Image { data: "bird.png".into() });
        let mut assets_b = assets_a.clone();

        let one = ImageAtom { asset_id: "1".into() };
        let two = ImageAtom { asset_id: "2".into() };
        assert!(!diff_image_atom(&one, &one, &assets_a, &assets_b));
        // Same payload under a different id still counts as a change.
        assert!(diff_image_atom(&one, &two, &assets_a, &assets_b));

        assets_b.insert("1".to_string(), Asset::Image { data: "arrow.png".into() });
        assert!(diff_image_atom(&one, &one, &assets_a, &assets_b));

        assets_b.insert("1".to_string(), Asset::Curve { data: Vec::new() });
        assert!(diff_image_atom(&one, &one, &assets_a, &assets_b));
    }

    #[test]
    fn test_text_and_paint() {
        let text = TextAtom {
            text: "Hello".into(),
            fill: 0,
            stroke: 0,
            alpha: 1.0,
            stroke_width: 0.0,
            font_size: 20.0,
            font_family: "Arial".into(),
            font_style: Default::default(),
            font_weight: Default::default(),
            text_align: Default::default(),
            text_baseline: Default::default(),
        };
        assert!(!diff_text_atom(&text, &text.clone()));
        let mut bigger = text.clone();
        bigger.font_size = 21.0;
        assert!(diff_text_atom(&text, &bigger));

        let p = PaintAtom { uuid: "p".into() };
        assert!(!diff_paint_atom(&p, &p.clone()));
        assert!(diff_paint_atom(&p, &PaintAtom { uuid: "q".into() }));
    }

    #[test]
    fn test_canvas_config() {
        let config = CanvasConfig {
            canvas_dims: Dims { w: 1920.0, h: 1080.0 },
            canvas_color: 0xffffff,
            canvas_alpha: 1.0,
            export_name: "out".into(),
        };
        assert!(diff_canvas_config(None, None).is_empty());
        assert_eq!(diff_canvas_config(Some(&config), None), CanvasConfigDiff::all());

        let mut renamed = config.clone();
        renamed.export_name = "other".into();
        assert_eq!(
            diff_canvas_config(Some(&config), Some(&renamed)),
            CanvasConfigDiff::EXPORT_NAME
        );

        let mut resized = config.clone();
        resized.canvas_dims.w = 800.0;
        assert_eq!(
            diff_canvas_config(Some(&config), Some(&resized)),
            CanvasConfigDiff::CANVAS_BLOCK
        );
    }
}
