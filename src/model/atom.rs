use serde::{Deserialize, Serialize};

use super::canvas::Dims;

/// Leaf drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    #[serde(rename = "nodeUUID")]
    pub node_uuid: String,
    #[serde(flatten)]
    pub kind: AtomKind,
}

impl Atom {
    pub fn new(node_uuid: impl Into<String>, kind: AtomKind) -> Self {
        Self {
            node_uuid: node_uuid.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AtomKind {
    Image(ImageAtom),
    Shape(ShapeAtom),
    Text(TextAtom),
    Curve(CurveAtom),
    Paint(PaintAtom),
    /// Unrecognised discriminant; renders as nothing.
    #[serde(other)]
    Unknown,
}

impl AtomKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomKind::Image(_) => "image",
            AtomKind::Shape(_) => "shape",
            AtomKind::Text(_) => "text",
            AtomKind::Curve(_) => "curve",
            AtomKind::Paint(_) => "paint",
            AtomKind::Unknown => "unknown",
        }
    }
}

fn opaque() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAtom {
    pub asset_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeAtom {
    pub shape: ShapeKind,
    pub bounds: Dims,
    pub fill: u32,
    #[serde(default = "opaque")]
    pub fill_alpha: f32,
    #[serde(default)]
    pub stroke: u32,
    #[serde(default = "opaque")]
    pub stroke_alpha: f32,
    #[serde(default)]
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    #[default]
    Alphabetic,
    Ideographic,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAtom {
    pub text: String,
    pub fill: u32,
    #[serde(default)]
    pub stroke: u32,
    #[serde(default = "opaque")]
    pub alpha: f32,
    #[serde(default)]
    pub stroke_width: f32,
    pub font_size: f32,
    #[serde(default)]
    pub font_family: String,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub text_baseline: TextBaseline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveAtom {
    pub asset_id: String,
    #[serde(default)]
    pub fill: u32,
    #[serde(default)]
    pub fill_alpha: f32,
    #[serde(default)]
    pub stroke: u32,
    #[serde(default = "opaque")]
    pub stroke_alpha: f32,
    #[serde(default)]
    pub stroke_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintAtom {
    pub uuid: String,
}
