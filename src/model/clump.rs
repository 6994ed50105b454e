use serde::{Deserialize, Serialize};

use super::atom::Atom;
use crate::transform::Transform;

/// Group node: a transform, optional opacity/filters/mask and ordered children.
///
/// The first declared element renders on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clump {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "nodeUUID")]
    pub node_uuid: String,
    #[serde(default)]
    pub transform: Transform,
    /// Percentage, `0..=100`. Absent means fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Box<Clump>>,
}

impl Clump {
    /// An empty clump with an identity transform.
    pub fn new(node_uuid: impl Into<String>) -> Self {
        Self {
            name: None,
            node_uuid: node_uuid.into(),
            transform: Transform::default(),
            opacity: None,
            elements: Vec::new(),
            filters: None,
            mask: None,
        }
    }

    /// Copy of this clump's own properties without its children.
    pub fn shallow(&self) -> Clump {
        Clump {
            name: self.name.clone(),
            node_uuid: self.node_uuid.clone(),
            transform: self.transform.clone(),
            opacity: self.opacity,
            elements: Vec::new(),
            filters: self.filters.clone(),
            mask: self.mask.clone(),
        }
    }

    pub fn has_filters(&self) -> bool {
        self.filters.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Opacity clamped to `0..=100` and mapped to `0.0..=1.0`.
    pub fn alpha(&self) -> f32 {
        self.opacity.unwrap_or(100.0).clamp(0.0, 100.0) / 100.0
    }
}

/// A child of a clump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum Element {
    Clump(Clump),
    Atom(Atom),
}

impl Element {
    pub fn node_uuid(&self) -> &str {
        match self {
            Element::Clump(c) => &c.node_uuid,
            Element::Atom(a) => &a.node_uuid,
        }
    }
}

/// Declarative pixel-filter recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(default)]
    pub params: Vec<FilterParam>,
}

impl Filter {
    pub fn new(kind: FilterKind, params: impl IntoIterator<Item = f32>) -> Self {
        Self {
            kind,
            params: params.into_iter().map(FilterParam::Number).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Blur,
    Noise,
    Bloom,
    Grayscale,
    Bevel,
    Outline,
    Dot,
    Crt,
    Emboss,
    Bulge,
    Glitch,
    #[serde(rename = "zoomblur")]
    ZoomBlur,
    Twist,
    BrightnessContrast,
    SaturationGamma,
    ColorChannel,
    /// Any kind this crate does not know; constructs to the identity filter.
    #[serde(other)]
    Unknown,
}

/// A single filter argument as sent by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterParam {
    Number(f32),
    Bool(bool),
    Vec2 { x: f32, y: f32 },
    List(Vec<f32>),
    Other(serde_json::Value),
}
