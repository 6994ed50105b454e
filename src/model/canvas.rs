use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::clump::Clump;
use crate::error::Result;
use crate::geometry::Point;

/// Root snapshot: assets, optional content tree and canvas settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CanvasConfig>,
    #[serde(default)]
    pub content: Option<Clump>,
}

impl Canvas {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Distinct image sources referenced by the asset table, in id order.
    pub fn image_sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for asset in self.assets.values() {
            if let Asset::Image { data } = asset {
                if !sources.contains(&data.as_str()) {
                    sources.push(data);
                }
            }
        }
        sources
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dims {
    pub w: f32,
    pub h: f32,
}

/// Output frame settings: the visible canvas block and the export name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub canvas_dims: Dims,
    pub canvas_color: u32,
    pub canvas_alpha: f32,
    pub export_name: String,
}

/// A shared resource referenced by atoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Asset {
    /// Opaque source reference (cache id, path or URI) resolved by the loader.
    Image { data: String },
    /// Cubic Bezier path: the first point starts the path, every following
    /// point is reached through its two control points.
    Curve { data: Vec<CurvePoint> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Curve,
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Image { .. } => AssetKind::Image,
            Asset::Curve { .. } => AssetKind::Curve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub control1: Point,
    pub control2: Point,
    pub point: Point,
}
