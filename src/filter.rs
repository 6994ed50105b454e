//! Construction of pixel filters from declarative [`Filter`] recipes.
//!
//! Parameters are positional, in the order the host sends them. A missing
//! trailing parameter takes the filter's default; a parameter of the wrong
//! shape fails construction. [`build_filter`] never fails: it falls back to
//! [`PixelFilter::Identity`].

use thiserror::Error;

use crate::geometry::{Color, Point};
use crate::model::{Filter, FilterKind, FilterParam};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("unknown filter kind")]
    UnknownKind,
    #[error("{kind:?} parameter {index} is not a finite number")]
    InvalidParam { kind: FilterKind, index: usize },
}

/// Per-channel colour adjustment. Every factor defaults to 1 (no change).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub gamma: f32,
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Default for Adjustment {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            gamma: 1.0,
            red: 1.0,
            green: 1.0,
            blue: 1.0,
            alpha: 1.0,
        }
    }
}

impl Adjustment {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrtParams {
    pub curvature: f32,
    pub line_width: f32,
    pub line_contrast: f32,
    pub noise: f32,
    pub noise_size: f32,
    pub vignetting: f32,
    pub vignetting_alpha: f32,
    pub vignetting_blur: f32,
    pub seed: f32,
}

/// A constructed pixel filter, ready to attach to a display node.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelFilter {
    /// Passes pixels through unchanged.
    Identity,
    Blur { strength: f32, quality: f32 },
    Noise { amount: f32, seed: f32 },
    Bloom { blur: f32, quality: f32 },
    Grayscale,
    Bevel {
        rotation: f32,
        thickness: f32,
        light: Color,
        shadow: Color,
    },
    Outline { thickness: f32, color: Color },
    Dot { scale: f32, angle: f32 },
    Crt(CrtParams),
    Emboss { strength: f32 },
    Bulge {
        radius: f32,
        strength: f32,
        center: Point,
    },
    Glitch { slices: f32, offset: f32 },
    ZoomBlur {
        strength: f32,
        inner_radius: f32,
        center: Point,
    },
    Twist {
        angle: f32,
        radius: f32,
        offset: Point,
    },
    Adjustment(Adjustment),
}

impl PixelFilter {
    /// Name as the host spells the filter type.
    pub fn name(&self) -> &'static str {
        match self {
            PixelFilter::Identity => "identity",
            PixelFilter::Blur { .. } => "blur",
            PixelFilter::Noise { .. } => "noise",
            PixelFilter::Bloom { .. } => "bloom",
            PixelFilter::Grayscale => "grayscale",
            PixelFilter::Bevel { .. } => "bevel",
            PixelFilter::Outline { .. } => "outline",
            PixelFilter::Dot { .. } => "dot",
            PixelFilter::Crt(_) => "crt",
            PixelFilter::Emboss { .. } => "emboss",
            PixelFilter::Bulge { .. } => "bulge",
            PixelFilter::Glitch { .. } => "glitch",
            PixelFilter::ZoomBlur { .. } => "zoomblur",
            PixelFilter::Twist { .. } => "twist",
            PixelFilter::Adjustment(_) => "adjustment",
        }
    }
}

struct Params<'a> {
    kind: FilterKind,
    params: &'a [FilterParam],
}

impl Params<'_> {
    fn number(&self, index: usize, default: f32) -> Result<f32, FilterError> {
        match self.params.get(index) {
            None => Ok(default),
            Some(FilterParam::Number(n)) if n.is_finite() => Ok(*n),
            Some(_) => Err(FilterError::InvalidParam {
                kind: self.kind,
                index,
            }),
        }
    }

    fn color(&self, index: usize, default: u32, alpha: f32) -> Result<Color, FilterError> {
        let hex = self.number(index, default as f32)?;
        if hex < 0.0 {
            return Err(FilterError::InvalidParam {
                kind: self.kind,
                index,
            });
        }
        Ok(Color::from_hex(hex as u32).with_alpha(alpha))
    }
}

impl TryFrom<&Filter> for PixelFilter {
    type Error = FilterError;

    fn try_from(filter: &Filter) -> Result<Self, Self::Error> {
        let p = Params {
            kind: filter.kind,
            params: &filter.params,
        };
        let built = match filter.kind {
            FilterKind::Blur => PixelFilter::Blur {
                strength: p.number(0, 8.0)?,
                quality: p.number(1, 4.0)?,
            },
            FilterKind::Noise => PixelFilter::Noise {
                amount: p.number(0, 0.5)?,
                seed: p.number(1, 0.0)?,
            },
            FilterKind::Bloom => PixelFilter::Bloom {
                blur: p.number(0, 2.0)?,
                quality: p.number(1, 4.0)?,
            },
            FilterKind::Grayscale => PixelFilter::Grayscale,
            FilterKind::Bevel => {
                let light_alpha = p.number(3, 0.7)?;
                let shadow_alpha = p.number(5, 0.7)?;
                PixelFilter::Bevel {
                    rotation: p.number(0, 45.0)?,
                    thickness: p.number(1, 2.0)?,
                    light: p.color(2, 0xffffff, light_alpha)?,
                    shadow: p.color(4, 0x000000, shadow_alpha)?,
                }
            }
            FilterKind::Outline => PixelFilter::Outline {
                thickness: p.number(0, 1.0)?,
                color: p.color(1, 0x000000, 1.0)?,
            },
            FilterKind::Dot => PixelFilter::Dot {
                scale: p.number(0, 1.0)?,
                angle: p.number(1, 5.0)?,
            },
            FilterKind::Crt => PixelFilter::Crt(CrtParams {
                curvature: p.number(0, 1.0)?,
                line_width: p.number(1, 1.0)?,
                line_contrast: p.number(2, 0.25)?,
                noise: p.number(3, 0.3)?,
                noise_size: p.number(4, 1.0)?,
                vignetting: p.number(5, 0.3)?,
                vignetting_alpha: p.number(6, 1.0)?,
                vignetting_blur: p.number(7, 0.3)?,
                seed: p.number(8, 0.0)?,
            }),
            FilterKind::Emboss => PixelFilter::Emboss {
                strength: p.number(0, 5.0)?,
            },
            FilterKind::Bulge => PixelFilter::Bulge {
                radius: p.number(0, 100.0)?,
                strength: p.number(1, 1.0)?,
                center: Point::new(p.number(2, 0.5)?, p.number(3, 0.5)?),
            },
            FilterKind::Glitch => PixelFilter::Glitch {
                slices: p.number(0, 5.0)?,
                offset: p.number(1, 100.0)?,
            },
            FilterKind::ZoomBlur => PixelFilter::ZoomBlur {
                strength: p.number(0, 0.1)?,
                inner_radius: p.number(1, 0.0)?,
                center: Point::new(p.number(2, 0.0)?, p.number(3, 0.0)?),
            },
            FilterKind::Twist => PixelFilter::Twist {
                angle: p.number(0, 4.0)?,
                radius: p.number(1, 200.0)?,
                offset: Point::new(p.number(2, 0.0)?, p.number(3, 0.0)?),
            },
            FilterKind::BrightnessContrast => PixelFilter::Adjustment(Adjustment {
                brightness: p.number(0, 1.0)?,
                contrast: p.number(1, 1.0)?,
                ..Adjustment::default()
            }),
            FilterKind::SaturationGamma => PixelFilter::Adjustment(Adjustment {
                saturation: p.number(0, 1.0)?,
                gamma: p.number(1, 1.0)?,
                ..Adjustment::default()
            }),
            FilterKind::ColorChannel => PixelFilter::Adjustment(Adjustment {
                red: p.number(0, 1.0)?,
                green: p.number(1, 1.0)?,
                blue: p.number(2, 1.0)?,
                alpha: p.number(3, 1.0)?,
                ..Adjustment::default()
            }),
            FilterKind::Unknown => return Err(FilterError::UnknownKind),
        };
        Ok(built)
    }
}

/// Construct a filter, substituting [`PixelFilter::Identity`] when the recipe
/// is malformed.
pub fn build_filter(filter: &Filter) -> PixelFilter {
    match PixelFilter::try_from(filter) {
        Ok(built) => built,
        Err(err) => {
            log::warn!("Filter {:?} falls back to identity: {err}", filter.kind);
            PixelFilter::Identity
        }
    }
}

/// Construct a whole chain, preserving order.
pub fn build_chain(filters: &[Filter]) -> Vec<PixelFilter> {
    filters.iter().map(build_filter).collect()
}
