use std::cell::RefCell;

use cosmic_text::{
    Align, Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight, Wrap,
};

use super::commands::Stroke;
use crate::assets::DecodedImage;
use crate::backend::effects::dilate;
use crate::geometry::{Color, Rect};
use crate::model::{FontStyle, FontWeight, TextAlign, TextAtom};

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Widest outline, in pixels either side of the glyph edge, the rasteriser
/// will grow.
const MAX_STROKE_RADIUS: usize = 16;

/// Largest bitmap, in pixels, a single text run may rasterise into.
const MAX_TEXT_PIXELS: usize = 4096 * 4096;

/// Font settings for one run of text.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub text: &'a str,
    pub font_size: f32,
    pub font_family: &'a str,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    pub stroke_width: f32,
}

impl<'a> From<&'a TextAtom> for TextStyle<'a> {
    fn from(atom: &'a TextAtom) -> Self {
        Self {
            text: &atom.text,
            font_size: atom.font_size,
            font_family: &atom.font_family,
            bold: atom.font_weight == FontWeight::Bold,
            italic: atom.font_style == FontStyle::Italic,
            align: atom.text_align,
            stroke_width: atom.stroke_width,
        }
    }
}

/// Shapes, measures and rasterises text with one shared font database.
pub struct TextEngine {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    fn shape(&mut self, style: &TextStyle, width: Option<f32>) -> Buffer {
        let font_size = style.font_size.max(1.0);
        let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);

        let family = if style.font_family.is_empty() {
            Family::SansSerif
        } else {
            Family::Name(style.font_family)
        };
        let mut attrs = Attrs::new().family(family);
        if style.bold {
            attrs = attrs.weight(Weight::BOLD);
        }
        if style.italic {
            attrs = attrs.style(Style::Italic);
        }
        let align = match style.align {
            TextAlign::Left => Align::Left,
            TextAlign::Center => Align::Center,
            TextAlign::Right => Align::Right,
        };

        buffer.set_wrap(&mut self.font_system, Wrap::None);
        buffer.set_size(&mut self.font_system, width, None);
        buffer.set_text(
            &mut self.font_system,
            style.text,
            &attrs,
            Shaping::Advanced,
            Some(align),
        );
        buffer.shape_until_scroll(&mut self.font_system, true);
        buffer
    }

    /// Size of the laid-out glyphs, unconstrained in width and without the
    /// stroke.
    fn glyph_extent(&mut self, style: &TextStyle) -> (f32, f32) {
        let buffer = self.shape(style, None);
        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
        }

        // Empty text still occupies one line.
        if height == 0.0 {
            height = style.font_size.max(1.0) * LINE_HEIGHT;
        }
        (width, height)
    }

    /// Size of the laid-out text including its outline.
    pub fn measure(&mut self, style: &TextStyle) -> (f32, f32) {
        let (width, height) = self.glyph_extent(style);

        // The stroke is drawn centred on the glyph outline.
        let pad = style.stroke_width.max(0.0);
        (width + pad, height + pad)
    }

    /// Rasterise `style` into a straight-alpha RGBA bitmap covering its
    /// measured rectangle. The outline sits behind the fill. `None` for
    /// text that draws nothing.
    pub fn rasterize(
        &mut self,
        style: &TextStyle,
        fill: Color,
        stroke: Option<Stroke>,
    ) -> Option<DecodedImage> {
        let (glyph_w, glyph_h) = self.glyph_extent(style);
        let pad = style.stroke_width.max(0.0);
        let (width, height) = ((glyph_w + pad).ceil() as usize, (glyph_h + pad).ceil() as usize);
        if style.text.trim().is_empty() || width == 0 || height == 0 {
            return None;
        }
        if width.saturating_mul(height) > MAX_TEXT_PIXELS {
            log::warn!("Text run of {width}x{height} is too large to rasterise, skipping");
            return None;
        }

        // Re-shape at the measured width so alignment has a box to work in.
        let buffer = self.shape(style, Some(glyph_w.max(1.0)));
        let offset = (pad / 2.0).round() as i32;
        let mut coverage = vec![0u8; width * height];
        let white = cosmic_text::Color::rgb(0xff, 0xff, 0xff);
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            white,
            |x, y, w, h, color| {
                for py in y..y + h as i32 {
                    for px in x..x + w as i32 {
                        let (cx, cy) = (px + offset, py + offset);
                        if cx < 0 || cy < 0 || cx as usize >= width || cy as usize >= height {
                            continue;
                        }
                        let cell = &mut coverage[cy as usize * width + cx as usize];
                        *cell = (*cell).max(color.a());
                    }
                }
            },
        );
        log::trace!(
            "Rasterised {:?} into {width}x{height} (glyphs {glyph_w}x{glyph_h})",
            style.text
        );

        let outline = stroke.map(|s| {
            let radius = ((s.width / 2.0).ceil() as usize).clamp(1, MAX_STROKE_RADIUS);
            (dilate(&coverage, width, height, radius), s.color)
        });

        let mut pixels = Vec::with_capacity(width * height * 4);
        for (i, &f) in coverage.iter().enumerate() {
            let fill_a = f as f32 / 255.0 * fill.a;
            let (stroke_rgb, stroke_a) = match &outline {
                Some((mask, color)) => (
                    [color.r, color.g, color.b],
                    mask[i] as f32 / 255.0 * color.a,
                ),
                None => ([0.0; 3], 0.0),
            };
            // Fill over outline, in straight alpha.
            let a = fill_a + stroke_a * (1.0 - fill_a);
            let channel = |f_c: f32, s_c: f32| {
                if a <= 0.0 {
                    0
                } else {
                    let c = (f_c * fill_a + s_c * stroke_a * (1.0 - fill_a)) / a;
                    (c.clamp(0.0, 1.0) * 255.0).round() as u8
                }
            };
            pixels.extend_from_slice(&[
                channel(fill.r, stroke_rgb[0]),
                channel(fill.g, stroke_rgb[1]),
                channel(fill.b, stroke_rgb[2]),
                (a.clamp(0.0, 1.0) * 255.0).round() as u8,
            ]);
        }

        Some(DecodedImage {
            width: width as u32,
            height: height as u32,
            pixels,
        })
    }
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static TEXT_ENGINE: RefCell<Option<TextEngine>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's text engine. The font database is loaded on
/// first use.
pub fn with_text_engine<R>(f: impl FnOnce(&mut TextEngine) -> R) -> R {
    TEXT_ENGINE.with_borrow_mut(|slot| f(slot.get_or_insert_with(TextEngine::new)))
}

/// Local rectangle a text atom occupies, top-left at the origin.
pub fn text_rect(atom: &TextAtom) -> Rect {
    let (w, h) = with_text_engine(|engine| engine.measure(&TextStyle::from(atom)));
    Rect::new(0.0, 0.0, w, h)
}
