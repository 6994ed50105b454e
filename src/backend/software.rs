use std::collections::HashMap;
use std::io::Cursor;

use resvg::tiny_skia::{
    self, ColorU8, FillRule, Mask, MaskType, Paint, PathBuilder, Pixmap, PixmapPaint,
};

use super::{effects, Backend, TextureId};
use crate::assets::DecodedImage;
use crate::error::{BlinkError, Result};
use crate::geometry::{Color, Point};
use crate::render::commands::{DrawCommand, PathSegment, Stroke};
use crate::render::text::{with_text_engine, TextStyle};
use crate::scene::{DisplayId, DisplayKind, DisplayNode, Scene};
use crate::transform::Matrix;

/// CPU renderer built on `tiny-skia`.
///
/// Draws sprites, vector graphics and text with alpha, masks and the pixel
/// filters it has CPU passes for.
#[derive(Default)]
pub struct SoftwareBackend {
    textures: HashMap<TextureId, Pixmap>,
    next_id: u64,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Straight-alpha RGBA of one texel.
    pub fn pixel(&self, texture: TextureId, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.textures.get(&texture)?.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Encode a texture as PNG.
    pub fn encode_png(&self, texture: TextureId) -> Result<Vec<u8>> {
        let pixmap = self
            .textures
            .get(&texture)
            .ok_or(BlinkError::UnknownTexture(texture))?;
        let mut rgba = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba).ok_or(
            BlinkError::TextureAllocation {
                width: pixmap.width(),
                height: pixmap.height(),
            },
        )?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    fn store(&mut self, pixmap: Pixmap) -> TextureId {
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, pixmap);
        id
    }

    fn draw_node(&self, scene: &Scene, id: DisplayId, parent: Matrix, target: &mut Pixmap) {
        let Some(node) = scene.get(id) else {
            return;
        };
        if !node.visible || node.alpha <= 0.0 {
            return;
        }
        let world = parent.then(&node.matrix);

        let isolated = node.alpha < 1.0 || !node.filters.is_empty() || node.mask.is_some();
        if !isolated {
            self.draw_subtree(scene, node, world, target);
            return;
        }

        let Some(mut layer) = Pixmap::new(target.width(), target.height()) else {
            return;
        };
        self.draw_subtree(scene, node, world, &mut layer);
        for filter in &node.filters {
            effects::apply(&mut layer, filter);
        }
        if let Some(mask_id) = node.mask {
            if let Some(mut mask_layer) = Pixmap::new(target.width(), target.height()) {
                self.draw_node(scene, mask_id, world, &mut mask_layer);
                let mask = Mask::from_pixmap(mask_layer.as_ref(), MaskType::Alpha);
                layer.apply_mask(&mask);
            }
        }
        target.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint {
                opacity: node.alpha.clamp(0.0, 1.0),
                ..PixmapPaint::default()
            },
            tiny_skia::Transform::identity(),
            None,
        );
    }

    fn draw_subtree(&self, scene: &Scene, node: &DisplayNode, world: Matrix, target: &mut Pixmap) {
        match &node.kind {
            DisplayKind::Container => {}
            DisplayKind::Sprite {
                texture,
                width,
                height,
                anchor,
                ..
            } => self.draw_sprite(*texture, *width, *height, anchor, world, target),
            DisplayKind::Graphics(commands) => {
                for command in commands {
                    draw_command(command, world, target);
                }
            }
        }
        for &child in node.children() {
            self.draw_node(scene, child, world, target);
        }
    }

    fn draw_sprite(
        &self,
        texture: TextureId,
        width: f32,
        height: f32,
        anchor: &Point,
        world: Matrix,
        target: &mut Pixmap,
    ) {
        let Some(pixmap) = self.textures.get(&texture) else {
            log::debug!("Sprite references released texture {texture:?}");
            return;
        };
        let placed = world
            .then(&Matrix::translate(-anchor.x * width, -anchor.y * height))
            .then(&Matrix::scale_xy(
                width / pixmap.width() as f32,
                height / pixmap.height() as f32,
            ));
        target.draw_pixmap(
            0,
            0,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            to_skia(&placed),
            None,
        );
    }
}

impl Backend for SoftwareBackend {
    fn create_texture(&mut self, image: &DecodedImage) -> Result<TextureId> {
        let pixmap = pixmap_from_image(image).ok_or(BlinkError::TextureAllocation {
            width: image.width,
            height: image.height,
        })?;
        Ok(self.store(pixmap))
    }

    fn render_to_texture(
        &mut self,
        scene: &Scene,
        root: DisplayId,
        width: u32,
        height: u32,
    ) -> Result<TextureId> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(BlinkError::TextureAllocation { width, height })?;
        self.draw_node(scene, root, Matrix::IDENTITY, &mut pixmap);
        Ok(self.store(pixmap))
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&texture)
            .map(|p| (p.width(), p.height()))
    }
}

/// Premultiply straight RGBA into a new pixmap.
fn pixmap_from_image(image: &DecodedImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width, image.height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

fn to_skia(m: &Matrix) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(m.a, m.b, m.c, m.d, m.tx, m.ty)
}

fn paint_for(color: Color) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn fill_and_stroke(
    path: Option<tiny_skia::Path>,
    fill: Option<Color>,
    stroke: Option<Stroke>,
    world: Matrix,
    target: &mut Pixmap,
) {
    let Some(path) = path else {
        return;
    };
    let transform = to_skia(&world);
    if let Some(fill) = fill.filter(|c| c.a > 0.0) {
        target.fill_path(&path, &paint_for(fill), FillRule::Winding, transform, None);
    }
    if let Some(stroke) = stroke {
        let style = tiny_skia::Stroke {
            width: stroke.width,
            ..tiny_skia::Stroke::default()
        };
        target.stroke_path(&path, &paint_for(stroke.color), &style, transform, None);
    }
}

fn draw_command(command: &DrawCommand, world: Matrix, target: &mut Pixmap) {
    match command {
        DrawCommand::Rect { rect, fill, stroke } => {
            let path = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
                .map(PathBuilder::from_rect);
            fill_and_stroke(path, Some(*fill), *stroke, world, target);
        }
        DrawCommand::Ellipse {
            center,
            radius_x,
            radius_y,
            fill,
            stroke,
        } => {
            let path = tiny_skia::Rect::from_xywh(
                center.x - radius_x,
                center.y - radius_y,
                radius_x * 2.0,
                radius_y * 2.0,
            )
            .and_then(PathBuilder::from_oval);
            fill_and_stroke(path, Some(*fill), *stroke, world, target);
        }
        DrawCommand::Polygon {
            points,
            fill,
            stroke,
        } => {
            let mut pb = PathBuilder::new();
            for (i, p) in points.iter().enumerate() {
                if i == 0 {
                    pb.move_to(p.x, p.y);
                } else {
                    pb.line_to(p.x, p.y);
                }
            }
            pb.close();
            fill_and_stroke(pb.finish(), Some(*fill), *stroke, world, target);
        }
        DrawCommand::Path {
            segments,
            fill,
            stroke,
        } => {
            let mut pb = PathBuilder::new();
            for segment in segments {
                match *segment {
                    PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
                    PathSegment::CubicTo { c1, c2, to } => {
                        pb.cubic_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y)
                    }
                }
            }
            fill_and_stroke(pb.finish(), Some(*fill), *stroke, world, target);
        }
        DrawCommand::Line { from, to, stroke } => {
            let mut pb = PathBuilder::new();
            pb.move_to(from.x, from.y);
            pb.line_to(to.x, to.y);
            fill_and_stroke(pb.finish(), None, Some(*stroke), world, target);
        }
        DrawCommand::Circle {
            center,
            radius,
            fill,
        } => {
            let path = PathBuilder::from_circle(center.x, center.y, *radius);
            fill_and_stroke(path, Some(*fill), None, world, target);
        }
        DrawCommand::Text {
            text,
            rect,
            color,
            stroke,
            font_size,
            font_family,
            italic,
            bold,
            align,
        } => {
            let style = TextStyle {
                text: text.as_str(),
                font_size: *font_size,
                font_family: font_family.as_str(),
                bold: *bold,
                italic: *italic,
                align: *align,
                stroke_width: stroke.map_or(0.0, |s| s.width),
            };
            let Some(glyphs) =
                with_text_engine(|engine| engine.rasterize(&style, *color, *stroke))
            else {
                return;
            };
            let Some(pixmap) = pixmap_from_image(&glyphs) else {
                return;
            };
            let placed = world.then(&Matrix::translate(rect.x, rect.y));
            target.draw_pixmap(
                0,
                0,
                pixmap.as_ref(),
                &PixmapPaint::default(),
                to_skia(&placed),
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn rect_node(rect: Rect, hex: u32) -> DisplayNode {
        DisplayNode::new(
            "rect",
            DisplayKind::Graphics(vec![DrawCommand::Rect {
                rect,
                fill: Color::from_hex(hex),
                stroke: None,
            }]),
        )
    }

    #[test]
    fn test_render_to_texture_size_and_pixels() {
        let mut scene = Scene::new();
        let mut node = rect_node(Rect::new(0.0, 0.0, 10.0, 10.0), 0xff0000);
        node.matrix = Matrix::translate(5.0, 5.0);
        let id = scene.insert(node);

        let mut backend = SoftwareBackend::new();
        let tex = backend.render_to_texture(&scene, id, 20, 30).unwrap();
        assert_eq!(backend.texture_size(tex), Some((20, 30)));
        assert_eq!(backend.pixel(tex, 10, 10), Some([255, 0, 0, 255]));
        assert_eq!(backend.pixel(tex, 2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_alpha_and_release() {
        let mut scene = Scene::new();
        let mut node = rect_node(Rect::new(0.0, 0.0, 4.0, 4.0), 0x0000ff);
        node.alpha = 0.5;
        let id = scene.insert(node);

        let mut backend = SoftwareBackend::new();
        let tex = backend.render_to_texture(&scene, id, 4, 4).unwrap();
        let [_, _, b, a] = backend.pixel(tex, 1, 1).unwrap();
        assert_eq!(b, 255);
        assert!((120..=135).contains(&a), "alpha {a}");

        backend.release_texture(tex);
        assert_eq!(backend.texture_count(), 0);
        assert!(matches!(
            backend.encode_png(tex),
            Err(BlinkError::UnknownTexture(_))
        ));
    }

    #[test]
    fn test_sprite_anchor_and_png() {
        let mut backend = SoftwareBackend::new();
        let image = DecodedImage {
            width: 2,
            height: 2,
            pixels: [0u8, 255, 0, 255].repeat(4),
        };
        let green = backend.create_texture(&image).unwrap();

        let mut scene = Scene::new();
        let mut sprite = DisplayNode::new(
            "sprite",
            DisplayKind::Sprite {
                texture: green,
                width: 8.0,
                height: 8.0,
                anchor: Point::new(0.5, 0.5),
                owned: false,
            },
        );
        sprite.matrix = Matrix::translate(8.0, 8.0);
        let id = scene.insert(sprite);

        let tex = backend.render_to_texture(&scene, id, 16, 16).unwrap();
        assert_eq!(backend.pixel(tex, 8, 8), Some([0, 255, 0, 255]));
        assert_eq!(backend.pixel(tex, 1, 1).map(|p| p[3]), Some(0));

        let png = backend.encode_png(tex).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_mask_clips() {
        let mut scene = Scene::new();
        let mut node = rect_node(Rect::new(0.0, 0.0, 10.0, 10.0), 0xff0000);
        let mask = scene.insert(rect_node(Rect::new(0.0, 0.0, 5.0, 10.0), 0xffffff));
        node.mask = Some(mask);
        let id = scene.insert(node);

        let mut backend = SoftwareBackend::new();
        let tex = backend.render_to_texture(&scene, id, 10, 10).unwrap();
        assert_eq!(backend.pixel(tex, 2, 5).map(|p| p[3]), Some(255));
        assert_eq!(backend.pixel(tex, 8, 5).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_text_is_drawn() {
        let mut scene = Scene::new();
        let node = DisplayNode::new(
            "text",
            DisplayKind::Graphics(vec![DrawCommand::Text {
                text: "HELLO WORLD".into(),
                rect: Rect::new(0.0, 0.0, 200.0, 100.0),
                color: Color::from_hex(0x000000),
                stroke: Stroke::visible(2.0, Color::from_hex(0xff0000)),
                font_size: 40.0,
                font_family: String::new(),
                italic: false,
                bold: false,
                align: Default::default(),
            }]),
        );
        let id = scene.insert(node);

        let mut backend = SoftwareBackend::new();
        let tex = backend.render_to_texture(&scene, id, 200, 100).unwrap();
        let drawn = (0..100)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| backend.pixel(tex, x, y).is_some_and(|p| p[3] > 0))
            .count();
        assert!(drawn > 0, "text drew nothing");
    }
}
