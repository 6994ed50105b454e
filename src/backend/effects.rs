//! CPU implementations of the pixel filters the software backend supports.
//!
//! Pixmaps hold premultiplied RGBA. Blurs work on premultiplied data; colour
//! adjustments demultiply, adjust, and premultiply again.

use std::cell::RefCell;
use std::collections::HashSet;

use resvg::tiny_skia::{ColorU8, Pixmap, PremultipliedColorU8};

use crate::filter::{Adjustment, PixelFilter};
use crate::geometry::Color;

/// Widest outline, in pixels, the outline filter will grow.
const MAX_OUTLINE: usize = 64;

thread_local! {
    static REPORTED: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
}

pub(crate) fn apply(pixmap: &mut Pixmap, filter: &PixelFilter) {
    match filter {
        PixelFilter::Identity => {}
        PixelFilter::Blur { strength, quality } => blur(pixmap, *strength, *quality),
        PixelFilter::Bloom { blur: amount, quality } => bloom(pixmap, *amount, *quality),
        PixelFilter::Grayscale => map_straight(pixmap, |_, [r, g, b, a]| {
            let l = luminance(r, g, b);
            [l, l, l, a]
        }),
        PixelFilter::Adjustment(adj) => {
            if !adj.is_identity() {
                let adj = *adj;
                map_straight(pixmap, move |_, c| adjust(&adj, c));
            }
        }
        PixelFilter::Noise { amount, seed } => {
            let (amount, seed) = (*amount, *seed);
            map_straight(pixmap, move |i, [r, g, b, a]| {
                let diff = (hash_unit(i as u32, seed.to_bits()) - 0.5) * amount;
                [r + diff, g + diff, b + diff, a]
            });
        }
        PixelFilter::Outline { thickness, color } => outline(pixmap, *thickness, *color),
        PixelFilter::Emboss { strength } => emboss(pixmap, *strength),
        other => {
            let name = other.name();
            if REPORTED.with_borrow_mut(|seen| seen.insert(name)) {
                log::warn!("The {name} filter has no software implementation, drawing unfiltered");
            }
        }
    }
}

fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2125 * r + 0.7154 * g + 0.0721 * b
}

fn adjust(adj: &Adjustment, [r, g, b, a]: [f32; 4]) -> [f32; 4] {
    let gamma = adj.gamma.max(0.0001);
    let mut c = [r, g, b].map(|v| v.max(0.0).powf(1.0 / gamma));
    let l = luminance(c[0], c[1], c[2]);
    c = c.map(|v| l + (v - l) * adj.saturation);
    c = c.map(|v| (v - 0.5) * adj.contrast + 0.5);
    c = c.map(|v| v * adj.brightness);
    [c[0] * adj.red, c[1] * adj.green, c[2] * adj.blue, a * adj.alpha]
}

/// Deterministic value in `0.0..1.0` for a pixel index and seed.
fn hash_unit(index: u32, seed: u32) -> f32 {
    let mut x = index.wrapping_mul(0x9E37_79B9) ^ seed.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    (x >> 8) as f32 / (1u32 << 24) as f32
}

fn map_straight(pixmap: &mut Pixmap, mut f: impl FnMut(usize, [f32; 4]) -> [f32; 4]) {
    for (i, px) in pixmap.pixels_mut().iter_mut().enumerate() {
        let c = px.demultiply();
        let unit = |v: u8| v as f32 / 255.0;
        let out = f(
            i,
            [unit(c.red()), unit(c.green()), unit(c.blue()), unit(c.alpha())],
        );
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        *px = ColorU8::from_rgba(q(out[0]), q(out[1]), q(out[2]), q(out[3])).premultiply();
    }
}

/// Repeated box blur; `quality` passes approximate a gaussian of
/// `strength` radius.
fn blur(pixmap: &mut Pixmap, strength: f32, quality: f32) {
    let passes = quality.round().clamp(1.0, 8.0) as usize;
    let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
    // A window wider than the pixmap averages the same pixels.
    let radius = (strength.max(0.0) / passes as f32)
        .round()
        .min(w.max(h) as f32) as usize;
    if radius == 0 {
        return;
    }
    let data = pixmap.data_mut();
    let mut scratch = vec![0u8; data.len()];
    for _ in 0..passes {
        box_pass(data, &mut scratch, w, h, radius, true);
        box_pass(&scratch, data, w, h, radius, false);
    }
}

/// One sliding-window pass, horizontal or vertical, from `src` into `dst`.
fn box_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, radius: usize, horizontal: bool) {
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let at = |line: usize, i: usize| {
        if horizontal {
            (line * w + i) * 4
        } else {
            (i * w + line) * 4
        }
    };
    let window = (radius * 2 + 1) as u32;
    for line in 0..lines {
        let mut sum = [0u32; 4];
        for i in 0..=radius.min(len.saturating_sub(1)) {
            let p = at(line, i);
            for ch in 0..4 {
                sum[ch] += src[p + ch] as u32;
            }
        }
        for i in 0..len {
            let p = at(line, i);
            for ch in 0..4 {
                dst[p + ch] = (sum[ch] / window) as u8;
            }
            let enter = i + radius + 1;
            if enter < len {
                let q = at(line, enter);
                for ch in 0..4 {
                    sum[ch] += src[q + ch] as u32;
                }
            }
            if i >= radius {
                let q = at(line, i - radius);
                for ch in 0..4 {
                    sum[ch] -= src[q + ch] as u32;
                }
            }
        }
    }
}

fn bloom(pixmap: &mut Pixmap, amount: f32, quality: f32) {
    let mut glow = pixmap.clone();
    blur(&mut glow, amount, quality);
    for (dst, src) in pixmap.data_mut().iter_mut().zip(glow.data()) {
        // Screen blend keeps premultiplied channels within alpha.
        let (d, s) = (*dst as u32, *src as u32);
        *dst = (d + s - d * s / 255) as u8;
    }
}

/// Grow a coverage mask by `radius` pixels in every direction.
pub(crate) fn dilate(mask: &[u8], width: usize, height: usize, radius: usize) -> Vec<u8> {
    let r = radius as isize;
    let mut out = vec![0u8; mask.len()];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let mut best = 0u8;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy > r * r {
                        continue;
                    }
                    let (sx, sy) = (x + dx, y + dy);
                    if sx < 0 || sy < 0 || sx >= width as isize || sy >= height as isize {
                        continue;
                    }
                    best = best.max(mask[sy as usize * width + sx as usize]);
                }
            }
            out[y as usize * width + x as usize] = best;
        }
    }
    out
}

/// Draw `color` around the opaque shape, `thickness` pixels wide, behind it.
fn outline(pixmap: &mut Pixmap, thickness: f32, color: Color) {
    let radius = thickness.max(0.0).round().min(MAX_OUTLINE as f32) as usize;
    if radius == 0 || color.a <= 0.0 {
        return;
    }
    let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
    let alpha: Vec<u8> = pixmap.pixels().iter().map(|p| p.alpha()).collect();
    let grown = dilate(&alpha, w, h, radius);
    let [r, g, b, a] = color.to_rgba8();
    for (px, &cover) in pixmap.pixels_mut().iter_mut().zip(&grown) {
        let ring_a = a as u32 * cover as u32 / 255;
        let keep = 255 - px.alpha() as u32;
        // Source over the premultiplied ring.
        let over = |src: u8, ring: u32| (src as u32 + ring * keep / 255).min(255) as u8;
        let out_a = over(px.alpha(), ring_a);
        let channel = |src: u8, c: u8| over(src, c as u32 * ring_a / 255).min(out_a);
        if let Some(p) = PremultipliedColorU8::from_rgba(
            channel(px.red(), r),
            channel(px.green(), g),
            channel(px.blue(), b),
            out_a,
        ) {
            *px = p;
        }
    }
}

/// Grey relief: each pixel compares its upper-left and lower-right
/// neighbours, keeping its own alpha.
fn emboss(pixmap: &mut Pixmap, strength: f32) {
    let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
    let src: Vec<[f32; 4]> = pixmap
        .pixels()
        .iter()
        .map(|p| {
            let unit = |v: u8| v as f32 / 255.0;
            [unit(p.red()), unit(p.green()), unit(p.blue()), unit(p.alpha())]
        })
        .collect();
    let at = |x: isize, y: isize| {
        let x = x.clamp(0, w as isize - 1) as usize;
        let y = y.clamp(0, h as isize - 1) as usize;
        src[y * w + x]
    };
    for (i, px) in pixmap.pixels_mut().iter_mut().enumerate() {
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        let (before, after) = (at(x - 1, y - 1), at(x + 1, y + 1));
        let relief: f32 = (0..3)
            .map(|ch| 0.5 - before[ch] * strength + after[ch] * strength)
            .sum::<f32>()
            / 3.0;
        let alpha = src[i][3];
        let v = ((relief * alpha).clamp(0.0, alpha) * 255.0).round() as u8;
        let a = (alpha * 255.0).round() as u8;
        if let Some(p) = PremultipliedColorU8::from_rgba(v, v, v, a) {
            *px = p;
        }
    }
}
