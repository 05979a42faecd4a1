//! Pixel compositing onto a [`Surface`].
//!
//! All positional arguments are logical pixels; physical mapping via the
//! surface's DPR happens here. Colors are premultiplied RGBA8 throughout.

use crate::foundation::core::FrameImage;
use crate::foundation::math::{hsl_to_rgba8, mul_div255_u8};
use crate::render::blur::blur_rgba8_premul;
use crate::render::surface::Surface;

pub type PremulRgba8 = [u8; 4];

pub fn premul(straight: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(straight[3]);
    [
        mul_div255_u8(u16::from(straight[0]), a),
        mul_div255_u8(u16::from(straight[1]), a),
        mul_div255_u8(u16::from(straight[2]), a),
        straight[3],
    ]
}

pub fn hsl_fill_color(h_deg: f64, s: f64, l: f64) -> PremulRgba8 {
    premul(hsl_to_rgba8(h_deg, s, l))
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f64) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Brightness on a premultiplied pixel: scales color channels only, clamped
/// at the alpha so the pixel stays valid premul.
fn brighten(px: PremulRgba8, brightness: f64) -> PremulRgba8 {
    if brightness == 1.0 {
        return px;
    }
    let b = brightness.max(0.0);
    let cap = px[3];
    let mut out = px;
    for c in out.iter_mut().take(3) {
        *c = ((f64::from(*c) * b).round() as u32).min(u32::from(cap)) as u8;
    }
    out
}

pub fn fill(surface: &mut Surface, color: PremulRgba8) {
    for px in surface.data_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
}

/// Fill an axis-aligned rect given in logical pixels.
pub fn fill_rect(surface: &mut Surface, x: f64, y: f64, w: f64, h: f64, color: PremulRgba8) {
    let dpr = surface.dpr();
    let (sw, sh) = (surface.width() as i64, surface.height() as i64);
    let x0 = ((x * dpr).round() as i64).clamp(0, sw);
    let y0 = ((y * dpr).round() as i64).clamp(0, sh);
    let x1 = (((x + w) * dpr).round() as i64).clamp(0, sw);
    let y1 = (((y + h) * dpr).round() as i64).clamp(0, sh);

    let stride = sw as usize * 4;
    let data = surface.data_mut();
    for py in y0..y1 {
        let row = py as usize * stride;
        for px in x0..x1 {
            let idx = row + px as usize * 4;
            let dst = [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]];
            let out = over(dst, color, 1.0);
            data[idx..idx + 4].copy_from_slice(&out);
        }
    }
}

/// [`fill_rect`] softened with a gaussian blur of `blur_px` logical pixels,
/// for the far depth-of-field layer. Falls back to a sharp fill when the
/// blur buffer cannot be built.
pub fn fill_rect_blurred(
    surface: &mut Surface,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    color: PremulRgba8,
    blur_px: f64,
) {
    let dpr = surface.dpr();
    let radius = (blur_px.max(0.0) * dpr).round() as u32;
    if radius == 0 {
        fill_rect(surface, x, y, w, h, color);
        return;
    }

    let pad = i64::from(radius) * 2;
    let rect_w = (w * dpr).round() as i64;
    let rect_h = (h * dpr).round() as i64;
    if rect_w <= 0 || rect_h <= 0 {
        return;
    }
    let bw = (rect_w + 2 * pad) as u32;
    let bh = (rect_h + 2 * pad) as u32;

    let mut buf = vec![0u8; bw as usize * bh as usize * 4];
    for py in pad..pad + rect_h {
        for px in pad..pad + rect_w {
            let idx = (py as usize * bw as usize + px as usize) * 4;
            buf[idx..idx + 4].copy_from_slice(&color);
        }
    }
    let Ok(blurred) = blur_rgba8_premul(&buf, bw, bh, radius) else {
        fill_rect(surface, x, y, w, h, color);
        return;
    };

    let ox = (x * dpr).round() as i64 - pad;
    let oy = (y * dpr).round() as i64 - pad;
    let (sw, sh) = (surface.width() as i64, surface.height() as i64);
    let stride = sw as usize * 4;
    let data = surface.data_mut();
    for by in 0..i64::from(bh) {
        let ty = oy + by;
        if ty < 0 || ty >= sh {
            continue;
        }
        for bx in 0..i64::from(bw) {
            let tx = ox + bx;
            if tx < 0 || tx >= sw {
                continue;
            }
            let sidx = (by as usize * bw as usize + bx as usize) * 4;
            let spx = [
                blurred[sidx],
                blurred[sidx + 1],
                blurred[sidx + 2],
                blurred[sidx + 3],
            ];
            if spx[3] == 0 {
                continue;
            }
            let didx = ty as usize * stride + tx as usize * 4;
            let dst = [data[didx], data[didx + 1], data[didx + 2], data[didx + 3]];
            let out = over(dst, spx, 1.0);
            data[didx..didx + 4].copy_from_slice(&out);
        }
    }
}

/// Draw `img` covering the whole surface: uniform scale so the image fully
/// covers the viewport, center-cropping the overflow axis. Nearest sampling.
pub fn blit_cover(surface: &mut Surface, img: &FrameImage) {
    let (sw, sh) = (surface.width(), surface.height());
    if sw == 0 || sh == 0 || img.width == 0 || img.height == 0 {
        return;
    }

    let scale = f64::max(
        f64::from(sw) / f64::from(img.width),
        f64::from(sh) / f64::from(img.height),
    );
    let draw_w = f64::from(img.width) * scale;
    let draw_h = f64::from(img.height) * scale;
    let off_x = (f64::from(sw) - draw_w) / 2.0;
    let off_y = (f64::from(sh) - draw_h) / 2.0;

    let src = img.rgba8_premul.as_slice();
    let stride = sw as usize * 4;
    let data = surface.data_mut();
    for py in 0..sh {
        let sy = (((f64::from(py) - off_y) / scale) as i64).clamp(0, i64::from(img.height) - 1);
        let src_row = sy as usize * img.width as usize * 4;
        let row = py as usize * stride;
        for px in 0..sw {
            let sx = (((f64::from(px) - off_x) / scale) as i64).clamp(0, i64::from(img.width) - 1);
            let sidx = src_row + sx as usize * 4;
            let didx = row + px as usize * 4;
            data[didx..didx + 4].copy_from_slice(&src[sidx..sidx + 4]);
        }
    }
}

/// Draw `img` centered at `(cx, cy)` logical pixels, uniformly scaled, with
/// opacity and brightness applied per pixel. Nearest sampling.
pub fn draw_image(
    surface: &mut Surface,
    img: &FrameImage,
    cx: f64,
    cy: f64,
    scale: f64,
    opacity: f64,
    brightness: f64,
) {
    if img.width == 0 || img.height == 0 || scale <= 0.0 || opacity <= 0.0 {
        return;
    }

    let dpr = surface.dpr();
    let draw_w = f64::from(img.width) * scale * dpr;
    let draw_h = f64::from(img.height) * scale * dpr;
    let left = cx * dpr - draw_w / 2.0;
    let top = cy * dpr - draw_h / 2.0;

    let (sw, sh) = (surface.width() as i64, surface.height() as i64);
    let x0 = (left.floor() as i64).clamp(0, sw);
    let y0 = (top.floor() as i64).clamp(0, sh);
    let x1 = ((left + draw_w).ceil() as i64).clamp(0, sw);
    let y1 = ((top + draw_h).ceil() as i64).clamp(0, sh);

    let src = img.rgba8_premul.as_slice();
    let stride = sw as usize * 4;
    let data = surface.data_mut();
    for py in y0..y1 {
        let v = (py as f64 - top) / draw_h;
        let sy = ((v * f64::from(img.height)) as i64).clamp(0, i64::from(img.height) - 1);
        let src_row = sy as usize * img.width as usize * 4;
        let row = py as usize * stride;
        for px in x0..x1 {
            let u = (px as f64 - left) / draw_w;
            let sx = ((u * f64::from(img.width)) as i64).clamp(0, i64::from(img.width) - 1);
            let sidx = src_row + sx as usize * 4;
            let spx = brighten(
                [src[sidx], src[sidx + 1], src[sidx + 2], src[sidx + 3]],
                brightness,
            );
            let didx = row + px as usize * 4;
            let dst = [data[didx], data[didx + 1], data[didx + 2], data[didx + 3]];
            let out = over(dst, spx, opacity);
            data[didx..didx + 4].copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::FrameImage;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        assert_eq!(over(dst, [200, 200, 200, 200], 0.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let src = [255, 0, 0, 255];
        assert_eq!(over([0, 0, 0, 255], src, 1.0), src);
    }

    #[test]
    fn cover_wide_into_tall_centers_crop() {
        // 4x2 image into a 2x4 surface: width is the overflow axis.
        let mut img_px = Vec::new();
        for x in 0..4u8 {
            img_px.extend_from_slice(&[x * 10, 0, 0, 255]);
        }
        let img = FrameImage::new(4, 2, img_px.repeat(2)).unwrap();

        let mut surface = Surface::new();
        surface.resize(2, 4, 1.0);
        blit_cover(&mut surface, &img);

        // scale = 2, draw_w = 8, off_x = -3: columns 1 and 2 of the source.
        assert_eq!(surface.pixel(0, 0)[0], 10);
        assert_eq!(surface.pixel(1, 0)[0], 20);
        // Fully covered: every pixel opaque.
        assert!(surface.data().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn cover_tall_into_wide_centers_crop() {
        // 2x4 image into a 4x2 surface: height is the overflow axis.
        let mut rows = Vec::new();
        for y in 0..4u8 {
            rows.extend_from_slice(&[y * 10, 0, 0, 255].repeat(2));
        }
        let img = FrameImage::new(2, 4, rows).unwrap();

        let mut surface = Surface::new();
        surface.resize(4, 2, 1.0);
        blit_cover(&mut surface, &img);

        assert_eq!(surface.pixel(0, 0)[0], 10);
        assert_eq!(surface.pixel(0, 1)[0], 20);
    }

    #[test]
    fn draw_image_respects_opacity_and_brightness() {
        let img = FrameImage::solid(2, 2, [100, 100, 100, 255]).unwrap();
        let mut surface = Surface::new();
        surface.resize(4, 4, 1.0);

        draw_image(&mut surface, &img, 2.0, 2.0, 1.0, 1.0, 2.0);
        let px = surface.pixel(2, 2);
        assert_eq!(px[0], 200);

        surface.clear();
        draw_image(&mut surface, &img, 2.0, 2.0, 1.0, 0.5, 1.0);
        let px = surface.pixel(2, 2);
        assert!(px[3] > 120 && px[3] < 135);
    }

    #[test]
    fn blurred_rect_feathers_past_its_edges() {
        let mut surface = Surface::new();
        surface.resize(20, 20, 1.0);
        fill_rect_blurred(&mut surface, 8.0, 8.0, 4.0, 4.0, [255, 255, 255, 255], 2.0);

        // Center stays near-solid, a ring outside the rect picks up alpha.
        assert!(surface.pixel(10, 10)[3] > 200);
        assert!(surface.pixel(6, 10)[3] > 0);
        assert_eq!(surface.pixel(0, 0)[3], 0);

        let mut sharp = Surface::new();
        sharp.resize(20, 20, 1.0);
        fill_rect_blurred(&mut sharp, 8.0, 8.0, 4.0, 4.0, [255, 255, 255, 255], 0.0);
        assert_eq!(sharp.pixel(6, 10)[3], 0);
        assert_eq!(sharp.pixel(10, 10)[3], 255);
    }

    #[test]
    fn fill_rect_uses_logical_coordinates() {
        let mut surface = Surface::new();
        surface.resize(4, 4, 2.0);
        fill_rect(&mut surface, 1.0, 1.0, 2.0, 2.0, [0, 255, 0, 255]);

        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(surface.pixel(2, 2), [0, 255, 0, 255]);
        assert_eq!(surface.pixel(5, 5), [0, 255, 0, 255]);
        assert_eq!(surface.pixel(6, 6), [0, 0, 0, 0]);
    }
}
