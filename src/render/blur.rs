//! Separable gaussian blur over premultiplied RGBA8, used for the far
//! depth-of-field layer.

use crate::foundation::error::{LumicardError, LumicardResult};

/// Blur `src` in place semantics: returns a new buffer of the same size.
/// `radius` 0 is the identity. Edge pixels clamp.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
) -> LumicardResult<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| LumicardError::render("blur buffer size overflow"))?;
    if src.len() != expected {
        return Err(LumicardError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel(radius);
    let mut tmp = vec![0u8; expected];
    let mut out = vec![0u8; expected];
    pass(src, &mut tmp, width, height, &kernel, Axis::X);
    pass(&tmp, &mut out, width, height, &kernel, Axis::Y);
    Ok(out)
}

fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let sigma = radius as f32 * 0.5 + 0.25;
    let denom = 2.0 * sigma * sigma;
    let r = radius as i32;

    let mut weights: Vec<f32> = (-r..=r)
        .map(|i| (-(i * i) as f32 / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

enum Axis {
    X,
    Y,
}

fn pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[f32], axis: Axis) {
    let radius = (kernel.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kw) in kernel.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += kw * f32::from(src[idx + c]);
                }
            }
            let idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[idx + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_0_is_identity() {
        let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(blur_rgba8_premul(&src, 1, 2, 0).unwrap(), src);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let (w, h) = (4u32, 3u32);
        let src = [10u8, 20, 30, 40].repeat((w * h) as usize);
        assert_eq!(blur_rgba8_premul(&src, w, h, 2).unwrap(), src);
    }

    #[test]
    fn energy_spreads_from_single_pixel() {
        let (w, h) = (5u32, 5u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = ((2 * w + 2) * 4) as usize;
        src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

        let out = blur_rgba8_premul(&src, w, h, 2).unwrap();
        let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
        assert!(nonzero > 1);

        let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
        assert!((sum_a as i32 - 255).abs() <= 8);
    }

    #[test]
    fn size_mismatch_is_an_error() {
        assert!(blur_rgba8_premul(&[0u8; 7], 1, 2, 1).is_err());
    }
}
