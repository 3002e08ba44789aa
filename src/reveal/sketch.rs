use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::luma;

/// Line-art parameters for the pencil rendition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SketchParams {
    /// Multiplier on Sobel gradient magnitude.
    pub edge_gain: f32,
    /// Gaussian pre-smoothing of luma; `0` disables it.
    pub blur_sigma: f32,
    /// How much source luma shows through as soft graphite shading, in `[0, 1]`.
    pub shade: f32,
}

impl Default for SketchParams {
    fn default() -> Self {
        Self {
            edge_gain: 1.6,
            blur_sigma: 1.0,
            shade: 0.25,
        }
    }
}

/// Desaturated pencil-style rendition of `src`: dark strokes where luma changes, light paper
/// elsewhere. Pure function of the source pixels.
#[tracing::instrument(level = "debug", skip(src), fields(w = src.width(), h = src.height()))]
pub fn pencil_sketch(src: &image::RgbaImage, params: &SketchParams) -> ReelResult<image::RgbaImage> {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return Err(ReelError::render("cannot sketch an empty image"));
    }
    let plane: Vec<u8> = src
        .pixels()
        .map(|p| luma(p[0], p[1], p[2]).round().clamp(0.0, 255.0) as u8)
        .collect();

    let radius = (params.blur_sigma * 3.0).ceil().max(0.0) as u32;
    let smooth = if params.blur_sigma > 0.0 && radius > 0 {
        blur_plane(&plane, w, h, radius, params.blur_sigma)?
    } else {
        plane.clone()
    };

    let shade = params.shade.clamp(0.0, 1.0);
    let (wi, hi) = (w as i64, h as i64);
    let at = |x: i64, y: i64| -> f32 {
        let x = x.clamp(0, wi - 1);
        let y = y.clamp(0, hi - 1);
        f32::from(smooth[(y * wi + x) as usize])
    };

    let mut out = image::RgbaImage::new(w, h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let (x, y) = (i64::from(x), i64::from(y));
        let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
            - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
        let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
            - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
        let edge = (gx * gx + gy * gy).sqrt() * 0.25 * params.edge_gain;
        let l = f32::from(plane[(y * wi + x) as usize]);
        let paper = 255.0 - shade * (255.0 - l);
        let v = (paper - edge).round().clamp(0.0, 255.0) as u8;
        *px = image::Rgba([v, v, v, 255]);
    }
    Ok(out)
}

/// Separable Gaussian blur of a single 8-bit plane, Q16 fixed-point weights.
fn blur_plane(src: &[u8], width: u32, height: u32, radius: u32, sigma: f32) -> ReelResult<Vec<u8>> {
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];
    let r = radius as i32;
    let (w, h) = (width as i32, height as i32);

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in kernel.iter().enumerate() {
                let sx = (x + ki as i32 - r).clamp(0, w - 1);
                acc += u64::from(kw) * u64::from(src[(y * w + sx) as usize]);
            }
            tmp[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in kernel.iter().enumerate() {
                let sy = (y + ki as i32 - r).clamp(0, h - 1);
                acc += u64::from(kw) * u64::from(tmp[(sy * w + x) as usize]);
            }
            out[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ReelResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReelError::render("sketch blur sigma must be > 0"));
    }
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&q| i64::from(q)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/sketch.rs"]
mod tests;
