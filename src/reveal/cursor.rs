use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Affine, FrameRGBA, Point, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::over_premul_opaque;

/// Pencil drawn tip-down-left in a 100x100 box; the graphite point sits at `(8, 92)`.
const PENCIL_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<polygon points="25.7,84.3 69.5,40.3 59.6,30.4 15.8,74.4" fill="#F4B400" stroke="#B8860B" stroke-width="1"/>
<polygon points="69.5,40.3 76.6,33.3 66.7,23.5 59.6,30.4" fill="#B0B0B0" stroke="#808080" stroke-width="0.8"/>
<polygon points="76.6,33.3 83.6,26.2 73.7,16.4 66.7,23.5" fill="#F28B82" stroke="#C5645C" stroke-width="0.8"/>
<polygon points="8,92 25.7,84.3 15.8,74.4" fill="#E8C39E" stroke="#B08963" stroke-width="0.8"/>
<polygon points="8,92 13.9,89.5 10.6,86.2" fill="#333333"/>
</svg>"##;
const PENCIL_TIP: (f64, f64) = (0.08, 0.92);

/// Square premultiplied RGBA sprite drawn at the stroke head.
#[derive(Clone, Debug, PartialEq)]
pub struct Cursor {
    size: u32,
    data: Vec<u8>,
    /// Drawing tip in sprite pixels; this point lands on the stroke head.
    tip: Point,
}

impl Cursor {
    /// Load a cursor image, scaled to fit `size` with its aspect kept, centered on a transparent
    /// square. The sprite center is anchored on the stroke head.
    pub fn load(path: &Path, size: u32) -> ReelResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read cursor {}", path.display()))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| ReelError::input(format!("decode cursor {}: {e}", path.display())))?;
        Self::from_image(&img.to_rgba8(), size)
    }

    pub fn from_image(img: &image::RgbaImage, size: u32) -> ReelResult<Self> {
        let size = size.max(1);
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Err(ReelError::input("cursor image is empty"));
        }
        let scale = f64::from(size) / f64::from(w.max(h));
        let nw = ((f64::from(w) * scale).round() as u32).clamp(1, size);
        let nh = ((f64::from(h) * scale).round() as u32).clamp(1, size);
        let resized = if (nw, nh) == (w, h) {
            img.clone()
        } else {
            image::imageops::resize(img, nw, nh, image::imageops::FilterType::Lanczos3)
        };

        let mut square = image::RgbaImage::new(size, size);
        image::imageops::overlay(
            &mut square,
            &resized,
            i64::from((size - nw) / 2),
            i64::from((size - nh) / 2),
        );
        let mut data = square.into_raw();
        premultiply_in_place(&mut data);
        Ok(Self {
            size,
            data,
            tip: Point::new(f64::from(size) * 0.5, f64::from(size) * 0.5),
        })
    }

    /// Built-in pencil sprite, tip anchored on the stroke head.
    pub fn procedural(size: u32) -> ReelResult<Self> {
        let size = size.max(1);
        let tree = usvg::Tree::from_str(PENCIL_SVG, &usvg::Options::default())
            .map_err(|e| ReelError::render(format!("parse pencil svg: {e}")))?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)
            .ok_or_else(|| ReelError::render("failed to allocate cursor pixmap"))?;
        let s = size as f32 / tree.size().width();
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(s, s),
            &mut pixmap.as_mut(),
        );
        Ok(Self {
            size,
            data: pixmap.data().to_vec(),
            tip: Point::new(
                f64::from(size) * PENCIL_TIP.0,
                f64::from(size) * PENCIL_TIP.1,
            ),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn tip(&self) -> Point {
        self.tip
    }

    /// Draw the sprite with its tip at `at`, rotated by `angle` radians, scaled by `opacity`.
    pub fn stamp(&self, frame: &mut FrameRGBA, at: Point, angle: f64, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let xf = Affine::translate(at.to_vec2())
            * Affine::rotate(angle)
            * Affine::translate(-self.tip.to_vec2());
        let inv = xf.inverse();

        let s = f64::from(self.size);
        let corners = [(0.0, 0.0), (s, 0.0), (s, s), (0.0, s)].map(|(x, y)| xf * Point::new(x, y));
        let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for c in corners {
            x0 = x0.min(c.x);
            y0 = y0.min(c.y);
            x1 = x1.max(c.x);
            y1 = y1.max(c.y);
        }
        let (fw, fh) = (f64::from(frame.width), f64::from(frame.height));
        let x0 = x0.floor().clamp(0.0, fw) as u32;
        let y0 = y0.floor().clamp(0.0, fh) as u32;
        let x1 = x1.ceil().clamp(0.0, fw) as u32;
        let y1 = y1.ceil().clamp(0.0, fh) as u32;

        let op = (opacity * 255.0).round() as u16;
        for y in y0..y1 {
            for x in x0..x1 {
                let src = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let Some(px) = self.sample(src) else {
                    continue;
                };
                let px = if op < 255 {
                    px.map(|c| ((u16::from(c) * op + 127) / 255) as u8)
                } else {
                    px
                };
                let i = (y as usize * frame.width as usize + x as usize) * 4;
                let d = &mut frame.data[i..i + 4];
                let out = over_premul_opaque([d[0], d[1], d[2], d[3]], px);
                d.copy_from_slice(&out);
            }
        }
    }

    /// Bilinear sample in sprite space (pixel centers at `+0.5`); `None` outside the sprite.
    fn sample(&self, p: Point) -> Option<[u8; 4]> {
        let s = f64::from(self.size);
        if p.x < 0.0 || p.y < 0.0 || p.x >= s || p.y >= s {
            return None;
        }
        let fx = (p.x - 0.5).max(0.0);
        let fy = (p.y - 0.5).max(0.0);
        let ix = (fx.floor() as u32).min(self.size - 1);
        let iy = (fy.floor() as u32).min(self.size - 1);
        let jx = (ix + 1).min(self.size - 1);
        let jy = (iy + 1).min(self.size - 1);
        let tx = fx - f64::from(ix);
        let ty = fy - f64::from(iy);

        let at = |x: u32, y: u32, c: usize| -> f64 {
            f64::from(self.data[(y as usize * self.size as usize + x as usize) * 4 + c])
        };
        let mut out = [0u8; 4];
        for (c, o) in out.iter_mut().enumerate() {
            let top = at(ix, iy, c) * (1.0 - tx) + at(jx, iy, c) * tx;
            let bot = at(ix, jy, c) * (1.0 - tx) + at(jx, jy, c) * tx;
            *o = (top * (1.0 - ty) + bot * ty).round().clamp(0.0, 255.0) as u8;
        }
        Some(out)
    }
}

/// Signed angle from `reference` to `tangent`, radians.
pub fn tilt_angle(reference: Vec2, tangent: Vec2) -> f64 {
    reference.cross(tangent).atan2(reference.dot(tangent))
}

/// Cursor opacity for reveal frame `index` of `total`: ramps in over `fade_in` frames and out
/// over the last `fade_out` frames.
pub fn fade_alpha(index: u64, total: u64, fade_in: u32, fade_out: u32) -> f32 {
    let mut alpha = 1.0f32;
    if fade_in > 0 && index < u64::from(fade_in) {
        alpha = alpha.min(index as f32 / fade_in as f32);
    }
    if fade_out > 0 && index + u64::from(fade_out) > total {
        let from_end = total.saturating_sub(index);
        alpha = alpha.min(from_end as f32 / fade_out as f32);
    }
    alpha.clamp(0.0, 1.0)
}

fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/cursor.rs"]
mod tests;
