use crate::foundation::core::{Canvas, CropRect, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult};
use crate::panzoom::planner::Trajectory;

/// Crop `src` at `rect` and rescale it to `canvas` with bilinear filtering.
pub fn crop_resize(src: &image::RgbaImage, rect: CropRect, canvas: Canvas) -> ReelResult<FrameRGBA> {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return Err(ReelError::render("cannot crop an empty image"));
    }
    if !(rect.w > 0.0 && rect.h > 0.0) {
        return Err(ReelError::render(format!("degenerate crop rectangle {rect:?}")));
    }
    let raw = src.as_raw();
    let stride = sw as usize * 4;
    let sx = rect.w / f64::from(canvas.width);
    let sy = rect.h / f64::from(canvas.height);

    let mut data = vec![0u8; canvas.byte_len()];
    for (y, row) in data.chunks_exact_mut(canvas.width as usize * 4).enumerate() {
        let fy = (rect.y + (y as f64 + 0.5) * sy - 0.5).clamp(0.0, f64::from(sh - 1));
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(sh as usize - 1);
        let ty = fy - y0 as f64;
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let fx = (rect.x + (x as f64 + 0.5) * sx - 0.5).clamp(0.0, f64::from(sw - 1));
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(sw as usize - 1);
            let tx = fx - x0 as f64;
            for c in 0..4 {
                let a = f64::from(raw[y0 * stride + x0 * 4 + c]);
                let b = f64::from(raw[y0 * stride + x1 * 4 + c]);
                let d = f64::from(raw[y1 * stride + x0 * 4 + c]);
                let e = f64::from(raw[y1 * stride + x1 * 4 + c]);
                let top = a + (b - a) * tx;
                let bot = d + (e - d) * tx;
                px[c] = (top + (bot - top) * ty).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data,
    })
}

/// Produces the frames of one pan-zoom scene.
pub struct PanZoomCompositor {
    source: image::RgbaImage,
    trajectory: Trajectory,
}

impl PanZoomCompositor {
    pub fn new(source: image::RgbaImage, trajectory: Trajectory) -> Self {
        Self { source, trajectory }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn render_frame(&self, index: u64) -> ReelResult<FrameRGBA> {
        if index >= self.trajectory.frame_count {
            return Err(ReelError::render(format!(
                "pan-zoom frame {index} out of range (scene has {})",
                self.trajectory.frame_count
            )));
        }
        crop_resize(
            &self.source,
            self.trajectory.rect_for_frame(index),
            self.trajectory.canvas,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/panzoom/compositor.rs"]
mod tests;
