use std::sync::Arc;

use crate::config::RevealParams;
use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult};
use crate::reveal::cursor::{Cursor, fade_alpha, tilt_angle};
use crate::reveal::mask::RevealMask;
use crate::reveal::path::RevealPath;
use crate::reveal::sketch::{SketchParams, pencil_sketch};

/// Everything the reveal compositor needs besides the image itself.
#[derive(Clone, Debug)]
pub struct RevealSetup {
    pub params: RevealParams,
    pub sketch: SketchParams,
    /// `None` draws no cursor.
    pub cursor: Option<Arc<Cursor>>,
    pub cursor_fade_in: u32,
    pub cursor_fade_out: u32,
}

/// Frame split between the revealing and holding phases of one scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealTiming {
    pub frame_count: u64,
    /// Frames `0..reveal_frames` are revealing.
    pub reveal_frames: u64,
    /// `r * duration` expressed in frames (not rounded).
    pub reveal_span: f64,
}

impl RevealTiming {
    pub fn new(frame_count: u64, seconds: f64, fps: f64, reveal_fraction: f64) -> Self {
        let span = reveal_fraction * seconds * fps;
        let reveal_frames = ((span - 1e-9).ceil().max(0.0) as u64).min(frame_count);
        Self {
            frame_count,
            reveal_frames,
            reveal_span: span,
        }
    }

    pub fn state_at(&self, index: u64) -> RevealState {
        if index < self.reveal_frames && self.reveal_span > 0.0 {
            RevealState::Revealing {
                p: (index as f64 / self.reveal_span).clamp(0.0, 1.0),
            }
        } else {
            RevealState::Holding
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RevealState {
    /// Stroke at progress `p`.
    Revealing { p: f64 },
    /// Fully revealed source, no overlay.
    Holding,
}

/// Produces the frames of one pencil-reveal scene, in order.
pub struct RevealCompositor {
    canvas: Canvas,
    source: FrameRGBA,
    sketch: image::RgbaImage,
    path: RevealPath,
    mask: RevealMask,
    cursor: Option<Arc<Cursor>>,
    fade: (u32, u32),
    timing: RevealTiming,
    next: u64,
}

impl RevealCompositor {
    /// `image` must already be normalized to the output canvas.
    pub fn new(image: &image::RgbaImage, setup: &RevealSetup, timing: RevealTiming) -> ReelResult<Self> {
        let (width, height) = image.dimensions();
        let canvas = Canvas::new(width, height)?;
        let path = RevealPath::generate(canvas, &setup.params)?;
        let sketch = pencil_sketch(image, &setup.sketch)?;
        Ok(Self {
            canvas,
            source: FrameRGBA::from_image(image),
            sketch,
            path,
            mask: RevealMask::new(width, height),
            cursor: setup.cursor.clone(),
            fade: (setup.cursor_fade_in, setup.cursor_fade_out),
            timing,
            next: 0,
        })
    }

    pub fn timing(&self) -> RevealTiming {
        self.timing
    }

    pub fn path(&self) -> &RevealPath {
        &self.path
    }

    /// Render frame `index`. Indices must not go backwards: the mask only accumulates.
    pub fn render_frame(&mut self, index: u64) -> ReelResult<FrameRGBA> {
        if index < self.next {
            return Err(ReelError::render(format!(
                "reveal frames must be requested in order (got {index} after {})",
                self.next - 1
            )));
        }
        if index >= self.timing.frame_count {
            return Err(ReelError::render(format!(
                "reveal frame {index} out of range (scene has {})",
                self.timing.frame_count
            )));
        }
        self.next = index + 1;

        let p = match self.timing.state_at(index) {
            RevealState::Holding => return Ok(self.source.clone()),
            RevealState::Revealing { p } => p,
        };
        self.mask.advance_to(&self.path, p);

        let mut frame = FrameRGBA::filled(self.canvas, [0, 0, 0, 255]);
        let sketch = self.sketch.as_raw();
        for (((dst, src), sk), &m) in frame
            .data
            .chunks_exact_mut(4)
            .zip(self.source.data.chunks_exact(4))
            .zip(sketch.chunks_exact(4))
            .zip(self.mask.as_bytes())
        {
            dst.copy_from_slice(if m != 0 { src } else { sk });
        }

        if let Some(cursor) = &self.cursor {
            let head = self.path.point_at(p);
            let angle = tilt_angle(self.path.sweep_dir(), self.path.tangent_at(p));
            let alpha = fade_alpha(index, self.timing.reveal_frames, self.fade.0, self.fade.1);
            cursor.stamp(&mut frame, head, angle, alpha);
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/compositor.rs"]
mod tests;
