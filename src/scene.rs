//! Scene Builder: one resolved image plus its duration and mode, normalized to the canvas.

use crate::config::PanZoomParams;
use crate::foundation::core::{Canvas, Fps, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult, Stage};
use crate::panzoom::compositor::PanZoomCompositor;
use crate::panzoom::planner::{PanDirection, plan_trajectory};
use crate::reveal::compositor::{RevealCompositor, RevealSetup, RevealTiming};

/// Decoded image plus the per-image fields of its request entry.
#[derive(Clone, Debug)]
pub struct ResolvedImage {
    pub image: image::RgbaImage,
    pub seconds: f64,
    pub direction: Option<PanDirection>,
}

/// Rendering treatment for a scene, carrying only what its compositor needs.
#[derive(Clone, Debug)]
pub enum SceneMode {
    Reveal(RevealSetup),
    PanZoom(PanZoomParams),
}

/// Mode selector used by callers that build the mode payload from config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Reveal,
    PanZoom,
}

impl RenderMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Reveal => "pencil-reveal",
            Self::PanZoom => "pan-zoom",
        }
    }
}

enum Compositor {
    Reveal(RevealCompositor),
    PanZoom(PanZoomCompositor),
}

/// One image's immutable frame source.
pub struct Scene {
    index: usize,
    canvas: Canvas,
    frame_count: u64,
    compositor: Compositor,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("index", &self.index)
            .field("canvas", &self.canvas)
            .field("frame_count", &self.frame_count)
            .field("mode", &self.mode().label())
            .finish()
    }
}

impl Scene {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn mode(&self) -> RenderMode {
        match self.compositor {
            Compositor::Reveal(_) => RenderMode::Reveal,
            Compositor::PanZoom(_) => RenderMode::PanZoom,
        }
    }

    /// Consume the scene into its lazy frame sequence.
    pub fn frames(self) -> SceneFrames {
        SceneFrames {
            scene: self,
            next: 0,
        }
    }
}

/// Lazy, finite frame sequence of one scene. Restarting requires rebuilding the scene.
pub struct SceneFrames {
    scene: Scene,
    next: u64,
}

impl SceneFrames {
    pub fn scene_index(&self) -> usize {
        self.scene.index
    }

    pub fn remaining(&self) -> u64 {
        self.scene.frame_count - self.next
    }
}

impl Iterator for SceneFrames {
    type Item = ReelResult<FrameRGBA>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.scene.frame_count {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let frame = match &mut self.scene.compositor {
            Compositor::Reveal(c) => c.render_frame(i),
            Compositor::PanZoom(c) => c.render_frame(i),
        };
        Some(frame.map_err(|e| e.in_scene(self.scene.index, Stage::Composite)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SceneFrames {}

/// Normalizes resolved images into scenes on one canvas at one frame rate.
#[derive(Clone, Copy, Debug)]
pub struct SceneBuilder {
    canvas: Canvas,
    fps: Fps,
    background: [u8; 3],
}

impl SceneBuilder {
    pub fn new(canvas: Canvas, fps: Fps, background: [u8; 3]) -> Self {
        Self {
            canvas,
            fps,
            background,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// `round(seconds * fps)`.
    pub fn frame_count(&self, seconds: f64) -> u64 {
        self.fps.secs_to_frames_round(seconds)
    }

    #[tracing::instrument(level = "debug", skip(self, image, mode), fields(seconds = image.seconds))]
    pub fn build(&self, index: usize, image: ResolvedImage, mode: &SceneMode) -> ReelResult<Scene> {
        self.build_inner(index, image, mode)
            .map_err(|e| e.in_scene(index, Stage::Plan))
    }

    fn build_inner(&self, index: usize, image: ResolvedImage, mode: &SceneMode) -> ReelResult<Scene> {
        if !(image.seconds.is_finite() && image.seconds > 0.0) {
            return Err(ReelError::input(format!(
                "seconds must be > 0, got {}",
                image.seconds
            )));
        }
        let (w, h) = image.image.dimensions();
        if w == 0 || h == 0 {
            return Err(ReelError::render("image has no pixels"));
        }
        let frame_count = self.frame_count(image.seconds);
        let flat = flatten_alpha(image.image, self.background);

        let compositor = match mode {
            SceneMode::Reveal(setup) => {
                let fitted = letterbox(&flat, self.canvas, self.background);
                let timing = RevealTiming::new(
                    frame_count,
                    image.seconds,
                    self.fps.as_f64(),
                    setup.params.reveal_fraction,
                );
                Compositor::Reveal(RevealCompositor::new(&fitted, setup, timing)?)
            }
            SceneMode::PanZoom(params) => {
                let source = limit_source(flat, self.canvas);
                let direction = image
                    .direction
                    .unwrap_or_else(|| PanDirection::alternating(index));
                let (sw, sh) = source.dimensions();
                let trajectory =
                    plan_trajectory(sw, sh, self.canvas, params, direction, frame_count)?;
                Compositor::PanZoom(PanZoomCompositor::new(source, trajectory))
            }
        };
        tracing::debug!(index, frame_count, "scene built");
        Ok(Scene {
            index,
            canvas: self.canvas,
            frame_count,
            compositor,
        })
    }
}

/// Composite straight-alpha pixels onto an opaque background.
pub fn flatten_alpha(mut img: image::RgbaImage, background: [u8; 3]) -> image::RgbaImage {
    for px in img.pixels_mut() {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in 0..3 {
            let v = u16::from(px[c]) * a + u16::from(background[c]) * (255 - a);
            px[c] = ((v + 127) / 255) as u8;
        }
        px[3] = 255;
    }
    img
}

/// Fit `img` inside `canvas` keeping its aspect, centered on `background`.
pub fn letterbox(img: &image::RgbaImage, canvas: Canvas, background: [u8; 3]) -> image::RgbaImage {
    let (w, h) = img.dimensions();
    let scale = (f64::from(canvas.width) / f64::from(w)).min(f64::from(canvas.height) / f64::from(h));
    let nw = ((f64::from(w) * scale).floor() as u32).clamp(1, canvas.width);
    let nh = ((f64::from(h) * scale).floor() as u32).clamp(1, canvas.height);
    let resized = if (nw, nh) == (w, h) {
        img.clone()
    } else {
        image::imageops::resize(img, nw, nh, image::imageops::FilterType::Lanczos3)
    };
    let [r, g, b] = background;
    let mut out = image::RgbaImage::from_pixel(canvas.width, canvas.height, image::Rgba([r, g, b, 255]));
    image::imageops::replace(
        &mut out,
        &resized,
        i64::from((canvas.width - nw) / 2),
        i64::from((canvas.height - nh) / 2),
    );
    out
}

/// Downscale sources far larger than the canvas so bilinear crops do not alias.
fn limit_source(img: image::RgbaImage, canvas: Canvas) -> image::RgbaImage {
    let (w, h) = img.dimensions();
    let factor = (f64::from(w) / f64::from(canvas.width))
        .min(f64::from(h) / f64::from(canvas.height));
    if factor <= 2.0 {
        return img;
    }
    let s = 2.0 / factor;
    let nw = ((f64::from(w) * s).round() as u32).max(1);
    let nh = ((f64::from(h) * s).round() as u32).max(1);
    image::imageops::resize(&img, nw, nh, image::imageops::FilterType::Triangle)
}

#[cfg(test)]
#[path = "../tests/unit/scene.rs"]
mod tests;
