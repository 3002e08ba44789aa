use crate::animation::ease::Ease;
use crate::config::PanZoomParams;
use crate::foundation::core::{Canvas, CropRect};
use crate::foundation::error::{ReelError, ReelResult};

/// Direction the view travels from at the start of a pan-zoom scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PanDirection {
    pub fn from_label(label: &str) -> ReelResult<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(ReelError::input(format!(
                "invalid pan direction '{other}', expected up, down, left or right"
            ))),
        }
    }

    /// Default for scene `index` when none is given: up, down, up, ...
    pub fn alternating(index: usize) -> Self {
        if index % 2 == 0 { Self::Up } else { Self::Down }
    }

    /// Start offset sign applied to `(x, y)`.
    fn offset_sign(self) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Eased crop-rectangle trajectory over one scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trajectory {
    pub start: CropRect,
    pub end: CropRect,
    pub ease: Ease,
    pub frame_count: u64,
    pub canvas: Canvas,
    /// Pan distance actually used, in source pixels.
    pub pan_distance: f64,
}

impl Trajectory {
    /// Crop rectangle at progress `p`.
    pub fn rect_at(&self, p: f64) -> CropRect {
        self.start.lerp(self.end, self.ease.apply(p))
    }

    /// Progress of frame `index`: `index / (n - 1)`, `0` for single-frame scenes.
    pub fn progress_for_frame(&self, index: u64) -> f64 {
        if self.frame_count <= 1 {
            0.0
        } else {
            (index as f64 / (self.frame_count - 1) as f64).clamp(0.0, 1.0)
        }
    }

    pub fn rect_for_frame(&self, index: u64) -> CropRect {
        self.rect_at(self.progress_for_frame(index))
    }

    /// Source-to-canvas scale factor at progress `p`.
    pub fn scale_at(&self, p: f64) -> f64 {
        f64::from(self.canvas.width) / self.rect_at(p).w
    }
}

/// Largest canvas-aspect rectangle centered in a `src_w x src_h` source.
pub fn cover_rect(src_w: f64, src_h: f64, canvas: Canvas) -> CropRect {
    let aspect = canvas.aspect();
    let (w, h) = if src_w / src_h > aspect {
        (src_h * aspect, src_h)
    } else {
        (src_w, src_w / aspect)
    };
    CropRect {
        x: (src_w - w) * 0.5,
        y: (src_h - h) * 0.5,
        w,
        h,
    }
}

fn zoomed(base: CropRect, zoom: f64) -> CropRect {
    let w = base.w / zoom;
    let h = base.h / zoom;
    let c = base.center();
    CropRect {
        x: c.x - w * 0.5,
        y: c.y - h * 0.5,
        w,
        h,
    }
}

/// Plan a pan-zoom trajectory for one source image.
///
/// Both endpoints are canvas-aspect rectangles inside the source. The start rectangle is offset
/// against `direction` by `pan_ratio` of its size; the end rectangle is centered. When the
/// source leaves less room than requested the pan is shortened, never rejected.
#[tracing::instrument(level = "debug", skip(params))]
pub fn plan_trajectory(
    src_w: u32,
    src_h: u32,
    canvas: Canvas,
    params: &PanZoomParams,
    direction: PanDirection,
    frame_count: u64,
) -> ReelResult<Trajectory> {
    if src_w == 0 || src_h == 0 {
        return Err(ReelError::render("cannot plan a crop for an empty image"));
    }
    if canvas.width == 0 || canvas.height == 0 {
        return Err(ReelError::render("cannot plan a crop for an empty canvas"));
    }
    if !(params.start_zoom >= 1.0 && params.end_zoom >= 1.0)
        || !params.start_zoom.is_finite()
        || !params.end_zoom.is_finite()
    {
        return Err(ReelError::render(format!(
            "crop rectangle cannot be computed for zoom {} -> {}",
            params.start_zoom, params.end_zoom
        )));
    }
    let (sw, sh) = (f64::from(src_w), f64::from(src_h));
    let base = cover_rect(sw, sh, canvas);
    let mut start = zoomed(base, params.start_zoom);
    let end = zoomed(base, params.end_zoom);

    let (dim, room) = if direction.is_vertical() {
        (start.h, start.y.min(sh - start.y - start.h))
    } else {
        (start.w, start.x.min(sw - start.x - start.w))
    };
    let requested = dim * params.pan_ratio.max(0.0);
    let room = room.max(0.0);
    let distance = requested.min(room);
    if distance + 1e-9 < requested {
        tracing::warn!(
            requested = requested,
            available = room,
            "pan distance shortened to fit the source"
        );
    }
    let (sx, sy) = direction.offset_sign();
    start.x += sx * distance;
    start.y += sy * distance;

    Ok(Trajectory {
        start,
        end,
        ease: params.ease,
        frame_count,
        canvas,
        pan_distance: distance,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/panzoom/planner.rs"]
mod tests;
