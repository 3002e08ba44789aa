use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Affine, Point, Vec2};

/// Absolute 0-based frame index in output timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::input("fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::input("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate.
    pub fn integer(fps: u32) -> ReelResult<Self> {
        Self::new(fps, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Frame count for a scene of `secs` seconds: `round(secs * fps)`.
    ///
    /// Halves round up. The small bias absorbs float noise such as `0.35 * 10 = 3.4999...`, so
    /// equal durations always produce equal counts.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        let exact = secs * f64::from(self.num) / f64::from(self.den);
        (exact + 0.5 + 1e-9).floor().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::input(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_len(self) -> usize {
        self.pixel_count() * 4
    }
}

/// Axis-aligned crop rectangle in source-pixel coordinates (sub-pixel precision).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CropRect {
    pub fn center(self) -> Point {
        Point::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// `true` if the rectangle lies inside `[0, width] x [0, height]` (with `eps` slack).
    pub fn is_within(self, width: f64, height: f64, eps: f64) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && self.x >= -eps
            && self.y >= -eps
            && self.x + self.w <= width + eps
            && self.y + self.h <= height + eps
    }

    /// Componentwise linear interpolation; exact at `t = 0` and `t = 1`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let s = 1.0 - t;
        Self {
            x: self.x * s + other.x * t,
            y: self.y * s + other.y * t,
            w: self.w * s + other.w * t,
            h: self.h * s + other.h * t,
        }
    }
}

/// One opaque output frame in straight (non-premultiplied) RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Frame filled with a single color.
    pub fn filled(canvas: Canvas, rgba: [u8; 4]) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: rgba.repeat(canvas.pixel_count()),
        }
    }

    pub fn from_image(img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.as_raw().clone(),
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
