//! Preset tables and the immutable render configuration.
//!
//! A [`RenderConfig`] is built once per invocation and handed to every component constructor.
//! Nothing in the crate reads canvas size, fps or stroke parameters from ambient state.

use std::path::Path;

use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::request::read_input_file;

/// Closed set of output aspect ratios.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    Landscape16x9,
    #[default]
    Portrait9x16,
    Square1x1,
    Portrait4x5,
    Classic4x3,
}

impl AspectRatio {
    pub const ALL: [Self; 5] = [
        Self::Landscape16x9,
        Self::Portrait9x16,
        Self::Square1x1,
        Self::Portrait4x5,
        Self::Classic4x3,
    ];

    pub fn from_label(label: &str) -> ReelResult<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.label() == label.trim())
            .ok_or_else(|| {
                ReelError::input(format!(
                    "invalid aspect ratio '{label}', expected one of {}",
                    Self::ALL.map(|r| r.label()).join(", ")
                ))
            })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Landscape16x9 => "16:9",
            Self::Portrait9x16 => "9:16",
            Self::Square1x1 => "1:1",
            Self::Portrait4x5 => "4:5",
            Self::Classic4x3 => "4:3",
        }
    }

    /// `(width, height)` ratio terms.
    pub fn terms(self) -> (u32, u32) {
        match self {
            Self::Landscape16x9 => (16, 9),
            Self::Portrait9x16 => (9, 16),
            Self::Square1x1 => (1, 1),
            Self::Portrait4x5 => (4, 5),
            Self::Classic4x3 => (4, 3),
        }
    }
}

/// Closed set of output qualities, each naming the output height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Quality {
    P480,
    #[default]
    P720,
    P1080,
    P1440,
    P2160,
}

impl Quality {
    pub const ALL: [Self; 5] = [Self::P480, Self::P720, Self::P1080, Self::P1440, Self::P2160];

    pub fn from_label(label: &str) -> ReelResult<Self> {
        Self::ALL
            .into_iter()
            .find(|q| q.label() == label.trim())
            .ok_or_else(|| {
                ReelError::input(format!(
                    "invalid quality '{label}', expected one of {}",
                    Self::ALL.map(|q| q.label()).join(", ")
                ))
            })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::P1440 => "1440p",
            Self::P2160 => "2160p",
        }
    }

    pub fn height(self) -> u32 {
        match self {
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
            Self::P1440 => 1440,
            Self::P2160 => 2160,
        }
    }
}

/// Output format: preset ratio and quality plus a fixed frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoSpec {
    pub ratio: AspectRatio,
    pub quality: Quality,
    pub fps: Fps,
}

impl VideoSpec {
    /// Resolve the preset pair into a pixel canvas.
    ///
    /// Height comes from the quality preset; width is `height * ratio` rounded down to an even
    /// number so the canvas is always encodable as yuv420p.
    pub fn resolve(self) -> Canvas {
        let (rw, rh) = self.ratio.terms();
        let height = self.quality.height();
        let width = (u64::from(height) * u64::from(rw) / u64::from(rh)) as u32;
        Canvas {
            width: (width & !1).max(2),
            height,
        }
    }
}

/// Stroke and timing parameters for the pencil-reveal mode, resolved for one canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealParams {
    /// Portion of each scene spent revealing, in `(0, 1]`.
    pub reveal_fraction: f64,
    /// Zig-zag offset from the sweep axis, in pixels.
    pub amplitude: f64,
    /// Sweep direction, degrees from the +x axis (y down).
    pub angle_deg: f64,
    /// Number of straight zig-zag legs.
    pub segments: u32,
    /// Radius of the revealed stroke around the path, in pixels.
    pub brush_radius: f64,
}

/// Pan-zoom trajectory parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanZoomParams {
    /// Zoom at the first frame (1.0 = the full cover rectangle).
    pub start_zoom: f64,
    /// Zoom at the last frame.
    pub end_zoom: f64,
    /// Pan travel as a fraction of the crop dimension along the pan axis.
    pub pan_ratio: f64,
    pub ease: Ease,
}

impl Default for PanZoomParams {
    fn default() -> Self {
        Self {
            start_zoom: 1.1,
            end_zoom: 1.1,
            pan_ratio: 0.15,
            ease: Ease::InOutCubic,
        }
    }
}

/// How caption text is picked for a timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    /// Longest character prefix whose end time has passed.
    #[default]
    Prefix,
    /// The single word being spoken.
    Word,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    pub mode: CaptionMode,
    /// Font size as a fraction of canvas height.
    pub font_size_ratio: f64,
    /// Vertical position of the caption baseline block, as a fraction of canvas height.
    pub y_ratio: f64,
    /// Usable text width as a fraction of canvas width.
    pub max_width_ratio: f64,
    pub max_lines: usize,
    pub font_family: String,
    pub color: String,
    pub stroke_color: String,
    pub highlight_color: String,
    /// Extra font directory loaded next to the system fonts.
    pub font_dir: Option<std::path::PathBuf>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            mode: CaptionMode::Prefix,
            font_size_ratio: 0.045,
            y_ratio: 0.78,
            max_width_ratio: 0.86,
            max_lines: 2,
            font_family: "sans-serif".to_string(),
            color: "#FFFFFF".to_string(),
            stroke_color: "#000000".to_string(),
            highlight_color: "#FFD400".to_string(),
            font_dir: None,
        }
    }
}

/// Transition applied where one scene ends and the next begins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Every frame of every scene is emitted exactly once.
    #[default]
    HardCut,
    /// The first `frames` frames of a scene are blended from the previous scene's last frame.
    /// Total frame count is unchanged.
    Crossfade { frames: u32 },
}

/// Parallel scene rendering controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderThreading {
    pub parallel: bool,
    /// Worker count; `0` uses rayon's default.
    pub threads: usize,
    /// Scenes rendered ahead of the encoder at once; `0` uses the worker count. Bounds the
    /// spool to this many scenes of raw frames.
    pub chunk_scenes: usize,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
            chunk_scenes: 0,
        }
    }
}

/// Immutable configuration threaded through one render invocation.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub fps: u32,
    pub reveal_fraction: f64,
    /// Zig-zag amplitude in pixels at the reference width.
    pub zigzag_amplitude: f64,
    pub diagonal_angle_deg: f64,
    pub zigzag_segments: u32,
    /// Stroke radius as a fraction of the canvas' shorter side.
    pub brush_radius_ratio: f64,
    /// Scale amplitude and cursor with the canvas' shorter side.
    pub scale_with_canvas: bool,
    pub cursor_size: Option<u32>,
    pub cursor_fade_in_frames: u32,
    pub cursor_fade_out_frames: u32,
    pub sketch_edge_gain: f32,
    pub sketch_blur_sigma: f32,
    pub sketch_shade: f32,
    pub background: [u8; 3],
    pub pan_zoom: PanZoomParams,
    pub captions: CaptionStyle,
    pub boundary: BoundaryPolicy,
    pub default_volume: f64,
    pub audio_fade_out_secs: f64,
    pub audio_sample_rate: u32,
    pub threading: RenderThreading,
    pub output_dir: std::path::PathBuf,
}

/// Shorter side of the 9:16 @ 720p canvas the stroke constants were tuned on.
pub const REFERENCE_SHORT_SIDE: f64 = 405.0;

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            reveal_fraction: 0.7,
            zigzag_amplitude: 350.0,
            diagonal_angle_deg: 45.0,
            zigzag_segments: 8,
            brush_radius_ratio: 0.06,
            scale_with_canvas: true,
            cursor_size: None,
            cursor_fade_in_frames: 20,
            cursor_fade_out_frames: 20,
            sketch_edge_gain: 1.6,
            sketch_blur_sigma: 1.0,
            sketch_shade: 0.25,
            background: [255, 255, 255],
            pan_zoom: PanZoomParams::default(),
            captions: CaptionStyle::default(),
            boundary: BoundaryPolicy::HardCut,
            default_volume: 1.0,
            audio_fade_out_secs: 1.0,
            audio_sample_rate: 48_000,
            threading: RenderThreading::default(),
            output_dir: std::path::PathBuf::from("output"),
        }
    }
}

impl RenderConfig {
    /// Parse a (possibly partial) JSON config; absent fields keep their defaults.
    pub fn from_json(text: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| ReelError::input(format!("invalid render config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> ReelResult<Self> {
        Self::from_json(&read_input_file(path, "config")?)
    }

    pub fn validate(&self) -> ReelResult<()> {
        Fps::integer(self.fps)?;
        if !(self.reveal_fraction > 0.0 && self.reveal_fraction <= 1.0) {
            return Err(ReelError::input("reveal_fraction must be in (0, 1]"));
        }
        if self.zigzag_segments == 0 {
            return Err(ReelError::input("zigzag_segments must be >= 1"));
        }
        if !(self.zigzag_amplitude.is_finite() && self.zigzag_amplitude >= 0.0) {
            return Err(ReelError::input("zigzag_amplitude must be >= 0"));
        }
        if !(self.brush_radius_ratio > 0.0 && self.brush_radius_ratio.is_finite()) {
            return Err(ReelError::input("brush_radius_ratio must be > 0"));
        }
        let pz = &self.pan_zoom;
        if !(pz.start_zoom >= 1.0 && pz.end_zoom >= 1.0) {
            return Err(ReelError::input("pan_zoom zoom levels must be >= 1.0"));
        }
        if !(pz.pan_ratio >= 0.0 && pz.pan_ratio < 1.0) {
            return Err(ReelError::input("pan_zoom.pan_ratio must be in [0, 1)"));
        }
        if !pz.ease.is_eased() {
            return Err(ReelError::input(
                "pan_zoom.ease must start and end at rest (in_out_quad, in_out_cubic or smooth_step)",
            ));
        }
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ReelError::input("default_volume must be in [0, 1]"));
        }
        if self.captions.max_lines == 0 {
            return Err(ReelError::input("captions.max_lines must be >= 1"));
        }
        if self.audio_sample_rate == 0 {
            return Err(ReelError::input("audio_sample_rate must be > 0"));
        }
        Ok(())
    }

    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::integer(self.fps)
    }

    fn canvas_scale(&self, canvas: Canvas) -> f64 {
        if self.scale_with_canvas {
            f64::from(canvas.width.min(canvas.height)) / REFERENCE_SHORT_SIDE
        } else {
            1.0
        }
    }

    /// Stroke parameters for `canvas`.
    pub fn reveal_params(&self, canvas: Canvas) -> RevealParams {
        let short = f64::from(canvas.width.min(canvas.height));
        RevealParams {
            reveal_fraction: self.reveal_fraction,
            amplitude: self.zigzag_amplitude * self.canvas_scale(canvas),
            angle_deg: self.diagonal_angle_deg,
            segments: self.zigzag_segments,
            brush_radius: (short * self.brush_radius_ratio).max(2.0),
        }
    }

    /// Cursor edge length for `canvas`: an explicit size wins, otherwise it tracks the
    /// shorter side (350 px at 405 px, quartered, clamped to `[100, 800]`).
    pub fn cursor_size(&self, canvas: Canvas) -> u32 {
        if let Some(size) = self.cursor_size {
            return size.max(1);
        }
        let short = f64::from(canvas.width.min(canvas.height));
        let scaled = (short / REFERENCE_SHORT_SIDE * 350.0).floor();
        ((scaled * 0.25).floor() as u32).clamp(100, 800)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
