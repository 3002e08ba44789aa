//! Sketchreel turns still images, an optional background track and timed captions into short
//! vertical-first videos.
//!
//! Two scene treatments are available:
//!
//! - pencil reveal: a zig-zag pencil stroke uncovers each image over a line-art rendition
//! - pan-zoom: an eased crop that zooms and pans across each image
//!
//! The entry point is [`Engine`]: validate a [`RenderRequest`] into a [`ResolvedRequest`], then
//! render it to an MP4 (or into any [`FrameSink`]).
#![forbid(unsafe_code)]

mod foundation;

/// Easing curves.
pub mod animation;
/// Ordered scene concatenation, boundary policy and caption burn-in.
pub mod assemble;
/// Source resolution, download and decoding.
pub mod assets;
/// Background audio decode and mixing.
pub mod audio;
/// Caption tracks and their overlay.
pub mod captions;
/// Render configuration and output presets.
pub mod config;
/// Encoding sinks.
pub mod encode;
/// One render invocation end to end.
pub mod engine;
/// Pan-zoom mode.
pub mod panzoom;
/// Artifact naming and upload.
pub mod publish;
/// Progress events.
pub mod report;
/// Request schema and validation.
pub mod request;
/// Pencil-reveal mode.
pub mod reveal;
/// Per-image scene model.
pub mod scene;

pub use crate::foundation::core::{Canvas, CropRect, Fps, FrameIndex, FrameRGBA, Point, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult, Stage};

pub use crate::config::{AspectRatio, BoundaryPolicy, Quality, RenderConfig, VideoSpec};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::engine::{CursorChoice, Engine, RenderOutcome};
pub use crate::request::{MediaOptions, RenderRequest, ResolvedRequest};
pub use crate::scene::RenderMode;
