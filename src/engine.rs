//! Composition root for one render invocation: prefetch, build scenes, assemble, publish.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assemble::{Assembler, AssemblyStats};
use crate::assets::decode::{DefaultImageDecoder, ImageDecoder, decode_file};
use crate::assets::fetch::{Fetcher, HttpFetcher};
use crate::assets::workspace::RenderWorkspace;
use crate::audio::decode::{AudioPcm, decode_audio_f32_stereo};
use crate::audio::mix::{MixParams, mix_background, write_f32le_file};
use crate::config::RenderConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInputConfig, FrameSink};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult, Stage};
use crate::publish::Publisher;
use crate::report::{RenderEvent, Reporter, TracingReporter};
use crate::request::ResolvedRequest;
use crate::reveal::compositor::RevealSetup;
use crate::reveal::cursor::Cursor;
use crate::reveal::sketch::SketchParams;
use crate::scene::{RenderMode, ResolvedImage, Scene, SceneBuilder, SceneMode};

/// Cursor drawn at the stroke head in reveal mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CursorChoice {
    /// Built-in pencil.
    #[default]
    Procedural,
    /// Image file scaled to the configured cursor size.
    File(PathBuf),
    /// No cursor.
    Hidden,
}

/// Result of a successful render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutcome {
    pub path: PathBuf,
    pub canvas: Canvas,
    pub scenes: usize,
    pub frames: u64,
    pub seconds: f64,
    /// Public URL when a publisher was configured and succeeded.
    pub url: Option<String>,
    /// Publisher failure; the local artifact is still valid.
    pub publish_error: Option<String>,
}

struct Prefetched {
    images: Vec<ResolvedImage>,
    audio: Option<(AudioPcm, String)>,
}

pub struct Engine {
    config: RenderConfig,
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<dyn ImageDecoder>,
    publisher: Option<Arc<dyn Publisher>>,
    reporter: Arc<dyn Reporter>,
    cursor: CursorChoice,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("publish", &self.publisher.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with HTTP fetching, the default decoder, tracing reports and no publisher.
    pub fn new(config: RenderConfig) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fetcher: Arc::new(HttpFetcher::new()?),
            decoder: Arc::new(DefaultImageDecoder),
            publisher: None,
            reporter: Arc::new(TracingReporter),
            cursor: CursorChoice::default(),
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_publisher(mut self, publisher: Option<Arc<dyn Publisher>>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorChoice) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `request` to an MP4 at `out`, then publish it when a publisher is set.
    ///
    /// Any failure before the encoder finishes leaves no file at `out`. A publish failure is
    /// reported and recorded in the outcome; it does not fail the render.
    #[tracing::instrument(level = "info", skip_all, fields(mode = mode.label(), out = %out.display()))]
    pub fn render(
        &self,
        request: &ResolvedRequest,
        mode: RenderMode,
        out: &Path,
    ) -> ReelResult<RenderOutcome> {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out));
        let stats = self.render_to_sink(request, mode, &mut sink)?;
        self.reporter.report(&RenderEvent::Encoded {
            path: out.to_path_buf(),
            frames: stats.frames,
        });

        let mut outcome = RenderOutcome {
            path: out.to_path_buf(),
            canvas: request.video.resolve(),
            scenes: stats.scenes,
            frames: stats.frames,
            seconds: request.video.fps.frames_to_secs(stats.frames),
            url: None,
            publish_error: None,
        };
        if let Some(publisher) = &self.publisher {
            match publisher.publish(out) {
                Ok(url) => {
                    self.reporter
                        .report(&RenderEvent::Published { url: url.clone() });
                    outcome.url = Some(url);
                }
                Err(e) => {
                    let message = e.to_string();
                    self.reporter.report(&RenderEvent::PublishFailed {
                        message: message.clone(),
                    });
                    outcome.publish_error = Some(message);
                }
            }
        }
        Ok(outcome)
    }

    /// Run prefetch, scene building and assembly into an arbitrary sink.
    ///
    /// The invocation's temporary workspace is removed before this returns, on every path.
    pub fn render_to_sink(
        &self,
        request: &ResolvedRequest,
        mode: RenderMode,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<AssemblyStats> {
        if request.images.is_empty() {
            return Err(ReelError::input("request has no images"));
        }
        let workspace = RenderWorkspace::new()?;
        self.reporter.report(&RenderEvent::RequestValidated {
            images: request.images.len(),
            total_seconds: request.total_seconds(),
        });

        let canvas = request.video.resolve();
        let scene_mode = self.scene_mode(mode, canvas)?;
        let prefetched = self.prefetch(request, &workspace)?;
        let scenes = self.build_scenes(request, prefetched.images, &scene_mode, canvas)?;

        let fps = request.video.fps;
        let total_frames = Assembler::total_frames(&scenes);
        let audio_cfg = self.mix_audio(request, prefetched.audio, total_frames, &workspace)?;

        let mut assembler = Assembler::new(canvas, fps)
            .with_boundary(self.config.boundary)
            .with_caption_style(self.config.captions.clone());
        if self.config.threading.parallel {
            assembler = assembler.with_parallel(self.config.threading, workspace.spool()?);
        }
        assembler.assemble(
            scenes,
            request.captions.as_ref(),
            Some(audio_cfg),
            sink,
            self.reporter.as_ref(),
        )
    }

    fn scene_mode(&self, mode: RenderMode, canvas: Canvas) -> ReelResult<SceneMode> {
        match mode {
            RenderMode::PanZoom => Ok(SceneMode::PanZoom(self.config.pan_zoom)),
            RenderMode::Reveal => {
                let size = self.config.cursor_size(canvas);
                let cursor = match &self.cursor {
                    CursorChoice::Procedural => Some(Cursor::procedural(size)?),
                    CursorChoice::File(path) => {
                        Some(Cursor::load(path, size).map_err(|e| match e {
                            ReelError::Other(inner) => {
                                ReelError::input(format!("cursor: {inner:#}"))
                            }
                            other => other,
                        })?)
                    }
                    CursorChoice::Hidden => None,
                };
                Ok(SceneMode::Reveal(RevealSetup {
                    params: self.config.reveal_params(canvas),
                    sketch: SketchParams {
                        edge_gain: self.config.sketch_edge_gain,
                        blur_sigma: self.config.sketch_blur_sigma,
                        shade: self.config.sketch_shade,
                    },
                    cursor: cursor.map(Arc::new),
                    cursor_fade_in: self.config.cursor_fade_in_frames,
                    cursor_fade_out: self.config.cursor_fade_out_frames,
                }))
            }
        }
    }

    /// Resolve and decode every source before any frame is produced.
    #[tracing::instrument(level = "info", skip_all, fields(images = request.images.len()))]
    fn prefetch(&self, request: &ResolvedRequest, workspace: &RenderWorkspace) -> ReelResult<Prefetched> {
        let downloads = workspace.downloads()?;
        let mut files = Vec::with_capacity(request.images.len());
        for (i, spec) in request.images.iter().enumerate() {
            let fetched = self
                .fetcher
                .fetch(&spec.source, &downloads)
                .map_err(|e| e.in_scene(i, Stage::Prefetch))?;
            self.reporter.report(&RenderEvent::AssetFetched {
                label: format!("image {i}"),
                source: spec.source.to_string(),
                bytes: fetched.bytes,
            });
            files.push(fetched.path);
        }

        let audio = match &request.audio {
            Some(spec) => {
                let fetched = self
                    .fetcher
                    .fetch(&spec.source, &downloads)
                    .map_err(|e| e.for_asset("audio"))?;
                self.reporter.report(&RenderEvent::AssetFetched {
                    label: "audio".to_string(),
                    source: spec.source.to_string(),
                    bytes: fetched.bytes,
                });
                let pcm = decode_audio_f32_stereo(&fetched.path, self.config.audio_sample_rate)
                    .map_err(|e| e.for_asset("audio"))?;
                Some((pcm, spec.source.to_string()))
            }
            None => None,
        };

        let images = request
            .images
            .iter()
            .zip(&files)
            .enumerate()
            .map(|(i, (spec, path))| {
                let image = decode_file(self.decoder.as_ref(), path)
                    .map_err(|e| e.in_scene(i, Stage::Decode))?;
                Ok(ResolvedImage {
                    image,
                    seconds: spec.seconds,
                    direction: spec.direction,
                })
            })
            .collect::<ReelResult<Vec<_>>>()?;
        Ok(Prefetched { images, audio })
    }

    fn build_scenes(
        &self,
        request: &ResolvedRequest,
        images: Vec<ResolvedImage>,
        mode: &SceneMode,
        canvas: Canvas,
    ) -> ReelResult<Vec<Scene>> {
        let builder = SceneBuilder::new(canvas, request.video.fps, self.config.background);
        images
            .into_iter()
            .enumerate()
            .map(|(i, image)| {
                let scene = builder.build(i, image, mode)?;
                self.reporter.report(&RenderEvent::SceneBuilt {
                    index: i,
                    mode: scene.mode().label(),
                    frames: scene.frame_count(),
                });
                Ok(scene)
            })
            .collect()
    }

    fn mix_audio(
        &self,
        request: &ResolvedRequest,
        pcm: Option<(AudioPcm, String)>,
        total_frames: u64,
        workspace: &RenderWorkspace,
    ) -> ReelResult<AudioInputConfig> {
        let sample_rate = self.config.audio_sample_rate;
        let params = MixParams {
            volume: request.audio.as_ref().map_or(1.0, |a| a.volume),
            looped: request.audio.as_ref().is_none_or(|a| a.looped),
            fade_out_secs: self.config.audio_fade_out_secs,
        };
        let (pcm, source) = match pcm {
            Some((pcm, source)) => (Some(pcm), Some(source)),
            None => (None, None),
        };
        let mix = mix_background(pcm.as_ref(), total_frames, request.video.fps, sample_rate, &params)?;
        let path = workspace.audio_mix_path();
        write_f32le_file(&mix.interleaved_f32, &path)?;
        self.reporter.report(&RenderEvent::AudioMixed {
            seconds: mix.duration_secs(),
            source,
        });
        Ok(AudioInputConfig {
            path,
            sample_rate,
            channels: mix.channels,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
