//! Frame/Scene Assembler: ordered concatenation of scene frames into one sink.
//!
//! Scenes are emitted strictly in input order with no gaps or duplicated boundary frames. With
//! the parallel option, scenes render concurrently into spool files and are re-joined in order,
//! so the output is identical to the sequential path regardless of completion order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::captions::overlay::CaptionOverlay;
use crate::captions::track::CaptionTrack;
use crate::config::{BoundaryPolicy, CaptionStyle, RenderThreading};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult, Stage};
use crate::foundation::math::crossfade_in_place;
use crate::report::{RenderEvent, Reporter};
use crate::scene::Scene;

/// Counters for one assembly run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssemblyStats {
    pub scenes: usize,
    pub frames: u64,
}

#[derive(Clone, Debug)]
pub struct Assembler {
    canvas: Canvas,
    fps: Fps,
    boundary: BoundaryPolicy,
    caption_style: CaptionStyle,
    threading: RenderThreading,
    spool_dir: Option<PathBuf>,
}

impl Assembler {
    /// Sequential hard-cut assembler with the default caption style.
    pub fn new(canvas: Canvas, fps: Fps) -> Self {
        Self {
            canvas,
            fps,
            boundary: BoundaryPolicy::HardCut,
            caption_style: CaptionStyle::default(),
            threading: RenderThreading {
                parallel: false,
                ..RenderThreading::default()
            },
            spool_dir: None,
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_caption_style(mut self, style: CaptionStyle) -> Self {
        self.caption_style = style;
        self
    }

    /// Render scenes concurrently, spooling raw frames under `spool_dir`.
    pub fn with_parallel(mut self, threading: RenderThreading, spool_dir: impl Into<PathBuf>) -> Self {
        self.threading = threading;
        self.spool_dir = Some(spool_dir.into());
        self
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Sum of every scene's frame count.
    pub fn total_frames(scenes: &[Scene]) -> u64 {
        scenes.iter().map(Scene::frame_count).sum()
    }

    /// Push every frame of `scenes`, in order, into `sink`, burning `captions` at absolute
    /// video time `frame / fps`.
    ///
    /// `sink.end()` is only called after the last frame; on any failure the sink is left
    /// unfinished so no artifact is produced.
    #[tracing::instrument(level = "info", skip_all, fields(scenes = scenes.len()))]
    pub fn assemble(
        &self,
        scenes: Vec<Scene>,
        captions: Option<&CaptionTrack>,
        audio: Option<AudioInputConfig>,
        sink: &mut dyn FrameSink,
        reporter: &dyn Reporter,
    ) -> ReelResult<AssemblyStats> {
        if scenes.is_empty() {
            return Err(ReelError::assembly("nothing to assemble: no scenes"));
        }
        if let Some(bad) = scenes.iter().find(|s| s.canvas() != self.canvas) {
            return Err(ReelError::assembly(format!(
                "scene {} is {}x{}, video is {}x{}",
                bad.index(),
                bad.canvas().width,
                bad.canvas().height,
                self.canvas.width,
                self.canvas.height
            )));
        }
        let total = Self::total_frames(&scenes);
        if total == 0 {
            return Err(ReelError::assembly("video has no frames"));
        }
        let scene_count = scenes.len();

        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
            total_frames: total,
            audio,
        })?;

        let mut emitter = Emitter {
            fps: self.fps,
            boundary: self.boundary,
            captions: captions.map(|t| (t, CaptionOverlay::new(self.canvas, &self.caption_style))),
            sink,
            reporter,
            next: 0,
            total,
            from: None,
            last: None,
        };

        match (&self.spool_dir, self.threading.parallel && scene_count > 1) {
            (Some(dir), true) => self.emit_parallel(scenes, dir, &mut emitter)?,
            _ => {
                for scene in scenes {
                    let (index, len) = (scene.index(), scene.frame_count());
                    for (local, frame) in scene.frames().enumerate() {
                        emitter.push(index, local as u64, len, frame?)?;
                    }
                    emitter.finish_scene(index, len);
                }
            }
        }

        if emitter.next != total {
            return Err(ReelError::assembly(format!(
                "assembled {} frames, expected {total}",
                emitter.next
            )));
        }
        emitter.sink.end()?;
        tracing::info!(frames = total, scenes = scene_count, "assembly finished");
        Ok(AssemblyStats {
            scenes: scene_count,
            frames: total,
        })
    }

    /// Render scenes in chunks of `chunk_scenes` on the pool, then stream each chunk in order.
    ///
    /// A spool file is removed as soon as its frames are pushed, so at most one chunk of raw
    /// frames is on disk at any time.
    fn emit_parallel(&self, scenes: Vec<Scene>, dir: &Path, emitter: &mut Emitter<'_>) -> ReelResult<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ReelError::assembly(format!("create spool dir '{}': {e}", dir.display())))?;
        let threads = (self.threading.threads > 0).then_some(self.threading.threads);
        let pool = build_thread_pool(threads)?;
        let chunk_scenes = match self.threading.chunk_scenes {
            0 => pool.current_num_threads().max(1),
            n => n,
        };
        let reporter = emitter.reporter;

        let mut pending = scenes.into_iter();
        loop {
            let chunk: Vec<Scene> = pending.by_ref().take(chunk_scenes).collect();
            if chunk.is_empty() {
                break;
            }
            let spools: Vec<ReelResult<Spool>> = pool.install(|| {
                chunk
                    .into_par_iter()
                    .map(|scene| spool_scene(scene, dir, reporter))
                    .collect()
            });
            let spools = spools.into_iter().collect::<ReelResult<Vec<_>>>()?;
            for spool in spools {
                self.stream_spool(&spool, emitter)?;
            }
        }
        Ok(())
    }

    fn stream_spool(&self, spool: &Spool, emitter: &mut Emitter<'_>) -> ReelResult<()> {
        let file = File::open(&spool.path).map_err(|e| {
            ReelError::assembly(format!("open spool '{}': {e}", spool.path.display()))
        })?;
        let mut reader = BufReader::new(file);
        let byte_len = self.canvas.byte_len();
        for local in 0..spool.frames {
            let mut data = vec![0u8; byte_len];
            reader.read_exact(&mut data).map_err(|e| {
                ReelError::assembly(format!("read spool of scene {}: {e}", spool.index))
            })?;
            let frame = FrameRGBA {
                width: self.canvas.width,
                height: self.canvas.height,
                data,
            };
            emitter.push(spool.index, local, spool.frames, frame)?;
        }
        emitter.finish_scene(spool.index, spool.frames);
        Ok(())
    }
}

struct Emitter<'a> {
    fps: Fps,
    boundary: BoundaryPolicy,
    captions: Option<(&'a CaptionTrack, CaptionOverlay)>,
    sink: &'a mut dyn FrameSink,
    reporter: &'a dyn Reporter,
    next: u64,
    total: u64,
    /// Last frame of the previous scene, the crossfade origin.
    from: Option<FrameRGBA>,
    /// Last frame of the current scene.
    last: Option<FrameRGBA>,
}

impl Emitter<'_> {
    fn push(&mut self, scene: usize, local: u64, len: u64, mut frame: FrameRGBA) -> ReelResult<()> {
        if let BoundaryPolicy::Crossfade { frames } = self.boundary {
            if local == 0 {
                self.from = self.last.take();
            }
            let k = u64::from(frames).min(len);
            if let Some(from) = &self.from
                && local < k
            {
                let t = (local + 1) as f32 / (k + 1) as f32;
                crossfade_in_place(&mut frame.data, &from.data, 1.0 - t);
            }
            if local + 1 == len {
                self.last = Some(frame.clone());
            }
        }

        if let Some((track, overlay)) = self.captions.as_mut() {
            let t = self.fps.frames_to_secs(self.next);
            overlay
                .apply(&mut frame, track, t)
                .map_err(|e| e.in_scene(scene, Stage::Captions))?;
        }
        self.sink
            .push_frame(FrameIndex(self.next), &frame)
            .map_err(|e| match e {
                ReelError::Render { .. } | ReelError::Other(_) => e.in_scene(scene, Stage::Encode),
                other => other,
            })?;
        self.next += 1;
        Ok(())
    }

    fn finish_scene(&mut self, scene: usize, frames: u64) {
        tracing::debug!(scene, frames, done = self.next, "scene emitted");
        self.reporter.report(&RenderEvent::Progress {
            done: self.next,
            total: self.total,
        });
    }
}

/// Raw frames of one scene on disk, removed on drop.
struct Spool {
    index: usize,
    frames: u64,
    path: PathBuf,
}

impl Drop for Spool {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn spool_scene(scene: Scene, dir: &Path, reporter: &dyn Reporter) -> ReelResult<Spool> {
    let index = scene.index();
    let frames = scene.frame_count();
    let spool = Spool {
        index,
        frames,
        path: dir.join(format!("scene_{index:04}.rgba")),
    };
    let file = File::create(&spool.path).map_err(|e| {
        ReelError::assembly(format!("create spool '{}': {e}", spool.path.display()))
    })?;
    let mut out = BufWriter::new(file);
    for frame in scene.frames() {
        out.write_all(&frame?.data)
            .map_err(|e| ReelError::assembly(format!("write spool of scene {index}: {e}")))?;
    }
    out.flush()
        .map_err(|e| ReelError::assembly(format!("write spool of scene {index}: {e}")))?;
    reporter.report(&RenderEvent::SceneRendered { index, frames });
    Ok(spool)
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::assembly(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/assemble.rs"]
mod tests;
