use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::Context;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// `ffmpeg` writes to a sibling `.partial` file that is renamed onto the output path only after
/// a clean exit. Dropping the sink before `end` kills the encoder and removes the partial file,
/// so a failed render never leaves a truncated artifact.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    partial_path: PathBuf,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("opts", &self.opts)
            .field("running", &self.child.is_some())
            .field("last_idx", &self.last_idx)
            .finish_non_exhaustive()
    }
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        let partial_path = partial_path_for(&opts.out_path);
        Self {
            opts,
            partial_path,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }

    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        let _ = std::fs::remove_file(&self.partial_path);
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            tracing::warn!(out = %self.opts.out_path.display(), "encoder dropped before finish; discarding output");
            self.abort();
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::assembly("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::assembly(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::assembly(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ReelError::assembly(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(ReelError::assembly(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            if audio.sample_rate == 0 || audio.channels == 0 {
                return Err(ReelError::assembly(
                    "audio sample rate and channel count must be non-zero",
                ));
            }
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "aac",
                "-b:a",
                "192k",
                "-shortest",
                "-movflags",
                "+faststart",
            ]);
        } else {
            cmd.args([
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]);
        }
        cmd.args(["-f", "mp4"]).arg(&self.partial_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::assembly(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(mut stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::assembly("failed to open ffmpeg pipes"));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            w = cfg.width,
            h = cfg.height,
            frames = cfg.total_frames,
            audio = cfg.audio.is_some(),
            "ffmpeg started"
        );
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::assembly("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::assembly(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::assembly(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != frame.canvas().byte_len() {
            return Err(ReelError::assembly(
                "frame.data size mismatch with width*height*4",
            ));
        }
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::assembly("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            ReelError::assembly(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::assembly("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| ReelError::assembly(format!("failed to wait for ffmpeg to finish: {e}")));
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::assembly("ffmpeg stderr drain thread panicked"))
                .and_then(|r| {
                    r.map_err(|e| ReelError::assembly(format!("ffmpeg stderr read failed: {e}")))
                }),
            None => Ok(Vec::new()),
        };

        let result = status.and_then(|status| {
            let stderr_bytes = stderr_bytes?;
            if status.success() {
                return Ok(());
            }
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            Err(ReelError::assembly(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )))
        });
        if let Err(e) = result {
            let _ = std::fs::remove_file(&self.partial_path);
            return Err(e);
        }

        std::fs::rename(&self.partial_path, &self.opts.out_path).map_err(|e| {
            let _ = std::fs::remove_file(&self.partial_path);
            ReelError::assembly(format!(
                "failed to move encoded output to '{}': {e}",
                self.opts.out_path.display()
            ))
        })?;
        self.cfg = None;
        Ok(())
    }
}

/// `video.mp4` → `video.mp4.partial` in the same directory.
pub fn partial_path_for(out_path: &Path) -> PathBuf {
    let mut name = out_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output.mp4".into());
    name.push(".partial");
    out_path.with_file_name(name)
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // `-r` before `-i` sets the rawvideo input rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))
            .map_err(|e| ReelError::assembly(format!("{e:#}")))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
