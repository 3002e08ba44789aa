use std::path::Path;

use anyhow::Context;

use crate::audio::decode::AudioPcm;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// Gain and envelope applied to the background track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixParams {
    /// Linear gain in `[0, 1]`.
    pub volume: f64,
    /// Loop a short track; otherwise pad it with silence.
    pub looped: bool,
    /// Linear fade to zero over the final seconds of the video.
    pub fade_out_secs: f64,
}

/// Stretch or cut interleaved PCM to exactly `frames` sample frames.
///
/// Longer input is trimmed. Shorter input is tiled when `looped`, padded with silence otherwise.
/// Empty input yields silence.
pub fn fit_pcm_to_length(pcm: &[f32], channels: u16, frames: usize, looped: bool) -> Vec<f32> {
    let ch = usize::from(channels.max(1));
    let want = frames * ch;
    let src = &pcm[..pcm.len() - pcm.len() % ch];
    if src.is_empty() {
        return vec![0.0; want];
    }
    if src.len() >= want {
        return src[..want].to_vec();
    }
    let mut out = Vec::with_capacity(want);
    if looped {
        while out.len() < want {
            let take = (want - out.len()).min(src.len());
            out.extend_from_slice(&src[..take]);
        }
    } else {
        out.extend_from_slice(src);
        out.resize(want, 0.0);
    }
    out
}

/// Build the background track for a video of `total_frames` frames at `fps`.
///
/// `None` produces silence of the same length so the container always carries an audio stream of
/// the video's duration.
#[tracing::instrument(level = "debug", skip(pcm))]
pub fn mix_background(
    pcm: Option<&AudioPcm>,
    total_frames: u64,
    fps: Fps,
    sample_rate: u32,
    params: &MixParams,
) -> ReelResult<AudioPcm> {
    if let Some(p) = pcm
        && p.sample_rate != sample_rate
    {
        return Err(ReelError::assembly(format!(
            "audio decoded at {} Hz, mix expects {sample_rate} Hz",
            p.sample_rate
        )));
    }
    let channels = pcm.map_or(2, |p| p.channels.max(1));
    let frames = frame_to_sample(total_frames, fps, sample_rate) as usize;
    let Some(pcm) = pcm else {
        return Ok(AudioPcm::silence(sample_rate, channels, frames));
    };

    let mut out = fit_pcm_to_length(&pcm.interleaved_f32, channels, frames, params.looped);
    let volume = params.volume.clamp(0.0, 1.0) as f32;
    let fade_frames = (params.fade_out_secs.max(0.0) * f64::from(sample_rate)).round() as usize;
    let ch = usize::from(channels);
    for (i, frame) in out.chunks_exact_mut(ch).enumerate() {
        let gain = volume * fade_out_gain(i, frames, fade_frames);
        for s in frame {
            *s = (*s * gain).clamp(-1.0, 1.0);
        }
    }
    if pcm.interleaved_f32.len() / ch < frames && !params.looped {
        tracing::debug!("audio shorter than video; padded with silence");
    }
    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: out,
    })
}

fn fade_out_gain(frame: usize, total: usize, fade: usize) -> f32 {
    if fade == 0 {
        return 1.0;
    }
    let remaining = total.saturating_sub(frame + 1);
    if remaining >= fade {
        1.0
    } else {
        remaining as f32 / fade as f32
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create audio mix output directory '{}'",
                parent.display()
            )
        })?;
    }
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes)
        .map_err(|e| ReelError::assembly(format!("write audio mix '{}': {e}", out_path.display())))
}

/// Convert a frame count to the nearest sample count at `sample_rate`.
pub fn frame_to_sample(frames: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frames) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num.max(1));
    ((num + (den / 2)) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
