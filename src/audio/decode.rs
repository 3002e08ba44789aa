use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

/// Interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    pub fn silence(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            interleaved_f32: vec![0.0; frames * usize::from(channels)],
        }
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            c => self.interleaved_f32.len() / usize::from(c),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

/// Decode any audio file `ffmpeg` understands into stereo `f32` PCM at `sample_rate`.
///
/// A file without an audio stream decodes to empty PCM. Any other decoder failure is an input
/// error: the track is unusable as given.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    if sample_rate == 0 {
        return Err(ReelError::assembly("audio sample rate must be non-zero"));
    }
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::assembly(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm::silence(sample_rate, 2, 0));
        }
        return Err(ReelError::input(format!(
            "audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    let interleaved_f32 = parse_f32le(&out.stdout)?;
    tracing::debug!(samples = interleaved_f32.len(), "audio decoded");
    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

/// Reinterpret raw little-endian bytes as `f32` samples.
pub fn parse_f32le(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::assembly(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
