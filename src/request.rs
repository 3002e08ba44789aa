//! Request payload schema and validation into resolved engine inputs.
//!
//! Validation runs before any asset is fetched or frame is rendered. Every failure here is a
//! [`ReelError::Input`] naming the offending field.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::captions::track::{CaptionSpec, CaptionTrack, CharTiming};
use crate::config::{AspectRatio, Quality, RenderConfig, VideoSpec};
use crate::foundation::error::{ReelError, ReelResult};
use crate::panzoom::planner::PanDirection;

/// Where an image or audio track comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRef {
    Path(PathBuf),
    Url(String),
}

impl SourceRef {
    /// Classify a raw reference: `http(s)://` is remote, anything else a local path.
    pub fn parse(raw: &str) -> ReelResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ReelError::input("empty source reference"));
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Self::Url(raw.to_string()))
        } else {
            Ok(Self::Path(PathBuf::from(raw)))
        }
    }

    /// Resolve relative paths against `base`.
    pub fn rebase(self, base: &Path) -> Self {
        match self {
            Self::Path(p) if p.is_relative() => Self::Path(base.join(p)),
            other => other,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
        }
    }
}

/// One validated image entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSpec {
    pub source: SourceRef,
    pub seconds: f64,
    /// Pan direction override for pan-zoom mode.
    pub direction: Option<PanDirection>,
}

/// Background audio track.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSpec {
    pub source: SourceRef,
    /// Linear gain in `[0, 1]`.
    pub volume: f64,
    /// Loop when shorter than the video (otherwise pad with silence). Longer tracks are trimmed.
    pub looped: bool,
}

/// Validated request, ready for prefetch.
#[derive(Clone, Debug)]
pub struct ResolvedRequest {
    pub images: Vec<ImageSpec>,
    pub audio: Option<AudioSpec>,
    pub video: VideoSpec,
    pub captions: Option<CaptionTrack>,
}

impl ResolvedRequest {
    pub fn total_seconds(&self) -> f64 {
        self.images.iter().map(|i| i.seconds).sum()
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    seconds: Option<f64>,
    #[serde(default)]
    direction: Option<String>,
}

#[derive(Clone, Debug, serde::Deserialize)]
struct RawCharTiming {
    char: String,
    start: f64,
    end: f64,
}

#[derive(Clone, Debug, serde::Deserialize)]
struct RawWordTiming {
    text: String,
    start: f64,
    end: f64,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
enum RawAlignment {
    Entries(Vec<RawCharTiming>),
    Words(Vec<RawWordTiming>),
    Columns {
        characters: Vec<String>,
        character_start_times_seconds: Vec<f64>,
        character_end_times_seconds: Vec<f64>,
    },
}

#[derive(Clone, Debug, serde::Deserialize)]
struct RawCaptions {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "normalized_alignment")]
    alignment: Option<RawAlignment>,
    #[serde(default)]
    highlighted_words: Vec<String>,
    #[serde(default)]
    highlight_color: Option<[u8; 3]>,
}

/// Request payload as submitted.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderRequest {
    #[serde(default)]
    images: Vec<RawImage>,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    ratio: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    loop_audio: Option<bool>,
    #[serde(default)]
    captions: Option<RawCaptions>,
}

impl RenderRequest {
    pub fn from_json(text: &str) -> ReelResult<Self> {
        serde_json::from_str(text).map_err(|e| ReelError::input(format!("invalid request: {e}")))
    }

    pub fn from_path(path: &Path) -> ReelResult<Self> {
        Self::from_json(&read_input_file(path, "request")?)
    }

    /// Check every field and resolve presets against `cfg`.
    pub fn validate(&self, cfg: &RenderConfig) -> ReelResult<ResolvedRequest> {
        if self.images.is_empty() {
            return Err(ReelError::input("request has no images"));
        }
        let images = self
            .images
            .iter()
            .enumerate()
            .map(|(i, raw)| resolve_image(i, raw))
            .collect::<ReelResult<Vec<_>>>()?;
        let captions = self
            .captions
            .as_ref()
            .map(resolve_captions)
            .transpose()?
            .map(CaptionTrack::new)
            .transpose()?;
        let media = MediaOptions {
            audio: self.audio.clone(),
            volume: self.volume,
            loop_audio: self.loop_audio,
            ratio: self.ratio.clone(),
            quality: self.quality.clone(),
        };
        ResolvedRequest::from_parts(images, &media, captions, cfg)
    }
}

/// Video and audio options shared by request payloads and the command line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaOptions {
    pub audio: Option<String>,
    pub volume: Option<f64>,
    pub loop_audio: Option<bool>,
    pub ratio: Option<String>,
    pub quality: Option<String>,
}

impl ResolvedRequest {
    /// Validate `media` and combine it with already-resolved images and captions.
    pub fn from_parts(
        images: Vec<ImageSpec>,
        media: &MediaOptions,
        captions: Option<CaptionTrack>,
        cfg: &RenderConfig,
    ) -> ReelResult<Self> {
        if images.is_empty() {
            return Err(ReelError::input("request has no images"));
        }
        let ratio = match &media.ratio {
            Some(label) => AspectRatio::from_label(label)?,
            None => AspectRatio::default(),
        };
        let quality = match &media.quality {
            Some(label) => Quality::from_label(label)?,
            None => Quality::default(),
        };
        let video = VideoSpec {
            ratio,
            quality,
            fps: cfg.fps()?,
        };

        let volume = media.volume.unwrap_or(cfg.default_volume);
        if !(0.0..=1.0).contains(&volume) {
            return Err(ReelError::input(format!(
                "volume must be in [0, 1], got {volume}"
            )));
        }
        let audio = match media.audio.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(AudioSpec {
                source: SourceRef::parse(raw)?,
                volume,
                looped: media.loop_audio.unwrap_or(true),
            }),
            _ => None,
        };

        Ok(Self {
            images,
            audio,
            video,
            captions,
        })
    }
}

/// Read a user-supplied text file; failures are input errors.
pub fn read_input_file(path: &Path, what: &str) -> ReelResult<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("read {what} file {}", path.display()))
        .map_err(|e| ReelError::input(format!("{e:#}")))
}

/// Parse an image-list file: a JSON array of `{image|url, seconds, direction?}` entries.
pub fn parse_image_list(text: &str) -> ReelResult<Vec<ImageSpec>> {
    let raw: Vec<RawImage> = serde_json::from_str(text)
        .map_err(|e| ReelError::input(format!("invalid image list: {e}")))?;
    if raw.is_empty() {
        return Err(ReelError::input("image list is empty"));
    }
    raw.iter()
        .enumerate()
        .map(|(i, r)| resolve_image(i, r))
        .collect()
}

/// Parse a caption file holding `{text?, alignment, highlighted_words?, highlight_color?}`.
///
/// `alignment` is either per-character entries, per-character columns, or a word list
/// `[{text, start, end}]`.
pub fn parse_captions(text: &str) -> ReelResult<CaptionTrack> {
    let raw: RawCaptions = serde_json::from_str(text)
        .map_err(|e| ReelError::input(format!("invalid captions: {e}")))?;
    CaptionTrack::new(resolve_captions(&raw)?)
}

fn resolve_image(index: usize, raw: &RawImage) -> ReelResult<ImageSpec> {
    let src = match (raw.image.as_deref(), raw.url.as_deref()) {
        (Some(s), _) | (None, Some(s)) => s,
        (None, None) => {
            return Err(ReelError::input(format!(
                "image {index}: missing 'image' or 'url'"
            )));
        }
    };
    let source = SourceRef::parse(src).map_err(|e| prefix(index, e))?;
    let seconds = raw
        .seconds
        .ok_or_else(|| ReelError::input(format!("image {index}: missing 'seconds'")))?;
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(ReelError::input(format!(
            "image {index}: 'seconds' must be > 0, got {seconds}"
        )));
    }
    let direction = raw
        .direction
        .as_deref()
        .map(PanDirection::from_label)
        .transpose()
        .map_err(|e| prefix(index, e))?;
    Ok(ImageSpec {
        source,
        seconds,
        direction,
    })
}

fn prefix(index: usize, err: ReelError) -> ReelError {
    match err {
        ReelError::Input(msg) => ReelError::Input(format!("image {index}: {msg}")),
        other => other,
    }
}

fn resolve_captions(raw: &RawCaptions) -> ReelResult<CaptionSpec> {
    let Some(raw_alignment) = &raw.alignment else {
        return Err(ReelError::input("captions: missing 'alignment'"));
    };
    let mut word_text = None;
    let alignment = match raw_alignment {
        RawAlignment::Words(words) => {
            let (text, timings) = words_to_chars(words)?;
            word_text = Some(text);
            timings
        }
        RawAlignment::Entries(entries) => entries
            .iter()
            .map(|e| timing(&e.char, e.start, e.end))
            .collect::<ReelResult<Vec<_>>>()?,
        RawAlignment::Columns {
            characters,
            character_start_times_seconds: starts,
            character_end_times_seconds: ends,
        } => {
            if characters.len() != starts.len() || characters.len() != ends.len() {
                return Err(ReelError::input(format!(
                    "caption alignment columns differ in length ({} chars, {} starts, {} ends)",
                    characters.len(),
                    starts.len(),
                    ends.len()
                )));
            }
            characters
                .iter()
                .zip(starts)
                .zip(ends)
                .map(|((c, &s), &e)| timing(c, s, e))
                .collect::<ReelResult<Vec<_>>>()?
        }
    };
    let text = match (&raw.text, word_text) {
        (Some(t), _) => t.clone(),
        (None, Some(t)) => t,
        (None, None) => alignment.iter().map(|t| t.ch).collect(),
    };
    Ok(CaptionSpec {
        text,
        alignment,
        highlighted_words: raw.highlighted_words.clone(),
        highlight_color: raw
            .highlight_color
            .map(|[r, g, b]| format!("#{r:02X}{g:02X}{b:02X}")),
    })
}

/// Expand word timings into character timings over the words joined by single spaces.
///
/// Characters split their word's interval evenly. The joining space starts where the previous
/// word ends (or where the next one starts, if earlier) and lasts until the next word starts.
fn words_to_chars(words: &[RawWordTiming]) -> ReelResult<(String, Vec<CharTiming>)> {
    let mut text = String::new();
    let mut out: Vec<CharTiming> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let w = word.text.trim();
        if w.is_empty() || w.contains(char::is_whitespace) {
            return Err(ReelError::input(format!(
                "caption word {i}: '{}' must be one non-empty word",
                word.text
            )));
        }
        if !(word.start.is_finite() && word.end.is_finite()) {
            return Err(ReelError::input(format!(
                "caption word {i}: non-finite timing"
            )));
        }
        if i > 0 {
            let prev = &words[i - 1];
            let last_start = out.last().map_or(0.0, |t| t.start);
            let start = last_start.max(prev.end.min(word.start));
            text.push(' ');
            out.push(CharTiming {
                ch: ' ',
                start,
                end: start.max(word.start),
            });
        }
        let n = w.chars().count() as f64;
        let span = word.end - word.start;
        for (k, ch) in w.chars().enumerate() {
            let k = k as f64;
            out.push(CharTiming {
                ch,
                start: word.start + span * k / n,
                end: word.start + span * (k + 1.0) / n,
            });
        }
        text.push_str(w);
    }
    Ok((text, out))
}

fn timing(ch: &str, start: f64, end: f64) -> ReelResult<CharTiming> {
    let mut chars = ch.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err(ReelError::input(format!(
            "caption alignment entry '{ch}' must be exactly one character"
        )));
    };
    Ok(CharTiming { ch: c, start, end })
}

#[cfg(test)]
#[path = "../tests/unit/request.rs"]
mod tests;
