use crate::config::CaptionMode;
use crate::foundation::error::{ReelError, ReelResult};

/// Timing of one transcript character, in seconds of absolute video time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharTiming {
    pub ch: char,
    pub start: f64,
    pub end: f64,
}

/// Transcript plus its per-character alignment, as submitted.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CaptionSpec {
    pub text: String,
    pub alignment: Vec<CharTiming>,
    /// Words drawn in the highlight color (case-insensitive).
    pub highlighted_words: Vec<String>,
    /// Highlight color override (`#RRGGBB`).
    pub highlight_color: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
struct Word {
    /// Byte range into the transcript.
    start_byte: usize,
    end_byte: usize,
    start: f64,
    end: f64,
}

/// Validated caption alignment with precomputed lookup tables.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionTrack {
    text: String,
    /// Byte offset of the end of each character prefix (`prefix_bytes[k]` ends `k + 1` chars).
    prefix_bytes: Vec<usize>,
    /// Running maximum of end times, so prefix lookup is a partition search.
    prefix_end: Vec<f64>,
    words: Vec<Word>,
    highlighted: Vec<String>,
    highlight_color: Option<String>,
}

impl CaptionTrack {
    /// Validate `spec`: the alignment must spell `text` exactly and start times must be
    /// non-decreasing.
    pub fn new(spec: CaptionSpec) -> ReelResult<Self> {
        let CaptionSpec {
            text,
            alignment,
            highlighted_words,
            highlight_color,
        } = spec;

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        if chars.len() != alignment.len() {
            return Err(ReelError::input(format!(
                "caption alignment has {} entries but text has {} characters",
                alignment.len(),
                chars.len()
            )));
        }

        let mut prefix_bytes = Vec::with_capacity(chars.len());
        let mut prefix_end = Vec::with_capacity(chars.len());
        let mut max_end = f64::NEG_INFINITY;
        let mut prev_start = f64::NEG_INFINITY;
        for (k, (&(byte, ch), t)) in chars.iter().zip(&alignment).enumerate() {
            if ch != t.ch {
                return Err(ReelError::input(format!(
                    "caption alignment entry {k} is '{}' but text has '{ch}'",
                    t.ch
                )));
            }
            if !(t.start.is_finite() && t.end.is_finite()) || t.start < 0.0 || t.end < t.start {
                return Err(ReelError::input(format!(
                    "caption alignment entry {k} has invalid times [{}, {}]",
                    t.start, t.end
                )));
            }
            if t.start < prev_start {
                return Err(ReelError::input(format!(
                    "caption alignment start times decrease at entry {k}"
                )));
            }
            prev_start = t.start;
            max_end = max_end.max(t.end);
            prefix_bytes.push(byte + ch.len_utf8());
            prefix_end.push(max_end);
        }

        let words = split_words(&text, &chars, &alignment);
        let highlighted = highlighted_words
            .iter()
            .map(|w| normalize_word(w))
            .filter(|w| !w.is_empty())
            .collect();

        Ok(Self {
            text,
            prefix_bytes,
            prefix_end,
            words,
            highlighted,
            highlight_color,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Time at which the last character finishes.
    pub fn end_secs(&self) -> f64 {
        self.prefix_end.last().copied().unwrap_or(0.0)
    }

    /// Longest character prefix whose end time is `<= t`.
    pub fn visible_prefix(&self, t: f64) -> &str {
        let n = self.prefix_end.partition_point(|&end| end <= t);
        match n {
            0 => "",
            n => &self.text[..self.prefix_bytes[n - 1]],
        }
    }

    /// The word being spoken at `t`, or `""` between speech and after the last word ends.
    pub fn active_word(&self, t: f64) -> &str {
        let idx = self.words.partition_point(|w| w.start <= t);
        if idx == 0 {
            return "";
        }
        let w = &self.words[idx - 1];
        let is_last = idx == self.words.len();
        if is_last && t > w.end {
            return "";
        }
        &self.text[w.start_byte..w.end_byte]
    }

    /// Text shown at absolute video time `t` for `mode`.
    pub fn visible_text(&self, t: f64, mode: CaptionMode) -> &str {
        match mode {
            CaptionMode::Prefix => self.visible_prefix(t),
            CaptionMode::Word => self.active_word(t),
        }
    }

    pub fn highlight_color(&self) -> Option<&str> {
        self.highlight_color.as_deref()
    }

    /// `true` if `word` (ignoring case and surrounding punctuation) is highlighted.
    pub fn is_highlighted(&self, word: &str) -> bool {
        let w = normalize_word(word);
        !w.is_empty() && self.highlighted.iter().any(|h| *h == w)
    }
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn split_words(text: &str, chars: &[(usize, char)], alignment: &[CharTiming]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for (k, &(_, ch)) in chars.iter().enumerate() {
        match (ch.is_whitespace(), current) {
            (false, None) => current = Some((k, k)),
            (false, Some((first, _))) => current = Some((first, k)),
            (true, Some((first, last))) => {
                words.push(make_word(text, chars, alignment, first, last));
                current = None;
            }
            (true, None) => {}
        }
    }
    if let Some((first, last)) = current {
        words.push(make_word(text, chars, alignment, first, last));
    }
    words
}

fn make_word(
    text: &str,
    chars: &[(usize, char)],
    alignment: &[CharTiming],
    first: usize,
    last: usize,
) -> Word {
    let end_byte = chars
        .get(last + 1)
        .map(|&(b, _)| b)
        .unwrap_or(text.len());
    Word {
        start_byte: chars[first].0,
        end_byte,
        start: alignment[first].start,
        end: alignment[first..=last]
            .iter()
            .map(|t| t.end)
            .fold(f64::NEG_INFINITY, f64::max),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/captions/track.rs"]
mod tests;
