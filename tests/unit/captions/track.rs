use super::*;

fn spec(text: &str, step: f64) -> CaptionSpec {
    let alignment = text
        .chars()
        .enumerate()
        .map(|(i, ch)| CharTiming {
            ch,
            start: i as f64 * step,
            end: (i + 1) as f64 * step,
        })
        .collect();
    CaptionSpec {
        text: text.to_string(),
        alignment,
        highlighted_words: vec!["World".to_string()],
        highlight_color: None,
    }
}

#[test]
fn prefix_grows_with_time() {
    let track = CaptionTrack::new(spec("hello world", 0.1)).unwrap();
    assert_eq!(track.visible_prefix(0.0), "");
    assert_eq!(track.visible_prefix(0.1), "h");
    assert_eq!(track.visible_prefix(0.55), "hello");
    assert_eq!(track.visible_prefix(10.0), "hello world");
    assert!((track.end_secs() - 1.1).abs() < 1e-9);
}

#[test]
fn visible_text_is_idempotent() {
    let track = CaptionTrack::new(spec("same input same output", 0.05)).unwrap();
    for i in 0..50 {
        let t = f64::from(i) * 0.03;
        assert_eq!(
            track.visible_text(t, CaptionMode::Prefix),
            track.visible_text(t, CaptionMode::Prefix)
        );
        assert_eq!(
            track.visible_text(t, CaptionMode::Word),
            track.visible_text(t, CaptionMode::Word)
        );
    }
}

#[test]
fn word_mode_tracks_the_spoken_word() {
    let track = CaptionTrack::new(spec("hello world", 0.1)).unwrap();
    assert_eq!(track.active_word(0.0), "hello");
    assert_eq!(track.active_word(0.55), "hello");
    assert_eq!(track.active_word(0.65), "world");
    assert_eq!(track.active_word(1.05), "world");
    assert_eq!(track.active_word(2.0), "");
}

#[test]
fn multibyte_text_slices_on_char_boundaries() {
    let track = CaptionTrack::new(spec("héllo ñu", 0.1)).unwrap();
    assert_eq!(track.visible_prefix(0.25), "hé");
    assert_eq!(track.active_word(0.75), "ñu");
}

#[test]
fn mismatched_alignment_is_rejected() {
    let mut s = spec("abc", 0.1);
    s.alignment.pop();
    assert!(CaptionTrack::new(s).unwrap_err().is_input());

    let mut s = spec("abc", 0.1);
    s.alignment[1].ch = 'x';
    assert!(CaptionTrack::new(s).unwrap_err().is_input());
}

#[test]
fn decreasing_starts_are_rejected() {
    let mut s = spec("abc", 0.1);
    s.alignment[2].start = 0.05;
    assert!(CaptionTrack::new(s).unwrap_err().is_input());

    let mut s = spec("abc", 0.1);
    s.alignment[0].end = -1.0;
    assert!(CaptionTrack::new(s).is_err());
}

#[test]
fn highlight_ignores_case_and_punctuation() {
    let track = CaptionTrack::new(spec("hello world", 0.1)).unwrap();
    assert!(track.is_highlighted("world!"));
    assert!(track.is_highlighted("WORLD"));
    assert!(!track.is_highlighted("hello"));
    assert!(!track.is_highlighted("..."));
}
