use super::*;

fn spec(ratio: &str, quality: &str) -> VideoSpec {
    VideoSpec {
        ratio: AspectRatio::from_label(ratio).unwrap(),
        quality: Quality::from_label(quality).unwrap(),
        fps: Fps::integer(30).unwrap(),
    }
}

#[test]
fn presets_resolve_to_even_dimensions() {
    assert_eq!(spec("9:16", "720p").resolve(), Canvas { width: 404, height: 720 });
    assert_eq!(spec("16:9", "1080p").resolve(), Canvas { width: 1920, height: 1080 });
    assert_eq!(spec("1:1", "480p").resolve(), Canvas { width: 480, height: 480 });
    assert_eq!(spec("4:5", "1440p").resolve(), Canvas { width: 1152, height: 1440 });
    assert_eq!(spec("4:3", "2160p").resolve(), Canvas { width: 2880, height: 2160 });
    for r in AspectRatio::ALL {
        for q in Quality::ALL {
            let c = VideoSpec {
                ratio: r,
                quality: q,
                fps: Fps::integer(30).unwrap(),
            }
            .resolve();
            assert_eq!(c.width % 2, 0);
            assert_eq!(c.height % 2, 0);
        }
    }
}

#[test]
fn unknown_labels_are_input_errors() {
    let err = AspectRatio::from_label("21:9").unwrap_err();
    assert!(err.is_input());
    assert!(err.to_string().contains("9:16"));
    assert!(Quality::from_label("4k").unwrap_err().is_input());
}

#[test]
fn defaults_match_presets() {
    assert_eq!(AspectRatio::default().label(), "9:16");
    assert_eq!(Quality::default().label(), "720p");
    let cfg = RenderConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.fps, 30);
    assert_eq!(cfg.boundary, BoundaryPolicy::HardCut);
}

#[test]
fn partial_json_overlays_defaults() {
    let cfg = RenderConfig::from_json(
        r#"{ "fps": 24, "pan_zoom": { "pan_ratio": 0.2 }, "boundary": { "kind": "crossfade", "frames": 6 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.pan_zoom.pan_ratio, 0.2);
    assert_eq!(cfg.pan_zoom.start_zoom, 1.1);
    assert_eq!(cfg.boundary, BoundaryPolicy::Crossfade { frames: 6 });
    assert_eq!(cfg.reveal_fraction, 0.7);
}

#[test]
fn invalid_json_config_is_rejected() {
    assert!(RenderConfig::from_json(r#"{ "reveal_fraction": 0.0 }"#).unwrap_err().is_input());
    assert!(RenderConfig::from_json(r#"{ "no_such_field": 1 }"#).unwrap_err().is_input());
    assert!(RenderConfig::from_json(r#"{ "pan_zoom": { "start_zoom": 0.5 } }"#).is_err());
}

#[test]
fn cursor_size_tracks_shorter_side() {
    let cfg = RenderConfig::default();
    assert_eq!(cfg.cursor_size(Canvas { width: 404, height: 720 }), 100);
    assert_eq!(cfg.cursor_size(Canvas { width: 1080, height: 1920 }), 233);
    assert_eq!(cfg.cursor_size(Canvas { width: 3840, height: 2160 }), 466);
    let fixed = RenderConfig {
        cursor_size: Some(64),
        ..RenderConfig::default()
    };
    assert_eq!(fixed.cursor_size(Canvas { width: 404, height: 720 }), 64);
}

#[test]
fn reveal_params_scale_with_canvas() {
    let cfg = RenderConfig::default();
    let small = cfg.reveal_params(Canvas { width: 405, height: 720 });
    assert!((small.amplitude - 350.0).abs() < 1e-9);
    let big = cfg.reveal_params(Canvas { width: 810, height: 1440 });
    assert!((big.amplitude - 700.0).abs() < 1e-9);
    assert!(big.brush_radius > small.brush_radius);
}

#[test]
fn config_file_overlays_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{ "fps": 24, "boundary": { "kind": "crossfade", "frames": 6 } }"#)
        .unwrap();
    let cfg = RenderConfig::from_path(&path).unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.boundary, BoundaryPolicy::Crossfade { frames: 6 });
    assert_eq!(cfg.zigzag_segments, RenderConfig::default().zigzag_segments);

    let missing = RenderConfig::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(missing.is_input());
}

#[test]
fn pan_zoom_rejects_curves_that_do_not_start_at_rest() {
    let err = RenderConfig::from_json(r#"{ "pan_zoom": { "ease": "linear" } }"#).unwrap_err();
    assert!(err.is_input());
    assert!(err.to_string().contains("pan_zoom.ease"), "{err}");

    let cfg = RenderConfig::from_json(r#"{ "pan_zoom": { "ease": "smooth_step" } }"#).unwrap();
    assert_eq!(cfg.pan_zoom.ease, Ease::SmoothStep);
}
