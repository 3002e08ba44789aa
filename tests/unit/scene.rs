use std::sync::Arc;

use super::*;
use crate::config::{RenderConfig, RevealParams};
use crate::reveal::cursor::Cursor;
use crate::reveal::sketch::SketchParams;

fn canvas() -> Canvas {
    Canvas {
        width: 20,
        height: 36,
    }
}

fn reveal_mode() -> SceneMode {
    SceneMode::Reveal(RevealSetup {
        params: RevealParams {
            reveal_fraction: 0.7,
            amplitude: 10.0,
            angle_deg: 45.0,
            segments: 4,
            brush_radius: 2.0,
        },
        sketch: SketchParams::default(),
        cursor: Some(Arc::new(Cursor::procedural(12).unwrap())),
        cursor_fade_in: 1,
        cursor_fade_out: 1,
    })
}

fn image(w: u32, h: u32, seconds: f64) -> ResolvedImage {
    ResolvedImage {
        image: image::RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 99, 255])),
        seconds,
        direction: None,
    }
}

fn builder(fps: u32) -> SceneBuilder {
    SceneBuilder::new(canvas(), Fps::integer(fps).unwrap(), [255, 255, 255])
}

#[test]
fn frame_count_is_rounded_and_exact() {
    let b = builder(10);
    for (secs, expected) in [(1.0, 10u64), (0.34, 3), (0.35, 4), (2.26, 23)] {
        let scene = b.build(0, image(8, 8, secs), &reveal_mode()).unwrap();
        assert_eq!(scene.frame_count(), expected);
        let frames: Vec<_> = scene.frames().collect::<ReelResult<_>>().unwrap();
        assert_eq!(frames.len() as u64, expected, "{secs}s");
        assert!(frames.iter().all(|f| f.canvas() == canvas()));
    }
}

#[test]
fn frames_iterator_is_lazy_and_sized() {
    let scene = builder(10)
        .build(2, image(30, 10, 1.0), &SceneMode::PanZoom(PanZoomParams::default()))
        .unwrap();
    assert_eq!(scene.mode(), RenderMode::PanZoom);
    let mut frames = scene.frames();
    assert_eq!(frames.len(), 10);
    frames.next().unwrap().unwrap();
    assert_eq!(frames.len(), 9);
    assert_eq!(frames.by_ref().count(), 9);
    assert!(frames.next().is_none());
}

#[test]
fn reveal_hold_frames_equal_the_letterboxed_source() {
    let img = image(10, 10, 1.0);
    let fitted = letterbox(&img.image, canvas(), [255, 255, 255]);
    let scene = builder(10).build(0, img, &reveal_mode()).unwrap();
    let frames: Vec<_> = scene.frames().collect::<ReelResult<_>>().unwrap();
    assert_eq!(frames[7].data, *fitted.as_raw());
    assert_eq!(frames[9].data, *fitted.as_raw());
    assert_ne!(frames[0].data, *fitted.as_raw());
}

#[test]
fn letterbox_centers_on_background() {
    let img = image::RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 0, 255]));
    let out = letterbox(&img, canvas(), [255, 255, 255]);
    assert_eq!(out.dimensions(), (20, 36));
    assert_eq!(out.get_pixel(10, 0).0, [255, 255, 255, 255]);
    assert_eq!(out.get_pixel(10, 35).0, [255, 255, 255, 255]);
    assert_eq!(out.get_pixel(10, 18).0[3], 255);
    assert!(out.get_pixel(10, 18).0[0] < 10);
}

#[test]
fn flatten_alpha_composites_on_background() {
    let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0]));
    assert_eq!(flatten_alpha(img, [255, 255, 255]).get_pixel(0, 0).0, [255, 255, 255, 255]);
    let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([100, 0, 0, 255]));
    assert_eq!(flatten_alpha(img, [255, 255, 255]).get_pixel(0, 0).0, [100, 0, 0, 255]);
}

#[test]
fn pan_direction_defaults_alternate_by_index() {
    let b = builder(10);
    let mode = SceneMode::PanZoom(PanZoomParams::default());
    let even = b.build(0, image(60, 60, 1.0), &mode).unwrap();
    let odd = b.build(1, image(60, 60, 1.0), &mode).unwrap();
    let (Compositor::PanZoom(e), Compositor::PanZoom(o)) = (&even.compositor, &odd.compositor) else {
        panic!("expected pan-zoom scenes");
    };
    assert!(e.trajectory().start.y < e.trajectory().end.y);
    assert!(o.trajectory().start.y > o.trajectory().end.y);
}

#[test]
fn invalid_seconds_are_input_errors_with_scene_context() {
    let err = builder(10).build(3, image(4, 4, 0.0), &reveal_mode()).unwrap_err();
    assert!(err.is_input());
    assert!(err.to_string().contains("scene 3"));
}

#[test]
fn default_config_builds_both_modes() {
    let cfg = RenderConfig::default();
    let c = Canvas {
        width: 40,
        height: 72,
    };
    let b = SceneBuilder::new(c, cfg.fps().unwrap(), cfg.background);
    let reveal = SceneMode::Reveal(RevealSetup {
        params: cfg.reveal_params(c),
        sketch: SketchParams::default(),
        cursor: None,
        cursor_fade_in: cfg.cursor_fade_in_frames,
        cursor_fade_out: cfg.cursor_fade_out_frames,
    });
    assert_eq!(b.build(0, image(50, 50, 0.2), &reveal).unwrap().frame_count(), 6);
    let pz = SceneMode::PanZoom(cfg.pan_zoom);
    assert_eq!(b.build(1, image(50, 50, 0.2), &pz).unwrap().frame_count(), 6);
}
