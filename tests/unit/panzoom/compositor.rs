use super::*;
use crate::config::PanZoomParams;
use crate::panzoom::planner::{PanDirection, plan_trajectory};

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas {
        width: w,
        height: h,
    }
}

#[test]
fn identity_crop_reproduces_the_source() {
    let src = image::RgbaImage::from_fn(6, 4, |x, y| image::Rgba([x as u8 * 40, y as u8 * 60, 7, 255]));
    let rect = CropRect {
        x: 0.0,
        y: 0.0,
        w: 6.0,
        h: 4.0,
    };
    let out = crop_resize(&src, rect, canvas(6, 4)).unwrap();
    assert_eq!(out.data, *src.as_raw());
}

#[test]
fn crop_selects_the_requested_region() {
    let mut src = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]));
    for y in 0..4 {
        for x in 4..8 {
            src.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
        }
    }
    let rect = CropRect {
        x: 4.0,
        y: 0.0,
        w: 4.0,
        h: 4.0,
    };
    let out = crop_resize(&src, rect, canvas(4, 4)).unwrap();
    assert!(out.data.chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
}

#[test]
fn upscales_tiny_sources() {
    let src = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    let out = crop_resize(
        &src,
        CropRect {
            x: 0.5,
            y: 0.0,
            w: 1.0,
            h: 2.0,
        },
        canvas(40, 80),
    )
    .unwrap();
    assert_eq!(out.data.len(), 40 * 80 * 4);
    assert!(out.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[test]
fn compositor_renders_every_frame_at_canvas_size() {
    let src = image::RgbaImage::from_fn(50, 50, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
    let c = canvas(18, 32);
    let t = plan_trajectory(50, 50, c, &PanZoomParams::default(), PanDirection::Up, 4).unwrap();
    let comp = PanZoomCompositor::new(src, t);
    for i in 0..4 {
        let f = comp.render_frame(i).unwrap();
        assert_eq!((f.width, f.height), (18, 32));
    }
    assert!(comp.render_frame(4).is_err());
}

#[test]
fn degenerate_rect_is_a_render_error() {
    let src = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
    let rect = CropRect {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 1.0,
    };
    assert!(matches!(
        crop_resize(&src, rect, canvas(2, 2)),
        Err(crate::foundation::error::ReelError::Render { .. })
    ));
}
