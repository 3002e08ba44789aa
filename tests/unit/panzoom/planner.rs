use super::*;

const EPS: f64 = 1e-6;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas {
        width: w,
        height: h,
    }
}

#[test]
fn cover_rect_matches_canvas_aspect() {
    let r = cover_rect(1600.0, 1600.0, canvas(1080, 1920));
    assert!((r.w / r.h - 1080.0 / 1920.0).abs() < 1e-9);
    assert_eq!(r.h, 1600.0);
    assert!(r.is_within(1600.0, 1600.0, EPS));

    let r = cover_rect(400.0, 1000.0, canvas(1920, 1080));
    assert_eq!(r.w, 400.0);
    assert!((r.center().y - 500.0).abs() < 1e-9);
}

#[test]
fn rects_stay_inside_source_for_many_shapes() {
    let sources = [(1600, 1600), (40, 30), (3000, 200), (200, 3000), (9, 16), (1, 1)];
    let canvases = [canvas(1080, 1920), canvas(404, 720), canvas(1920, 1080), canvas(480, 480)];
    let dirs = [
        PanDirection::Up,
        PanDirection::Down,
        PanDirection::Left,
        PanDirection::Right,
    ];
    let params = [
        PanZoomParams::default(),
        PanZoomParams {
            start_zoom: 1.0,
            end_zoom: 1.0,
            pan_ratio: 0.5,
            ease: Ease::InOutQuad,
        },
        PanZoomParams {
            start_zoom: 1.0,
            end_zoom: 1.4,
            pan_ratio: 0.9,
            ease: Ease::SmoothStep,
        },
    ];
    for (sw, sh) in sources {
        for c in canvases {
            for d in dirs {
                for p in &params {
                    let t = plan_trajectory(sw, sh, c, p, d, 37).unwrap();
                    for i in 0..37 {
                        let r = t.rect_for_frame(i);
                        assert!(
                            r.is_within(f64::from(sw), f64::from(sh), EPS),
                            "{sw}x{sh} {c:?} {d:?} frame {i}: {r:?}"
                        );
                        assert!((r.w / r.h - c.aspect()).abs() < 1e-6);
                    }
                }
            }
        }
    }
}

#[test]
fn endpoints_and_eased_midpoint() {
    let t = plan_trajectory(
        1600,
        1600,
        canvas(1080, 1920),
        &PanZoomParams::default(),
        PanDirection::Up,
        120,
    )
    .unwrap();
    assert_eq!(t.rect_for_frame(0), t.start);
    assert_eq!(t.rect_for_frame(119), t.end);
    assert!(t.start.y < t.end.y);
    let mid = t.rect_for_frame(60);
    assert!(mid.y > t.start.y && mid.y < t.end.y);
}

#[test]
fn motion_has_zero_velocity_at_both_ends() {
    let t = plan_trajectory(
        2000,
        2000,
        canvas(404, 720),
        &PanZoomParams::default(),
        PanDirection::Left,
        300,
    )
    .unwrap();
    let travel = (t.end.x - t.start.x).abs();
    assert!(travel > 1.0);
    let first_step = (t.rect_for_frame(1).x - t.rect_for_frame(0).x).abs();
    let last_step = (t.rect_for_frame(299).x - t.rect_for_frame(298).x).abs();
    let mid_step = (t.rect_for_frame(150).x - t.rect_for_frame(149).x).abs();
    assert!(first_step < mid_step * 0.01);
    assert!(last_step < mid_step * 0.01);
}

#[test]
fn pan_shrinks_instead_of_failing() {
    let params = PanZoomParams {
        start_zoom: 1.0,
        end_zoom: 1.0,
        pan_ratio: 0.3,
        ease: Ease::InOutCubic,
    };
    // Exact canvas aspect leaves no room at zoom 1.0.
    let t = plan_trajectory(1080, 1920, canvas(1080, 1920), &params, PanDirection::Down, 10).unwrap();
    assert_eq!(t.pan_distance, 0.0);
    assert_eq!(t.start, t.end);
}

#[test]
fn single_frame_scene_sits_at_start() {
    let t = plan_trajectory(100, 100, canvas(10, 10), &PanZoomParams::default(), PanDirection::Right, 1)
        .unwrap();
    assert_eq!(t.progress_for_frame(0), 0.0);
    assert_eq!(t.rect_for_frame(0), t.start);
    assert!(t.scale_at(0.0) > 0.0);
}

#[test]
fn directions_parse_and_alternate() {
    assert_eq!(PanDirection::from_label(" Left ").unwrap(), PanDirection::Left);
    assert!(PanDirection::from_label("diagonal").unwrap_err().is_input());
    assert_eq!(PanDirection::alternating(0), PanDirection::Up);
    assert_eq!(PanDirection::alternating(1), PanDirection::Down);
    assert_eq!(PanDirection::alternating(4), PanDirection::Up);
}

#[test]
fn zoom_below_one_is_rejected() {
    let params = PanZoomParams {
        start_zoom: 0.5,
        ..PanZoomParams::default()
    };
    assert!(plan_trajectory(100, 100, canvas(10, 10), &params, PanDirection::Up, 5).is_err());
}
