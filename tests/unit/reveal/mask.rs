use super::*;
use crate::config::RevealParams;
use crate::foundation::core::Canvas;

fn path(w: u32, h: u32) -> RevealPath {
    RevealPath::generate(
        Canvas {
            width: w,
            height: h,
        },
        &RevealParams {
            reveal_fraction: 0.7,
            amplitude: 20.0,
            angle_deg: 45.0,
            segments: 6,
            brush_radius: 3.0,
        },
    )
    .unwrap()
}

#[test]
fn single_advance_matches_path_coverage() {
    let path = path(40, 60);
    for p in [0.0, 0.13, 0.5, 0.77] {
        let mut mask = RevealMask::new(40, 60);
        mask.advance_to(&path, p);
        for y in 0..60 {
            for x in 0..40 {
                assert_eq!(
                    mask.revealed(x, y),
                    path.covers(p, f64::from(x) + 0.5, f64::from(y) + 0.5),
                    "p={p} ({x},{y})"
                );
            }
        }
    }
}

#[test]
fn accumulation_is_monotonic() {
    let path = path(40, 60);
    let mut mask = RevealMask::new(40, 60);
    let mut prev = mask.as_bytes().to_vec();
    let mut prev_count = 0;
    for i in 0..=30 {
        mask.advance_to(&path, f64::from(i) / 30.0);
        for (a, b) in prev.iter().zip(mask.as_bytes()) {
            assert!(*a == 0 || *b == 255);
        }
        assert!(mask.revealed_count() >= prev_count);
        prev = mask.as_bytes().to_vec();
        prev_count = mask.revealed_count();
    }
    assert!(mask.is_complete());
}

#[test]
fn going_backwards_is_a_no_op() {
    let path = path(40, 60);
    let mut mask = RevealMask::new(40, 60);
    mask.advance_to(&path, 0.6);
    let snapshot = mask.as_bytes().to_vec();
    mask.advance_to(&path, 0.2);
    assert_eq!(mask.as_bytes(), snapshot.as_slice());
    assert_eq!(mask.progress(), 0.6);
}

#[test]
fn full_progress_reveals_every_pixel() {
    let path = path(33, 17);
    let mut mask = RevealMask::new(33, 17);
    mask.advance_to(&path, 1.0);
    assert!(mask.is_complete());
    assert_eq!(mask.revealed_count(), 33 * 17);
}
