use super::*;

const ALL: [Ease; 4] = [Ease::Linear, Ease::InOutQuad, Ease::InOutCubic, Ease::SmoothStep];

#[test]
fn endpoints_are_fixed() {
    for e in ALL {
        assert_eq!(e.apply(0.0), 0.0, "{e:?}");
        assert!((e.apply(1.0) - 1.0).abs() < 1e-12, "{e:?}");
    }
}

#[test]
fn curves_are_monotonic() {
    for e in ALL {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = e.apply(f64::from(i) / 100.0);
            assert!(v + 1e-12 >= prev, "{e:?} at {i}");
            prev = v;
        }
    }
}

#[test]
fn eased_curves_start_and_end_flat() {
    let h = 1e-4;
    for e in [Ease::InOutQuad, Ease::InOutCubic, Ease::SmoothStep] {
        let start_slope = e.apply(h) / h;
        let end_slope = (1.0 - e.apply(1.0 - h)) / h;
        assert!(start_slope < 1e-2, "{e:?} start {start_slope}");
        assert!(end_slope < 1e-2, "{e:?} end {end_slope}");
        assert!(e.is_eased());
    }
    assert!(!Ease::Linear.is_eased());
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::InOutCubic.apply(-3.0), 0.0);
    assert_eq!(Ease::InOutCubic.apply(7.0), 1.0);
}
