use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn crossfade_endpoints_are_exact() {
    let a = [10, 20, 30, 255];
    let b = [200, 100, 50, 255];
    assert_eq!(crossfade(a, b, 0.0), a);
    assert_eq!(crossfade(a, b, 1.0), b);
}

#[test]
fn over_premul_opaque_blends_half_alpha() {
    let dst = [200, 200, 200, 255];
    assert_eq!(over_premul_opaque(dst, [0, 0, 0, 0]), dst);
    assert_eq!(over_premul_opaque(dst, [10, 20, 30, 255]), [10, 20, 30, 255]);
    let out = over_premul_opaque(dst, [64, 0, 0, 128]);
    assert_eq!(out[3], 255);
    assert_eq!(out[1], mul_div255_u8(200, 127));
    assert_eq!(out[0], 64 + mul_div255_u8(200, 127));
}
