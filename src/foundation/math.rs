/// Rounded `x * y / 255` in integer arithmetic.
pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Premultiplied source composited over an opaque destination pixel.
pub fn over_premul_opaque(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    match src[3] {
        0 => dst,
        255 => [src[0], src[1], src[2], 255],
        sa => {
            let inv = 255 - u16::from(sa);
            let mut out = [0u8, 0, 0, 255];
            for i in 0..3 {
                out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
            }
            out
        }
    }
}

/// Linear blend of two pixels, `t = 0` returns `a`, `t = 1` returns `b`.
pub fn crossfade(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255_u8(u16::from(a[i]), it);
        let bv = mul_div255_u8(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

/// Blend two equal-length RGBA8 buffers into `dst`.
pub fn crossfade_in_place(dst: &mut [u8], other: &[u8], t: f32) {
    for (d, o) in dst.chunks_exact_mut(4).zip(other.chunks_exact(4)) {
        let out = crossfade([d[0], d[1], d[2], d[3]], [o[0], o[1], o[2], o[3]], t);
        d.copy_from_slice(&out);
    }
}

/// Rec. 601 luma of an RGB triple, in `[0, 255]`.
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
