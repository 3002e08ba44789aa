use super::*;

fn flat(w: u32, h: u32, rgb: [u8; 3]) -> image::RgbaImage {
    image::RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

#[test]
fn output_is_gray_and_opaque() {
    let mut img = flat(16, 16, [200, 30, 90]);
    for y in 0..16 {
        for x in 8..16 {
            img.put_pixel(x, y, image::Rgba([10, 220, 40, 255]));
        }
    }
    let out = pencil_sketch(&img, &SketchParams::default()).unwrap();
    for px in out.pixels() {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn edges_are_darker_than_flat_regions() {
    let mut img = flat(20, 10, [255, 255, 255]);
    for y in 0..10 {
        for x in 10..20 {
            img.put_pixel(x, y, image::Rgba([0, 0, 0, 255]));
        }
    }
    let params = SketchParams {
        shade: 0.0,
        ..SketchParams::default()
    };
    let out = pencil_sketch(&img, &params).unwrap();
    let edge = out.get_pixel(10, 5)[0];
    let far = out.get_pixel(2, 5)[0];
    assert_eq!(far, 255);
    assert!(edge < 128, "edge value {edge}");
}

#[test]
fn sketch_is_deterministic() {
    let mut img = flat(12, 9, [128, 64, 32]);
    img.put_pixel(4, 4, image::Rgba([250, 250, 250, 255]));
    let a = pencil_sketch(&img, &SketchParams::default()).unwrap();
    let b = pencil_sketch(&img, &SketchParams::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn blur_constant_plane_is_identity() {
    let src = vec![77u8; 5 * 4];
    assert_eq!(blur_plane(&src, 5, 4, 3, 2.0).unwrap(), src);
}

#[test]
fn kernel_sums_to_one_in_q16() {
    let k = gaussian_kernel_q16(4, 1.5).unwrap();
    assert_eq!(k.iter().map(|&v| u64::from(v)).sum::<u64>(), 65536);
    assert!(gaussian_kernel_q16(2, 0.0).is_err());
}
