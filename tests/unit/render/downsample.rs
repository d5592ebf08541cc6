use super::*;

fn gradient(w: u32, h: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 7) as u8, (y * 13) as u8, ((x + y) * 3) as u8, 255]);
        }
    }
    PixelBuffer::new(w, h, data).unwrap()
}

#[test]
fn shrinks_to_exact_target_dimensions() {
    let out = downsample(gradient(40, 20), 12, 6).unwrap();
    assert_eq!((out.width, out.height), (12, 6));
    assert_eq!(out.data.len(), 12 * 6 * 4);
}

#[test]
fn same_input_gives_identical_output() {
    let a = downsample(gradient(64, 32), 24, 12).unwrap();
    let b = downsample(gradient(64, 32), 24, 12).unwrap();
    assert_eq!(a, b);
}

#[test]
fn solid_color_survives_resampling() {
    let src = PixelBuffer::solid(32, 16, [10, 200, 30, 255]);
    for filter in [ResampleFilter::Nearest, ResampleFilter::Bilinear] {
        let out = downsample_with(src.clone(), 8, 4, filter).unwrap();
        assert!(out.data.chunks_exact(4).all(|px| px == [10, 200, 30, 255]));
    }
}

#[test]
fn identity_size_returns_input_unchanged() {
    let src = gradient(10, 5);
    let out = downsample(src.clone(), 10, 5).unwrap();
    assert_eq!(out, src);
}

#[test]
fn rejects_aspect_mismatch_upscale_and_zero() {
    assert!(downsample(gradient(40, 20), 30, 20).is_err());
    assert!(downsample(gradient(40, 20), 80, 40).is_err());
    assert!(downsample(gradient(40, 20), 0, 0).is_err());
}
