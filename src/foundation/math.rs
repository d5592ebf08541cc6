pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Composite straight-alpha RGBA8 over an opaque matte color, in place.
///
/// GIF frames carry no partial alpha, so every pixel leaves this function with `a == 255`.
pub(crate) fn flatten_over_matte(rgba: &mut [u8], matte: [u8; 3]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(px[c]), a) + mul_div255_u16(u16::from(matte[c]), inv);
            px[c] = v.min(255) as u8;
        }
        px[3] = 255;
    }
}

/// Convert premultiplied RGBA8 to straight alpha, in place.
pub(crate) fn unpremultiply_rgba8(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in 0..3 {
            let v = (u32::from(px[c]) * 255 + a / 2) / a;
            px[c] = v.min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
