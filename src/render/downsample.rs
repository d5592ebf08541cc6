use image::imageops::{self, FilterType};

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{PromoError, PromoResult};

/// Resampling kernel used when shrinking captured frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Bilinear,
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
        }
    }
}

/// Shrink `buffer` to `target_w x target_h` with the default bilinear kernel.
pub fn downsample(buffer: PixelBuffer, target_w: u32, target_h: u32) -> PromoResult<PixelBuffer> {
    downsample_with(buffer, target_w, target_h, ResampleFilter::default())
}

/// Shrink `buffer` to `target_w x target_h`.
///
/// The target must keep the source aspect ratio exactly and must not be larger than the source;
/// both are configuration errors rather than cases to letterbox or upscale.
pub fn downsample_with(
    buffer: PixelBuffer,
    target_w: u32,
    target_h: u32,
    filter: ResampleFilter,
) -> PromoResult<PixelBuffer> {
    if target_w == 0 || target_h == 0 {
        return Err(PromoError::validation(
            "downsample target width/height must be non-zero",
        ));
    }
    let (src_w, src_h) = (buffer.width, buffer.height);
    if u64::from(src_w) * u64::from(target_h) != u64::from(src_h) * u64::from(target_w) {
        return Err(PromoError::validation(format!(
            "downsample aspect mismatch: {src_w}x{src_h} -> {target_w}x{target_h}"
        )));
    }
    if target_w > src_w || target_h > src_h {
        return Err(PromoError::validation(format!(
            "downsample target {target_w}x{target_h} exceeds source {src_w}x{src_h}"
        )));
    }
    if target_w == src_w {
        return Ok(buffer);
    }

    let img = buffer.into_rgba_image()?;
    let out = imageops::resize(&img, target_w, target_h, filter.filter_type());
    Ok(PixelBuffer::from_rgba_image(out))
}

#[cfg(test)]
#[path = "../../tests/unit/render/downsample.rs"]
mod tests;
