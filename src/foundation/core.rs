use std::str::FromStr;

use crate::foundation::error::{PromoError, PromoResult};

/// Number of clock ticks in one animation loop (4 seconds at the nominal 30 fps).
pub const CLOCK_PERIOD: u32 = 120;

/// Width of the canonical capture resolution.
pub const CANONICAL_WIDTH: u32 = 3200;
/// Height of the canonical capture resolution.
pub const CANONICAL_HEIGHT: u32 = 1600;

/// Cyclic frame counter driving every time-varying scene parameter.
///
/// The value always lies in `[0, period)`; advancing past the end wraps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnimationClock {
    value: u32,
    period: u32,
}

impl AnimationClock {
    /// Create a clock at zero with a validated `period > 0`.
    pub fn new(period: u32) -> PromoResult<Self> {
        if period == 0 {
            return Err(PromoError::validation("clock period must be > 0"));
        }
        Ok(Self { value: 0, period })
    }

    /// Current clock value.
    pub fn value(self) -> u32 {
        self.value
    }

    /// Loop length in ticks.
    pub fn period(self) -> u32 {
        self.period
    }

    /// Advance by `step` ticks, wrapping modulo the period, and return the new value.
    pub fn advance(&mut self, step: u32) -> u32 {
        self.value = ((u64::from(self.value) + u64::from(step)) % u64::from(self.period)) as u32;
        self.value
    }

    /// Jump to `value` (wrapped into range).
    pub fn set(&mut self, value: u32) {
        self.value = value % self.period;
    }

    /// Return to zero.
    pub fn reset(&mut self) {
        self.value = 0;
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            value: 0,
            period: CLOCK_PERIOD,
        }
    }
}

/// Bitmap dimensions requested from a rasterizer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRequest {
    /// Logical scene width.
    pub width: u32,
    /// Logical scene height.
    pub height: u32,
    /// Device pixels per logical pixel.
    pub pixel_density: f32,
}

impl CaptureRequest {
    /// The fixed high-resolution request used for every captured frame.
    pub fn canonical() -> Self {
        Self {
            width: CANONICAL_WIDTH,
            height: CANONICAL_HEIGHT,
            pixel_density: 1.0,
        }
    }

    /// Width of the returned bitmap in device pixels.
    pub fn pixel_width(self) -> u32 {
        ((self.width as f32) * self.pixel_density).round().max(1.0) as u32
    }

    /// Height of the returned bitmap in device pixels.
    pub fn pixel_height(self) -> u32 {
        ((self.height as f32) * self.pixel_density).round().max(1.0) as u32
    }

    pub fn validate(self) -> PromoResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PromoError::validation(
                "capture width/height must be non-zero",
            ));
        }
        if !self.pixel_density.is_finite() || self.pixel_density <= 0.0 {
            return Err(PromoError::validation(
                "capture pixel_density must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Named output size / compression trade-off.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputProfile {
    Small,
    #[default]
    Medium,
    Large,
}

/// Concrete numbers behind an [`OutputProfile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileSpec {
    pub target_width: u32,
    pub target_height: u32,
    /// NeuQuant sampling factor in `1..=30`; higher means coarser palettes and smaller files.
    pub quality: u8,
}

impl OutputProfile {
    pub const ALL: [OutputProfile; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn spec(self) -> ProfileSpec {
        match self {
            Self::Small => ProfileSpec {
                target_width: 640,
                target_height: 320,
                quality: 24,
            },
            Self::Medium => ProfileSpec {
                target_width: 960,
                target_height: 480,
                quality: 20,
            },
            Self::Large => ProfileSpec {
                target_width: 1280,
                target_height: 640,
                quality: 16,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for OutputProfile {
    type Err = PromoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(PromoError::validation(format!(
                "unknown output profile '{other}' (expected small, medium or large)"
            ))),
        }
    }
}

impl std::fmt::Display for OutputProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Straight-alpha RGBA8 bitmap, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA8 bytes, checking that the length matches `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> PromoResult<Self> {
        if width == 0 || height == 0 {
            return Err(PromoError::validation(
                "pixel buffer width/height must be non-zero",
            ));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(PromoError::validation(format!(
                "pixel buffer has {} bytes, expected {expected} for {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(px * 4);
        for _ in 0..px {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Read one pixel; `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub(crate) fn into_rgba_image(self) -> PromoResult<image::RgbaImage> {
        let (w, h) = (self.width, self.height);
        image::RgbaImage::from_raw(w, h, self.data).ok_or_else(|| {
            PromoError::validation(format!("pixel buffer does not fit {w}x{h} rgba8"))
        })
    }

    pub(crate) fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// One downsampled frame plus how long it stays on screen.
///
/// Immutable once appended to an encoding session.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: PixelBuffer,
    delay_ms: u32,
}

impl Frame {
    pub fn new(pixels: PixelBuffer, delay_ms: u32) -> Self {
        Self { pixels, delay_ms }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
