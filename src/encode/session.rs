use std::borrow::Cow;

use rayon::prelude::*;

use crate::encode::quantize::{Palette, PaletteMode};
use crate::foundation::core::{Frame, PixelBuffer};
use crate::foundation::error::{PromoError, PromoResult};
use crate::foundation::math::flatten_over_matte;

/// Tunables for GIF encoding that are not tied to an output profile.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Floyd-Steinberg error diffusion when mapping onto a trained palette.
    pub dither: bool,
    pub palette: PaletteMode,
    /// Worker threads used for palette training and pixel mapping.
    pub parallelism: usize,
    /// Palette size in `16..=256`.
    pub max_colors: usize,
    /// Color that translucent pixels are flattened onto.
    pub matte: [u8; 3],
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            dither: false,
            palette: PaletteMode::Global,
            parallelism: 2,
            max_colors: 256,
            matte: [0, 0, 0],
        }
    }
}

impl EncoderOptions {
    pub fn validate(&self) -> PromoResult<()> {
        if self.parallelism == 0 {
            return Err(PromoError::validation("encoder parallelism must be >= 1"));
        }
        if !(16..=256).contains(&self.max_colors) {
            return Err(PromoError::validation(
                "encoder max_colors must be in 16..=256",
            ));
        }
        Ok(())
    }
}

/// A finished animated GIF.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedGif {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
}

/// Accumulates frames for one GIF and encodes them on finalize.
///
/// Frames are kept in append order. After [`EncodingSession::finalize`] the session rejects any
/// further use.
#[derive(Debug)]
pub struct EncodingSession {
    width: u32,
    height: u32,
    quality: u8,
    opts: EncoderOptions,
    frames: Vec<Frame>,
    finalized: bool,
}

impl EncodingSession {
    /// Open a session for `width x height` frames at NeuQuant `quality` (1 = best, 30 = fastest).
    pub fn open(width: u32, height: u32, quality: u8, opts: EncoderOptions) -> PromoResult<Self> {
        if width == 0 || height == 0 {
            return Err(PromoError::validation(
                "gif width/height must be non-zero",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(PromoError::validation(format!(
                "gif dimensions {width}x{height} exceed {}",
                u16::MAX
            )));
        }
        if !(1..=30).contains(&quality) {
            return Err(PromoError::validation("gif quality must be in 1..=30"));
        }
        opts.validate()?;

        Ok(Self {
            width,
            height,
            quality,
            opts,
            frames: Vec::new(),
            finalized: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Append one frame shown for `delay_ms`. Translucent pixels are flattened onto the matte.
    pub fn append_frame(&mut self, mut pixels: PixelBuffer, delay_ms: u32) -> PromoResult<()> {
        if self.finalized {
            return Err(PromoError::encoding("session is already finalized"));
        }
        if pixels.width != self.width || pixels.height != self.height {
            return Err(PromoError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                pixels.width, pixels.height, self.width, self.height
            )));
        }
        let expected = (self.width as usize) * (self.height as usize) * 4;
        if pixels.data.len() != expected {
            return Err(PromoError::encoding(format!(
                "frame has {} bytes, expected {expected}",
                pixels.data.len()
            )));
        }
        flatten_over_matte(&mut pixels.data, self.opts.matte);
        self.frames.push(Frame::new(pixels, delay_ms));
        Ok(())
    }

    /// Encode every appended frame into a looping GIF.
    ///
    /// Quantization and LZW compression run on the blocking pool.
    pub async fn finalize(&mut self) -> PromoResult<EncodedGif> {
        if self.finalized {
            return Err(PromoError::encoding("session is already finalized"));
        }
        self.finalized = true;
        if self.frames.is_empty() {
            return Err(PromoError::encoding("cannot finalize a gif with no frames"));
        }

        let frames = std::mem::take(&mut self.frames);
        let (width, height, quality) = (self.width, self.height, self.quality);
        let opts = self.opts.clone();

        tokio::task::spawn_blocking(move || encode_gif(&frames, width, height, quality, &opts))
            .await
            .map_err(|e| PromoError::encoding(format!("encode task failed: {e}")))?
    }
}

/// GIF delays are in hundredths of a second; round to nearest and never emit zero.
pub(crate) fn delay_centis(delay_ms: u32) -> u16 {
    (delay_ms.saturating_add(5) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

#[tracing::instrument(skip(frames, opts), fields(frames = frames.len()))]
fn encode_gif(
    frames: &[Frame],
    width: u32,
    height: u32,
    quality: u8,
    opts: &EncoderOptions,
) -> PromoResult<EncodedGif> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.parallelism)
        .build()
        .map_err(|e| PromoError::encoding(format!("failed to start encoder workers: {e}")))?;

    let (global, indexed): (Option<Palette>, Vec<(Vec<u8>, Option<Vec<u8>>)>) =
        pool.install(|| match opts.palette {
            PaletteMode::Global => {
                let all: Vec<&[u8]> = frames.iter().map(|f| f.pixels().data.as_slice()).collect();
                let palette = Palette::build(&all, opts.max_colors, quality);
                let indexed = frames
                    .par_iter()
                    .map(|f| (palette.map_frame(&f.pixels().data, width, opts.dither), None))
                    .collect();
                (Some(palette), indexed)
            }
            PaletteMode::PerFrame => {
                let indexed = frames
                    .par_iter()
                    .map(|f| {
                        let data = f.pixels().data.as_slice();
                        let palette = Palette::build(&[data], opts.max_colors, quality);
                        let idx = palette.map_frame(data, width, opts.dither);
                        (idx, Some(palette.rgb().to_vec()))
                    })
                    .collect();
                (None, indexed)
            }
        });

    let global_rgb = global.as_ref().map(|p| p.rgb()).unwrap_or(&[]);
    tracing::debug!(
        palette_colors = global.as_ref().map_or(0, Palette::len),
        "palette ready"
    );

    let mut encoder = gif::Encoder::new(Vec::new(), width as u16, height as u16, global_rgb)
        .map_err(|e| PromoError::encoding(format!("failed to start gif stream: {e}")))?;
    encoder
        .set_repeat(gif::Repeat::Infinite)
        .map_err(|e| PromoError::encoding(format!("failed to set gif loop: {e}")))?;

    for (frame, (indices, local)) in frames.iter().zip(indexed) {
        let gif_frame = gif::Frame {
            width: width as u16,
            height: height as u16,
            delay: delay_centis(frame.delay_ms()),
            dispose: gif::DisposalMethod::Keep,
            palette: local,
            buffer: Cow::Owned(indices),
            ..gif::Frame::default()
        };
        encoder
            .write_frame(&gif_frame)
            .map_err(|e| PromoError::encoding(format!("failed to write gif frame: {e}")))?;
    }

    let bytes = encoder
        .into_inner()
        .map_err(|e| PromoError::encoding(format!("failed to finish gif stream: {e}")))?;

    Ok(EncodedGif {
        bytes,
        width,
        height,
        frame_count: frames.len(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/session.rs"]
mod tests;
