//! Raster stages: downsampling and the reference SVG rasterizer.

/// Canonical-to-target resampling.
pub mod downsample;
/// `usvg`/`resvg` implementation of the rasterizer contract.
pub mod svg;
