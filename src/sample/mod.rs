//! Frame sampling: publishing clock values into the scene and capturing full-resolution bitmaps.

/// Rasterizer collaborator contract.
pub mod rasterizer;
/// Clock-driven frame sampler.
pub mod sampler;
