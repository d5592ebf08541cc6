//! Palette quantization, GIF stream assembly and artifact delivery.

pub mod quantize;
pub mod session;
pub mod sink;

pub use quantize::{Palette, PaletteMode};
pub use session::{EncodedGif, EncoderOptions, EncodingSession};
pub use sink::{Artifact, ArtifactSink, DirSink, InMemorySink};
