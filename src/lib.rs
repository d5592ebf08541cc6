#![forbid(unsafe_code)]

//! Animated promotional GIF generation.
//!
//! A [`Coordinator`] steps an [`AnimationClock`] through a scene, captures each frame at the
//! canonical resolution through a [`Rasterizer`], downsamples it to the active
//! [`OutputProfile`], and encodes the sequence into a looping GIF handed to an [`ArtifactSink`].

pub mod artifact;
pub mod config;
pub mod encode;
pub mod fetch;
pub mod foundation;
pub mod pipeline;
pub mod render;
pub mod sample;
pub mod scene;

pub use artifact::{artifact_filename, slug};
pub use config::PipelineConfig;
pub use encode::{
    Artifact, ArtifactSink, DirSink, EncodedGif, EncoderOptions, EncodingSession, InMemorySink,
    PaletteMode,
};
pub use fetch::{FsFetcher, ProxyFetcher, ResourceFetcher};
pub use foundation::cancel::CancelToken;
pub use foundation::core::{
    AnimationClock, CaptureRequest, Frame, OutputProfile, PixelBuffer, ProfileSpec,
};
pub use foundation::error::{FailureKind, PromoError, PromoResult};
pub use pipeline::{
    ArtifactInfo, Coordinator, EditOutcome, GenerateOutcome, PipelineObserver, PipelineProgress,
    PipelineState, TracingObserver,
};
pub use render::downsample::{ResampleFilter, downsample};
pub use render::svg::SvgRasterizer;
pub use sample::rasterizer::Rasterizer;
pub use sample::sampler::FrameSampler;
pub use scene::model::PromoScene;
pub use scene::{SceneFrame, SceneHandle};
