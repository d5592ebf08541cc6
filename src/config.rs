use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::artifact::DEFAULT_DESCRIPTOR;
use crate::encode::session::EncoderOptions;
use crate::foundation::core::OutputProfile;
use crate::foundation::error::{PromoError, PromoResult};
use crate::render::downsample::ResampleFilter;

/// Settings for one generation run.
///
/// Every field has a default, so a config file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames captured per run.
    pub total_frames: u32,
    /// Clock ticks advanced between consecutive frames.
    pub frame_step: u32,
    /// Wait after publishing a clock value, for rasterizers without a repaint signal.
    pub settle_delay_ms: u64,
    /// How long each frame stays on screen in the output.
    pub frame_delay_ms: u32,
    pub output_profile: OutputProfile,
    /// Abort the run when a single capture takes longer than this.
    pub frame_timeout_ms: Option<u64>,
    pub resample: ResampleFilter,
    pub encoder: EncoderOptions,
    /// Middle part of the output filename.
    pub descriptor: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            total_frames: 24,
            frame_step: 5,
            settle_delay_ms: 80,
            frame_delay_ms: 80,
            output_profile: OutputProfile::Medium,
            frame_timeout_ms: None,
            resample: ResampleFilter::default(),
            encoder: EncoderOptions::default(),
            descriptor: DEFAULT_DESCRIPTOR.to_owned(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> PromoResult<()> {
        if self.total_frames == 0 {
            return Err(PromoError::validation("total_frames must be > 0"));
        }
        if self.frame_step == 0 {
            return Err(PromoError::validation("frame_step must be > 0"));
        }
        // GIF delays have centisecond resolution.
        if self.frame_delay_ms < 10 {
            return Err(PromoError::validation("frame_delay_ms must be >= 10"));
        }
        if self.frame_timeout_ms == Some(0) {
            return Err(PromoError::validation("frame_timeout_ms must be > 0 when set"));
        }
        if self.descriptor.trim().is_empty() || self.descriptor.contains(['/', '\\']) {
            return Err(PromoError::validation(
                "descriptor must be non-empty and must not contain path separators",
            ));
        }
        self.encoder.validate()
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> PromoResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| PromoError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> PromoResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> PromoResult<Self> {
        let path = path.as_ref();
        use anyhow::Context as _;
        let f = File::open(path)
            .with_context(|| format!("open config JSON '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }
}
