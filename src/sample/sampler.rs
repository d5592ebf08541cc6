use std::time::Duration;

use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{CaptureRequest, PixelBuffer};
use crate::foundation::error::{PromoError, PromoResult};
use crate::sample::rasterizer::Rasterizer;
use crate::scene::SceneHandle;

/// Advances the animation clock and captures the scene at canonical resolution.
///
/// Captures are strictly sequential: `capture_at` takes `&mut self`, so the next clock value
/// cannot be published while a capture is still reading the scene.
pub struct FrameSampler<R> {
    scene: SceneHandle,
    rasterizer: R,
    request: CaptureRequest,
    settle_delay: Duration,
}

impl<R: Rasterizer> FrameSampler<R> {
    pub fn new(scene: SceneHandle, rasterizer: R) -> Self {
        Self {
            scene,
            rasterizer,
            request: CaptureRequest::canonical(),
            settle_delay: Duration::ZERO,
        }
    }

    /// Override the capture request (tests use small requests to keep buffers cheap).
    pub fn with_request(mut self, request: CaptureRequest) -> Self {
        self.request = request;
        self
    }

    pub fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn request(&self) -> CaptureRequest {
        self.request
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneHandle {
        &mut self.scene
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    pub fn clock_value(&self) -> u32 {
        self.scene.clock().value()
    }

    /// Move the clock forward by `step` ticks (wrapping) and return the new value.
    pub fn advance(&mut self, step: u32) -> u32 {
        self.scene.clock_mut().advance(step)
    }

    pub fn reset_clock(&mut self) {
        self.scene.clock_mut().reset();
    }

    /// Give the rasterizer a chance to preload resources for the current scene.
    pub async fn prepare(&mut self, cancel: &CancelToken) -> PromoResult<()> {
        self.request.validate()?;
        let scene = self.scene.snapshot().scene;
        cancel.run(self.rasterizer.prepare(&scene)).await?
    }

    /// Publish `clock_value`, wait for the surface to settle, then rasterize.
    ///
    /// Any rasterizer rejection is returned as-is; there is no retry.
    #[tracing::instrument(skip(self, cancel), level = "debug")]
    pub async fn capture_at(
        &mut self,
        clock_value: u32,
        cancel: &CancelToken,
    ) -> PromoResult<PixelBuffer> {
        let frame = self.scene.publish(clock_value);

        if self.rasterizer.has_repaint_signal() {
            cancel.run(self.rasterizer.repaint_complete(&frame)).await??;
        } else if !self.settle_delay.is_zero() {
            cancel.run(tokio::time::sleep(self.settle_delay)).await?;
        }

        let request = self.request;
        let pixels = cancel
            .run(self.rasterizer.rasterize(&frame, request))
            .await??;

        let (w, h) = (request.pixel_width(), request.pixel_height());
        if pixels.width != w || pixels.height != h {
            return Err(PromoError::rasterization(format!(
                "rasterizer returned {}x{}, expected {w}x{h}",
                pixels.width, pixels.height
            )));
        }
        let expected = (w as usize) * (h as usize) * 4;
        if pixels.data.len() != expected {
            return Err(PromoError::rasterization(format!(
                "rasterizer returned {} bytes for {w}x{h}, expected {expected}",
                pixels.data.len()
            )));
        }
        Ok(pixels)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sample/sampler.rs"]
mod tests;
