use async_trait::async_trait;

use crate::foundation::core::{CaptureRequest, PixelBuffer};
use crate::foundation::error::PromoResult;
use crate::scene::SceneFrame;
use crate::scene::model::PromoScene;

/// Turns a scene snapshot into a bitmap at a caller-chosen resolution.
///
/// Implementations must be deterministic: the same frame and request yield the same pixels.
/// Failures to load referenced images are reported as
/// [`PromoError::ResourceLoad`](crate::PromoError::ResourceLoad); failures of the capture itself as
/// [`PromoError::Rasterization`](crate::PromoError::Rasterization).
#[async_trait]
pub trait Rasterizer: Send {
    /// Produce a straight-alpha RGBA8 bitmap of exactly
    /// `request.pixel_width() x request.pixel_height()` pixels.
    async fn rasterize(
        &mut self,
        frame: &SceneFrame,
        request: CaptureRequest,
    ) -> PromoResult<PixelBuffer>;

    /// Whether [`Rasterizer::repaint_complete`] is a real completion signal.
    ///
    /// When `false` the sampler falls back to the configured fixed settle delay.
    fn has_repaint_signal(&self) -> bool {
        false
    }

    /// Resolve once the surface reflects `frame`.
    async fn repaint_complete(&mut self, _frame: &SceneFrame) -> PromoResult<()> {
        Ok(())
    }

    /// Called once at the start of every run, before the first capture.
    async fn prepare(&mut self, _scene: &PromoScene) -> PromoResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    async fn rasterize(
        &mut self,
        frame: &SceneFrame,
        request: CaptureRequest,
    ) -> PromoResult<PixelBuffer> {
        (**self).rasterize(frame, request).await
    }

    fn has_repaint_signal(&self) -> bool {
        (**self).has_repaint_signal()
    }

    async fn repaint_complete(&mut self, frame: &SceneFrame) -> PromoResult<()> {
        (**self).repaint_complete(frame).await
    }

    async fn prepare(&mut self, scene: &PromoScene) -> PromoResult<()> {
        (**self).prepare(scene).await
    }
}
