use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::*;
use crate::foundation::core::AnimationClock;
use crate::scene::SceneFrame;
use crate::scene::model::PromoScene;

#[derive(Default)]
struct Recording {
    clocks: Arc<Mutex<Vec<u32>>>,
    signal: bool,
    wrong_size: bool,
    truncated: bool,
}

#[async_trait]
impl Rasterizer for Recording {
    async fn rasterize(
        &mut self,
        frame: &SceneFrame,
        request: CaptureRequest,
    ) -> PromoResult<PixelBuffer> {
        self.clocks.lock().unwrap().push(frame.clock());
        if self.truncated {
            return Ok(PixelBuffer {
                width: request.pixel_width(),
                height: request.pixel_height(),
                data: vec![0; 4],
            });
        }
        let w = if self.wrong_size {
            request.pixel_width() + 1
        } else {
            request.pixel_width()
        };
        Ok(PixelBuffer::solid(
            w,
            request.pixel_height(),
            [frame.clock() as u8, 0, 0, 255],
        ))
    }

    fn has_repaint_signal(&self) -> bool {
        self.signal
    }
}

fn small_request() -> CaptureRequest {
    CaptureRequest {
        width: 8,
        height: 4,
        pixel_density: 1.0,
    }
}

fn sampler(r: Recording) -> FrameSampler<Recording> {
    let handle = SceneHandle::new(PromoScene::default(), AnimationClock::default());
    FrameSampler::new(handle, r).with_request(small_request())
}

#[tokio::test(start_paused = true)]
async fn capture_waits_for_settle_delay_then_rasterizes_published_clock() {
    let clocks = Arc::new(Mutex::new(Vec::new()));
    let mut s = sampler(Recording {
        clocks: Arc::clone(&clocks),
        ..Default::default()
    });
    s.set_settle_delay(Duration::from_millis(80));

    let start = tokio::time::Instant::now();
    let px = s.capture_at(45, &CancelToken::new()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(80));
    assert_eq!((px.width, px.height), (8, 4));
    assert_eq!(px.pixel(0, 0), Some([45, 0, 0, 255]));
    assert_eq!(*clocks.lock().unwrap(), vec![45]);
    assert_eq!(s.clock_value(), 45);
}

#[tokio::test(start_paused = true)]
async fn repaint_signal_replaces_fixed_delay() {
    let mut s = sampler(Recording {
        signal: true,
        ..Default::default()
    });
    s.set_settle_delay(Duration::from_secs(60));

    let start = tokio::time::Instant::now();
    s.capture_at(0, &CancelToken::new()).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn advance_wraps_clock() {
    let mut s = sampler(Recording::default());
    assert_eq!(s.advance(100), 100);
    assert_eq!(s.advance(25), 5);
    s.reset_clock();
    assert_eq!(s.clock_value(), 0);
}

#[tokio::test(start_paused = true)]
async fn wrong_sized_bitmap_is_a_rasterization_failure() {
    let mut s = sampler(Recording {
        wrong_size: true,
        ..Default::default()
    });
    let err = s.capture_at(0, &CancelToken::new()).await.unwrap_err();
    assert!(matches!(err, PromoError::Rasterization(_)));
}

#[tokio::test(start_paused = true)]
async fn truncated_bitmap_is_a_rasterization_failure() {
    let mut s = sampler(Recording {
        truncated: true,
        ..Default::default()
    });
    let err = s.capture_at(0, &CancelToken::new()).await.unwrap_err();
    assert!(matches!(err, PromoError::Rasterization(_)), "{err}");
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_aborts_before_rasterizing() {
    let clocks = Arc::new(Mutex::new(Vec::new()));
    let mut s = sampler(Recording {
        clocks: Arc::clone(&clocks),
        ..Default::default()
    });
    s.set_settle_delay(Duration::from_millis(80));
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = s.capture_at(5, &cancel).await.unwrap_err();
    assert!(matches!(err, PromoError::Cancelled));
    assert!(clocks.lock().unwrap().is_empty());
}
