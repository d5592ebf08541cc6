use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::artifact::artifact_filename;
use crate::config::PipelineConfig;
use crate::encode::session::EncodingSession;
use crate::encode::sink::{Artifact, ArtifactSink};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{PromoError, PromoResult};
use crate::pipeline::progress::PipelineProgress;
use crate::render::downsample::downsample_with;
use crate::sample::rasterizer::Rasterizer;
use crate::sample::sampler::FrameSampler;
use crate::scene::model::PromoScene;

/// Where the coordinator is in a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Capturing { frame: u32 },
    Finalizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// What a successful run delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub byte_len: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateOutcome {
    Delivered(ArtifactInfo),
    /// A run was already in progress; nothing was started.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Held until the in-flight run returns to idle.
    Queued,
}

/// Receives run notifications. All methods default to no-ops.
///
/// Callbacks run on the task driving [`Coordinator::generate`] and must not block.
pub trait PipelineObserver: Send + Sync {
    fn on_state(&self, _state: PipelineState) {}
    fn on_progress(&self, _percent: u8, _progress: PipelineProgress) {}
    /// Called exactly once per failed run.
    fn on_failure(&self, _error: &PromoError) {}
    fn on_delivered(&self, _artifact: &ArtifactInfo) {}
}

/// Observer that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_state(&self, state: PipelineState) {
        tracing::debug!(?state, "pipeline state");
    }

    fn on_progress(&self, percent: u8, progress: PipelineProgress) {
        tracing::info!(
            percent,
            captured = progress.frames_captured(),
            total = progress.frames_total(),
            "progress"
        );
    }

    fn on_failure(&self, error: &PromoError) {
        tracing::error!(kind = ?error.kind(), %error, "generation failed");
    }

    fn on_delivered(&self, artifact: &ArtifactInfo) {
        tracing::info!(
            filename = %artifact.filename,
            bytes = artifact.byte_len,
            "artifact delivered"
        );
    }
}

type SceneEdit = Box<dyn FnOnce(&mut PromoScene) + Send>;

struct Shared {
    state: PipelineState,
    progress: PipelineProgress,
    pending_edits: Vec<SceneEdit>,
}

struct Work<R, S> {
    sampler: FrameSampler<R>,
    sink: S,
}

/// Drives one capture-downsample-encode-deliver run at a time.
///
/// `generate` while a run is in flight is ignored. Scene edits made during a run are queued and
/// applied before the coordinator reports `Idle` again.
pub struct Coordinator<R, S> {
    config: PipelineConfig,
    shared: Mutex<Shared>,
    work: tokio::sync::Mutex<Work<R, S>>,
    observer: Arc<dyn PipelineObserver>,
}

impl<R: Rasterizer, S: ArtifactSink> Coordinator<R, S> {
    pub fn new(mut sampler: FrameSampler<R>, sink: S, config: PipelineConfig) -> PromoResult<Self> {
        config.validate()?;
        sampler.set_settle_delay(config.settle_delay());
        Ok(Self {
            config,
            shared: Mutex::new(Shared {
                state: PipelineState::Idle,
                progress: PipelineProgress::default(),
                pending_edits: Vec::new(),
            }),
            work: tokio::sync::Mutex::new(Work { sampler, sink }),
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.shared().state
    }

    pub fn progress(&self) -> PipelineProgress {
        self.shared().progress
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: PipelineState) {
        self.shared().state = state;
        self.observer.on_state(state);
    }

    /// Change scene parameters now, or after the current run if one is in flight.
    pub async fn edit_scene(
        &self,
        edit: impl FnOnce(&mut PromoScene) + Send + 'static,
    ) -> EditOutcome {
        {
            let mut sh = self.shared();
            if sh.state.is_busy() {
                sh.pending_edits.push(Box::new(edit));
                return EditOutcome::Queued;
            }
        }
        let mut work = self.work.lock().await;
        self.apply_pending_edits(&mut work);
        work.sampler.scene_mut().edit(edit);
        EditOutcome::Applied
    }

    /// Read the current scene parameters.
    pub async fn inspect_scene<T>(&self, f: impl FnOnce(&PromoScene) -> T) -> T {
        let work = self.work.lock().await;
        f(work.sampler.scene().scene())
    }

    /// Read the sink, e.g. to collect delivered artifacts.
    pub async fn inspect_sink<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let work = self.work.lock().await;
        f(&work.sink)
    }

    /// Run the full pipeline once.
    ///
    /// Returns `Ignored` if a run is already in progress. On failure the error is returned after
    /// the observer has been notified once; no artifact is delivered and the coordinator is idle.
    #[tracing::instrument(
        skip_all,
        fields(frames = self.config.total_frames, profile = %self.config.output_profile)
    )]
    pub async fn generate(&self, cancel: &CancelToken) -> PromoResult<GenerateOutcome> {
        {
            let mut sh = self.shared();
            if sh.state.is_busy() {
                tracing::debug!(state = ?sh.state, "generate ignored while busy");
                return Ok(GenerateOutcome::Ignored);
            }
            sh.state = PipelineState::Capturing { frame: 0 };
            sh.progress = PipelineProgress::new(self.config.total_frames);
        }
        self.observer.on_state(PipelineState::Capturing { frame: 0 });
        tracing::info!("generation started");

        let mut guard = RunGuard {
            coordinator: self,
            work: None,
            finished: false,
        };
        let work = guard.work.insert(self.work.lock().await);
        self.apply_pending_edits(work);
        let result = self.run(work, cancel).await;

        match &result {
            Ok(info) => {
                self.set_state(PipelineState::Done);
                self.observer.on_delivered(info);
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation aborted");
                self.set_state(PipelineState::Failed);
                self.observer.on_failure(e);
            }
        }

        guard.finished = true;
        self.return_to_idle(guard.work.as_deref_mut());
        result.map(GenerateOutcome::Delivered)
    }

    async fn run(&self, work: &mut Work<R, S>, cancel: &CancelToken) -> PromoResult<ArtifactInfo> {
        let Work { sampler, sink } = work;
        let cfg = &self.config;
        let profile = cfg.output_profile.spec();
        let (tw, th) = (profile.target_width, profile.target_height);

        let mut session = EncodingSession::open(tw, th, profile.quality, cfg.encoder.clone())?;

        sampler.reset_clock();
        sampler.prepare(cancel).await?;

        for i in 0..cfg.total_frames {
            if i > 0 {
                self.set_state(PipelineState::Capturing { frame: i });
            }
            // Frame 0 shows the clock as published; every later frame steps it first.
            let clock = if i == 0 {
                sampler.clock_value()
            } else {
                sampler.advance(cfg.frame_step)
            };

            let capture = sampler.capture_at(clock, cancel);
            let pixels = match cfg.frame_timeout() {
                Some(limit) => tokio::time::timeout(limit, capture).await.map_err(|_| {
                    PromoError::timeout(format!(
                        "frame {i} not captured within {} ms",
                        limit.as_millis()
                    ))
                })??,
                None => capture.await?,
            };

            let filter = cfg.resample;
            let frame = tokio::task::spawn_blocking(move || downsample_with(pixels, tw, th, filter))
                .await
                .map_err(|e| anyhow::anyhow!("downsample task failed: {e}"))??;
            session.append_frame(frame, cfg.frame_delay_ms)?;

            let progress = {
                let mut sh = self.shared();
                sh.progress.record_frame();
                sh.progress
            };
            tracing::debug!(frame = i, clock, percent = progress.percent(), "frame captured");
            self.observer.on_progress(progress.percent(), progress);
        }

        self.set_state(PipelineState::Finalizing);
        let gif = cancel.run(session.finalize()).await??;
        tracing::info!(bytes = gif.bytes.len(), frames = gif.frame_count, "gif finalized");

        let filename = artifact_filename(
            &sampler.scene().scene().site.name,
            &cfg.descriptor,
            gif.width,
            gif.height,
            "gif",
        );
        let artifact = Artifact {
            filename,
            bytes: gif.bytes,
            width: gif.width,
            height: gif.height,
            frame_count: gif.frame_count,
        };
        sink.deliver(&artifact).await?;

        Ok(ArtifactInfo {
            filename: artifact.filename,
            width: artifact.width,
            height: artifact.height,
            frame_count: artifact.frame_count,
            byte_len: artifact.bytes.len(),
        })
    }

    // Apply queued edits, then go idle in the same critical section that sees the queue empty.
    // Without the work lock the edits stay queued for the next holder of it.
    fn return_to_idle(&self, mut work: Option<&mut Work<R, S>>) {
        loop {
            let edits = {
                let mut sh = self.shared();
                if sh.pending_edits.is_empty() || work.is_none() {
                    sh.state = PipelineState::Idle;
                    sh.progress = PipelineProgress::default();
                    break;
                }
                std::mem::take(&mut sh.pending_edits)
            };
            if let Some(work) = work.as_deref_mut() {
                tracing::debug!(count = edits.len(), "applying queued scene edits");
                for edit in edits {
                    work.sampler.scene_mut().edit(edit);
                }
            }
        }
        self.observer.on_state(PipelineState::Idle);
    }

    fn apply_pending_edits(&self, work: &mut Work<R, S>) {
        let edits = std::mem::take(&mut self.shared().pending_edits);
        for edit in edits {
            work.sampler.scene_mut().edit(edit);
        }
    }
}

/// Returns the coordinator to idle if a `generate` future is dropped before it completes.
struct RunGuard<'a, R: Rasterizer, S: ArtifactSink> {
    coordinator: &'a Coordinator<R, S>,
    work: Option<tokio::sync::MutexGuard<'a, Work<R, S>>>,
    finished: bool,
}

impl<R: Rasterizer, S: ArtifactSink> Drop for RunGuard<'_, R, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let coord = self.coordinator;
        tracing::warn!("generation dropped before completion");
        coord.set_state(PipelineState::Failed);
        coord.observer.on_failure(&PromoError::Cancelled);

        let mut work = self.work.take().or_else(|| coord.work.try_lock().ok());
        coord.return_to_idle(work.as_deref_mut());
    }
}
