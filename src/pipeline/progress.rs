/// Frames captured so far out of the frames a run will capture.
///
/// `frames_captured` only grows during a run and never exceeds `frames_total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineProgress {
    frames_captured: u32,
    frames_total: u32,
}

impl PipelineProgress {
    pub fn new(frames_total: u32) -> Self {
        Self {
            frames_captured: 0,
            frames_total,
        }
    }

    pub fn frames_captured(self) -> u32 {
        self.frames_captured
    }

    pub fn frames_total(self) -> u32 {
        self.frames_total
    }

    /// Count one more captured frame (saturating at the total).
    pub fn record_frame(&mut self) {
        if self.frames_captured < self.frames_total {
            self.frames_captured += 1;
        }
    }

    pub fn is_complete(self) -> bool {
        self.frames_total > 0 && self.frames_captured == self.frames_total
    }

    /// `round(captured / total * 100)`, held at 99 until the last frame is in.
    pub fn percent(self) -> u8 {
        if self.frames_total == 0 {
            return 0;
        }
        if self.is_complete() {
            return 100;
        }
        let c = u64::from(self.frames_captured);
        let t = u64::from(self.frames_total);
        ((c * 200 + t) / (2 * t)).min(99) as u8
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
