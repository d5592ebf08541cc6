//! Scene parameters, clock-driven motion and the single-owner scene handle.

pub mod color;
pub mod model;
pub mod motion;

use std::sync::Arc;

use crate::foundation::core::AnimationClock;
use crate::scene::model::PromoScene;
use crate::scene::motion::MotionState;

/// Consistent snapshot of the scene at one clock value, as seen by a rasterizer.
#[derive(Clone, Debug)]
pub struct SceneFrame {
    pub scene: Arc<PromoScene>,
    pub motion: MotionState,
}

impl SceneFrame {
    pub fn clock(&self) -> u32 {
        self.motion.clock
    }
}

/// Exclusive owner of the mutable scene: parameters plus the current clock.
///
/// Capture code publishes clock values through `&mut self`, so no other writer can interleave
/// between a parameter update and the capture that reads it.
#[derive(Debug)]
pub struct SceneHandle {
    scene: Arc<PromoScene>,
    clock: AnimationClock,
}

impl SceneHandle {
    pub fn new(scene: PromoScene, clock: AnimationClock) -> Self {
        Self {
            scene: Arc::new(scene),
            clock,
        }
    }

    pub fn scene(&self) -> &PromoScene {
        &self.scene
    }

    pub fn clock(&self) -> AnimationClock {
        self.clock
    }

    pub fn clock_mut(&mut self) -> &mut AnimationClock {
        &mut self.clock
    }

    /// Apply a parameter edit. Snapshots taken earlier keep the old parameters.
    pub fn edit(&mut self, f: impl FnOnce(&mut PromoScene)) {
        f(Arc::make_mut(&mut self.scene));
    }

    /// Set the clock to `clock_value` and return the derived snapshot.
    pub fn publish(&mut self, clock_value: u32) -> SceneFrame {
        self.clock.set(clock_value);
        self.snapshot()
    }

    pub fn snapshot(&self) -> SceneFrame {
        let header_chars = self.scene.header_text.chars().count();
        let images = self.scene.right_panel.images.len();
        SceneFrame {
            scene: Arc::clone(&self.scene),
            motion: MotionState::evaluate(self.clock.value(), header_chars, images),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/handle.rs"]
mod tests;
