//! Pure functions from the animation clock to time-varying scene values.

/// Clock ticks per blink half-cycle (0.5 s at 30 fps).
pub const BLINK_HALF_PERIOD: u32 = 15;
/// Clock ticks each slideshow image stays up (2 s at 30 fps).
pub const SLIDE_DURATION: u32 = 60;
/// Peak vertical displacement of the header wave, in scene pixels.
pub const WAVE_AMPLITUDE_PX: f64 = 20.0;
const WAVE_PHASE_PER_TICK: f64 = 0.3;
const WAVE_PHASE_PER_CHAR: f64 = 0.3;

/// Vertical offset of header character `char_index` at `clock`.
pub fn wave_offset(clock: u32, char_index: usize) -> f64 {
    let phase = f64::from(clock) * WAVE_PHASE_PER_TICK + (char_index as f64) * WAVE_PHASE_PER_CHAR;
    phase.sin() * WAVE_AMPLITUDE_PX
}

/// Whether blinking elements are in their "on" phase.
pub fn blink_visible(clock: u32) -> bool {
    (clock / BLINK_HALF_PERIOD) % 2 == 0
}

/// Index of the slideshow image shown at `clock`; `0` when there are no images.
pub fn slideshow_index(clock: u32, image_count: usize) -> usize {
    if image_count == 0 {
        return 0;
    }
    ((clock / SLIDE_DURATION) as usize) % image_count
}

/// All time-varying values for one clock tick.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionState {
    pub clock: u32,
    pub blink_visible: bool,
    pub slide_index: usize,
    /// One entry per header character.
    pub wave_offsets: Vec<f64>,
}

impl MotionState {
    pub fn evaluate(clock: u32, header_chars: usize, image_count: usize) -> Self {
        Self {
            clock,
            blink_visible: blink_visible(clock),
            slide_index: slideshow_index(clock, image_count),
            wave_offsets: (0..header_chars).map(|i| wave_offset(clock, i)).collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/motion.rs"]
mod tests;
