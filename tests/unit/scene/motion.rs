use super::*;

#[test]
fn blink_toggles_every_fifteen_ticks() {
    assert!(blink_visible(0));
    assert!(blink_visible(14));
    assert!(!blink_visible(15));
    assert!(!blink_visible(29));
    assert!(blink_visible(30));
    assert!(!blink_visible(119));
}

#[test]
fn slideshow_changes_every_sixty_ticks() {
    assert_eq!(slideshow_index(0, 3), 0);
    assert_eq!(slideshow_index(59, 3), 0);
    assert_eq!(slideshow_index(60, 3), 1);
    assert_eq!(slideshow_index(119, 3), 1);
    assert_eq!(slideshow_index(60, 1), 0);
    assert_eq!(slideshow_index(60, 0), 0);
}

#[test]
fn wave_is_bounded_and_phase_shifted_per_char() {
    for clock in 0..120 {
        for i in 0..16 {
            assert!(wave_offset(clock, i).abs() <= WAVE_AMPLITUDE_PX + 1e-9);
        }
    }
    assert_eq!(wave_offset(0, 0), 0.0);
    assert!((wave_offset(1, 0) - wave_offset(0, 1)).abs() < 1e-12);
}

#[test]
fn evaluate_is_a_pure_function_of_clock() {
    let a = MotionState::evaluate(20, 5, 2);
    let b = MotionState::evaluate(20, 5, 2);
    assert_eq!(a, b);
    assert_eq!(a.wave_offsets.len(), 5);
    assert!(!a.blink_visible);
    assert_eq!(a.slide_index, 0);
}
