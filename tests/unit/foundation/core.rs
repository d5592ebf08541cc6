use super::*;

#[test]
fn clock_advance_wraps_modulo_period() {
    let mut clock = AnimationClock::default();
    assert_eq!(clock.period(), CLOCK_PERIOD);
    assert_eq!(clock.advance(5), 5);
    assert_eq!(clock.advance(110), 115);
    assert_eq!(clock.advance(5), 0);
    assert_eq!(clock.advance(125), 5);
}

#[test]
fn clock_rejects_zero_period() {
    assert!(AnimationClock::new(0).is_err());
    let mut c = AnimationClock::new(7).unwrap();
    c.set(15);
    assert_eq!(c.value(), 1);
    c.reset();
    assert_eq!(c.value(), 0);
}

#[test]
fn clock_advance_does_not_overflow_near_u32_max() {
    let mut c = AnimationClock::new(u32::MAX).unwrap();
    c.set(u32::MAX - 1);
    assert_eq!(c.advance(u32::MAX), u32::MAX - 1);
}

#[test]
fn canonical_request_is_2_to_1() {
    let req = CaptureRequest::canonical();
    assert_eq!((req.pixel_width(), req.pixel_height()), (3200, 1600));
    assert!(req.validate().is_ok());

    let bad = CaptureRequest {
        pixel_density: 0.0,
        ..req
    };
    assert!(bad.validate().is_err());
}

#[test]
fn profiles_fit_inside_canonical_and_keep_aspect() {
    for p in OutputProfile::ALL {
        let s = p.spec();
        assert!(s.target_width <= CANONICAL_WIDTH);
        assert!(s.target_height <= CANONICAL_HEIGHT);
        assert_eq!(s.target_width, s.target_height * 2);
        assert!((1..=30).contains(&s.quality));
    }
    assert_eq!(OutputProfile::Medium.spec().target_width, 960);
}

#[test]
fn profile_parses_case_insensitively() {
    assert_eq!("Large".parse::<OutputProfile>().unwrap(), OutputProfile::Large);
    assert_eq!(" small ".parse::<OutputProfile>().unwrap(), OutputProfile::Small);
    assert!("huge".parse::<OutputProfile>().is_err());
    assert_eq!(OutputProfile::default().to_string(), "medium");
}

#[test]
fn profile_serde_uses_lowercase_names() {
    let s = serde_json::to_string(&OutputProfile::Large).unwrap();
    assert_eq!(s, "\"large\"");
    let p: OutputProfile = serde_json::from_str("\"small\"").unwrap();
    assert_eq!(p, OutputProfile::Small);
}

#[test]
fn pixel_buffer_checks_length() {
    assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
    assert!(PixelBuffer::new(2, 2, vec![0; 15]).is_err());
    assert!(PixelBuffer::new(0, 2, vec![]).is_err());
}

#[test]
fn pixel_lookup_and_solid_fill() {
    let buf = PixelBuffer::solid(3, 2, [9, 8, 7, 255]);
    assert_eq!(buf.pixel_count(), 6);
    assert_eq!(buf.pixel(2, 1), Some([9, 8, 7, 255]));
    assert_eq!(buf.pixel(3, 0), None);
}

#[test]
fn frame_exposes_dimensions_and_delay() {
    let f = Frame::new(PixelBuffer::solid(4, 2, [0, 0, 0, 255]), 80);
    assert_eq!((f.width(), f.height(), f.delay_ms()), (4, 2, 80));
}
