use super::*;

fn decode(bytes: &[u8]) -> Vec<gif::Frame<'static>> {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut dec = opts.read_info(bytes).unwrap();
    let mut out = Vec::new();
    while let Some(f) = dec.read_next_frame().unwrap() {
        out.push(f.clone());
    }
    out
}

#[test]
fn open_rejects_bad_parameters() {
    let o = EncoderOptions::default();
    assert!(EncodingSession::open(0, 4, 20, o.clone()).is_err());
    assert!(EncodingSession::open(70_000, 4, 20, o.clone()).is_err());
    assert!(EncodingSession::open(4, 4, 0, o.clone()).is_err());
    assert!(EncodingSession::open(4, 4, 31, o.clone()).is_err());
    assert!(
        EncodingSession::open(
            4,
            4,
            20,
            EncoderOptions {
                parallelism: 0,
                ..EncoderOptions::default()
            }
        )
        .is_err()
    );
    assert!(
        EncodingSession::open(
            4,
            4,
            20,
            EncoderOptions {
                max_colors: 8,
                ..EncoderOptions::default()
            }
        )
        .is_err()
    );
}

#[test]
fn append_rejects_size_mismatch() {
    let mut s = EncodingSession::open(4, 2, 20, EncoderOptions::default()).unwrap();
    let err = s
        .append_frame(PixelBuffer::solid(2, 2, [0, 0, 0, 255]), 80)
        .unwrap_err();
    assert!(matches!(err, PromoError::Encoding(_)));
    assert_eq!(s.frame_count(), 0);
}

#[test]
fn append_rejects_truncated_pixel_data() {
    let mut s = EncodingSession::open(4, 2, 20, EncoderOptions::default()).unwrap();
    let short = PixelBuffer {
        width: 4,
        height: 2,
        data: vec![0; 12],
    };
    let err = s.append_frame(short, 80).unwrap_err();
    assert!(matches!(err, PromoError::Encoding(_)));
    assert_eq!(s.frame_count(), 0);
}

#[test]
fn append_flattens_translucent_pixels_over_matte() {
    let opts = EncoderOptions {
        matte: [0, 0, 255],
        ..EncoderOptions::default()
    };
    let mut s = EncodingSession::open(1, 1, 20, opts).unwrap();
    s.append_frame(PixelBuffer::solid(1, 1, [255, 0, 0, 0]), 80)
        .unwrap();
    assert_eq!(s.frames()[0].pixels().data, vec![0, 0, 255, 255]);
}

#[test]
fn delay_rounds_to_centiseconds() {
    assert_eq!(delay_centis(80), 8);
    assert_eq!(delay_centis(84), 8);
    assert_eq!(delay_centis(85), 9);
    assert_eq!(delay_centis(0), 1);
}

#[tokio::test]
async fn finalize_without_frames_fails_and_closes_session() {
    let mut s = EncodingSession::open(4, 2, 20, EncoderOptions::default()).unwrap();
    let err = s.finalize().await.unwrap_err();
    assert!(matches!(err, PromoError::Encoding(_)));
    assert!(s.is_finalized());
    assert!(
        s.append_frame(PixelBuffer::solid(4, 2, [0, 0, 0, 255]), 80)
            .is_err()
    );
}

#[tokio::test]
async fn finalize_produces_looping_gif_in_append_order() {
    let mut s = EncodingSession::open(4, 2, 20, EncoderOptions::default()).unwrap();
    s.append_frame(PixelBuffer::solid(4, 2, [255, 0, 0, 255]), 80)
        .unwrap();
    s.append_frame(PixelBuffer::solid(4, 2, [0, 255, 0, 255]), 80)
        .unwrap();
    s.append_frame(PixelBuffer::solid(4, 2, [0, 0, 255, 255]), 120)
        .unwrap();

    let gif = s.finalize().await.unwrap();
    assert_eq!((gif.width, gif.height, gif.frame_count), (4, 2, 3));
    assert!(gif.bytes.starts_with(b"GIF89a"));
    // NETSCAPE2.0 application extension marks an infinitely looping animation.
    assert!(gif.bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));

    let frames = decode(&gif.bytes);
    assert_eq!(frames.len(), 3);
    assert_eq!(&frames[0].buffer[..4], &[255, 0, 0, 255]);
    assert_eq!(&frames[1].buffer[..4], &[0, 255, 0, 255]);
    assert_eq!(&frames[2].buffer[..4], &[0, 0, 255, 255]);
    assert_eq!(frames[0].delay, 8);
    assert_eq!(frames[2].delay, 12);

    assert!(s.finalize().await.is_err());
}

#[tokio::test]
async fn per_frame_palettes_decode_to_same_colors() {
    let opts = EncoderOptions {
        palette: PaletteMode::PerFrame,
        dither: true,
        parallelism: 1,
        ..EncoderOptions::default()
    };
    let mut s = EncodingSession::open(2, 2, 10, opts).unwrap();
    s.append_frame(PixelBuffer::solid(2, 2, [10, 20, 30, 255]), 80)
        .unwrap();
    s.append_frame(PixelBuffer::solid(2, 2, [200, 100, 50, 255]), 80)
        .unwrap();

    let gif = s.finalize().await.unwrap();
    let frames = decode(&gif.bytes);
    assert_eq!(&frames[1].buffer[..4], &[200, 100, 50, 255]);
}
