use std::io::Cursor;

use super::*;
use crate::foundation::core::AnimationClock;
use crate::scene::SceneHandle;
use crate::scene::model::SlideImage;

struct MapFetcher(HashMap<String, Vec<u8>>);

#[async_trait]
impl ResourceFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> PromoResult<Vec<u8>> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| PromoError::resource_load(format!("no such resource '{url}'")))
    }
}

fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn tiny_request() -> CaptureRequest {
    CaptureRequest {
        width: 64,
        height: 32,
        pixel_density: 1.0,
    }
}

fn no_fonts() -> Arc<usvg::fontdb::Database> {
    Arc::new(usvg::fontdb::Database::new())
}

fn frame_at(scene: PromoScene, clock: u32) -> SceneFrame {
    let mut h = SceneHandle::new(scene, AnimationClock::default());
    h.publish(clock)
}

#[test]
fn data_uri_passes_png_through() {
    let png = png_bytes([1, 2, 3]);
    let uri = image_data_uri(&png).unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));
}

#[test]
fn data_uri_rejects_garbage() {
    let err = image_data_uri(b"definitely not an image").unwrap_err();
    assert!(matches!(err, PromoError::ResourceLoad(_)));
}

#[test]
fn text_is_escaped() {
    let mut scene = PromoScene::default();
    scene.text1 = "a<b & \"c\"".to_owned();
    let svg = build_scene_svg(&frame_at(scene, 0), &HashMap::new(), tiny_request()).unwrap();
    assert!(svg.contains("a&lt;b\u{a0}&amp;\u{a0}&quot;c&quot;"));
    assert!(!svg.contains("a<b"));
}

#[test]
fn blink_phase_changes_search_text_opacity() {
    let on = build_scene_svg(
        &frame_at(PromoScene::default(), 0),
        &HashMap::new(),
        tiny_request(),
    )
    .unwrap();
    let off = build_scene_svg(
        &frame_at(PromoScene::default(), 15),
        &HashMap::new(),
        tiny_request(),
    )
    .unwrap();
    assert!(on.contains(r#"fill-opacity="1""#));
    assert!(off.contains(r#"fill-opacity="0.3""#));
    assert_ne!(on, off);
}

#[test]
fn missing_image_in_cache_is_resource_load_error() {
    let mut scene = PromoScene::default();
    scene.background = "bg.png".to_owned();
    let err = build_scene_svg(&frame_at(scene, 0), &HashMap::new(), tiny_request()).unwrap_err();
    assert!(matches!(err, PromoError::ResourceLoad(_)));
}

#[test]
fn slideshow_embeds_only_the_current_image() {
    let mut scene = PromoScene::default();
    scene.right_panel.images = vec![
        SlideImage {
            url: "a.png".to_owned(),
            name: "first".to_owned(),
        },
        SlideImage {
            url: "b.png".to_owned(),
            name: "second".to_owned(),
        },
    ];
    let mut images = HashMap::new();
    images.insert("a.png".to_owned(), Arc::<str>::from("data:image/png;base64,AAAA"));
    images.insert("b.png".to_owned(), Arc::<str>::from("data:image/png;base64,BBBB"));

    let early = build_scene_svg(&frame_at(scene.clone(), 10), &images, tiny_request()).unwrap();
    assert!(early.contains("AAAA") && early.contains("first"));
    assert!(!early.contains("BBBB"));

    let late = build_scene_svg(&frame_at(scene, 70), &images, tiny_request()).unwrap();
    assert!(late.contains("BBBB") && late.contains("second"));
}

#[tokio::test]
async fn renders_requested_size_with_theme_background() {
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(MapFetcher(HashMap::new()));
    let mut r = SvgRasterizer::with_fontdb(fetcher, no_fonts());
    let frame = frame_at(PromoScene::default(), 0);

    let px = r.rasterize(&frame, tiny_request()).await.unwrap();
    assert_eq!((px.width, px.height), (64, 32));

    let corner = px.pixel(0, 0).unwrap();
    assert_eq!(corner[3], 255);
    for (got, want) in corner.iter().zip([0x05u8, 0x0b, 0x14]) {
        assert!(got.abs_diff(want) <= 1, "corner {corner:?}");
    }
}

#[tokio::test]
async fn prepare_caches_each_url_once() {
    let mut map = HashMap::new();
    map.insert("bg.png".to_owned(), png_bytes([200, 10, 10]));
    map.insert("slide.png".to_owned(), png_bytes([10, 200, 10]));
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(MapFetcher(map));
    let mut r = SvgRasterizer::with_fontdb(fetcher, no_fonts());

    let mut scene = PromoScene::default();
    scene.background = "bg.png".to_owned();
    scene.right_panel.images = vec![SlideImage {
        url: "slide.png".to_owned(),
        name: String::new(),
    }];
    r.prepare(&scene).await.unwrap();
    assert_eq!(r.cached_images(), 2);

    let px = r.rasterize(&frame_at(scene, 0), tiny_request()).await.unwrap();
    assert_eq!(px.data.len(), 64 * 32 * 4);
    assert!(r.has_repaint_signal());
}

#[tokio::test]
async fn unreachable_image_fails_prepare() {
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(MapFetcher(HashMap::new()));
    let mut r = SvgRasterizer::with_fontdb(fetcher, no_fonts());
    let mut scene = PromoScene::default();
    scene.site.logo = "missing.png".to_owned();

    let err = r.prepare(&scene).await.unwrap_err();
    assert!(matches!(err, PromoError::ResourceLoad(_)));
    assert_eq!(r.cached_images(), 0);
}

#[tokio::test]
async fn undecodable_image_fails_prepare() {
    let mut map = HashMap::new();
    map.insert("bad.png".to_owned(), b"<html>nope</html>".to_vec());
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(MapFetcher(map));
    let mut r = SvgRasterizer::with_fontdb(fetcher, no_fonts());
    let mut scene = PromoScene::default();
    scene.background = "bad.png".to_owned();

    let err = r.prepare(&scene).await.unwrap_err();
    assert!(matches!(err, PromoError::ResourceLoad(_)));
}

#[tokio::test]
async fn prepare_evicts_images_the_scene_dropped() {
    let mut map = HashMap::new();
    map.insert("bg-a.png".to_owned(), png_bytes([200, 10, 10]));
    map.insert("bg-b.png".to_owned(), png_bytes([10, 10, 200]));
    map.insert("slide.png".to_owned(), png_bytes([10, 200, 10]));
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(MapFetcher(map));
    let mut r = SvgRasterizer::with_fontdb(fetcher, no_fonts());

    let mut scene = PromoScene::default();
    scene.background = "bg-a.png".to_owned();
    scene.right_panel.images = vec![SlideImage {
        url: "slide.png".to_owned(),
        name: String::new(),
    }];
    r.prepare(&scene).await.unwrap();
    assert_eq!(r.cached_images(), 2);

    scene.background = "bg-b.png".to_owned();
    r.prepare(&scene).await.unwrap();
    assert_eq!(r.cached_images(), 2);

    scene.right_panel.images.clear();
    r.prepare(&scene).await.unwrap();
    assert_eq!(r.cached_images(), 1);
}
