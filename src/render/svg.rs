use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;

use crate::fetch::ResourceFetcher;
use crate::foundation::core::{CANONICAL_HEIGHT, CANONICAL_WIDTH, CaptureRequest, PixelBuffer};
use crate::foundation::error::{PromoError, PromoResult};
use crate::foundation::math::unpremultiply_rgba8;
use crate::sample::rasterizer::Rasterizer;
use crate::scene::SceneFrame;
use crate::scene::color::Rgb8;
use crate::scene::model::PromoScene;

// Layout is authored in canonical scene coordinates and scaled to the requested bitmap.
const SCENE_W: f64 = CANONICAL_WIDTH as f64;
const SCENE_H: f64 = CANONICAL_HEIGHT as f64;

const PAD_X: f64 = 48.0;
const CONTENT_TOP: f64 = 288.0;
const CONTENT_BOTTOM: f64 = SCENE_H - 256.0;
const CONTENT_CY: f64 = (CONTENT_TOP + CONTENT_BOTTOM) / 2.0;
const LEFT_W: f64 = (SCENE_W - 2.0 * PAD_X) * 0.6;
const COLUMN_GAP: f64 = 32.0;
const LEFT_CX: f64 = PAD_X + (LEFT_W - COLUMN_GAP) / 2.0;
const RIGHT_CX: f64 = PAD_X + LEFT_W + COLUMN_GAP + (SCENE_W - 2.0 * PAD_X - LEFT_W - COLUMN_GAP) / 2.0;

const HEADER_SIZE: f64 = 112.0;
const ROW_TEXT_SIZE: f64 = 64.0;
const ROW_W: f64 = 896.0;
const ROW_H: f64 = 128.0;
const ROW_GAP: f64 = 32.0;
const SLIDE_W: f64 = 672.0;
const SLIDE_H: f64 = 378.0;
const BLOCK_GAP: f64 = 48.0;

const GOOGLE_LETTERS: [(char, &str); 6] = [
    ('G', "#4285f4"),
    ('o', "#ea4335"),
    ('o', "#fbbc05"),
    ('g', "#4285f4"),
    ('l', "#34a853"),
    ('e', "#ea4335"),
];

/// Reference [`Rasterizer`]: lays the scene out as SVG and renders it with `resvg`.
///
/// Images are fetched once per URL, validated by decoding, and embedded as data URIs. Rendering
/// runs on the blocking pool so the async caller stays responsive.
pub struct SvgRasterizer {
    fetcher: Arc<dyn ResourceFetcher>,
    fontdb: Arc<usvg::fontdb::Database>,
    images: HashMap<String, Arc<str>>,
}

impl SvgRasterizer {
    /// Create a rasterizer using the system fonts.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self::with_fontdb(fetcher, Arc::new(db))
    }

    pub fn with_fontdb(
        fetcher: Arc<dyn ResourceFetcher>,
        fontdb: Arc<usvg::fontdb::Database>,
    ) -> Self {
        Self {
            fetcher,
            fontdb,
            images: HashMap::new(),
        }
    }

    /// Load every `.ttf`/`.otf`/`.ttc` file in `dir` in addition to the current fonts.
    pub fn with_font_dir(mut self, dir: &Path) -> Self {
        let db = Arc::make_mut(&mut self.fontdb);
        load_fonts_from_dir(db, dir);
        self
    }

    /// Number of images currently cached.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    pub fn clear_cache(&mut self) {
        self.images.clear();
    }

    async fn ensure_loaded(&mut self, scene: &PromoScene) -> PromoResult<()> {
        for url in scene.resource_urls() {
            if self.images.contains_key(url) {
                continue;
            }
            let bytes = self.fetcher.fetch(url).await?;
            let uri = image_data_uri(&bytes)
                .map_err(|e| PromoError::resource_load(format!("'{url}': {e}")))?;
            tracing::debug!(%url, bytes = bytes.len(), "cached scene image");
            self.images.insert(url.to_owned(), Arc::from(uri));
        }
        Ok(())
    }
}

#[async_trait]
impl Rasterizer for SvgRasterizer {
    async fn rasterize(
        &mut self,
        frame: &SceneFrame,
        request: CaptureRequest,
    ) -> PromoResult<PixelBuffer> {
        request.validate()?;
        self.ensure_loaded(&frame.scene).await?;
        let svg = build_scene_svg(frame, &self.images, request)?;
        let fontdb = Arc::clone(&self.fontdb);
        let (pw, ph) = (request.pixel_width(), request.pixel_height());
        tokio::task::spawn_blocking(move || render_svg(&svg, fontdb, pw, ph))
            .await
            .map_err(|e| PromoError::rasterization(format!("render task failed: {e}")))?
    }

    // Every frame is rendered from its own snapshot, so the surface is settled on return.
    fn has_repaint_signal(&self) -> bool {
        true
    }

    // Drops images the scene no longer references before fetching new ones.
    async fn prepare(&mut self, scene: &PromoScene) -> PromoResult<()> {
        let keep = scene.resource_urls();
        self.images.retain(|url, _| keep.contains(&url.as_str()));
        self.ensure_loaded(scene).await
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        let _ = db.load_font_file(&path);
    }
}

/// Validate image bytes by decoding them and return a `data:` URI `usvg` can embed.
///
/// PNG, JPEG and GIF are passed through; other decodable formats are re-encoded as PNG.
pub(crate) fn image_data_uri(bytes: &[u8]) -> PromoResult<String> {
    let format = image::guess_format(bytes)
        .map_err(|e| PromoError::resource_load(format!("unrecognized image format: {e}")))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PromoError::resource_load(format!("decode image: {e}")))?;

    let (mime, payload): (&str, Cow<'_, [u8]>) = match format {
        image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::Gif => {
            (format.to_mime_type(), Cow::Borrowed(bytes))
        }
        _ => {
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .map_err(|e| PromoError::resource_load(format!("re-encode image as png: {e}")))?;
            ("image/png", Cow::Owned(buf))
        }
    };

    let b64 = base64::engine::general_purpose::STANDARD.encode(&payload);
    Ok(format!("data:{mime};base64,{b64}"))
}

/// Parse and render an SVG document into a straight-alpha bitmap of `width x height`.
pub(crate) fn render_svg(
    svg: &str,
    fontdb: Arc<usvg::fontdb::Database>,
    width: u32,
    height: u32,
) -> PromoResult<PixelBuffer> {
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| PromoError::rasterization(format!("parse scene svg: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PromoError::rasterization("failed to allocate scene pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(&tree, xform, &mut pixmap.as_mut());
    let mut data = pixmap.take();
    unpremultiply_rgba8(&mut data);
    PixelBuffer::new(width, height, data)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            ' ' => out.push('\u{00a0}'),
            _ => out.push(c),
        }
    }
    out
}

// Rough advance width; only used to size boxes around text.
fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.6
}

fn lookup<'a>(images: &'a HashMap<String, Arc<str>>, url: &str) -> PromoResult<&'a str> {
    images
        .get(url)
        .map(|s| s.as_ref())
        .ok_or_else(|| PromoError::resource_load(format!("image '{url}' was not loaded")))
}

/// Lay out one scene frame as an SVG document sized to `request`.
///
/// Every image URL referenced by the scene must already be present in `images`.
pub fn build_scene_svg(
    frame: &SceneFrame,
    images: &HashMap<String, Arc<str>>,
    request: CaptureRequest,
) -> PromoResult<String> {
    let scene = &frame.scene;
    let motion = &frame.motion;
    let theme = scene.theme;
    let (primary, secondary, bg, accent) = (
        theme.primary.to_hex(),
        theme.secondary.to_hex(),
        theme.background.to_hex(),
        theme.accent.to_hex(),
    );

    let mut s = String::with_capacity(16 * 1024);
    let _ = write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 {SCENE_W} {SCENE_H}" font-family="sans-serif">"#,
        request.width, request.height
    );
    let _ = write!(
        s,
        r#"<defs><linearGradient id="overlay" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{bg}" stop-opacity="0.867"/><stop offset="0.5" stop-color="{bg}" stop-opacity="0.6"/><stop offset="1" stop-color="{bg}" stop-opacity="0.867"/></linearGradient><linearGradient id="row" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{accent}" stop-opacity="0.565"/><stop offset="1" stop-color="{accent}" stop-opacity="0.376"/></linearGradient><linearGradient id="modal" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{primary}" stop-opacity="0.19"/><stop offset="1" stop-color="{accent}" stop-opacity="0.125"/></linearGradient></defs>"#
    );

    // Background, optional photo, then the darkening overlay.
    let _ = write!(s, r#"<rect width="{SCENE_W}" height="{SCENE_H}" fill="{bg}"/>"#);
    if !scene.background.trim().is_empty() {
        let href = lookup(images, &scene.background)?;
        let _ = write!(
            s,
            r#"<image x="0" y="0" width="{SCENE_W}" height="{SCENE_H}" preserveAspectRatio="xMidYMid slice" xlink:href="{href}"/>"#
        );
    }
    let _ = write!(
        s,
        r#"<rect width="{SCENE_W}" height="{SCENE_H}" fill="url(#overlay)"/>"#
    );

    if !scene.site.logo.trim().is_empty() {
        let href = lookup(images, &scene.site.logo)?;
        let _ = write!(
            s,
            r#"<image x="0" y="32" width="{SCENE_W}" height="256" preserveAspectRatio="xMidYMid meet" xlink:href="{href}"/>"#
        );
    }

    write_left_column(&mut s, scene, &motion.wave_offsets, &primary, &secondary);
    write_right_column(
        &mut s,
        scene,
        images,
        motion.blink_visible,
        motion.slide_index,
        &primary,
        &secondary,
    )?;
    write_bottom(&mut s, scene, motion.blink_visible, &primary);

    s.push_str("</svg>");
    Ok(s)
}

fn write_left_column(
    s: &mut String,
    scene: &PromoScene,
    wave: &[f64],
    primary: &str,
    secondary: &str,
) {
    let rows = scene.link_rows();
    let header = scene.header_text.trim();
    let header_h = if header.is_empty() {
        0.0
    } else {
        HEADER_SIZE + 64.0
    };
    let rows_h = if rows.is_empty() {
        0.0
    } else {
        rows.len() as f64 * ROW_H + (rows.len() - 1) as f64 * ROW_GAP
    };
    let mut y = CONTENT_CY - (header_h + rows_h) / 2.0;

    if !header.is_empty() {
        // Per-character wave expressed as relative dy steps so the line stays one text chunk.
        let mut prev = 0.0;
        let mut dy = String::new();
        for (i, _) in scene.header_text.chars().enumerate() {
            let o = wave.get(i).copied().unwrap_or(0.0);
            let _ = write!(dy, "{:.2} ", o - prev);
            prev = o;
        }
        let baseline = y + HEADER_SIZE * 0.8;
        let text = escape_xml(&scene.header_text);
        let _ = write!(
            s,
            r#"<text x="{LEFT_CX}" y="{baseline}" dy="{dy}" text-anchor="middle" font-size="{HEADER_SIZE}" font-weight="900" letter-spacing="4" fill="none" stroke="{primary}" stroke-opacity="0.3" stroke-width="12">{text}</text>"#,
            dy = dy.trim_end()
        );
        let _ = write!(
            s,
            r#"<text x="{LEFT_CX}" y="{baseline}" dy="{dy}" text-anchor="middle" font-size="{HEADER_SIZE}" font-weight="900" letter-spacing="4" fill="{primary}">{text}</text>"#,
            dy = dy.trim_end()
        );
        y += header_h;
    }

    for row in rows {
        let x = LEFT_CX - ROW_W / 2.0;
        let _ = write!(
            s,
            r#"<rect x="{x}" y="{y}" width="{ROW_W}" height="{ROW_H}" rx="48" fill="url(#row)" stroke="{primary}" stroke-opacity="0.376" stroke-width="4"/>"#
        );
        let baseline = y + ROW_H / 2.0 + ROW_TEXT_SIZE * 0.35;
        let _ = write!(
            s,
            r#"<text x="{LEFT_CX}" y="{baseline}" text-anchor="middle" font-size="{ROW_TEXT_SIZE}" font-weight="700" fill="{secondary}">{}</text>"#,
            escape_xml(row)
        );
        y += ROW_H + ROW_GAP;
    }
}

fn write_right_column(
    s: &mut String,
    scene: &PromoScene,
    images: &HashMap<String, Arc<str>>,
    blink: bool,
    slide_index: usize,
    primary: &str,
    secondary: &str,
) -> PromoResult<()> {
    let panel = &scene.right_panel;
    let title = panel.title.trim();
    let slide = panel.images.get(slide_index);
    let footer = panel.footer.trim();

    let modal_h = 128.0;
    let slide_h = slide.map_or(0.0, |img| {
        if img.name.trim().is_empty() {
            SLIDE_H
        } else {
            SLIDE_H + 24.0 + 50.0
        }
    });
    let footer_h = 60.0;

    let mut blocks = Vec::new();
    if !title.is_empty() {
        blocks.push(modal_h);
    }
    if slide.is_some() {
        blocks.push(slide_h);
    }
    if !footer.is_empty() {
        blocks.push(footer_h);
    }
    let total: f64 =
        blocks.iter().sum::<f64>() + BLOCK_GAP * (blocks.len().saturating_sub(1) as f64);
    let mut y = CONTENT_CY - total / 2.0;

    if !title.is_empty() {
        let w = text_width(&panel.title, 64.0) + 96.0;
        let x = RIGHT_CX - w / 2.0;
        let (scale, glow_opacity, glow_width, text_opacity) = if blink {
            (1.02, 0.5, 24.0, 1.0)
        } else {
            (1.0, 0.25, 12.0, 0.6)
        };
        let cy = y + modal_h / 2.0;
        let _ = write!(
            s,
            r#"<g transform="translate({RIGHT_CX} {cy}) scale({scale}) translate({} {})">"#,
            -RIGHT_CX,
            -cy
        );
        let _ = write!(
            s,
            r#"<rect x="{x}" y="{y}" width="{w}" height="{modal_h}" rx="32" fill="none" stroke="{primary}" stroke-opacity="{glow_opacity}" stroke-width="{glow_width}"/>"#
        );
        let _ = write!(
            s,
            r#"<rect x="{x}" y="{y}" width="{w}" height="{modal_h}" rx="32" fill="url(#modal)" stroke="{primary}" stroke-width="4"/>"#
        );
        let _ = write!(
            s,
            r#"<text x="{RIGHT_CX}" y="{}" text-anchor="middle" font-size="64" font-weight="900" fill="{secondary}" fill-opacity="{text_opacity}">{}</text>"#,
            cy + 64.0 * 0.35,
            escape_xml(&panel.title)
        );
        s.push_str("</g>");
        y += modal_h + BLOCK_GAP;
    }

    if let Some(img) = slide {
        let href = lookup(images, &img.url)?;
        let x = RIGHT_CX - SLIDE_W / 2.0;
        let _ = write!(
            s,
            r#"<clipPath id="slide-clip"><rect x="{x}" y="{y}" width="{SLIDE_W}" height="{SLIDE_H}" rx="48"/></clipPath>"#
        );
        let _ = write!(
            s,
            r#"<image x="{x}" y="{y}" width="{SLIDE_W}" height="{SLIDE_H}" preserveAspectRatio="xMidYMid slice" clip-path="url(#slide-clip)" xlink:href="{href}"/>"#
        );
        let _ = write!(
            s,
            r#"<rect x="{x}" y="{y}" width="{SLIDE_W}" height="{SLIDE_H}" rx="48" fill="none" stroke="{primary}" stroke-opacity="0.376" stroke-width="6"/>"#
        );
        if !img.name.trim().is_empty() {
            let _ = write!(
                s,
                r#"<text x="{RIGHT_CX}" y="{}" text-anchor="middle" font-size="40" font-weight="600" fill="{secondary}">{}</text>"#,
                y + SLIDE_H + 24.0 + 40.0,
                escape_xml(&img.name)
            );
        }
        y += slide_h + BLOCK_GAP;
    }

    if !footer.is_empty() {
        let _ = write!(
            s,
            r#"<text x="{RIGHT_CX}" y="{}" text-anchor="middle" font-size="48" font-weight="600" fill="{primary}">{}</text>"#,
            y + 48.0,
            escape_xml(&panel.footer)
        );
    }
    Ok(())
}

fn write_bottom(s: &mut String, scene: &PromoScene, blink: bool, primary: &str) {
    let cx = SCENE_W / 2.0;
    let search = scene.search_bar_text.trim();
    let bar_h = 112.0;
    let bar_y = SCENE_H - 32.0 - bar_h;

    if !scene.footer_text.trim().is_empty() {
        let baseline = if search.is_empty() {
            SCENE_H - 32.0 - 14.0
        } else {
            bar_y - 24.0 - 14.0
        };
        let _ = write!(
            s,
            r#"<text x="{cx}" y="{baseline}" text-anchor="middle" font-size="56" font-weight="700" fill="{primary}">{}</text>"#,
            escape_xml(&scene.footer_text)
        );
    }

    if search.is_empty() {
        return;
    }

    let logo_w = text_width("Google", 40.0);
    let input_w = text_width(&scene.search_bar_text, 32.0) + 8.0 + 4.0 + 48.0;
    let bar_w = (48.0 * 2.0 + logo_w + 24.0 + input_w).max(750.0);
    let bar_x = cx - bar_w / 2.0;
    let bar_cy = bar_y + bar_h / 2.0;
    let white = Rgb8::new(255, 255, 255).to_hex();

    let _ = write!(
        s,
        r#"<rect x="{bar_x}" y="{bar_y}" width="{bar_w}" height="{bar_h}" rx="{}" fill="{white}" stroke="{primary}" stroke-opacity="0.25" stroke-width="16"/>"#,
        bar_h / 2.0
    );

    let mut logo_x = bar_x + 48.0;
    let _ = write!(
        s,
        r#"<text x="{logo_x}" y="{}" font-size="40" font-weight="700">"#,
        bar_cy + 14.0
    );
    for (c, color) in GOOGLE_LETTERS {
        let _ = write!(s, r#"<tspan fill="{color}">{c}</tspan>"#);
    }
    s.push_str("</text>");
    logo_x += logo_w + 24.0;

    let input_h = 64.0;
    let input_w = (bar_x + bar_w - 48.0) - logo_x;
    let input_y = bar_cy - input_h / 2.0;
    let _ = write!(
        s,
        r##"<rect x="{logo_x}" y="{input_y}" width="{input_w}" height="{input_h}" rx="32" fill="none" stroke="#d1d5db" stroke-width="2"/>"##
    );

    let (text_opacity, cursor_opacity) = if blink { (1.0, 1.0) } else { (0.3, 0.0) };
    let text_x = logo_x + 24.0;
    let _ = write!(
        s,
        r##"<text x="{text_x}" y="{}" font-size="32" font-weight="600" fill="#1f2937" fill-opacity="{text_opacity}">{}</text>"##,
        bar_cy + 11.0,
        escape_xml(&scene.search_bar_text)
    );
    let cursor_x = text_x + text_width(&scene.search_bar_text, 32.0) + 8.0;
    let _ = write!(
        s,
        r##"<rect x="{cursor_x}" y="{}" width="4" height="40" fill="#1f2937" fill-opacity="{cursor_opacity}"/>"##,
        bar_cy - 20.0
    );
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
