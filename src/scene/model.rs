use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{PromoError, PromoResult};
use crate::scene::color::Rgb8;

/// The site being promoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    /// Human-readable name; also the source of the output filename slug.
    pub name: String,
    /// Logo image URL or path. Empty means no logo.
    #[serde(default)]
    pub logo: String,
}

/// Four-color theme applied to every scene element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTheme {
    pub primary: Rgb8,
    pub secondary: Rgb8,
    pub background: Rgb8,
    pub accent: Rgb8,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            primary: Rgb8::new(0x00, 0xf0, 0xff),
            secondary: Rgb8::new(0xff, 0xd7, 0x00),
            background: Rgb8::new(0x05, 0x0b, 0x14),
            accent: Rgb8::new(0x04, 0xc7, 0xd1),
        }
    }
}

/// One slideshow entry on the right panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideImage {
    pub url: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightPanel {
    /// Blinking call-to-action title.
    pub title: String,
    pub images: Vec<SlideImage>,
    pub footer: String,
}

impl Default for RightPanel {
    fn default() -> Self {
        Self {
            title: "Klik di sini".to_owned(),
            images: Vec::new(),
            footer: "Silahkan clear cache atau menggunakan vpn".to_owned(),
        }
    }
}

/// Every user-editable parameter of the promotional scene.
///
/// Time-varying values are not stored here; they are derived from the animation clock by
/// [`crate::scene::motion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromoScene {
    pub site: Site,
    pub theme: ColorTheme,
    /// Background image URL or path. Empty means a flat themed background.
    pub background: String,
    /// Header text rendered with the per-character wave.
    pub header_text: String,
    pub text1: String,
    pub text2: String,
    pub additional_texts: Vec<String>,
    pub footer_text: String,
    pub search_bar_text: String,
    pub right_panel: RightPanel,
}

impl Default for PromoScene {
    fn default() -> Self {
        Self {
            site: Site {
                id: "example".to_owned(),
                name: "Example Site".to_owned(),
                logo: String::new(),
            },
            theme: ColorTheme::default(),
            background: String::new(),
            header_text: "LINK ALTERNATIF".to_owned(),
            text1: "www.example1.com".to_owned(),
            text2: "www.example2.com".to_owned(),
            additional_texts: Vec::new(),
            footer_text: "KETIK \"NAMA WEB\" DI GOOGLE UNTUK MENEMUKAN LINK TERBARU".to_owned(),
            search_bar_text: "NAMA WEB".to_owned(),
            right_panel: RightPanel::default(),
        }
    }
}

impl PromoScene {
    pub fn from_reader<R: std::io::Read>(r: R) -> PromoResult<Self> {
        let scene: Self = serde_json::from_reader(r)
            .map_err(|e| PromoError::serde(format!("parse scene JSON: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_json_str(s: &str) -> PromoResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> PromoResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PromoError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> PromoResult<()> {
        if self.site.name.trim().is_empty() {
            return Err(PromoError::validation("site name must be non-empty"));
        }
        if self.right_panel.images.iter().any(|i| i.url.trim().is_empty()) {
            return Err(PromoError::validation(
                "slideshow image urls must be non-empty",
            ));
        }
        Ok(())
    }

    /// Link rows in display order: `text1`, `text2`, then additional rows, with blank rows dropped.
    pub fn link_rows(&self) -> Vec<&str> {
        [self.text1.as_str(), self.text2.as_str()]
            .into_iter()
            .chain(self.additional_texts.iter().map(String::as_str))
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Every external image the scene references, in a stable order without duplicates.
    pub fn resource_urls(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let candidates = [self.background.as_str(), self.site.logo.as_str()]
            .into_iter()
            .chain(self.right_panel.images.iter().map(|i| i.url.as_str()));
        for url in candidates {
            if !url.trim().is_empty() && !out.contains(&url) {
                out.push(url);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
