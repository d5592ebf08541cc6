use std::collections::{HashMap, HashSet};

use color_quant::NeuQuant;

/// Upper bound on pixels fed to the palette trainer; larger inputs are sampled with a stride.
const MAX_TRAINING_PIXELS: usize = 1 << 21;

/// NeuQuant runs a fixed number of learning cycles and needs at least this many samples.
const MIN_TRAINING_PIXELS: usize = 100;

/// Where the GIF color table lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    /// One palette trained on all frames, written as the global color table.
    #[default]
    Global,
    /// A local color table per frame.
    PerFrame,
}

enum Lookup {
    Exact(HashMap<[u8; 3], u8>),
    Trained(Box<NeuQuant>),
}

/// An indexed color table plus the lookup used to map pixels onto it.
pub struct Palette {
    rgb: Vec<u8>,
    lookup: Lookup,
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("colors", &self.len())
            .field("exact", &self.is_exact())
            .finish()
    }
}

impl Palette {
    /// Build a palette covering every opaque RGBA8 buffer in `frames`.
    ///
    /// When the input has at most `max_colors` distinct colors the palette is exact; otherwise a
    /// NeuQuant network is trained with sampling factor `quality` (1 = best, 30 = fastest).
    pub fn build(frames: &[&[u8]], max_colors: usize, quality: u8) -> Self {
        let max_colors = max_colors.clamp(2, 256);
        if let Some(colors) = distinct_colors(frames, max_colors) {
            return Self::exact(colors);
        }

        let samples = training_samples(frames);
        let pixel_count = samples.len() / 4;
        let samplefac = i32::from(quality)
            .min((pixel_count / MIN_TRAINING_PIXELS) as i32)
            .max(1);
        let nq = NeuQuant::new(samplefac, max_colors, &samples);
        Self {
            rgb: nq.color_map_rgb(),
            lookup: Lookup::Trained(Box::new(nq)),
        }
    }

    fn exact(mut colors: Vec<[u8; 3]>) -> Self {
        colors.sort_unstable();
        let mut rgb = Vec::with_capacity(colors.len() * 3);
        let mut map = HashMap::with_capacity(colors.len());
        for (i, c) in colors.iter().enumerate() {
            rgb.extend_from_slice(c);
            map.insert(*c, i as u8);
        }
        Self {
            rgb,
            lookup: Lookup::Exact(map),
        }
    }

    /// Packed `RGBRGB...` color table.
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn len(&self) -> usize {
        self.rgb.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.rgb.is_empty()
    }

    /// Whether every input color is represented without loss.
    pub fn is_exact(&self) -> bool {
        matches!(self.lookup, Lookup::Exact(_))
    }

    /// Index of the palette entry closest to `c`.
    pub fn index_of(&self, c: [u8; 3]) -> u8 {
        match &self.lookup {
            Lookup::Exact(map) => match map.get(&c) {
                Some(i) => *i,
                None => self.nearest_linear(c),
            },
            Lookup::Trained(nq) => nq.index_of(&[c[0], c[1], c[2], 255]) as u8,
        }
    }

    fn nearest_linear(&self, c: [u8; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_d = u32::MAX;
        for (i, p) in self.rgb.chunks_exact(3).enumerate() {
            let d = sq_dist([p[0], p[1], p[2]], c);
            if d < best_d {
                best = i;
                best_d = d;
            }
        }
        best as u8
    }

    fn color(&self, idx: u8) -> [u8; 3] {
        let i = usize::from(idx) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    /// Map one opaque RGBA8 frame to palette indices, optionally with Floyd-Steinberg dithering.
    pub fn map_frame(&self, rgba: &[u8], width: u32, dither: bool) -> Vec<u8> {
        if !dither || self.is_exact() {
            return rgba
                .chunks_exact(4)
                .map(|p| self.index_of([p[0], p[1], p[2]]))
                .collect();
        }
        self.map_dithered(rgba, width as usize)
    }

    fn map_dithered(&self, rgba: &[u8], width: usize) -> Vec<u8> {
        let height = rgba.len() / 4 / width.max(1);
        let mut out = Vec::with_capacity(width * height);

        // Error rows carry one pixel of padding on each side.
        let row_len = (width + 2) * 3;
        let mut cur = vec![0i32; row_len];
        let mut next = vec![0i32; row_len];

        for y in 0..height {
            next.iter_mut().for_each(|e| *e = 0);
            for x in 0..width {
                let src = (y * width + x) * 4;
                let e = (x + 1) * 3;
                let want = [
                    (i32::from(rgba[src]) + cur[e] / 16).clamp(0, 255),
                    (i32::from(rgba[src + 1]) + cur[e + 1] / 16).clamp(0, 255),
                    (i32::from(rgba[src + 2]) + cur[e + 2] / 16).clamp(0, 255),
                ];
                let idx = self.index_of([want[0] as u8, want[1] as u8, want[2] as u8]);
                out.push(idx);

                let got = self.color(idx);
                for ch in 0..3 {
                    let err = want[ch] - i32::from(got[ch]);
                    cur[e + 3 + ch] += err * 7;
                    next[e - 3 + ch] += err * 3;
                    next[e + ch] += err * 5;
                    next[e + 3 + ch] += err;
                }
            }
            std::mem::swap(&mut cur, &mut next);
        }
        out
    }
}

fn sq_dist(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = i32::from(*x) - i32::from(*y);
            (d * d) as u32
        })
        .sum()
}

// Returns `None` as soon as more than `max` distinct colors are seen.
fn distinct_colors(frames: &[&[u8]], max: usize) -> Option<Vec<[u8; 3]>> {
    let mut seen: HashSet<[u8; 3]> = HashSet::new();
    for frame in frames {
        for p in frame.chunks_exact(4) {
            if seen.insert([p[0], p[1], p[2]]) && seen.len() > max {
                return None;
            }
        }
    }
    if seen.is_empty() {
        seen.insert([0, 0, 0]);
    }
    Some(seen.into_iter().collect())
}

// Interleave pixels from every frame so each one contributes to the shared palette.
fn training_samples(frames: &[&[u8]]) -> Vec<u8> {
    let total: usize = frames.iter().map(|f| f.len() / 4).sum();
    let stride = total.div_ceil(MAX_TRAINING_PIXELS).max(1);

    let longest = frames.iter().map(|f| f.len() / 4).max().unwrap_or(0);

    // Round-robin across frames at each sampled pixel index.
    let mut out = Vec::with_capacity((total / stride + frames.len()) * 4);
    for px in (0..longest).step_by(stride) {
        for frame in frames {
            if let Some(p) = frame.get(px * 4..px * 4 + 4) {
                out.extend_from_slice(&[p[0], p[1], p[2], 255]);
            }
        }
    }

    if out.is_empty() {
        out.extend_from_slice(&[0, 0, 0, 255]);
    }
    while out.len() / 4 < MIN_TRAINING_PIXELS {
        let len = out.len();
        out.extend_from_within(..len);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/quantize.rs"]
mod tests;
