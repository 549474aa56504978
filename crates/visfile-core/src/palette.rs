/// Deterministic node colours.
///
/// Depth picks the hue family from a fixed base palette; an FNV-1a hash of
/// the entry name nudges hue and brightness inside that family so siblings
/// stay distinguishable but related. No randomness: the same name at the
/// same depth always gets the same colour.
use crate::config::PaletteConfig;
use serde::Serialize;

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend with `other`, `t` = 0 keeps `self`.
    pub fn mix(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round().clamp(0.0, 255.0) as u8;
        Self::rgb(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }

    /// Perceived brightness in 0..=255 (Rec. 601 weights).
    pub fn luma(self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }
}

/// Base hues, one per depth level.
const BASE: [Color; 10] = [
    Color::rgb(0x89, 0xb4, 0xfa), // blue
    Color::rgb(0xa6, 0xe3, 0xa1), // green
    Color::rgb(0xf9, 0xe2, 0xaf), // yellow
    Color::rgb(0xf3, 0x8b, 0xa8), // pink
    Color::rgb(0xfa, 0xb3, 0x87), // peach
    Color::rgb(0xcb, 0xa6, 0xf7), // mauve
    Color::rgb(0x94, 0xe2, 0xd5), // teal
    Color::rgb(0xf5, 0xc2, 0xe7), // flamingo
    Color::rgb(0x74, 0xc7, 0xec), // sapphire
    Color::rgb(0xb4, 0xbe, 0xfe), // lavender
];

/// Colour of the synthetic "other" bucket in pie charts.
pub const OTHER_COLOR: Color = Color::rgb(0x93, 0x99, 0xb2);

/// Maximum hue shift either side of the base hue, as a fraction of the
/// colour wheel.
const HUE_SPREAD: f32 = 0.045;

/// Maximum brightness shift either side of the base value.
const VALUE_SPREAD: f32 = 0.10;

#[derive(Debug, Clone)]
pub struct Palette {
    size: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&PaletteConfig::default())
    }
}

impl Palette {
    pub fn new(config: &PaletteConfig) -> Self {
        Self {
            size: config.size.clamp(1, BASE.len()),
        }
    }

    /// Number of hue families in use.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Base colour for a depth before any per-name perturbation.
    pub fn base_for_depth(&self, depth: usize) -> Color {
        BASE[depth % self.size]
    }

    /// Stable colour for the entry called `name` at `depth`.
    pub fn color_for(&self, name: &str, depth: usize) -> Color {
        let base = self.base_for_depth(depth);
        let hash = fnv1a(name.as_bytes());
        let hue_jitter = (unit(hash) * 2.0 - 1.0) * HUE_SPREAD;
        let value_jitter = (unit(hash >> 32) * 2.0 - 1.0) * VALUE_SPREAD;

        let (h, s, v) = rgb_to_hsv(base);
        hsv_to_rgb(
            (h + hue_jitter).rem_euclid(1.0),
            s,
            (v + value_jitter).clamp(0.35, 1.0),
        )
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x0100_0000_01b3);
    }
    h
}

/// Low 16 bits of `h` mapped to 0.0..=1.0.
fn unit(h: u64) -> f32 {
    (h & 0xffff) as f32 / 65535.0
}

fn rgb_to_hsv(c: Color) -> (f32, f32, f32) {
    let r = c.r as f32 / 255.0;
    let g = c.g as f32 / 255.0;
    let b = c.b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let h6 = h.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - ((h6 % 2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h6 as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::rgb(to_u8(r), to_u8(g), to_u8(b))
}
