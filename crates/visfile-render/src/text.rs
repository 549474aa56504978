/// Glyph rendering for chart labels.
///
/// Uses `fontdue` with a single font: either the configured file or the
/// first loadable system font. Without a font every operation is a no-op
/// and callers simply get unlabelled charts.
use crate::canvas::Canvas;
use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};
use visfile_core::palette::Color;

const ELLIPSIS: &str = "...";

pub struct TextRenderer {
    font: Option<Font>,
    px: f32,
}

impl TextRenderer {
    /// Load `font_path` if given, falling back to known system fonts.
    pub fn load(font_path: Option<&Path>, px: f32) -> Self {
        if let Some(path) = font_path {
            match read_font(path) {
                Some(font) => {
                    tracing::debug!("Loaded label font from {}", path.display());
                    return Self {
                        font: Some(font),
                        px,
                    };
                }
                None => tracing::warn!(
                    "Cannot load font {}; trying system fonts",
                    path.display()
                ),
            }
        }

        for path in system_font_candidates() {
            if let Some(font) = read_font(&path) {
                tracing::debug!("Loaded label font from {}", path.display());
                return Self {
                    font: Some(font),
                    px,
                };
            }
        }

        tracing::warn!("No usable font found; labels will be omitted");
        Self::disabled(px)
    }

    /// A renderer that draws nothing.
    pub fn disabled(px: f32) -> Self {
        Self { font: None, px }
    }

    pub fn is_available(&self) -> bool {
        self.font.is_some()
    }

    /// Distance from the top of a line to its baseline.
    pub fn ascent(&self) -> f32 {
        self.font
            .as_ref()
            .and_then(|f| f.horizontal_line_metrics(self.px))
            .map_or(self.px * 0.8, |m| m.ascent)
    }

    /// Vertical advance between lines.
    pub fn line_height(&self) -> f32 {
        self.font
            .as_ref()
            .and_then(|f| f.horizontal_line_metrics(self.px))
            .map_or(self.px * 1.2, |m| m.new_line_size)
    }

    /// Advance width of `text` on one line.
    pub fn measure(&self, text: &str) -> f32 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        text.chars()
            .map(|ch| font.metrics(ch, self.px).advance_width)
            .sum()
    }

    /// `text` as-is if it fits in `max_width`, otherwise the longest
    /// prefix that fits followed by `...`. `None` when not even the
    /// ellipsis fits or there is no font.
    pub fn fit(&self, text: &str, max_width: f32) -> Option<String> {
        if !self.is_available() || max_width <= 0.0 {
            return None;
        }
        if self.measure(text) <= max_width {
            return Some(text.to_string());
        }
        let budget = max_width - self.measure(ELLIPSIS);
        if budget < 0.0 {
            return None;
        }
        let mut width = 0.0;
        let mut end = 0;
        for (i, ch) in text.char_indices() {
            let w = self.measure(ch.encode_utf8(&mut [0; 4]));
            if width + w > budget {
                break;
            }
            width += w;
            end = i + ch.len_utf8();
        }
        if end == 0 {
            return None;
        }
        Some(format!("{}{ELLIPSIS}", &text[..end]))
    }

    /// Draw `text` with its pen starting at (`x`, `baseline`).
    pub fn draw(&self, canvas: &mut Canvas, text: &str, x: f32, baseline: f32, color: Color) {
        let Some(font) = &self.font else {
            return;
        };
        let mut pen = x;
        let base = baseline.round() as i64;
        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, self.px);
            let left = (pen.round() as i64) + metrics.xmin as i64;
            let top = base - (metrics.height as i64 + metrics.ymin as i64);
            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage > 0 {
                        canvas.blend(
                            left + gx as i64,
                            top + gy as i64,
                            color,
                            coverage as f32 / 255.0,
                        );
                    }
                }
            }
            pen += metrics.advance_width;
        }
    }
}

fn read_font(path: &Path) -> Option<Font> {
    let data = std::fs::read(path).ok()?;
    Font::from_bytes(data, FontSettings::default()).ok()
}

fn system_font_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Ok(windir) = std::env::var("WINDIR") {
        candidates.push(PathBuf::from(format!("{windir}\\Fonts\\segoeui.ttf")));
        candidates.push(PathBuf::from(format!("{windir}\\Fonts\\arial.ttf")));
    }

    candidates.extend(
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\segoeui.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
        .map(PathBuf::from),
    );
    candidates
}
