/// Rasterizer: paints laid-out charts into a [`Frame`].
///
/// Treemaps are drawn parents first so children cover them, with a
/// 1-pixel border on every rectangle and labels on leaves that are large
/// enough. Pies are drawn per pixel: each pixel's clockwise angle from
/// 12 o'clock selects its slice, with an anti-aliased rim and thin
/// separators between slices.
use crate::canvas::{Canvas, Frame};
use crate::text::TextRenderer;
use crate::theme::{Theme, ThemeMode};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use visfile_core::layout::{Chart, Rect, Slice, TreemapNode};
use visfile_core::model::format_size;
use visfile_core::palette::Color;

/// Largest accepted canvas side, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

/// Horizontal padding inside a labelled rectangle.
const LABEL_PAD: f32 = 4.0;

/// Labels sit at this fraction of the pie radius along the bisector.
const PIE_LABEL_RADIUS: f64 = 0.65;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("invalid canvas size {width}x{height} (each side must be 1..={max})", max = MAX_DIMENSION)]
    InvalidCanvas { width: u32, height: u32 },
}

/// Output and labelling settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub theme: ThemeMode,

    /// Draw labels at all.
    pub labels: bool,

    /// Treemap leaves must be wider and taller than this to get a label.
    pub min_label_width: f64,
    pub min_label_height: f64,

    /// Pie slices need at least this sweep to get a label.
    pub min_label_degrees: f64,

    /// Gap between the pie and the nearest canvas edge.
    pub pie_margin: f64,

    /// Add a formatted size line under each label when it fits.
    pub show_sizes: bool,

    /// Font file for labels. System fonts are tried when unset or unusable.
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            theme: ThemeMode::Dark,
            labels: true,
            min_label_width: 60.0,
            min_label_height: 20.0,
            min_label_degrees: 10.0,
            pie_margin: 20.0,
            show_sizes: true,
            font_path: None,
            font_size: 12.0,
        }
    }
}

/// Reject canvases with a zero or oversized side.
pub fn check_dimensions(width: u32, height: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RenderError::InvalidCanvas { width, height });
    }
    Ok(())
}

pub struct Rasterizer {
    theme: Theme,
    text: TextRenderer,
    min_label_width: f64,
    min_label_height: f64,
    min_label_degrees: f64,
    pie_margin: f64,
    show_sizes: bool,
}

impl Rasterizer {
    pub fn new(config: &RenderConfig) -> Self {
        let text = if config.labels {
            TextRenderer::load(config.font_path.as_deref(), config.font_size)
        } else {
            TextRenderer::disabled(config.font_size)
        };
        Self {
            theme: Theme::for_mode(config.theme),
            text,
            min_label_width: config.min_label_width,
            min_label_height: config.min_label_height,
            min_label_degrees: config.min_label_degrees,
            pie_margin: config.pie_margin,
            show_sizes: config.show_sizes,
        }
    }

    /// Paint `chart` onto a fresh `width × height` canvas.
    pub fn render(&self, chart: &Chart<'_>, width: u32, height: u32) -> Result<Frame, RenderError> {
        check_dimensions(width, height)?;
        let mut canvas = Canvas::new(width, height, self.theme.background);
        match chart {
            Chart::Treemap(root) => self.draw_treemap(&mut canvas, root),
            Chart::Pie(slices) => self.draw_pie(&mut canvas, slices),
        }
        tracing::debug!("Rendered {width}x{height} frame");
        Ok(canvas.into_frame())
    }

    // ── Treemap ─────────────────────────────────────────────────────

    fn draw_treemap(&self, canvas: &mut Canvas, root: &TreemapNode<'_>) {
        for node in root.iter() {
            canvas.fill_rect(&node.rect, node.color);
            canvas.stroke_rect(&node.rect, self.theme.border);
        }
        if !self.text.is_available() {
            return;
        }
        for leaf in root.leaves() {
            if leaf.rect.width > self.min_label_width && leaf.rect.height > self.min_label_height {
                self.label_rect(canvas, &leaf.rect, &leaf.entry.name, leaf.entry.total_size, leaf.color);
            }
        }
    }

    fn label_rect(&self, canvas: &mut Canvas, rect: &Rect, name: &str, size: u64, fill: Color) {
        let max_w = rect.width as f32 - 2.0 * LABEL_PAD;
        let Some(label) = self.text.fit(name, max_w) else {
            return;
        };
        let (ink, ink_dim) = self.theme.label_on(fill);
        let x = rect.x as f32 + LABEL_PAD;
        let line = self.text.line_height();
        let baseline = rect.y as f32 + LABEL_PAD / 2.0 + self.text.ascent();
        self.text.draw(canvas, &label, x, baseline, ink);

        if self.show_sizes && (rect.height as f32) >= 2.0 * line + LABEL_PAD {
            let size_text = format_size(size);
            if self.text.measure(&size_text) <= max_w {
                self.text.draw(canvas, &size_text, x, baseline + line, ink_dim);
            }
        }
    }

    // ── Pie ─────────────────────────────────────────────────────────

    fn draw_pie(&self, canvas: &mut Canvas, slices: &[Slice<'_>]) {
        let Some(first) = slices.first() else {
            return;
        };
        let (w, h) = (canvas.width() as f64, canvas.height() as f64);
        let cx = w / 2.0;
        let cy = h / 2.0;
        let radius = (w.min(h) / 2.0 - self.pie_margin).max(0.0);
        if radius <= 0.0 {
            return;
        }

        let reference = first.start_angle;
        // Slice ends relative to the reference angle, ascending.
        let ends: Vec<f64> = slices.iter().map(|s| s.end_angle - reference).collect();
        let boundaries: Vec<f64> = if slices.len() > 1 {
            slices.iter().map(|s| s.start_angle.rem_euclid(360.0)).collect()
        } else {
            Vec::new()
        };

        let y0 = (cy - radius - 2.0).floor().max(0.0) as i64;
        let y1 = (cy + radius + 2.0).ceil().min(h) as i64;
        let x0 = (cx - radius - 2.0).floor().max(0.0) as i64;
        let x1 = (cx + radius + 2.0).ceil().min(w) as i64;

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = smooth_edge(dist, radius);
                if coverage <= 0.0 {
                    continue;
                }

                let angle = clockwise_from_top(dx, dy);
                let rel = (angle - reference).rem_euclid(360.0);
                let idx = ends.partition_point(|&end| end <= rel).min(slices.len() - 1);
                let mut color = slices[idx].color;

                let sep = separator_factor(angle, dist, &boundaries);
                if sep > 0.0 {
                    color = color.mix(self.theme.separator, sep);
                }
                canvas.blend(x, y, color, coverage);
            }
        }

        if !self.text.is_available() {
            return;
        }
        for slice in slices {
            if slice.sweep() >= self.min_label_degrees {
                self.label_slice(canvas, slice, cx, cy, radius);
            }
        }
    }

    fn label_slice(&self, canvas: &mut Canvas, slice: &Slice<'_>, cx: f64, cy: f64, radius: f64) {
        let theta = slice.bisector().to_radians();
        let lx = cx + PIE_LABEL_RADIUS * radius * theta.sin();
        let ly = cy - PIE_LABEL_RADIUS * radius * theta.cos();

        let max_w = (radius * 0.6) as f32;
        let Some(label) = self.text.fit(slice.name(), max_w) else {
            return;
        };
        let (ink, ink_dim) = self.theme.label_on(slice.color);
        let line = self.text.line_height();
        let lines = if self.show_sizes { 2.0 } else { 1.0 };
        let top = ly as f32 - lines * line / 2.0;
        let baseline = top + self.text.ascent();

        let label_w = self.text.measure(&label);
        self.text.draw(canvas, &label, lx as f32 - label_w / 2.0, baseline, ink);

        if self.show_sizes {
            let size_text = format_size(slice.total_size());
            let size_w = self.text.measure(&size_text);
            self.text
                .draw(canvas, &size_text, lx as f32 - size_w / 2.0, baseline + line, ink_dim);
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Angle of (`dx`, `dy`) in degrees, clockwise from 12 o'clock, in 0..360.
/// Screen coordinates: `dy` grows downwards.
fn clockwise_from_top(dx: f64, dy: f64) -> f64 {
    dx.atan2(-dy).to_degrees().rem_euclid(360.0)
}

/// Smooth anti-aliased edge (1 → 0 as `dist` crosses `edge`).
fn smooth_edge(dist: f64, edge: f64) -> f32 {
    let d = dist - edge;
    if d < -1.0 {
        1.0
    } else if d > 1.0 {
        0.0
    } else {
        (0.5 - d * 0.5) as f32
    }
}

/// How strongly a pixel at (`angle`, `dist`) belongs to a 1-pixel
/// separator line along any slice boundary (0 = not at all).
fn separator_factor(angle: f64, dist: f64, boundaries: &[f64]) -> f32 {
    let mut factor = 0.0f64;
    for &b in boundaries {
        let mut d = (angle - b).abs();
        if d > 180.0 {
            d = 360.0 - d;
        }
        if d >= 90.0 {
            continue;
        }
        let px = dist * d.to_radians().sin();
        if px < 1.0 {
            factor = factor.max(1.0 - px);
        }
    }
    factor as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use visfile_core::config::LayoutConfig;
    use visfile_core::layout::{ChartKind, SliceSubject};
    use visfile_core::model::Entry;

    fn plain() -> Rasterizer {
        Rasterizer::new(&RenderConfig {
            labels: false,
            ..Default::default()
        })
    }

    fn chart<'a>(kind: ChartKind, entry: &'a Entry, w: u32, h: u32) -> Chart<'a> {
        kind.layout(
            entry,
            Rect::new(0.0, 0.0, w as f64, h as f64),
            &LayoutConfig::default(),
        )
        .unwrap()
    }

    fn sample() -> Entry {
        Entry::directory(
            "root",
            vec![
                Entry::directory("src", vec![Entry::file("main.rs", 600), Entry::file("lib.rs", 300)]),
                Entry::file("data.bin", 900),
                Entry::file("notes.txt", 200),
            ],
        )
    }

    #[test]
    fn test_invalid_canvas() {
        let entry = sample();
        let c = chart(ChartKind::Treemap, &entry, 10, 10);
        assert_eq!(
            plain().render(&c, 0, 10).unwrap_err(),
            RenderError::InvalidCanvas { width: 0, height: 10 }
        );
        assert!(plain().render(&c, 10, MAX_DIMENSION + 1).is_err());
        assert!(check_dimensions(MAX_DIMENSION, 1).is_ok());
    }

    #[test]
    fn test_treemap_leaf_pixels_take_leaf_color() {
        let entry = sample();
        let c = chart(ChartKind::Treemap, &entry, 300, 200);
        let frame = plain().render(&c, 300, 200).unwrap();
        assert_eq!((frame.width(), frame.height()), (300, 200));

        let Chart::Treemap(root) = &c else {
            unreachable!()
        };
        for leaf in root.leaves() {
            let cx = (leaf.rect.x + leaf.rect.width / 2.0) as u32;
            let cy = (leaf.rect.y + leaf.rect.height / 2.0) as u32;
            assert_eq!(frame.color_at(cx, cy), Some(leaf.color), "{}", leaf.entry.name);
        }
        // Outer border.
        assert_eq!(frame.color_at(0, 0), Some(Theme::dark().border));
    }

    #[test]
    fn test_pie_90_270() {
        let entry = Entry::directory("P", vec![Entry::file("a", 100), Entry::file("b", 300)]);
        let c = chart(ChartKind::Pie, &entry, 400, 400);
        let frame = plain().render(&c, 400, 400).unwrap();
        let Chart::Pie(slices) = &c else {
            unreachable!()
        };
        let a = slices.iter().find(|s| s.name() == "a").unwrap();
        let b = slices.iter().find(|s| s.name() == "b").unwrap();

        // Upper-left quadrant (315°) belongs to `a`, right (90°) and
        // bottom (180°) to `b`.
        assert_eq!(frame.color_at(140, 140), Some(a.color));
        assert_eq!(frame.color_at(300, 200), Some(b.color));
        assert_eq!(frame.color_at(200, 300), Some(b.color));
        // Corners stay background.
        assert_eq!(frame.color_at(2, 2), Some(Theme::dark().background));
    }

    #[test]
    fn test_empty_pie_is_background() {
        let entry = Entry::directory("empty", Vec::new());
        let c = chart(ChartKind::Pie, &entry, 50, 40);
        let frame = plain().render(&c, 50, 40).unwrap();
        let bg = Theme::dark().background;
        assert!(frame
            .as_raw()
            .chunks(4)
            .all(|p| p == [bg.r, bg.g, bg.b, 255]));
    }

    #[test]
    fn test_render_is_deterministic() {
        let entry = sample();
        let r = Rasterizer::new(&RenderConfig::default());
        for kind in [ChartKind::Treemap, ChartKind::Pie] {
            let c = chart(kind, &entry, 320, 240);
            assert_eq!(r.render(&c, 320, 240).unwrap(), r.render(&c, 320, 240).unwrap());
        }
    }

    /// A labelling rasterizer, or `None` when no font can be found.
    fn labelled() -> Option<Rasterizer> {
        let r = Rasterizer::new(&RenderConfig::default());
        r.text.is_available().then_some(r)
    }

    /// Pixels where the two frames differ.
    fn ink(labelled: &Frame, plain: &Frame) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..plain.height() {
            for x in 0..plain.width() {
                if labelled.color_at(x, y) != plain.color_at(x, y) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    fn inside(rect: &Rect, (x, y): (u32, u32)) -> bool {
        let (x, y) = (x as f64 + 0.5, y as f64 + 0.5);
        x > rect.x && x < rect.right() && y > rect.y && y < rect.bottom()
    }

    fn leaf<'a>(entry: &'a Entry, rect: Rect, color: Color) -> TreemapNode<'a> {
        TreemapNode {
            entry,
            rect,
            color,
            depth: 1,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_treemap_labels_only_large_leaves() {
        let Some(r) = labelled() else {
            return;
        };
        let root_entry = Entry::directory("root", Vec::new());
        let big = Entry::file("big", 900);
        let short = Entry::file("short", 50);
        let narrow = Entry::file("narrow", 50);

        let big_rect = Rect::new(0.0, 0.0, 300.0, 200.0);
        // Wide enough but not taller than 20px.
        let short_rect = Rect::new(300.0, 0.0, 100.0, 15.0);
        // Tall enough but not wider than 60px.
        let narrow_rect = Rect::new(300.0, 15.0, 50.0, 185.0);
        let tree = Chart::Treemap(TreemapNode {
            entry: &root_entry,
            rect: Rect::new(0.0, 0.0, 400.0, 200.0),
            color: Color::rgb(30, 30, 30),
            depth: 0,
            children: vec![
                leaf(&big, big_rect, Color::rgb(40, 60, 160)),
                leaf(&short, short_rect, Color::rgb(200, 200, 120)),
                leaf(&narrow, narrow_rect, Color::rgb(60, 140, 60)),
            ],
        });

        let with = r.render(&tree, 400, 200).unwrap();
        let without = plain().render(&tree, 400, 200).unwrap();
        let diff = ink(&with, &without);

        assert!(!diff.is_empty(), "large leaf got no label");
        assert!(diff.iter().all(|&p| inside(&big_rect, p)));
        assert!(!diff.iter().any(|&p| inside(&short_rect, p)));
        assert!(!diff.iter().any(|&p| inside(&narrow_rect, p)));
    }

    fn slice<'a>(entry: &'a Entry, start: f64, end: f64, color: Color) -> Slice<'a> {
        Slice {
            subject: SliceSubject::Entry(entry),
            start_angle: start,
            end_angle: end,
            color,
        }
    }

    #[test]
    fn test_pie_skips_labels_on_thin_slices() {
        let Some(r) = labelled() else {
            return;
        };
        let (big, s1, s2) = (Entry::file("big", 70), Entry::file("s1", 1), Entry::file("s2", 1));
        // `big` is centred at 175°, below the centre; the 5° slices sit at the top.
        let pie = Chart::Pie(vec![
            slice(&big, 0.0, 350.0, Color::rgb(40, 60, 160)),
            slice(&s1, 350.0, 355.0, Color::rgb(200, 80, 80)),
            slice(&s2, 355.0, 360.0, Color::rgb(80, 200, 80)),
        ]);

        let with = r.render(&pie, 400, 400).unwrap();
        let without = plain().render(&pie, 400, 400).unwrap();
        let diff = ink(&with, &without);

        assert!(!diff.is_empty(), "wide slice got no label");
        assert!(diff.iter().all(|&(_, y)| y > 200));
    }

    #[test]
    fn test_pie_labels_slices_at_threshold() {
        let Some(r) = labelled() else {
            return;
        };
        let (big, edge) = (Entry::file("big", 35), Entry::file("edge", 1));
        let pie = Chart::Pie(vec![
            slice(&big, 0.0, 350.0, Color::rgb(40, 60, 160)),
            slice(&edge, 350.0, 360.0, Color::rgb(200, 80, 80)),
        ]);

        let with = r.render(&pie, 400, 400).unwrap();
        let without = plain().render(&pie, 400, 400).unwrap();
        let diff = ink(&with, &without);

        // Exactly 10° is enough; its label sits near the top of the disc.
        assert!(diff.iter().any(|&(_, y)| y < 200));
        assert!(diff.iter().any(|&(_, y)| y > 200));
    }

    #[test]
    fn test_clockwise_from_top() {
        assert!((clockwise_from_top(0.0, -1.0) - 0.0).abs() < 1e-9);
        assert!((clockwise_from_top(1.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((clockwise_from_top(0.0, 1.0) - 180.0).abs() < 1e-9);
        assert!((clockwise_from_top(-1.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_separator_only_near_boundary() {
        assert!(separator_factor(0.0, 100.0, &[0.0]) > 0.99);
        assert_eq!(separator_factor(45.0, 100.0, &[0.0]), 0.0);
        assert_eq!(separator_factor(180.0, 100.0, &[0.0]), 0.0);
    }
}
