/// Colour scheme for rendered charts.
///
/// Node colours come from the core palette; everything around them
/// (background, borders, separators, label ink) is defined here so the
/// rasterizer references semantically-named values rather than raw hex codes.
use serde::Deserialize;
use visfile_core::palette::Color;

/// Which theme is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

/// Semantic colours for one theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    /// 1-pixel outline around every treemap rectangle.
    pub border: Color,
    /// Lines between pie slices and around the pie.
    pub separator: Color,
    /// Label ink on light fills.
    pub label_dark: Color,
    /// Label ink on dark fills.
    pub label_light: Color,
    /// Secondary (size) line on light fills.
    pub label_dark_dim: Color,
    /// Secondary (size) line on dark fills.
    pub label_light_dim: Color,
}

impl Theme {
    /// Dark theme (the default).
    pub fn dark() -> Self {
        Self {
            background: Color::rgb(0x1e, 0x1e, 0x2e),
            border: Color::rgb(0x11, 0x11, 0x1b),
            separator: Color::rgb(0x1e, 0x1e, 0x2e),
            label_dark: Color::rgb(0x10, 0x10, 0x10),
            label_light: Color::rgb(0xff, 0xff, 0xff),
            label_dark_dim: Color::rgb(0x30, 0x30, 0x30),
            label_light_dim: Color::rgb(0xd0, 0xd0, 0xd0),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::rgb(0xf5, 0xf5, 0xf5),
            border: Color::rgb(0x4a, 0x4a, 0x5a),
            separator: Color::rgb(0xff, 0xff, 0xff),
            label_dark: Color::rgb(0x10, 0x10, 0x10),
            label_light: Color::rgb(0xff, 0xff, 0xff),
            label_dark_dim: Color::rgb(0x30, 0x30, 0x30),
            label_light_dim: Color::rgb(0xd0, 0xd0, 0xd0),
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Primary and secondary label colours readable on `fill`.
    pub fn label_on(&self, fill: Color) -> (Color, Color) {
        if fill.luma() > 140.0 {
            (self.label_dark, self.label_dark_dim)
        } else {
            (self.label_light, self.label_light_dim)
        }
    }
}
