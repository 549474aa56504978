/// Chart layout: turns an `Entry` tree into positioned, coloured geometry.
///
/// Two strategies form a closed set selected by [`ChartKind`]:
/// - [`squarify`]: nested squarified treemap (Bruls, Huizing, van Wijk).
/// - [`pie`]: one level of angular slices with small-slice bucketing.
///
/// Layout output borrows the tree; it is built fresh for every render and
/// never mutates the entries.
pub mod pie;
pub mod squarify;

use crate::config::LayoutConfig;
use crate::model::Entry;
use crate::palette::Palette;
use thiserror::Error;

pub use pie::{layout_pie, Slice, SliceSubject};
pub use squarify::{layout_treemap, squarify, TreemapNode};

/// An axis-aligned rectangle in output pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area shared with `other` (0 when the interiors are disjoint).
    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }

    /// Finite, non-negative extents.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    /// The bounding rectangle is negative or not finite.
    #[error("degenerate layout bounds: {0:?}")]
    DegenerateInput(Rect),
}

/// Which chart to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChartKind {
    #[default]
    Treemap,
    Pie,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Treemap => f.write_str("treemap"),
            ChartKind::Pie => f.write_str("pie"),
        }
    }
}

/// Laid-out geometry for one chart.
#[derive(Debug, Clone)]
pub enum Chart<'a> {
    Treemap(TreemapNode<'a>),
    Pie(Vec<Slice<'a>>),
}

impl ChartKind {
    /// Lay out `entry` inside `bounds` with this strategy.
    ///
    /// Pie charts only use `bounds` for validation; the rasterizer fits the
    /// circle to the canvas.
    pub fn layout<'a>(
        self,
        entry: &'a Entry,
        bounds: Rect,
        config: &LayoutConfig,
    ) -> Result<Chart<'a>, LayoutError> {
        if !bounds.is_valid() {
            return Err(LayoutError::DegenerateInput(bounds));
        }
        let palette = Palette::new(&config.palette);
        Ok(match self {
            ChartKind::Treemap => {
                Chart::Treemap(layout_treemap(entry, bounds, &config.treemap, &palette)?)
            }
            ChartKind::Pie => Chart::Pie(layout_pie(entry, &config.pie, &palette)),
        })
    }
}
