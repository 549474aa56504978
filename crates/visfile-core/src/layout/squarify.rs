/// Squarified treemap layout (Bruls, Huizing, van Wijk).
///
/// Rectangle areas are proportional to `total_size`. Children are consumed
/// in their canonical (descending size) order and packed into rows along
/// the shorter side of the remaining space; a row grows only while adding
/// the next child does not make its worst aspect ratio worse.
///
/// Every child gets a rectangle, including zero-size ones (which get a
/// zero-area rectangle at the position the algorithm reaches), so leaf
/// areas always add up to the parent's area.
use super::{LayoutError, Rect};
use crate::config::TreemapConfig;
use crate::model::Entry;
use crate::palette::{Color, Palette};

/// A positioned treemap node and its laid-out children.
#[derive(Debug, Clone)]
pub struct TreemapNode<'a> {
    pub entry: &'a Entry,
    pub rect: Rect,
    pub color: Color,
    /// 0 for the layout root.
    pub depth: usize,
    /// Empty for leaves (files, empty directories, nodes at the depth cap,
    /// and nodes whose rectangle has no area).
    pub children: Vec<TreemapNode<'a>>,
}

impl<'a> TreemapNode<'a> {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order traversal: parents before their children.
    pub fn iter(&self) -> impl Iterator<Item = &TreemapNode<'a>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn leaves(&self) -> impl Iterator<Item = &TreemapNode<'a>> {
        self.iter().filter(|n| n.is_leaf())
    }
}

/// Lay out `entry` and its descendants inside `bounds`.
pub fn layout_treemap<'a>(
    entry: &'a Entry,
    bounds: Rect,
    config: &TreemapConfig,
    palette: &Palette,
) -> Result<TreemapNode<'a>, LayoutError> {
    if !bounds.is_valid() {
        return Err(LayoutError::DegenerateInput(bounds));
    }
    let root = layout_node(entry, bounds, 0, config, palette);
    tracing::debug!(
        "Treemap layout: {} nodes in {:.0}x{:.0}",
        root.iter().count(),
        bounds.width,
        bounds.height
    );
    Ok(root)
}

fn layout_node<'a>(
    entry: &'a Entry,
    rect: Rect,
    depth: usize,
    config: &TreemapConfig,
    palette: &Palette,
) -> TreemapNode<'a> {
    let color = palette.color_for(&entry.name, depth);
    let at_cap = config.max_depth.is_some_and(|max| depth >= max);

    let children = if entry.children.is_empty() || rect.area() <= 0.0 || at_cap {
        Vec::new()
    } else {
        let weights: Vec<f64> = entry.children.iter().map(|c| c.total_size as f64).collect();
        squarify(&weights, rect)
            .into_iter()
            .zip(&entry.children)
            .map(|(child_rect, child)| layout_node(child, child_rect, depth + 1, config, palette))
            .collect()
    };

    TreemapNode {
        entry,
        rect,
        color,
        depth,
        children,
    }
}

/// Partition `bounds` into one rectangle per weight, in input order.
///
/// `weights` should be sorted descending for good aspect ratios. When they
/// sum to zero every item gets an equal share.
pub fn squarify(weights: &[f64], bounds: Rect) -> Vec<Rect> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let total: f64 = weights.iter().sum();
    let area = bounds.area();
    let areas: Vec<f64> = if total > 0.0 {
        weights.iter().map(|w| w / total * area).collect()
    } else {
        vec![area / n as f64; n]
    };

    let mut out = Vec::with_capacity(n);
    let mut remaining = bounds;
    let mut start = 0;

    while start < n {
        let short = remaining.width.min(remaining.height);

        // Greedy row building.
        let mut end = start + 1;
        let mut row_area = areas[start];
        let mut best_worst = worst_ratio(&areas[start..end], row_area, short);
        while end < n {
            let new_area = row_area + areas[end];
            let new_worst = worst_ratio(&areas[start..=end], new_area, short);
            if new_worst <= best_worst {
                row_area = new_area;
                best_worst = new_worst;
                end += 1;
            } else {
                break;
            }
        }

        let last_row = end == n;
        let remaining_area: f64 = areas[start..].iter().sum();
        let row_fraction = if last_row {
            1.0
        } else if remaining_area > 0.0 {
            row_area / remaining_area
        } else {
            0.0
        };

        // The row runs along the shorter side; its thickness eats into the
        // longer one.
        let (row_rect, rest) = if remaining.width >= remaining.height {
            let thickness = remaining.width * row_fraction;
            (
                Rect::new(remaining.x, remaining.y, thickness, remaining.height),
                Rect::new(
                    remaining.x + thickness,
                    remaining.y,
                    (remaining.width - thickness).max(0.0),
                    remaining.height,
                ),
            )
        } else {
            let thickness = remaining.height * row_fraction;
            (
                Rect::new(remaining.x, remaining.y, remaining.width, thickness),
                Rect::new(
                    remaining.x,
                    remaining.y + thickness,
                    remaining.width,
                    (remaining.height - thickness).max(0.0),
                ),
            )
        };
        let vertical = remaining.width >= remaining.height;
        remaining = rest;

        place_row(&areas[start..end], row_area, row_rect, vertical, &mut out);
        start = end;
    }

    out
}

/// Split `row_rect` among `areas` along the row direction.
fn place_row(areas: &[f64], row_area: f64, row_rect: Rect, vertical: bool, out: &mut Vec<Rect>) {
    let extent = if vertical {
        row_rect.height
    } else {
        row_rect.width
    };
    let origin = if vertical { row_rect.y } else { row_rect.x };

    let mut acc = 0.0;
    for (i, &a) in areas.iter().enumerate() {
        let begin = if row_area > 0.0 {
            origin + extent * (acc / row_area)
        } else {
            origin
        };
        acc += a;
        // The last item closes the row exactly so rounding never leaves a gap.
        let finish = if i + 1 == areas.len() && row_area > 0.0 {
            origin + extent
        } else if row_area > 0.0 {
            origin + extent * (acc / row_area)
        } else {
            origin
        };

        out.push(if vertical {
            Rect::new(row_rect.x, begin, row_rect.width, finish - begin)
        } else {
            Rect::new(begin, row_rect.y, finish - begin, row_rect.height)
        });
    }
}

/// Worst (highest) aspect ratio of a row of `areas` laid along `side`.
fn worst_ratio(areas: &[f64], sum: f64, side: f64) -> f64 {
    if areas.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::INFINITY;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max = areas.iter().copied().fold(0.0, f64::max);
    let min = areas.iter().copied().fold(f64::INFINITY, f64::min);
    if min <= 0.0 {
        return f64::INFINITY;
    }
    ((side_sq * max) / sum_sq).max(sum_sq / (side_sq * min))
}
