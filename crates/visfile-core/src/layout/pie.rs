/// Pie layout: one level of angular slices.
///
/// Angles are in degrees, clockwise from 12 o'clock, offset by the
/// configured reference angle. Slices are contiguous and the last one is
/// clamped to end exactly one full turn after the reference, whatever the
/// floating-point drift along the way.
use crate::config::PieConfig;
use crate::model::Entry;
use crate::palette::{Color, Palette, OTHER_COLOR};

/// What a slice stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceSubject<'a> {
    Entry(&'a Entry),
    /// Children too thin to label, folded together.
    Other {
        name: String,
        count: usize,
        total_size: u64,
    },
}

/// One positioned pie slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<'a> {
    pub subject: SliceSubject<'a>,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Color,
}

impl Slice<'_> {
    pub fn name(&self) -> &str {
        match &self.subject {
            SliceSubject::Entry(e) => e.name.as_str(),
            SliceSubject::Other { name, .. } => name.as_str(),
        }
    }

    pub fn total_size(&self) -> u64 {
        match &self.subject {
            SliceSubject::Entry(e) => e.total_size,
            SliceSubject::Other { total_size, .. } => *total_size,
        }
    }

    /// Angular width in degrees.
    #[inline]
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Angle halfway through the slice.
    #[inline]
    pub fn bisector(&self) -> f64 {
        self.start_angle + self.sweep() / 2.0
    }

}

/// Lay out the immediate children of `entry` as pie slices.
///
/// Returns no slices for an entry without children. When the children's
/// sizes sum to zero every child gets the same angle.
pub fn layout_pie<'a>(entry: &'a Entry, config: &PieConfig, palette: &Palette) -> Vec<Slice<'a>> {
    let children = &entry.children;
    if children.is_empty() {
        return Vec::new();
    }

    let total: u64 = children.iter().map(|c| c.total_size).sum();
    let sweep_of = |child: &Entry| {
        if total > 0 {
            360.0 * child.total_size as f64 / total as f64
        } else {
            360.0 / children.len() as f64
        }
    };

    // Folding needs at least two thin children and must leave one slice
    // standing on its own.
    let thin = children
        .iter()
        .filter(|c| sweep_of(*c) < config.min_slice_degrees)
        .count();
    let fold = thin >= 2 && thin < children.len();

    let mut kept: Vec<(SliceSubject<'a>, f64)> = Vec::with_capacity(children.len());
    let mut other_sweep = 0.0;
    let mut other_size = 0u64;
    let mut other_count = 0usize;
    for child in children {
        let sweep = sweep_of(child);
        if fold && sweep < config.min_slice_degrees {
            other_sweep += sweep;
            other_size += child.total_size;
            other_count += 1;
        } else {
            kept.push((SliceSubject::Entry(child), sweep));
        }
    }
    if other_count > 0 {
        kept.push((
            SliceSubject::Other {
                name: config.other_label.clone(),
                count: other_count,
                total_size: other_size,
            },
            other_sweep,
        ));
    }

    let reference = config.start_angle;
    let last = kept.len() - 1;
    let mut cursor = reference;
    let slices: Vec<Slice<'a>> = kept
        .into_iter()
        .enumerate()
        .map(|(i, (subject, sweep))| {
            let start_angle = cursor;
            let end_angle = if i == last {
                reference + 360.0
            } else {
                (cursor + sweep).min(reference + 360.0)
            };
            cursor = end_angle;
            // Slices are the root's children, so they share depth 1.
            let color = match &subject {
                SliceSubject::Entry(e) => palette.color_for(&e.name, 1),
                SliceSubject::Other { .. } => OTHER_COLOR,
            };
            Slice {
                subject,
                start_angle,
                end_angle,
                color,
            }
        })
        .collect();

    tracing::debug!(
        "Pie layout: {} slices ({} children folded)",
        slices.len(),
        other_count
    );
    slices
}
