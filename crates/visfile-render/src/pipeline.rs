/// End-to-end pipeline: scan a directory, lay it out, rasterize, persist.
///
/// Each stage keeps its own error type; [`Error`] wraps them unchanged so
/// callers can tell which stage failed through [`Error::kind`].
use crate::raster::{check_dimensions, Rasterizer, RenderConfig, RenderError};
use crate::sink::{ImageSink, PngSink, SinkError};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;
use visfile_core::config::{LayoutConfig, ScanConfig};
use visfile_core::layout::{ChartKind, LayoutError, Rect};
use visfile_core::model::Entry;
use visfile_core::scanner::{self, ScanError, ScanOptions};

/// Everything a render run can be configured with, loadable from JSON.
///
/// ```json
/// {
///   "scan":   { "workers": 4, "follow_symlinks": false },
///   "layout": { "treemap": { "max_depth": 3 }, "pie": { "min_slice_degrees": 2.0 } },
///   "render": { "width": 1600, "height": 900, "theme": "light" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scan: ScanConfig,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A failure in one of the pipeline stages.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Which stage an [`Error`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Scan,
    Layout,
    Render,
    Sink,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Scan(_) => ErrorKind::Scan,
            Error::Layout(_) => ErrorKind::Layout,
            Error::Render(_) => ErrorKind::Render,
            Error::Sink(_) => ErrorKind::Sink,
        }
    }
}

/// Scan `root` and write a `kind` chart of it to `output` as PNG, with the
/// default configuration.
pub fn scan_and_render(root: &Path, output: &Path, kind: ChartKind) -> Result<(), Error> {
    scan_and_render_with(root, output, kind, &Config::default(), &PngSink).map(|_| ())
}

/// Like [`scan_and_render`] with explicit configuration and sink. Returns
/// the scanned tree so callers can report on it.
pub fn scan_and_render_with(
    root: &Path,
    output: &Path,
    kind: ChartKind,
    config: &Config,
    sink: &dyn ImageSink,
) -> Result<Entry, Error> {
    let (width, height) = (config.render.width, config.render.height);
    check_dimensions(width, height)?;

    let start = Instant::now();
    let tree = scanner::scan(root, &config.scan, &ScanOptions::default())?;
    info!(
        "Scanned {}: {} files, {} bytes in {:?}",
        root.display(),
        tree.file_count,
        tree.total_size,
        start.elapsed()
    );

    render_tree(&tree, output, kind, config, sink)?;
    Ok(tree)
}

/// Lay out, rasterize and persist an already scanned tree.
pub fn render_tree(
    tree: &Entry,
    output: &Path,
    kind: ChartKind,
    config: &Config,
    sink: &dyn ImageSink,
) -> Result<(), Error> {
    let (width, height) = (config.render.width, config.render.height);
    let start = Instant::now();

    let bounds = Rect::new(0.0, 0.0, width as f64, height as f64);
    let chart = kind.layout(tree, bounds, &config.layout)?;
    let frame = Rasterizer::new(&config.render).render(&chart, width, height)?;
    sink.write(&frame, output)?;

    info!(
        "Wrote {kind} {width}x{height} to {} in {:?}",
        output.display(),
        start.elapsed()
    );
    Ok(())
}
